use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::submission::SubmissionId;
use super::template::TemplateId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(pub String);

impl std::fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    /// The employee produced a submission that is now in approval.
    Filled,
    /// The linked submission reached a terminal state on creation (no chain).
    Submitted,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Filled => "filled",
            Self::Submitted => "submitted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "filled" => Some(Self::Filled),
            "submitted" => Some(Self::Submitted),
            _ => None,
        }
    }
}

/// A request for one employee to fill one template, with an optional due
/// date. Overdue is derived at read time, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub template_id: TemplateId,
    pub employee_id: String,
    pub status: AssignmentStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub linked_submission_id: Option<SubmissionId>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == AssignmentStatus::Pending
            && self.due_date.map(|due| due < now).unwrap_or(false)
    }
}
