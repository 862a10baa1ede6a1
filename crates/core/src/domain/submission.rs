use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::template::TemplateId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field id to entered value. BTreeMap keeps serialization order stable.
pub type SubmissionData = BTreeMap<String, serde_json::Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    InApproval,
    Approved,
    Rejected,
    /// Terminal state for templates with no approval chain. Distinct from
    /// `Approved`: nobody signed off, there was nothing to sign off on.
    Submitted,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InApproval => "in_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Submitted => "submitted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "in_approval" => Some(Self::InApproval),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "submitted" => Some(Self::Submitted),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Submitted)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// One recorded decision. History holds at most one event per level and a
/// rejection, if present, is always the last entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub level: u32,
    pub approver_id: String,
    pub decision: Decision,
    pub comments: Option<String>,
    pub actioned_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub template_id: TemplateId,
    pub data: SubmissionData,
    pub status: SubmissionStatus,
    /// Level currently awaiting action; 0 when no level is pending.
    pub current_level: u32,
    pub approval_history: Vec<ApprovalEvent>,
    pub submitted_by: String,
    /// Optimistic-concurrency token, bumped on every successful mutation.
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn decision_at(&self, level: u32) -> Option<&ApprovalEvent> {
        self.approval_history.iter().find(|event| event.level == level)
    }

    /// History must cover levels 1..=k in ascending order, with a rejection
    /// only ever in last position.
    pub fn history_is_well_formed(&self) -> bool {
        for (position, event) in self.approval_history.iter().enumerate() {
            if event.level != position as u32 + 1 {
                return false;
            }
            if event.decision == Decision::Rejected
                && position + 1 != self.approval_history.len()
            {
                return false;
            }
        }
        true
    }
}
