//! Approval decision engine.
//!
//! Applies one approver decision to a loaded submission. Checks run in a
//! fixed order so callers get deterministic errors when several conditions
//! fail at once: pending status first, then level, then approver identity.

use chrono::Utc;

use crate::domain::submission::{ApprovalEvent, Decision, Submission, SubmissionStatus};
use crate::domain::template::FormTemplate;
use crate::errors::WorkflowError;

/// A submission after a decision, plus the event that was recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionOutcome {
    pub submission: Submission,
    pub event: ApprovalEvent,
}

#[derive(Clone, Debug, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn apply_decision(
        &self,
        template: &FormTemplate,
        mut submission: Submission,
        level: u32,
        approver_id: &str,
        decision: Decision,
        comments: Option<String>,
    ) -> Result<DecisionOutcome, WorkflowError> {
        if submission.status != SubmissionStatus::InApproval {
            return Err(WorkflowError::NotPending {
                submission_id: submission.id.clone(),
                status: submission.status,
            });
        }
        if level != submission.current_level {
            return Err(WorkflowError::WrongLevel {
                submission_id: submission.id.clone(),
                expected: submission.current_level,
                got: level,
            });
        }
        let designated = template.chain.approver_at(level).ok_or_else(|| {
            WorkflowError::InvalidState(format!(
                "template {} has no approver configured for level {}",
                template.id, level
            ))
        })?;
        if designated.approver_id != approver_id {
            return Err(WorkflowError::UnauthorizedApprover {
                approver_id: approver_id.to_string(),
                level,
            });
        }

        let now = Utc::now();
        let event = ApprovalEvent {
            level,
            approver_id: approver_id.to_string(),
            decision,
            comments,
            actioned_at: now,
        };
        submission.approval_history.push(event.clone());

        match decision {
            Decision::Rejected => {
                submission.status = SubmissionStatus::Rejected;
                submission.current_level = 0;
            }
            Decision::Approved if level == template.chain.last_level() => {
                submission.status = SubmissionStatus::Approved;
                submission.current_level = 0;
            }
            Decision::Approved => {
                submission.current_level += 1;
            }
        }
        submission.version += 1;
        submission.updated_at = now;

        Ok(DecisionOutcome { submission, event })
    }
}
