use thiserror::Error;

use crate::domain::assignment::AssignmentId;
use crate::domain::submission::{SubmissionId, SubmissionStatus};
use crate::domain::template::{ChainError, TemplateId};

/// Domain failures the engine can surface. Every variant carries enough
/// context for a caller to act on without re-reading the record.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("template {0} not found")]
    TemplateNotFound(TemplateId),

    #[error("submission {0} not found")]
    SubmissionNotFound(SubmissionId),

    #[error("assignment {0} not found")]
    AssignmentNotFound(AssignmentId),

    #[error("submission {submission_id} is not awaiting approval (status: {})", .status.as_str())]
    NotPending {
        submission_id: SubmissionId,
        status: SubmissionStatus,
    },

    #[error("submission {submission_id} is at level {expected}, decision targeted level {got}")]
    WrongLevel {
        submission_id: SubmissionId,
        expected: u32,
        got: u32,
    },

    #[error("approver {approver_id} is not the designated approver for level {level}")]
    UnauthorizedApprover { approver_id: String, level: u32 },

    #[error("invalid state transition: {0}")]
    InvalidState(String),

    #[error("record {id} was modified concurrently (expected version {expected_version})")]
    ConcurrentModification { id: String, expected_version: u32 },
}

impl WorkflowError {
    /// Stable machine-readable identifier, used in logs and API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::TemplateNotFound(_) => "template_not_found",
            Self::SubmissionNotFound(_) => "submission_not_found",
            Self::AssignmentNotFound(_) => "assignment_not_found",
            Self::NotPending { .. } => "not_pending",
            Self::WrongLevel { .. } => "wrong_level",
            Self::UnauthorizedApprover { .. } => "unauthorized_approver",
            Self::InvalidState(_) => "invalid_state",
            Self::ConcurrentModification { .. } => "concurrent_modification",
        }
    }
}

impl From<ChainError> for WorkflowError {
    fn from(error: ChainError) -> Self {
        Self::Validation(error.to_string())
    }
}
