//! Submission lifecycle engine.
//!
//! Pure state machine for submissions: callers load records, the engine
//! validates and produces updated records, callers persist them. No I/O
//! happens here, which keeps every transition unit-testable.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::submission::{Submission, SubmissionData, SubmissionId, SubmissionStatus};
use crate::domain::template::FormTemplate;
use crate::errors::WorkflowError;

#[derive(Clone, Debug, Default)]
pub struct LifecycleEngine;

impl LifecycleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Store work-in-progress data without entering the approval flow.
    /// Required-field validation is deferred until finalization.
    pub fn save_draft(
        &self,
        template: &FormTemplate,
        data: SubmissionData,
        submitted_by: impl Into<String>,
    ) -> Result<Submission, WorkflowError> {
        ensure_template_accepts_submissions(template)?;

        let now = Utc::now();
        Ok(Submission {
            id: SubmissionId(Uuid::new_v4().to_string()),
            template_id: template.id.clone(),
            data,
            status: SubmissionStatus::Draft,
            current_level: 0,
            approval_history: Vec::new(),
            submitted_by: submitted_by.into(),
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Create and finalize a submission in one step. An empty approval chain
    /// makes the submission terminal immediately; otherwise it enters the
    /// chain at level 1.
    pub fn create_submission(
        &self,
        template: &FormTemplate,
        data: SubmissionData,
        submitted_by: impl Into<String>,
    ) -> Result<Submission, WorkflowError> {
        ensure_template_accepts_submissions(template)?;
        validate_required_fields(template, &data)?;
        template.chain.validate()?;

        let now = Utc::now();
        let (status, current_level) = initial_position(template);
        Ok(Submission {
            id: SubmissionId(Uuid::new_v4().to_string()),
            template_id: template.id.clone(),
            data,
            status,
            current_level,
            approval_history: Vec::new(),
            submitted_by: submitted_by.into(),
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace a draft's or a rejected submission's data and send it (back)
    /// through the chain from level 1. Prior decisions are discarded so the
    /// retained history always describes the current data.
    pub fn edit_and_resubmit(
        &self,
        template: &FormTemplate,
        mut submission: Submission,
        data: SubmissionData,
    ) -> Result<Submission, WorkflowError> {
        match submission.status {
            SubmissionStatus::Draft | SubmissionStatus::Rejected => {}
            other => {
                return Err(WorkflowError::InvalidState(format!(
                    "submission {} cannot be resubmitted from status {}",
                    submission.id,
                    other.as_str()
                )));
            }
        }
        if submission.template_id != template.id {
            return Err(WorkflowError::InvalidState(format!(
                "submission {} belongs to template {}, not {}",
                submission.id, submission.template_id, template.id
            )));
        }
        ensure_template_accepts_submissions(template)?;
        validate_required_fields(template, &data)?;
        template.chain.validate()?;

        let (status, current_level) = initial_position(template);
        submission.data = data;
        submission.status = status;
        submission.current_level = current_level;
        submission.approval_history.clear();
        submission.version += 1;
        submission.updated_at = Utc::now();
        Ok(submission)
    }
}

fn initial_position(template: &FormTemplate) -> (SubmissionStatus, u32) {
    if template.requires_approval() {
        (SubmissionStatus::InApproval, 1)
    } else {
        (SubmissionStatus::Submitted, 0)
    }
}

fn ensure_template_accepts_submissions(template: &FormTemplate) -> Result<(), WorkflowError> {
    // Archived templates are withdrawn from submitters and read the same as
    // templates that never existed.
    if template.archived {
        return Err(WorkflowError::TemplateNotFound(template.id.clone()));
    }
    Ok(())
}

fn validate_required_fields(
    template: &FormTemplate,
    data: &SubmissionData,
) -> Result<(), WorkflowError> {
    let missing: Vec<&str> = template
        .required_fields
        .iter()
        .filter(|field| {
            matches!(data.get(field.as_str()), None | Some(serde_json::Value::Null))
        })
        .map(String::as_str)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(WorkflowError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}
