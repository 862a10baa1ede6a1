//! Assignment tracking engine.
//!
//! Assignments request that an employee fill a template. The tracker owns
//! their small state machine: `Pending` until a submission is produced,
//! then `Filled` (or `Submitted` when the linked submission was terminal on
//! creation). Overdue is never stored, only derived from the due date.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::assignment::{Assignment, AssignmentId, AssignmentStatus};
use crate::domain::submission::{Submission, SubmissionStatus};
use crate::domain::template::FormTemplate;
use crate::errors::WorkflowError;

#[derive(Clone, Debug, Default)]
pub struct AssignmentTracker;

impl AssignmentTracker {
    pub fn new() -> Self {
        Self
    }

    /// Create one pending assignment per template, all handed to the same
    /// employee.
    pub fn create_assignments(
        &self,
        templates: &[FormTemplate],
        employee_id: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<Assignment>, WorkflowError> {
        if templates.is_empty() {
            return Err(WorkflowError::Validation(
                "at least one template id is required".to_string(),
            ));
        }
        if employee_id.trim().is_empty() {
            return Err(WorkflowError::Validation("employee id must not be blank".to_string()));
        }
        if let Some(archived) = templates.iter().find(|template| template.archived) {
            return Err(WorkflowError::Validation(format!(
                "template {} is archived and cannot be assigned",
                archived.id
            )));
        }

        let now = Utc::now();
        Ok(templates
            .iter()
            .map(|template| Assignment {
                id: AssignmentId(Uuid::new_v4().to_string()),
                template_id: template.id.clone(),
                employee_id: employee_id.to_string(),
                status: AssignmentStatus::Pending,
                due_date,
                linked_submission_id: None,
                version: 1,
                created_at: now,
                updated_at: now,
            })
            .collect())
    }

    /// Link a submission to its assignment. Only pending assignments can be
    /// filled; the landed status mirrors whether the submission still needs
    /// approval.
    pub fn mark_filled(
        &self,
        mut assignment: Assignment,
        submission: &Submission,
    ) -> Result<Assignment, WorkflowError> {
        if assignment.status != AssignmentStatus::Pending {
            return Err(WorkflowError::InvalidState(format!(
                "assignment {} is already {}",
                assignment.id,
                assignment.status.as_str()
            )));
        }
        if assignment.template_id != submission.template_id {
            return Err(WorkflowError::InvalidState(format!(
                "assignment {} targets template {}, submission {} belongs to {}",
                assignment.id, assignment.template_id, submission.id, submission.template_id
            )));
        }

        assignment.status = if submission.status == SubmissionStatus::Submitted {
            AssignmentStatus::Submitted
        } else {
            AssignmentStatus::Filled
        };
        assignment.linked_submission_id = Some(submission.id.clone());
        assignment.version += 1;
        assignment.updated_at = Utc::now();
        Ok(assignment)
    }

    /// Deleting is a retraction of the request, so it is only allowed while
    /// no submission exists yet.
    pub fn ensure_deletable(&self, assignment: &Assignment) -> Result<(), WorkflowError> {
        if assignment.status == AssignmentStatus::Pending {
            Ok(())
        } else {
            Err(WorkflowError::InvalidState(format!(
                "assignment {} is {} and can no longer be deleted",
                assignment.id,
                assignment.status.as_str()
            )))
        }
    }
}
