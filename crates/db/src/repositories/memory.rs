use std::collections::HashMap;

use tokio::sync::RwLock;

use formflow_core::domain::assignment::{Assignment, AssignmentId};
use formflow_core::domain::submission::{Submission, SubmissionId};
use formflow_core::domain::template::{FormTemplate, TemplateId};

use super::{AssignmentRepository, RepositoryError, SubmissionRepository, TemplateStore};

#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<String, FormTemplate>>,
}

#[async_trait::async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn find_by_id(&self, id: &TemplateId) -> Result<Option<FormTemplate>, RepositoryError> {
        let templates = self.templates.read().await;
        Ok(templates.get(&id.0).cloned())
    }

    async fn save(&self, template: FormTemplate) -> Result<(), RepositoryError> {
        let mut templates = self.templates.write().await;
        templates.insert(template.id.0.clone(), template);
        Ok(())
    }
}

/// In-memory submission store enforcing the same compare-and-swap contract
/// as the SQL repository, so service-level conflict handling is testable
/// without a database.
#[derive(Default)]
pub struct InMemorySubmissionRepository {
    submissions: RwLock<HashMap<String, Submission>>,
}

#[async_trait::async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn find_by_id(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let submissions = self.submissions.read().await;
        Ok(submissions.get(&id.0).cloned())
    }

    async fn insert(&self, submission: Submission) -> Result<(), RepositoryError> {
        let mut submissions = self.submissions.write().await;
        submissions.insert(submission.id.0.clone(), submission);
        Ok(())
    }

    async fn update(&self, submission: Submission) -> Result<(), RepositoryError> {
        let expected_version = submission.version.saturating_sub(1);
        let mut submissions = self.submissions.write().await;
        match submissions.get(&submission.id.0) {
            Some(stored) if stored.version == expected_version => {
                submissions.insert(submission.id.0.clone(), submission);
                Ok(())
            }
            _ => Err(RepositoryError::VersionConflict {
                entity: "submission",
                id: submission.id.0.clone(),
                expected_version,
            }),
        }
    }

    async fn list_by_template(
        &self,
        template_id: &TemplateId,
    ) -> Result<Vec<Submission>, RepositoryError> {
        let submissions = self.submissions.read().await;
        let mut matching: Vec<Submission> = submissions
            .values()
            .filter(|s| s.template_id == *template_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matching)
    }
}

#[derive(Default)]
pub struct InMemoryAssignmentRepository {
    assignments: RwLock<HashMap<String, Assignment>>,
}

#[async_trait::async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn find_by_id(&self, id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError> {
        let assignments = self.assignments.read().await;
        Ok(assignments.get(&id.0).cloned())
    }

    async fn insert_many(&self, batch: Vec<Assignment>) -> Result<(), RepositoryError> {
        let mut assignments = self.assignments.write().await;
        for assignment in batch {
            assignments.insert(assignment.id.0.clone(), assignment);
        }
        Ok(())
    }

    async fn update(&self, assignment: Assignment) -> Result<(), RepositoryError> {
        let expected_version = assignment.version.saturating_sub(1);
        let mut assignments = self.assignments.write().await;
        match assignments.get(&assignment.id.0) {
            Some(stored) if stored.version == expected_version => {
                assignments.insert(assignment.id.0.clone(), assignment);
                Ok(())
            }
            _ => Err(RepositoryError::VersionConflict {
                entity: "assignment",
                id: assignment.id.0.clone(),
                expected_version,
            }),
        }
    }

    async fn list_by_employee(
        &self,
        employee_id: &str,
    ) -> Result<Vec<Assignment>, RepositoryError> {
        let assignments = self.assignments.read().await;
        let mut matching: Vec<Assignment> = assignments
            .values()
            .filter(|a| a.employee_id == employee_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matching)
    }

    async fn list_by_template(
        &self,
        template_id: &TemplateId,
    ) -> Result<Vec<Assignment>, RepositoryError> {
        let assignments = self.assignments.read().await;
        let mut matching: Vec<Assignment> = assignments
            .values()
            .filter(|a| a.template_id == *template_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matching)
    }

    async fn delete(&self, id: &AssignmentId) -> Result<(), RepositoryError> {
        let mut assignments = self.assignments.write().await;
        assignments.remove(&id.0);
        Ok(())
    }
}
