use async_trait::async_trait;
use thiserror::Error;

use formflow_core::domain::assignment::{Assignment, AssignmentId};
use formflow_core::domain::submission::{Submission, SubmissionId};
use formflow_core::domain::template::{FormTemplate, TemplateId};

pub mod assignment;
pub mod memory;
pub mod submission;
pub mod template;

pub use assignment::SqlAssignmentRepository;
pub use memory::{
    InMemoryAssignmentRepository, InMemorySubmissionRepository, InMemoryTemplateStore,
};
pub use submission::SqlSubmissionRepository;
pub use template::SqlTemplateStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("version conflict on {entity} {id}: expected version {expected_version}")]
    VersionConflict { entity: &'static str, id: String, expected_version: u32 },
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn find_by_id(&self, id: &TemplateId) -> Result<Option<FormTemplate>, RepositoryError>;
    /// Used by fixtures and tests; the workflow engine never writes templates.
    async fn save(&self, template: FormTemplate) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn find_by_id(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError>;

    async fn insert(&self, submission: Submission) -> Result<(), RepositoryError>;

    /// Compare-and-swap write. The record's `version` is the value after the
    /// mutation; the row is only updated when the stored version is exactly
    /// one less. A mismatch returns `VersionConflict` and writes nothing.
    async fn update(&self, submission: Submission) -> Result<(), RepositoryError>;

    async fn list_by_template(
        &self,
        template_id: &TemplateId,
    ) -> Result<Vec<Submission>, RepositoryError>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn find_by_id(&self, id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError>;

    /// Insert a batch atomically: either every assignment lands or none do.
    async fn insert_many(&self, assignments: Vec<Assignment>) -> Result<(), RepositoryError>;

    /// Same compare-and-swap contract as submission updates.
    async fn update(&self, assignment: Assignment) -> Result<(), RepositoryError>;

    async fn list_by_employee(
        &self,
        employee_id: &str,
    ) -> Result<Vec<Assignment>, RepositoryError>;

    async fn list_by_template(
        &self,
        template_id: &TemplateId,
    ) -> Result<Vec<Assignment>, RepositoryError>;

    async fn delete(&self, id: &AssignmentId) -> Result<(), RepositoryError>;
}
