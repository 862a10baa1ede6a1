use chrono::{DateTime, Utc};
use sqlx::Row;

use formflow_core::domain::assignment::{Assignment, AssignmentId, AssignmentStatus};
use formflow_core::domain::submission::SubmissionId;
use formflow_core::domain::template::TemplateId;

use super::{AssignmentRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAssignmentRepository {
    pool: DbPool,
}

impl SqlAssignmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_assignment(row: &sqlx::sqlite::SqliteRow) -> Result<Assignment, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let template_id: String =
        row.try_get("template_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let employee_id: String =
        row.try_get("employee_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let due_date_str: Option<String> =
        row.try_get("due_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let linked_submission_id: Option<String> =
        row.try_get("linked_submission_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let version: i64 =
        row.try_get("version").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let status = AssignmentStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown assignment status `{status_str}`")))?;
    let due_date = match due_date_str {
        Some(value) => Some(parse_timestamp(&value, "due_date")?),
        None => None,
    };

    Ok(Assignment {
        id: AssignmentId(id),
        template_id: TemplateId(template_id),
        employee_id,
        status,
        due_date,
        linked_submission_id: linked_submission_id.map(SubmissionId),
        version: version as u32,
        created_at: parse_timestamp(&created_at_str, "created_at")?,
        updated_at: parse_timestamp(&updated_at_str, "updated_at")?,
    })
}

const SELECT_COLUMNS: &str = "id, template_id, employee_id, status, due_date, \
     linked_submission_id, version, created_at, updated_at";

#[async_trait::async_trait]
impl AssignmentRepository for SqlAssignmentRepository {
    async fn find_by_id(&self, id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM assignment WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_assignment(r)?)),
            None => Ok(None),
        }
    }

    async fn insert_many(&self, assignments: Vec<Assignment>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for assignment in &assignments {
            sqlx::query(
                "INSERT INTO assignment (id, template_id, employee_id, status, due_date,
                                         linked_submission_id, version, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&assignment.id.0)
            .bind(&assignment.template_id.0)
            .bind(&assignment.employee_id)
            .bind(assignment.status.as_str())
            .bind(assignment.due_date.map(|dt| dt.to_rfc3339()))
            .bind(assignment.linked_submission_id.as_ref().map(|id| id.0.clone()))
            .bind(assignment.version)
            .bind(assignment.created_at.to_rfc3339())
            .bind(assignment.updated_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, assignment: Assignment) -> Result<(), RepositoryError> {
        let expected_version = assignment.version.saturating_sub(1);

        let result = sqlx::query(
            "UPDATE assignment
             SET status = ?, due_date = ?, linked_submission_id = ?, version = ?, updated_at = ?
             WHERE id = ? AND version = ?",
        )
        .bind(assignment.status.as_str())
        .bind(assignment.due_date.map(|dt| dt.to_rfc3339()))
        .bind(assignment.linked_submission_id.as_ref().map(|id| id.0.clone()))
        .bind(assignment.version)
        .bind(assignment.updated_at.to_rfc3339())
        .bind(&assignment.id.0)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::VersionConflict {
                entity: "assignment",
                id: assignment.id.0.clone(),
                expected_version,
            });
        }
        Ok(())
    }

    async fn list_by_employee(
        &self,
        employee_id: &str,
    ) -> Result<Vec<Assignment>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM assignment
             WHERE employee_id = ? ORDER BY created_at ASC"
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_assignment).collect()
    }

    async fn list_by_template(
        &self,
        template_id: &TemplateId,
    ) -> Result<Vec<Assignment>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM assignment
             WHERE template_id = ? ORDER BY created_at ASC"
        ))
        .bind(&template_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_assignment).collect()
    }

    async fn delete(&self, id: &AssignmentId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM assignment WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
