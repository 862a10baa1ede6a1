use chrono::{DateTime, Utc};
use sqlx::Row;

use formflow_core::domain::submission::{
    ApprovalEvent, Decision, Submission, SubmissionData, SubmissionId, SubmissionStatus,
};
use formflow_core::domain::template::TemplateId;

use super::{RepositoryError, SubmissionRepository};
use crate::DbPool;

pub struct SqlSubmissionRepository {
    pool: DbPool,
}

impl SqlSubmissionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_submission(row: &sqlx::sqlite::SqliteRow) -> Result<Submission, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let template_id: String =
        row.try_get("template_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let data_json: String =
        row.try_get("data_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let current_level: i64 =
        row.try_get("current_level").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let submitted_by: String =
        row.try_get("submitted_by").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let version: i64 =
        row.try_get("version").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let data: SubmissionData = serde_json::from_str(&data_json)
        .map_err(|e| RepositoryError::Decode(format!("data_json: {e}")))?;
    let status = SubmissionStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown submission status `{status_str}`")))?;

    Ok(Submission {
        id: SubmissionId(id),
        template_id: TemplateId(template_id),
        data,
        status,
        current_level: current_level as u32,
        approval_history: Vec::new(),
        submitted_by,
        version: version as u32,
        created_at: parse_timestamp(&created_at_str, "created_at")?,
        updated_at: parse_timestamp(&updated_at_str, "updated_at")?,
    })
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<ApprovalEvent, RepositoryError> {
    let level: i64 = row.try_get("level").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let approver_id: String =
        row.try_get("approver_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let decision_str: String =
        row.try_get("decision").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let comments: Option<String> =
        row.try_get("comments").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let actioned_at_str: String =
        row.try_get("actioned_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let decision = Decision::parse(&decision_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown decision `{decision_str}`")))?;

    Ok(ApprovalEvent {
        level: level as u32,
        approver_id,
        decision,
        comments,
        actioned_at: parse_timestamp(&actioned_at_str, "actioned_at")?,
    })
}

async fn load_history(
    pool: &DbPool,
    submission_id: &str,
) -> Result<Vec<ApprovalEvent>, RepositoryError> {
    let rows = sqlx::query(
        "SELECT level, approver_id, decision, comments, actioned_at
         FROM approval_event WHERE submission_id = ? ORDER BY level ASC",
    )
    .bind(submission_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_event).collect()
}

async fn write_history<'a>(
    tx: &mut sqlx::Transaction<'a, sqlx::Sqlite>,
    submission: &Submission,
) -> Result<(), RepositoryError> {
    // History is replaced wholesale: cheap at these sizes and it keeps the
    // resubmission reset and the incremental append on one code path.
    sqlx::query("DELETE FROM approval_event WHERE submission_id = ?")
        .bind(&submission.id.0)
        .execute(&mut **tx)
        .await?;

    for event in &submission.approval_history {
        sqlx::query(
            "INSERT INTO approval_event (submission_id, level, approver_id, decision, comments, actioned_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&submission.id.0)
        .bind(event.level)
        .bind(&event.approver_id)
        .bind(event.decision.as_str())
        .bind(&event.comments)
        .bind(event.actioned_at.to_rfc3339())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn encode_data(data: &SubmissionData) -> Result<String, RepositoryError> {
    serde_json::to_string(data).map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl SubmissionRepository for SqlSubmissionRepository {
    async fn find_by_id(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, template_id, data_json, status, current_level, submitted_by,
                    version, created_at, updated_at
             FROM submission WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => {
                let mut submission = row_to_submission(r)?;
                submission.approval_history = load_history(&self.pool, &submission.id.0).await?;
                Ok(Some(submission))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, submission: Submission) -> Result<(), RepositoryError> {
        let data_json = encode_data(&submission.data)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO submission (id, template_id, data_json, status, current_level,
                                     submitted_by, version, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&submission.id.0)
        .bind(&submission.template_id.0)
        .bind(&data_json)
        .bind(submission.status.as_str())
        .bind(submission.current_level)
        .bind(&submission.submitted_by)
        .bind(submission.version)
        .bind(submission.created_at.to_rfc3339())
        .bind(submission.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        write_history(&mut tx, &submission).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, submission: Submission) -> Result<(), RepositoryError> {
        let expected_version = submission.version.saturating_sub(1);
        let data_json = encode_data(&submission.data)?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE submission
             SET data_json = ?, status = ?, current_level = ?, version = ?, updated_at = ?
             WHERE id = ? AND version = ?",
        )
        .bind(&data_json)
        .bind(submission.status.as_str())
        .bind(submission.current_level)
        .bind(submission.version)
        .bind(submission.updated_at.to_rfc3339())
        .bind(&submission.id.0)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::VersionConflict {
                entity: "submission",
                id: submission.id.0.clone(),
                expected_version,
            });
        }

        write_history(&mut tx, &submission).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_by_template(
        &self,
        template_id: &TemplateId,
    ) -> Result<Vec<Submission>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, template_id, data_json, status, current_level, submitted_by,
                    version, created_at, updated_at
             FROM submission WHERE template_id = ? ORDER BY created_at ASC",
        )
        .bind(&template_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut submissions = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut submission = row_to_submission(row)?;
            submission.approval_history = load_history(&self.pool, &submission.id.0).await?;
            submissions.push(submission);
        }
        Ok(submissions)
    }
}
