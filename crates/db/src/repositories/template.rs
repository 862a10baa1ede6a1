use sqlx::Row;

use formflow_core::domain::template::{
    ApprovalChain, ApproverLevel, FormTemplate, TemplateId,
};

use super::{RepositoryError, TemplateStore};
use crate::DbPool;

pub struct SqlTemplateStore {
    pool: DbPool,
}

impl SqlTemplateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_template(
    row: &sqlx::sqlite::SqliteRow,
    chain: ApprovalChain,
) -> Result<FormTemplate, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let required_fields_json: String =
        row.try_get("required_fields_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_reusable: i64 =
        row.try_get("is_reusable").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let archived: i64 =
        row.try_get("archived").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let required_fields: Vec<String> = serde_json::from_str(&required_fields_json)
        .map_err(|e| RepositoryError::Decode(format!("required_fields_json: {e}")))?;

    Ok(FormTemplate {
        id: TemplateId(id),
        name,
        required_fields,
        chain,
        is_reusable: is_reusable != 0,
        archived: archived != 0,
    })
}

fn row_to_level(row: &sqlx::sqlite::SqliteRow) -> Result<ApproverLevel, RepositoryError> {
    let level: i64 = row.try_get("level").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let approver_id: String =
        row.try_get("approver_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let approver_name: String =
        row.try_get("approver_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(ApproverLevel { level: level as u32, approver_id, approver_name })
}

#[async_trait::async_trait]
impl TemplateStore for SqlTemplateStore {
    async fn find_by_id(&self, id: &TemplateId) -> Result<Option<FormTemplate>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, required_fields_json, is_reusable, archived
             FROM form_template WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(ref row) = row else { return Ok(None) };

        let level_rows = sqlx::query(
            "SELECT level, approver_id, approver_name
             FROM approver_level WHERE template_id = ? ORDER BY level ASC",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        let levels = level_rows.iter().map(row_to_level).collect::<Result<Vec<_>, _>>()?;
        Ok(Some(row_to_template(row, ApprovalChain(levels))?))
    }

    async fn save(&self, template: FormTemplate) -> Result<(), RepositoryError> {
        let required_fields_json = serde_json::to_string(&template.required_fields)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO form_template (id, name, required_fields_json, is_reusable, archived)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 required_fields_json = excluded.required_fields_json,
                 is_reusable = excluded.is_reusable,
                 archived = excluded.archived",
        )
        .bind(&template.id.0)
        .bind(&template.name)
        .bind(&required_fields_json)
        .bind(template.is_reusable)
        .bind(template.archived)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM approver_level WHERE template_id = ?")
            .bind(&template.id.0)
            .execute(&mut *tx)
            .await?;

        for entry in template.chain.levels() {
            sqlx::query(
                "INSERT INTO approver_level (template_id, level, approver_id, approver_name)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&template.id.0)
            .bind(entry.level)
            .bind(&entry.approver_id)
            .bind(&entry.approver_name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
