use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_TEMPLATE_IDS: &[&str] = &["tpl-expense-report", "tpl-pulse-survey"];
const SEED_ASSIGNMENT_IDS: &[&str] = &["asg-seed-001", "asg-seed-002"];

/// Deterministic seed templates and assignments for demos and integration
/// tests. One template with a two-level chain, one with no chain at all.
pub struct SeedDataset;

impl SeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_templates.sql");

    /// Load the seed set. Re-running replaces the same rows, so the load is
    /// idempotent.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            template_ids: SEED_TEMPLATE_IDS,
            assignment_ids: SEED_ASSIGNMENT_IDS,
        })
    }

    /// Verify the seeded rows exist and match the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for template_id in SEED_TEMPLATE_IDS {
            let exists: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM form_template WHERE id = ?1)")
                    .bind(template_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((*template_id, exists == 1));
        }

        let chain_levels: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM approver_level WHERE template_id = 'tpl-expense-report'",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("expense-report-chain", chain_levels == 2));

        let survey_levels: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM approver_level WHERE template_id = 'tpl-pulse-survey'",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("pulse-survey-chainless", survey_levels == 0));

        for assignment_id in SEED_ASSIGNMENT_IDS {
            let pending: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM assignment WHERE id = ?1 AND status = 'pending')",
            )
            .bind(assignment_id)
            .fetch_one(pool)
            .await?;
            checks.push((*assignment_id, pending == 1));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove the seeded rows from a test database.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let quoted_assignments = sql_array_from_ids(SEED_ASSIGNMENT_IDS);
        let quoted_templates = sql_array_from_ids(SEED_TEMPLATE_IDS);

        sqlx::query(&format!("DELETE FROM assignment WHERE id IN {quoted_assignments}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "DELETE FROM approver_level WHERE template_id IN {quoted_templates}"
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!("DELETE FROM form_template WHERE id IN {quoted_templates}"))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub template_ids: &'static [&'static str],
    pub assignment_ids: &'static [&'static str],
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
