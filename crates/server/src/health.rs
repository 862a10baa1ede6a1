//! Readiness endpoint on its own port, reachable even when the API
//! listener is busy. Reports one entry per dependency check so operators
//! can see which layer degraded.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use formflow_db::DbPool;
use serde::Serialize;
use tracing::{error, info};

const WORKFLOW_TABLES: &[&str] =
    &["form_template", "approver_level", "submission", "approval_event", "assignment"];

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DependencyCheck {
    pub name: &'static str,
    pub healthy: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct ReadinessReport {
    pub status: &'static str,
    pub checks: Vec<DependencyCheck>,
    pub checked_at: DateTime<Utc>,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn spawn(bind_address: &str, port: u16, db_pool: DbPool) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.listening",
        bind_address = %address,
        "health endpoint listening"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(db_pool)).await {
            error!(
                event_name = "system.health.failed",
                error = %error,
                "health endpoint stopped serving"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<ReadinessReport>) {
    let checks = vec![database_check(&state.db_pool).await, schema_check(&state.db_pool).await];
    let ready = checks.iter().all(|check| check.healthy);

    let report = ReadinessReport {
        status: if ready { "ready" } else { "degraded" },
        checks,
        checked_at: Utc::now(),
    };
    let code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(report))
}

async fn database_check(pool: &DbPool) -> DependencyCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => DependencyCheck {
            name: "database",
            healthy: true,
            detail: "reachable".to_string(),
        },
        Err(error) => DependencyCheck {
            name: "database",
            healthy: false,
            detail: error.to_string(),
        },
    }
}

async fn schema_check(pool: &DbPool) -> DependencyCheck {
    let expected = WORKFLOW_TABLES.len() as i64;
    let placeholders = vec!["?"; WORKFLOW_TABLES.len()].join(", ");
    let sql = format!(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ({placeholders})"
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for table in WORKFLOW_TABLES {
        query = query.bind(*table);
    }

    match query.fetch_one(pool).await {
        Ok(found) if found == expected => DependencyCheck {
            name: "schema",
            healthy: true,
            detail: "workflow tables present".to_string(),
        },
        Ok(found) => DependencyCheck {
            name: "schema",
            healthy: false,
            detail: format!("expected {expected} workflow tables, found {found}"),
        },
        Err(error) => DependencyCheck {
            name: "schema",
            healthy: false,
            detail: error.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use formflow_db::{connect_in_memory, migrations};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_is_ready_once_the_schema_is_applied() {
        let pool = connect_in_memory().await.expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let (status, Json(report)) = health(State(HealthState { db_pool: pool.clone() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, "ready");
        assert!(report.checks.iter().all(|check| check.healthy));

        pool.close().await;
    }

    #[tokio::test]
    async fn health_degrades_when_the_schema_is_missing() {
        let pool = connect_in_memory().await.expect("pool should connect");

        let (status, Json(report)) = health(State(HealthState { db_pool: pool.clone() })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, "degraded");
        let database = report.checks.iter().find(|c| c.name == "database").expect("database");
        assert!(database.healthy);
        let schema = report.checks.iter().find(|c| c.name == "schema").expect("schema");
        assert!(!schema.healthy);
        assert!(schema.detail.contains("found 0"));

        pool.close().await;
    }

    #[tokio::test]
    async fn health_degrades_when_the_database_is_unreachable() {
        let pool = connect_in_memory().await.expect("pool should connect");
        pool.close().await;

        let (status, Json(report)) = health(State(HealthState { db_pool: pool })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, "degraded");
        assert!(report.checks.iter().any(|check| !check.healthy));
    }
}
