mod api;
mod bootstrap;
mod health;
mod workflow;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use formflow_core::config::{AppConfig, LoadOptions};
use formflow_core::notify::TracingPublisher;
use formflow_db::repositories::{
    SqlAssignmentRepository, SqlSubmissionRepository, SqlTemplateStore,
};

fn init_logging(config: &AppConfig) {
    use formflow_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
    )
    .await?;

    let service = Arc::new(workflow::WorkflowService::new(
        Arc::new(SqlTemplateStore::new(app.db_pool.clone())),
        Arc::new(SqlSubmissionRepository::new(app.db_pool.clone())),
        Arc::new(SqlAssignmentRepository::new(app.db_pool.clone())),
        Arc::new(TracingPublisher),
    ));

    let address =
        format!("{}:{}", app.config.server.bind_address, app.config.server.api_port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "formflow-server started"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let server = axum::serve(listener, api::router(service))
        .with_graceful_shutdown(wait_for_shutdown());

    tokio::select! {
        result = server => result?,
        () = shutdown_deadline(grace) => {
            tracing::warn!(
                event_name = "system.server.shutdown_deadline",
                correlation_id = "shutdown",
                "graceful shutdown deadline exceeded, aborting open connections"
            );
        }
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "formflow-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}

// Every ctrl_c() future resolves on the same signal, so this runs the
// drain clock in parallel with the server's own shutdown listener.
async fn shutdown_deadline(grace: Duration) {
    let _ = tokio::signal::ctrl_c().await;
    tokio::time::sleep(grace).await;
}
