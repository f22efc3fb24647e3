use std::net::SocketAddr;

use anyhow::Context;

mod app;
mod auth;
mod config;
mod db;
mod flows;
mod mail;
mod rpc;
mod state;
#[cfg(test)]
mod test_helpers;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "nodepath=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("parse APP_HOST/APP_PORT")?;
    tracing::info!(
        email_verification = ?config.email_verification,
        smtp = config.smtp.is_some(),
        "configuration loaded"
    );

    db::ensure_database(&config.database_url).await?;
    let pool = db::connect(&config.database_url).await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
    }

    let state = AppState::postgres(config, pool.clone())?;
    let result = app::serve(app::build_app(state), addr).await;

    pool.close().await;
    tracing::info!("database pool closed");
    result
}
