use anyhow::Context;
use sqlx::{
    error::ErrorKind, migrate::MigrateDatabase, postgres::PgPoolOptions, PgPool, Postgres,
};
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::info;

/// Errors surfaced by the repositories.
///
/// Constraint violations are classified from the Postgres error kind and the
/// constraint name, so handlers can map them to domain messages.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated on `{field}`")]
    UniqueViolation { field: String },
    #[error("foreign key constraint violated on `{field}`")]
    ForeignKeyViolation { field: String },
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let classified = match &err {
            sqlx::Error::Database(db_err) => {
                let field = db_err
                    .constraint()
                    .map(constraint_field)
                    .unwrap_or_else(|| "unknown".into());
                match db_err.kind() {
                    ErrorKind::UniqueViolation => Some(StoreError::UniqueViolation { field }),
                    ErrorKind::ForeignKeyViolation => {
                        Some(StoreError::ForeignKeyViolation { field })
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        classified.unwrap_or(StoreError::Database(err))
    }
}

/// Maps a Postgres default constraint name to the column it guards:
/// `users_email_key` -> `email`, `flows_user_id_fkey` -> `user_id`,
/// `flows_pkey` -> `id`.
pub fn constraint_field(constraint: &str) -> String {
    if constraint.ends_with("_pkey") {
        return "id".into();
    }
    let stem = ["_fkey", "_key"]
        .iter()
        .find_map(|suffix| constraint.strip_suffix(suffix))
        .unwrap_or(constraint);
    match stem.split_once('_') {
        Some((table, column)) if matches!(table, "users" | "flows") => column.to_string(),
        _ => stem.to_string(),
    }
}

/// Current UTC time in the zone-less form the tables store.
pub fn utc_now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Creates the database named in `database_url` when the server lacks it.
/// Returns whether it was created.
pub async fn ensure_database(database_url: &str) -> anyhow::Result<bool> {
    if Postgres::database_exists(database_url)
        .await
        .context("check database exists")?
    {
        return Ok(false);
    }
    info!("database missing; creating it");
    Postgres::create_database(database_url)
        .await
        .context("create database")?;
    Ok(true)
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}
