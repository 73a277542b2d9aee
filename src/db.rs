use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::config::AppConfig;

/// A unique index rejected a write. Carries the violated constraint name.
#[derive(Debug, Error)]
#[error("duplicate key violates unique constraint {constraint}")]
pub struct DuplicateKey {
    pub constraint: String,
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}

/// Lift unique-index violations into [`DuplicateKey`] so services can tell
/// them apart from other storage failures.
pub(crate) fn classify(e: sqlx::Error, what: &'static str) -> anyhow::Error {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return anyhow::Error::new(DuplicateKey { constraint }).context(what);
        }
    }
    anyhow::Error::new(e).context(what)
}

/// Whether an error chain bottoms out in a unique-index violation.
pub(crate) fn is_duplicate_key(e: &anyhow::Error) -> bool {
    e.downcast_ref::<DuplicateKey>().is_some()
}

/// Name of the unique constraint that rejected the write, if any.
pub(crate) fn duplicate_constraint(e: &anyhow::Error) -> Option<&str> {
    e.downcast_ref::<DuplicateKey>().map(|d| d.constraint.as_str())
}
