use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::repo::{AccountRepository, PgAccountRepository};
use crate::config::AppConfig;
use crate::db;
use crate::people::repo::{PersonRepository, PgPersonRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub people: Arc<dyn PersonRepository>,
    pub accounts: Arc<dyn AccountRepository>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let pool = db::connect(&config).await?;
        Self::with_pool(config, pool).await
    }

    /// Applies pending migrations, then wires the Postgres repositories.
    /// A failed migration aborts startup.
    pub async fn with_pool(config: Arc<AppConfig>, pool: PgPool) -> anyhow::Result<Self> {
        db::migrate(&pool).await?;
        tracing::info!("database migrations applied");

        Ok(Self::from_parts(
            config,
            Arc::new(PgPersonRepository::new(pool.clone())),
            Arc::new(PgAccountRepository::new(pool)),
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        people: Arc<dyn PersonRepository>,
        accounts: Arc<dyn AccountRepository>,
    ) -> Self {
        Self {
            config,
            people,
            accounts,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(Default::default(), Default::default())
    }

    #[cfg(test)]
    pub fn fake_with(
        people: Arc<crate::testing::MemoryPersonRepository>,
        accounts: Arc<crate::testing::MemoryAccountRepository>,
    ) -> Self {
        Self::from_parts(Arc::new(crate::testing::test_config()), people, accounts)
    }
}
