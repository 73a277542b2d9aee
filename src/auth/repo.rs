use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::{
    password::verify_password,
    repo_types::{Account, NewAccount},
};
use crate::db::classify;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get_by_username(&self, username: &str) -> anyhow::Result<Option<Account>>;
    async fn get_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;
    async fn insert(&self, account: NewAccount) -> anyhow::Result<Account>;

    /// True only for an active account whose stored hash matches `password`.
    async fn validate_credentials(&self, username: &str, password: &str) -> anyhow::Result<bool> {
        match self.get_by_username(username).await? {
            Some(account) if account.is_active => {
                verify_password(password, &account.password_hash)
            }
            _ => Ok(false),
        }
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct PgAccountRepository {
    db: PgPool,
}

impl PgAccountRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    /// Find an account by username.
    async fn get_by_username(&self, username: &str) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("get account by username")?;
        Ok(account)
    }

    /// Find an account by email.
    async fn get_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("get account by email")?;
        Ok(account)
    }

    /// Create a new account with an already hashed password.
    async fn insert(&self, a: NewAccount) -> anyhow::Result<Account> {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts
                (username, email, password_hash, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&a.username)
        .bind(&a.email)
        .bind(&a.password_hash)
        .bind(a.is_active)
        .bind(a.created_at)
        .bind(a.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify(e, "insert account"))?;
        Ok(account)
    }
}
