//! Handle account persistence.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::database::Result;
use crate::user::{Account, NewAccount};

/// Store capability needed by account registration.
///
/// Implementations normalize `email` to lowercase both when looking up and
/// when writing, and must reject a write colliding with an existing email or
/// display name with [`StoreError::Duplicate`](crate::database::StoreError)
/// carrying [`EMAIL_CONSTRAINT`](crate::user::EMAIL_CONSTRAINT) or
/// [`NAME_CONSTRAINT`](crate::user::NAME_CONSTRAINT).
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find one account whose display name or email matches. An email match
    /// is returned first when both exist.
    async fn find_by_name_or_email(
        &self,
        display_name: &str,
        email: &str,
    ) -> Result<Option<Account>>;

    /// Insert [`NewAccount`] and return the stored [`Account`].
    async fn insert(&self, account: NewAccount) -> Result<Account>;
}

#[derive(Clone)]
pub struct PgAccountStore {
    pool: Pool<Postgres>,
}

impl PgAccountStore {
    /// Create a new [`PgAccountStore`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_name_or_email(
        &self,
        display_name: &str,
        email: &str,
    ) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"SELECT id, email, credential_hash, display_name, created_at, updated_at
                FROM accounts
                WHERE display_name = $1 OR email = $2
                ORDER BY (email = $2) DESC
                LIMIT 1"#,
        )
        .bind(display_name)
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn insert(&self, account: NewAccount) -> Result<Account> {
        let account = sqlx::query_as::<_, Account>(
            r#"INSERT INTO accounts (email, credential_hash, display_name)
                VALUES ($1, $2, $3)
                RETURNING id, email, credential_hash, display_name, created_at, updated_at"#,
        )
        .bind(account.email.to_lowercase())
        .bind(account.credential_hash)
        .bind(account.display_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }
}
