mod repository;
mod service;
mod validation;

#[cfg(test)]
pub(crate) mod memory;

pub use repository::*;
pub use service::*;
pub use validation::*;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Name of the uniqueness constraint on `accounts.email`.
pub const EMAIL_CONSTRAINT: &str = "accounts_email_key";
/// Name of the uniqueness constraint on `accounts.display_name`.
pub const NAME_CONSTRAINT: &str = "accounts_display_name_key";

/// Account as saved on database.
#[derive(Clone, PartialEq, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub credential_hash: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("credential_hash", &"[redacted]")
            .field("display_name", &self.display_name)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Account about to be written. The store assigns `id` and timestamps.
#[derive(Clone, PartialEq)]
pub struct NewAccount {
    pub email: String,
    pub credential_hash: String,
    pub display_name: String,
}

/// Projection of an [`Account`] safe to hand to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicAccount {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<Account> for PublicAccount {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            name: account.display_name,
        }
    }
}
