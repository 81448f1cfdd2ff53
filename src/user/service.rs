use std::sync::Arc;
use std::time::Duration;

use crate::crypto::{CryptoError, PasswordManager};
use crate::database::{StoreError, bounded};
use crate::user::{
    Account, AccountStore, EMAIL_CONSTRAINT, NAME_CONSTRAINT, NewAccount,
    ValidationError, validate,
};

/// Ways an account registration can fail.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("email is already in use")]
    EmailTaken,
    #[error("username is already in use")]
    NameTaken,
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Hash(#[from] CryptoError),
}

impl From<StoreError> for RegistrationError {
    /// Uniqueness violations caught by the store are conflicts, not
    /// failures.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { ref constraint }
                if constraint == EMAIL_CONSTRAINT =>
            {
                Self::EmailTaken
            },
            StoreError::Duplicate { ref constraint }
                if constraint == NAME_CONSTRAINT =>
            {
                Self::NameTaken
            },
            err => Self::Store(err),
        }
    }
}

/// Account creation workflow.
#[derive(Clone)]
pub struct Registrar {
    store: Arc<dyn AccountStore>,
    pwd: Arc<PasswordManager>,
    timeout: Duration,
}

impl Registrar {
    /// Create a new [`Registrar`].
    pub fn new(
        store: Arc<dyn AccountStore>,
        pwd: Arc<PasswordManager>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            pwd,
            timeout,
        }
    }

    /// Validate, reject duplicates, hash the password then persist the
    /// account.
    pub async fn register(
        &self,
        email: Option<&str>,
        password: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<Account, RegistrationError> {
        validate(email, password, display_name)?;
        let (email, password, display_name) = (
            email.unwrap_or_default(),
            password.unwrap_or_default(),
            display_name.unwrap_or_default(),
        );

        let existing = bounded(
            self.timeout,
            self.store.find_by_name_or_email(display_name, email),
        )
        .await?;

        if let Some(existing) = existing {
            if existing.email == email.to_lowercase() {
                return Err(RegistrationError::EmailTaken);
            }
            if existing.display_name == display_name {
                return Err(RegistrationError::NameTaken);
            }
        }

        let credential_hash = self.pwd.hash(password).await?;

        let insert = bounded(
            self.timeout,
            self.store.insert(NewAccount {
                email: email.to_owned(),
                credential_hash: credential_hash.clone(),
                display_name: display_name.to_owned(),
            }),
        )
        .await;

        let account = match insert {
            Err(StoreError::Timeout(limit)) => self
                .committed(email, display_name, &credential_hash)
                .await
                .ok_or(StoreError::Timeout(limit))?,
            insert => insert?,
        };

        tracing::info!(account_id = %account.id, "account created");
        metrics::counter!("accounts_created_total").increment(1);

        Ok(account)
    }

    /// Look for the account a timed out write may still have committed. The
    /// salted hash only matches the write made by this call.
    async fn committed(
        &self,
        email: &str,
        display_name: &str,
        credential_hash: &str,
    ) -> Option<Account> {
        let found = bounded(
            self.timeout,
            self.store.find_by_name_or_email(display_name, email),
        )
        .await;

        match found {
            Ok(account) => {
                account.filter(|account| account.credential_hash == credential_hash)
            },
            Err(err) => {
                tracing::warn!(error = %err, "cannot check a timed out account write");
                None
            },
        }
    }
}
