//! In-memory [`AccountStore`] enforcing the same uniqueness rules as
//! PostgreSQL.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::database::{Result, StoreError};
use crate::user::{
    Account, AccountStore, EMAIL_CONSTRAINT, NAME_CONSTRAINT, NewAccount,
};

#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<Vec<Account>>,
    /// Lookups report nothing, as if a concurrent writer won the race.
    blind_lookups: AtomicBool,
    /// Delay applied to every call.
    latency: Mutex<Option<Duration>>,
    /// Delay between a committed write and its answer.
    ack_latency: Mutex<Option<Duration>>,
    lookups: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryAccountStore {
    pub fn blind_lookups(self) -> Self {
        self.blind_lookups.store(true, Ordering::SeqCst);
        self
    }

    pub fn latency(self, latency: Duration) -> Self {
        *self.latency.lock().unwrap() = Some(latency);
        self
    }

    pub fn ack_latency(self, latency: Duration) -> Self {
        *self.ack_latency.lock().unwrap() = Some(latency);
        self
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn commit(&self, account: NewAccount) -> Result<Account> {
        let email = account.email.to_lowercase();
        let mut accounts = self.accounts.lock().unwrap();

        let constraint = if accounts.iter().any(|a| a.email == email) {
            Some(EMAIL_CONSTRAINT)
        } else if accounts
            .iter()
            .any(|a| a.display_name == account.display_name)
        {
            Some(NAME_CONSTRAINT)
        } else {
            None
        };
        if let Some(constraint) = constraint {
            return Err(StoreError::Duplicate {
                constraint: constraint.to_owned(),
            });
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email,
            credential_hash: account.credential_hash,
            display_name: account.display_name,
            created_at: now,
            updated_at: now,
        };
        accounts.push(account.clone());

        Ok(account)
    }

    async fn wait(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_name_or_email(
        &self,
        display_name: &str,
        email: &str,
    ) -> Result<Option<Account>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.wait().await;

        if self.blind_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let email = email.to_lowercase();
        let accounts = self.accounts.lock().unwrap();
        let found = accounts
            .iter()
            .find(|a| a.email == email)
            .or_else(|| accounts.iter().find(|a| a.display_name == display_name))
            .cloned();

        Ok(found)
    }

    async fn insert(&self, account: NewAccount) -> Result<Account> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.wait().await;

        let account = self.commit(account)?;

        let ack_latency = *self.ack_latency.lock().unwrap();
        if let Some(latency) = ack_latency {
            tokio::time::sleep(latency).await;
        }

        Ok(account)
    }
}
