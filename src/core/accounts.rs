use crate::domain::model::{Account, Role};
use crate::domain::ports::AccountStore;
use crate::utils::error::{AuthError, Result};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Process-local account registry shared by the server and its links.
#[derive(Debug, Default)]
pub struct InMemoryAccounts {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts<I>(accounts: I) -> Result<Self>
    where
        I: IntoIterator<Item = Account>,
    {
        let store = Self::new();
        for account in accounts {
            store.register(account)?;
        }
        Ok(store)
    }

    pub fn register(&self, account: Account) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if accounts.contains_key(&account.identifier) {
            return Err(AuthError::DuplicateAccount {
                identifier: account.identifier,
            });
        }

        tracing::debug!(identifier = %account.identifier, role = %account.role, "registered account");
        accounts.insert(account.identifier.clone(), account);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AccountStore for InMemoryAccounts {
    fn contains(&self, identifier: &str) -> bool {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(identifier)
    }

    fn verify(&self, identifier: &str, secret: &str) -> bool {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
            .is_some_and(|account| account.secret == secret)
    }

    fn role_of(&self, identifier: &str) -> Option<Role> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
            .map(|account| account.role)
    }
}
