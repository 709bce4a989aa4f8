use crate::core::accounts::InMemoryAccounts;
use crate::core::chain::{Chain, ChainBuilder};
use crate::core::middlewares::{KnownAccount, RoleCheck, SecretMatches, Throttling};
use crate::domain::model::{Account, Credentials, Role};
use crate::domain::ports::AccountStore;
use crate::utils::error::Result;
use std::sync::Arc;

pub const DEMO_ADMIN: (&str, &str) = ("admin@example.com", "admin_pass");
pub const DEMO_USER: (&str, &str) = ("user@example.com", "user_pass");

/// Login front door: an account registry plus the chain every attempt runs.
pub struct Server {
    name: String,
    accounts: Arc<InMemoryAccounts>,
    chain: Chain,
}

impl Server {
    pub fn new(name: impl Into<String>, accounts: Arc<InMemoryAccounts>, chain: Chain) -> Self {
        Self {
            name: name.into(),
            accounts,
            chain,
        }
    }

    /// Two accounts and the throttling -> known -> password -> role chain.
    pub fn demo() -> Result<Self> {
        let accounts = Arc::new(InMemoryAccounts::with_accounts([
            Account::new(DEMO_ADMIN.0, DEMO_ADMIN.1, Role::Admin),
            Account::new(DEMO_USER.0, DEMO_USER.1, Role::User),
        ])?);
        let store: Arc<dyn AccountStore> = accounts.clone();

        let chain = ChainBuilder::new(Throttling::new(store.clone(), 2))
            .link_with(KnownAccount::new(store.clone()))
            .link_with(SecretMatches::new(store.clone()))
            .link_with(RoleCheck::new(store, vec![Role::Admin, Role::User]))
            .build();

        Ok(Self::new("demo", accounts, chain))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn accounts(&self) -> &InMemoryAccounts {
        &self.accounts
    }

    pub fn register(&self, identifier: &str, secret: &str, role: Role) -> Result<()> {
        self.accounts.register(Account::new(identifier, secret, role))
    }

    pub fn has_account(&self, identifier: &str) -> bool {
        self.accounts.contains(identifier)
    }

    pub fn log_in(&self, identifier: &str, secret: &str) -> bool {
        tracing::debug!(server = %self.name, identifier, "login attempt");
        if self.chain.check(identifier, secret) {
            tracing::info!(identifier, "Authorization have been successful!");
            return true;
        }
        tracing::info!(identifier, "Authorization rejected");
        false
    }

    pub fn log_in_with(&self, credentials: &Credentials) -> bool {
        self.log_in(&credentials.identifier, &credentials.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_admin_and_user_log_in() {
        let server = Server::demo().unwrap();
        assert!(server.log_in(DEMO_ADMIN.0, DEMO_ADMIN.1));
        assert!(server.log_in(DEMO_USER.0, DEMO_USER.1));
        assert_eq!(
            server.chain().names(),
            vec!["throttling", "known_account", "secret_matches", "role_check"]
        );
    }

    #[test]
    fn test_demo_rejects_unknown_and_wrong_password() {
        let server = Server::demo().unwrap();
        assert!(!server.log_in("ghost@example.com", "whatever"));
        assert!(!server.log_in(DEMO_USER.0, "nope"));
    }

    #[test]
    fn test_demo_throttles_third_attempt() {
        let server = Server::demo().unwrap();
        assert!(!server.log_in(DEMO_USER.0, "wrong"));
        assert!(!server.log_in(DEMO_USER.0, "wrong again"));
        // correct password, but the limit of two per minute is spent
        assert!(!server.log_in(DEMO_USER.0, DEMO_USER.1));
    }

    #[test]
    fn test_registered_account_is_visible_to_chain() {
        let server = Server::demo().unwrap();
        assert!(!server.has_account("carol@example.com"));
        server
            .register("carol@example.com", "carol_pass", Role::User)
            .unwrap();
        assert!(server.has_account("carol@example.com"));
        assert!(server.log_in("carol@example.com", "carol_pass"));
        assert!(server.register("carol@example.com", "x", Role::User).is_err());
    }
}
