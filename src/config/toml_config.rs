use crate::core::accounts::InMemoryAccounts;
use crate::core::chain::ChainBuilder;
use crate::core::middlewares::{
    KnownAccount, MinSecretLength, NonEmptyIdentifier, RoleCheck, SecretMatches, Throttling,
};
use crate::core::server::Server;
use crate::domain::model::{Account, Role, REDACTED};
use crate::domain::ports::{AccountStore, Middleware};
use crate::utils::error::{AuthError, Result};
use crate::utils::validation::{
    validate_non_empty_list, validate_non_empty_string, validate_positive_number, validate_range,
    validate_unique, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const MAX_WINDOW_SECONDS: u64 = 86_400;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub chain: Vec<LinkConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    /// Reject the chain if a link kind is listed twice.
    pub unique_links: Option<bool>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub identifier: String,
    pub secret: String,
    pub role: String,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("identifier", &self.identifier)
            .field("secret", &REDACTED)
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkConfig {
    NonEmptyIdentifier,
    MinSecretLength {
        min_length: usize,
    },
    KnownAccount,
    SecretMatches,
    Throttling {
        requests_per_minute: usize,
        window_seconds: Option<u64>,
        #[serde(default)]
        role_limits: HashMap<String, usize>,
    },
    RoleCheck {
        allowed: Vec<String>,
    },
}

impl LinkConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            LinkConfig::NonEmptyIdentifier => "non_empty_identifier",
            LinkConfig::MinSecretLength { .. } => "min_secret_length",
            LinkConfig::KnownAccount => "known_account",
            LinkConfig::SecretMatches => "secret_matches",
            LinkConfig::Throttling { .. } => "throttling",
            LinkConfig::RoleCheck { .. } => "role_check",
        }
    }

    fn validate_at(&self, index: usize) -> Result<()> {
        match self {
            LinkConfig::MinSecretLength { min_length } => {
                validate_positive_number(&format!("chain[{}].min_length", index), *min_length, 1)
            }
            LinkConfig::Throttling {
                requests_per_minute,
                window_seconds,
                role_limits,
            } => {
                validate_positive_number(
                    &format!("chain[{}].requests_per_minute", index),
                    *requests_per_minute,
                    1,
                )?;
                if let Some(seconds) = window_seconds {
                    validate_range(
                        &format!("chain[{}].window_seconds", index),
                        *seconds,
                        1,
                        MAX_WINDOW_SECONDS,
                    )?;
                }
                let mut parsed_roles = Vec::with_capacity(role_limits.len());
                for (role, limit) in role_limits {
                    parsed_roles.push(role.parse::<Role>()?);
                    validate_positive_number(
                        &format!("chain[{}].role_limits.{}", index, role),
                        *limit,
                        1,
                    )?;
                }
                // `admin` and `Admin` name the same role
                validate_unique(
                    &format!("chain[{}].role_limits", index),
                    parsed_roles.iter().map(Role::as_str),
                )
            }
            LinkConfig::RoleCheck { allowed } => {
                validate_non_empty_list(&format!("chain[{}].allowed", index), allowed)?;
                for role in allowed {
                    role.parse::<Role>()?;
                }
                Ok(())
            }
            LinkConfig::NonEmptyIdentifier
            | LinkConfig::KnownAccount
            | LinkConfig::SecretMatches => Ok(()),
        }
    }

    /// Instantiates the configured link against `store`.
    pub fn build(&self, store: &Arc<dyn AccountStore>) -> Result<Box<dyn Middleware>> {
        let link: Box<dyn Middleware> = match self {
            LinkConfig::NonEmptyIdentifier => Box::new(NonEmptyIdentifier),
            LinkConfig::MinSecretLength { min_length } => Box::new(MinSecretLength::new(*min_length)),
            LinkConfig::KnownAccount => Box::new(KnownAccount::new(store.clone())),
            LinkConfig::SecretMatches => Box::new(SecretMatches::new(store.clone())),
            LinkConfig::Throttling {
                requests_per_minute,
                window_seconds,
                role_limits,
            } => {
                let mut throttling = Throttling::new(store.clone(), *requests_per_minute);
                if let Some(seconds) = window_seconds {
                    throttling = throttling.with_window(Duration::from_secs(*seconds));
                }
                let mut limits = HashMap::with_capacity(role_limits.len());
                for (role, limit) in role_limits {
                    let parsed: Role = role.parse()?;
                    if limits.insert(parsed, *limit).is_some() {
                        return Err(AuthError::InvalidConfigValueError {
                            field: "role_limits".to_string(),
                            value: parsed.as_str().to_string(),
                            reason: "Role is listed more than once".to_string(),
                        });
                    }
                }
                for (role, limit) in limits {
                    throttling = throttling.with_role_limit(role, limit);
                }
                Box::new(throttling)
            }
            LinkConfig::RoleCheck { allowed } => {
                let roles = allowed
                    .iter()
                    .map(|role| role.parse::<Role>())
                    .collect::<Result<Vec<_>>>()?;
                Box::new(RoleCheck::new(store.clone(), roles))
            }
        };
        Ok(link)
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Expands `${VAR}` from the environment; unset variables stay verbatim.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AuthError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("server.name", &self.server.name)?;

        for (index, account) in self.accounts.iter().enumerate() {
            validate_non_empty_string(
                &format!("accounts[{}].identifier", index),
                &account.identifier,
            )?;
            account.role.parse::<Role>()?;
        }
        validate_unique(
            "accounts.identifier",
            self.accounts.iter().map(|a| a.identifier.as_str()),
        )?;

        validate_non_empty_list("chain", &self.chain)?;
        for (index, link) in self.chain.iter().enumerate() {
            link.validate_at(index)?;
        }

        if self.unique_links() {
            validate_unique("chain.kind", self.chain.iter().map(LinkConfig::kind))?;
        }

        Ok(())
    }

    pub fn unique_links(&self) -> bool {
        self.server.unique_links.unwrap_or(false)
    }

    pub fn accounts(&self) -> Result<Vec<Account>> {
        self.accounts
            .iter()
            .map(|a| -> Result<Account> {
                Ok(Account::new(&a.identifier, &a.secret, a.role.parse()?))
            })
            .collect()
    }

    /// Registers the configured accounts and wires the chain in file order.
    pub fn build_server(&self) -> Result<Server> {
        let accounts = Arc::new(InMemoryAccounts::with_accounts(self.accounts()?)?);
        let store: Arc<dyn AccountStore> = accounts.clone();

        let links = self
            .chain
            .iter()
            .map(|link| link.build(&store))
            .collect::<Result<Vec<_>>>()?;

        let builder = ChainBuilder::from_links(links)?;
        let chain = if self.unique_links() {
            builder.build_unique()?
        } else {
            builder.build()
        };

        tracing::debug!(server = %self.server.name, links = chain.len(), "built chain from config");
        Ok(Server::new(self.server.name.clone(), accounts, chain))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
