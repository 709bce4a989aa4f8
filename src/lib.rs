pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use crate::core::{
    accounts::InMemoryAccounts,
    chain::{Chain, ChainBuilder, Link, PredicateLink},
    server::Server,
};
pub use domain::model::{Account, Credentials, Role};
pub use domain::ports::{AccountStore, Middleware};
pub use utils::error::{AuthError, Result};
