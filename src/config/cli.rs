use crate::domain::model::{Credentials, REDACTED};
use crate::utils::error::{AuthError, Result};
use crate::utils::validation::{validate_positive_number, Validate};
use clap::Parser;
use std::fmt;

#[derive(Clone, Parser)]
#[command(name = "auth-chain")]
#[command(about = "Run login attempts through a chain of credential checks")]
pub struct CliConfig {
    /// Path to a TOML file describing accounts and chain links; the built-in demo is used if omitted
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long)]
    pub identifier: Option<String>,

    #[arg(long)]
    pub secret: Option<String>,

    /// Repeat the login this many times
    #[arg(long, default_value = "1")]
    pub attempts: usize,

    /// Print the chain layout as JSON and exit
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    pub fn credentials(&self) -> Result<Credentials> {
        let identifier = self
            .identifier
            .clone()
            .ok_or_else(|| AuthError::MissingConfigError {
                field: "--identifier".to_string(),
            })?;
        let secret = self
            .secret
            .clone()
            .ok_or_else(|| AuthError::MissingConfigError {
                field: "--secret".to_string(),
            })?;
        Ok(Credentials::new(identifier, secret))
    }
}

impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("config", &self.config)
            .field("identifier", &self.identifier)
            .field("secret", &self.secret.as_ref().map(|_| REDACTED))
            .field("attempts", &self.attempts)
            .field("dry_run", &self.dry_run)
            .field("verbose", &self.verbose)
            .field("json_logs", &self.json_logs)
            .finish()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("--attempts", self.attempts, 1)?;
        if !self.dry_run {
            self.credentials()?;
        }
        Ok(())
    }
}
