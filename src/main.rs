use anyhow::Context;
use auth_chain::utils::error::{AuthError, ErrorSeverity};
use auth_chain::utils::logger::{self, LogFormat};
use auth_chain::utils::validation::Validate;
use auth_chain::{CliConfig, Server, TomlConfig};
use clap::Parser;
use serde::Serialize;

const EXIT_REJECTED: i32 = 4;

#[derive(Serialize)]
struct DryRunReport<'a> {
    server: &'a str,
    accounts: usize,
    chain: auth_chain::core::chain::ChainSummary,
}

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    let log_format = if config.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(log_format, config.verbose);

    tracing::info!("Starting auth-chain CLI");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        fail(&e);
    }

    let server = match load_server(&config) {
        Ok(server) => server,
        Err(e) => fail(&e),
    };

    tracing::info!(
        "🔗 Server '{}' ready with chain: {}",
        server.name(),
        server.chain().names().join(" -> ")
    );

    if config.dry_run {
        let report = DryRunReport {
            server: server.name(),
            accounts: server.accounts().len(),
            chain: server.chain().summary(),
        };
        let json = serde_json::to_string_pretty(&report).context("rendering chain layout")?;
        println!("{}", json);
        return Ok(());
    }

    let credentials = match config.credentials() {
        Ok(credentials) => credentials,
        Err(e) => fail(&e),
    };

    let mut accepted = false;
    for attempt in 1..=config.attempts {
        accepted = server.log_in_with(&credentials);
        let verdict = if accepted { "✅ accepted" } else { "❌ rejected" };
        println!("attempt {}: {}", attempt, verdict);
    }

    if !accepted {
        std::process::exit(EXIT_REJECTED);
    }
    Ok(())
}

fn load_server(config: &CliConfig) -> auth_chain::Result<Server> {
    match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let toml_config = TomlConfig::from_file(path)?;
            toml_config.validate()?;
            toml_config.build_server()
        }
        None => {
            tracing::info!("No --config given, using the built-in demo server");
            Server::demo()
        }
    }
}

fn fail(e: &AuthError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // exit code follows error severity
    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
