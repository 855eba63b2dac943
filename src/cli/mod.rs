//! # Command Line Interface
//!
//! `vault-config contexts | resolve | health`.

pub mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::observability::{init_logging, log_config_info, LoggingOptions};
use crate::{VaultBootstrap, VaultConfig};
use output::{render, render_view, OutputFormat};

#[derive(Parser)]
#[command(name = "vault-config")]
#[command(about = "Resolve application configuration from a Vault-compatible secret store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (YAML or JSON); VAULT_* environment variables are used when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Active profiles, comma-separated; defaults to VAULT_PROFILES
    #[arg(short, long, global = true, value_delimiter = ',')]
    pub profiles: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the generic secret contexts, most specific first
    Contexts,

    /// Compose the configuration and print the merged properties
    Resolve {
        /// Print secret values instead of masking them
        #[arg(long)]
        show_values: bool,

        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Query the secret store's health endpoint
    Health {
        #[arg(short, long, value_enum, default_value = "json")]
        output: OutputFormat,
    },
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    init_logging(&LoggingOptions { level: level.to_string(), json: cli.json_logs })?;

    let config = match &cli.config {
        Some(path) => VaultConfig::from_file(path),
        None => VaultConfig::from_env(),
    }
    .context("Failed to load configuration")?;
    log_config_info(&config);

    let profiles = active_profiles(cli.profiles, std::env::var("VAULT_PROFILES").ok());

    match cli.command {
        Commands::Contexts => {
            for context in config.generic.contexts(&profiles) {
                println!("{}", context);
            }
        }
        Commands::Resolve { show_values, output } => {
            let bootstrap = VaultBootstrap::new(config)?;
            let result = bootstrap.load(&profiles).await;
            bootstrap.shutdown().await;

            let view = result.context("Failed to compose configuration")?;
            info!(sources = view.len(), "Resolved configuration");
            print!("{}", render_view(&view, show_values, output)?);
        }
        Commands::Health { output } => {
            let client = crate::client::VaultClient::new(config.client_options())?;
            let health = client.health().await.context("Health check failed")?;
            let format = if output == OutputFormat::Table { OutputFormat::Yaml } else { output };
            println!("{}", render(&health, format)?);
            if health.sealed || !health.initialized {
                anyhow::bail!("secret store is not ready");
            }
        }
    }

    Ok(())
}

/// Profiles from the command line, falling back to a comma-separated list.
fn active_profiles(from_args: Vec<String>, fallback: Option<String>) -> Vec<String> {
    let profiles = if from_args.is_empty() {
        fallback.map(|list| list.split(',').map(str::to_string).collect()).unwrap_or_default()
    } else {
        from_args
    };
    profiles.into_iter().map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}
