//! # vault-config
//!
//! Loads application configuration from a Vault-compatible secret store.
//!
//! ## Architecture
//!
//! ```text
//! ClientAuthentication → SessionManager ─┐
//!                                        ├→ PropertySourceComposer → ConfigView
//! build_contexts + backend registry ─────┘
//! ```
//!
//! - **auth**: one strategy per login scheme, each producing a [`auth::VaultToken`]
//! - **session**: caches the token, serializes logins and optionally renews in the background
//! - **resolver**: computes the generic secret contexts for application names and profiles
//! - **backends**: maps enabled backend descriptors to fetch metadata via ordered factories
//! - **composer**: reads every entry and assembles the ordered [`ConfigView`]
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vault_config::{Result, VaultBootstrap, VaultConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let bootstrap = VaultBootstrap::new(VaultConfig::from_env()?)?;
//!     let view = bootstrap.load(&["dev".to_string()]).await?;
//!     println!("{:?}", view.get("datasource.username"));
//!     bootstrap.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod backends;
pub mod bootstrap;
pub mod cli;
pub mod client;
pub mod composer;
pub mod config;
pub mod errors;
pub mod observability;
pub mod resolver;
pub mod session;

pub use bootstrap::VaultBootstrap;
pub use composer::{ConfigView, PropertySource};
pub use config::VaultConfig;
pub use errors::{Error, Result};
pub use resolver::build_contexts;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
