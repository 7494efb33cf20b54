//! keyloader-adapter-vault - HashiCorp Vault adapter
//!
//! Serves the loader ports from a Vault server:
//! - AppRole authentication
//! - KV v2 secrets, tags taken from custom metadata
//! - Transit keys exposed as remote signing handles
//! - Health checking
//! - Automatic error mapping to AppError

pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod signing;

pub use client::VaultClient;
pub use config::{VaultConfig, VaultConfigBuilder};
pub use health::{VaultHealthStatus, check_vault_health};
pub use signing::TransitSigningHandle;
