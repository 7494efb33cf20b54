//! keyloader - 从 Vault 批量加载签名密钥

use std::sync::Arc;

use anyhow::{Context, bail};
use keyloader_adapter_vault::{VaultClient, check_vault_health};
use keyloader_bootstrap::{KeyRegistry, RuntimeConfig, init_runtime};
use keyloader_bulk::BulkLoader;
use keyloader_config::AppConfig;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let runtime = RuntimeConfig::from_env();
    let config = AppConfig::load(&runtime.config_dir)
        .with_context(|| format!("Failed to load config from {}", runtime.config_dir))?;

    let metrics = init_runtime(&config)?;

    let client = VaultClient::new(config.vault.clone()).await?;
    let health = check_vault_health(&client).await;
    if !health.is_healthy() {
        error!(error = ?health.error, "Vault is not accessible");
        bail!("Vault health check failed: {}", health.error.unwrap_or_default());
    }
    info!(response_time_ms = health.response_time_ms, "Vault is accessible");

    let loader = BulkLoader::new(Arc::new(client), config.loader.clone());
    let registry = KeyRegistry::populate(&loader, &config.selection).await;

    info!(
        private_keys = registry.entries().len(),
        signing_keys = registry.keys().len(),
        errors = registry.error_count(),
        "Key registry populated"
    );
    for entry in registry.entries() {
        debug!(source = %entry.source(), fingerprint = %entry.fingerprint(), "Registered private key");
    }
    for key in registry.keys() {
        debug!(key_id = %key.key_id(), "Registered signing key");
    }

    if let Some(handle) = metrics {
        debug!(metrics = %handle.render(), "Load metrics");
    }

    if registry.error_count() > 0 {
        warn!(errors = registry.error_count(), "Some vault items failed to load");
        if config.selection.fail_on_error {
            bail!("{} vault item(s) failed to load", registry.error_count());
        }
    }

    Ok(())
}
