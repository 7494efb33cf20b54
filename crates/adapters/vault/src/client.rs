//! Vault client implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use keyloader_errors::{AppError, AppResult};
use keyloader_ports::{
    ItemFetcher, ItemKind, ItemMetadata, ListingEntry, PageStream, PagedListingSource,
    SigningHandle,
};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};
use vaultrs::client::{VaultClient as VaultRsClient, VaultClientSettingsBuilder};
use vaultrs::{kv2, transit};
use vaultrs_login::LoginClient;
use vaultrs_login::engines::approle::AppRoleLogin;

use crate::config::VaultConfig;
use crate::error::map_vault_error;
use crate::signing::TransitSigningHandle;

/// Concurrent metadata reads within one listing page
const METADATA_READS: usize = 4;

/// Vault client serving KV v2 secrets and transit keys
pub struct VaultClient {
    client: Arc<VaultRsClient>,
    config: VaultConfig,
}

impl VaultClient {
    /// Create a new Vault client with AppRole authentication
    pub async fn new(config: VaultConfig) -> AppResult<Self> {
        info!("Connecting to Vault at {}", config.endpoint);

        let settings = VaultClientSettingsBuilder::default()
            .address(&config.endpoint)
            .build()
            .map_err(|e| map_vault_error(e, "Failed to build Vault client settings"))?;

        let mut client = VaultRsClient::new(settings)
            .map_err(|e| map_vault_error(e, "Failed to create Vault client"))?;

        info!(mount = %config.approle_mount, "Authenticating with AppRole");
        let login = AppRoleLogin::new(&config.role_id, config.secret_id.expose_secret());
        client
            .login(&config.approle_mount, &login)
            .await
            .map_err(|e| map_vault_error(e, "AppRole authentication failed"))?;

        info!("Successfully authenticated with Vault");

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Read all fields of a KV secret
    pub async fn get_secret(&self, path: &str) -> AppResult<HashMap<String, String>> {
        debug!("Reading secret from path: {}", path);

        let secret: HashMap<String, String> =
            kv2::read(self.client.as_ref(), &self.config.kv_mount, path)
                .await
                .map_err(|e| {
                    map_vault_error(e, &format!("Failed to read secret at path: {}", path))
                })?;

        debug!("Successfully read secret from path: {}", path);
        Ok(secret)
    }

    /// Read a specific field from a KV secret
    pub async fn get_secret_field(&self, path: &str, field: &str) -> AppResult<String> {
        let secret = self.get_secret(path).await?;
        secret.get(field).cloned().ok_or_else(|| {
            AppError::not_found(format!(
                "Field '{}' not found in secret at path: {}",
                field, path
            ))
        })
    }

    /// Check if Vault is accessible
    pub async fn health_check(&self) -> AppResult<()> {
        // An empty folder answers 404, which still proves connectivity
        match kv2::list(
            self.client.as_ref(),
            &self.config.kv_mount,
            &self.config.kv_prefix,
        )
        .await
        {
            Ok(_) => Ok(()),
            Err(e) => match map_vault_error(e, "Vault health probe failed") {
                AppError::NotFound(_) => Ok(()),
                other => Err(other),
            },
        }
    }

    async fn list_secret_pages(&self) -> AppResult<PageStream> {
        let entries = match kv2::list(
            self.client.as_ref(),
            &self.config.kv_mount,
            &self.config.kv_prefix,
        )
        .await
        {
            Ok(entries) => entries,
            Err(e) => match map_vault_error(e, "Failed to list secrets") {
                AppError::NotFound(_) => Vec::new(),
                other => return Err(other),
            },
        };

        // Sub-folders end with '/' and are not traversed
        let paths: Vec<String> = entries
            .iter()
            .filter(|entry| !entry.ends_with('/'))
            .map(|entry| self.config.secret_path(entry))
            .collect();

        debug!(
            mount = %self.config.kv_mount,
            prefix = %self.config.kv_prefix,
            secrets = paths.len(),
            "Listed KV secrets"
        );

        let pages: Vec<Vec<String>> = paths
            .chunks(self.config.effective_page_size())
            .map(<[String]>::to_vec)
            .collect();
        let client = Arc::clone(&self.client);
        let mount = self.config.kv_mount.clone();

        Ok(stream::iter(pages)
            .then(move |page| {
                let client = Arc::clone(&client);
                let mount = mount.clone();
                async move {
                    let entries = read_metadata_page(&client, &mount, page).await;
                    Ok::<_, AppError>(entries)
                }
            })
            .boxed())
    }

    async fn list_key_pages(&self) -> AppResult<PageStream> {
        let names = match transit::key::list(self.client.as_ref(), &self.config.transit_mount).await
        {
            Ok(response) => response.keys,
            Err(e) => match map_vault_error(e, "Failed to list transit keys") {
                AppError::NotFound(_) => Vec::new(),
                other => return Err(other),
            },
        };

        debug!(
            mount = %self.config.transit_mount,
            keys = names.len(),
            "Listed transit keys"
        );

        // Transit keys carry no tags and are always used at their latest version
        let pages: Vec<AppResult<Vec<ListingEntry>>> = names
            .chunks(self.config.effective_page_size())
            .map(|chunk| {
                Ok(chunk
                    .iter()
                    .map(|name| ListingEntry::Item(ItemMetadata::new(name)))
                    .collect())
            })
            .collect();

        Ok(stream::iter(pages).boxed())
    }
}

/// Read the metadata of one page of KV entries.
///
/// Entries deleted between the list call and the metadata read are skipped.
/// Any other read failure stays in the page as [`ListingEntry::Unreadable`].
async fn read_metadata_page(
    client: &VaultRsClient,
    mount: &str,
    paths: Vec<String>,
) -> Vec<ListingEntry> {
    let entries: Vec<Option<ListingEntry>> = stream::iter(paths)
        .map(|path| read_metadata_entry(client, mount, path))
        .buffered(METADATA_READS)
        .collect()
        .await;

    entries.into_iter().flatten().collect()
}

async fn read_metadata_entry(
    client: &VaultRsClient,
    mount: &str,
    path: String,
) -> Option<ListingEntry> {
    match kv2::read_metadata(client, mount, &path).await {
        Ok(metadata) => Some(ListingEntry::Item(ItemMetadata {
            name: path,
            tags: metadata.custom_metadata,
            version: Some(metadata.current_version.to_string()),
        })),
        Err(e) => match map_vault_error(e, &format!("Failed to read metadata at path: {}", path)) {
            AppError::NotFound(_) => {
                debug!(path = %path, "Secret disappeared before its metadata was read");
                None
            }
            other => {
                warn!(path = %path, error = %other, "Secret metadata unreadable");
                Some(ListingEntry::unreadable(path, other))
            }
        },
    }
}

#[async_trait]
impl PagedListingSource for VaultClient {
    async fn list_items(&self, kind: ItemKind) -> AppResult<PageStream> {
        match kind {
            ItemKind::Secret => self.list_secret_pages().await,
            ItemKind::Key => self.list_key_pages().await,
        }
    }
}

#[async_trait]
impl ItemFetcher for VaultClient {
    async fn fetch_secret_value(&self, name: &str) -> AppResult<String> {
        self.get_secret_field(name, &self.config.value_field).await
    }

    async fn fetch_key_handle(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> AppResult<Arc<dyn SigningHandle>> {
        let version = version
            .map(|v| {
                v.parse::<u64>().map_err(|_| {
                    AppError::validation(format!("Invalid transit key version '{}' for {}", v, name))
                })
            })
            .transpose()?;

        transit::key::read(self.client.as_ref(), &self.config.transit_mount, name)
            .await
            .map_err(|e| map_vault_error(e, &format!("Failed to read transit key: {}", name)))?;

        let key_id = format!(
            "{}/v1/{}/keys/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.transit_mount,
            name
        );
        debug!(key_id = %key_id, "Bound signing handle to transit key");

        Ok(Arc::new(TransitSigningHandle::new(
            Arc::clone(&self.client),
            self.config.transit_mount.clone(),
            name.to_string(),
            version,
            key_id,
        )))
    }
}
