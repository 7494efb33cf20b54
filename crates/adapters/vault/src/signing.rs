//! Transit-backed signing handle

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use keyloader_errors::AppResult;
use keyloader_ports::SigningHandle;
use tracing::debug;
use vaultrs::api::transit::requests::{SignDataRequest, VerifySignedDataRequest};
use vaultrs::client::VaultClient as VaultRsClient;
use vaultrs::transit;

use crate::error::map_vault_error;

/// Signs and verifies through the transit engine; the private key stays in Vault
pub struct TransitSigningHandle {
    client: Arc<VaultRsClient>,
    mount: String,
    name: String,
    version: Option<u64>,
    key_id: String,
}

impl TransitSigningHandle {
    pub(crate) fn new(
        client: Arc<VaultRsClient>,
        mount: String,
        name: String,
        version: Option<u64>,
        key_id: String,
    ) -> Self {
        Self {
            client,
            mount,
            name,
            version,
            key_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pinned key version, `None` signs with the latest version
    pub fn version(&self) -> Option<u64> {
        self.version
    }
}

impl fmt::Debug for TransitSigningHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitSigningHandle")
            .field("mount", &self.mount)
            .field("name", &self.name)
            .field("version", &self.version)
            .field("key_id", &self.key_id)
            .finish()
    }
}

#[async_trait]
impl SigningHandle for TransitSigningHandle {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn sign(&self, data: &[u8]) -> AppResult<String> {
        let input = STANDARD.encode(data);
        let mut opts = SignDataRequest::builder();
        if let Some(version) = self.version {
            opts.key_version(version);
        }

        let response = transit::data::sign(
            self.client.as_ref(),
            &self.mount,
            &self.name,
            &input,
            Some(&mut opts),
        )
        .await
        .map_err(|e| map_vault_error(e, &format!("Failed to sign with key: {}", self.name)))?;

        debug!(key = %self.name, "Signed payload with transit key");
        Ok(response.signature)
    }

    async fn verify(&self, data: &[u8], signature: &str) -> AppResult<bool> {
        let input = STANDARD.encode(data);
        let mut opts = VerifySignedDataRequest::builder();
        opts.signature(signature);

        let response = transit::data::verify(
            self.client.as_ref(),
            &self.mount,
            &self.name,
            &input,
            Some(&mut opts),
        )
        .await
        .map_err(|e| {
            map_vault_error(e, &format!("Failed to verify signature with key: {}", self.name))
        })?;

        Ok(response.valid)
    }
}
