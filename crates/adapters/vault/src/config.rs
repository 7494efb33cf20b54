//! Vault configuration

use secrecy::Secret;
use serde::Deserialize;

/// Vault client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// Vault server endpoint
    pub endpoint: String,

    /// AppRole role ID for authentication
    #[serde(default)]
    pub role_id: String,

    /// AppRole secret ID for authentication
    #[serde(default = "empty_secret")]
    pub secret_id: Secret<String>,

    /// Mount path of the AppRole auth method
    #[serde(default = "default_approle_mount")]
    pub approle_mount: String,

    /// KV v2 secrets engine mount path
    #[serde(default = "default_kv_mount")]
    pub kv_mount: String,

    /// Folder inside the KV mount that holds the secrets to load
    #[serde(default)]
    pub kv_prefix: String,

    /// Field of a KV secret that carries the value
    #[serde(default = "default_value_field")]
    pub value_field: String,

    /// Transit secrets engine mount path
    #[serde(default = "default_transit_mount")]
    pub transit_mount: String,

    /// Number of entries per listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn default_approle_mount() -> String {
    "approle".to_string()
}

fn default_kv_mount() -> String {
    "secret".to_string()
}

fn default_value_field() -> String {
    "value".to_string()
}

fn default_transit_mount() -> String {
    "transit".to_string()
}

fn default_page_size() -> usize {
    25
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8200".to_string(),
            role_id: String::new(),
            secret_id: empty_secret(),
            approle_mount: default_approle_mount(),
            kv_mount: default_kv_mount(),
            kv_prefix: String::new(),
            value_field: default_value_field(),
            transit_mount: default_transit_mount(),
            page_size: default_page_size(),
        }
    }
}

impl VaultConfig {
    /// Full KV path of an entry listed under the prefix
    pub fn secret_path(&self, entry: &str) -> String {
        let prefix = self.kv_prefix.trim_matches('/');
        if prefix.is_empty() {
            entry.to_string()
        } else {
            format!("{}/{}", prefix, entry)
        }
    }

    /// Listing page size, at least one
    pub fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }
}

/// Builder for VaultConfig
pub struct VaultConfigBuilder {
    config: VaultConfig,
}

impl VaultConfigBuilder {
    /// Create a new builder with endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            config: VaultConfig {
                endpoint: endpoint.into(),
                ..Default::default()
            },
        }
    }

    /// Set AppRole credentials
    pub fn with_approle(mut self, role_id: impl Into<String>, secret_id: impl Into<String>) -> Self {
        self.config.role_id = role_id.into();
        self.config.secret_id = Secret::new(secret_id.into());
        self
    }

    /// Set KV mount path
    pub fn with_kv_mount(mut self, mount: impl Into<String>) -> Self {
        self.config.kv_mount = mount.into();
        self
    }

    /// Set KV folder to list
    pub fn with_kv_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.kv_prefix = prefix.into();
        self
    }

    /// Set the field holding the secret value
    pub fn with_value_field(mut self, field: impl Into<String>) -> Self {
        self.config.value_field = field.into();
        self
    }

    /// Set transit mount path
    pub fn with_transit_mount(mut self, mount: impl Into<String>) -> Self {
        self.config.transit_mount = mount.into();
        self
    }

    /// Set listing page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Build the configuration
    pub fn build(self) -> VaultConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_default_config() {
        let config = VaultConfig::default();
        assert_eq!(config.endpoint, "http://localhost:8200");
        assert_eq!(config.kv_mount, "secret");
        assert_eq!(config.transit_mount, "transit");
        assert_eq!(config.value_field, "value");
        assert_eq!(config.page_size, 25);
    }

    #[test]
    fn test_builder() {
        let config = VaultConfigBuilder::new("http://vault:8200")
            .with_approle("role123", "secret456")
            .with_kv_mount("kv")
            .with_kv_prefix("signers/")
            .with_value_field("keys")
            .with_page_size(50)
            .build();

        assert_eq!(config.endpoint, "http://vault:8200");
        assert_eq!(config.role_id, "role123");
        assert_eq!(config.secret_id.expose_secret(), "secret456");
        assert_eq!(config.kv_mount, "kv");
        assert_eq!(config.value_field, "keys");
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_secret_path() {
        let flat = VaultConfig::default();
        assert_eq!(flat.secret_path("validator-1"), "validator-1");

        let nested = VaultConfigBuilder::new("http://vault:8200")
            .with_kv_prefix("/signers/")
            .build();
        assert_eq!(nested.secret_path("validator-1"), "signers/validator-1");
    }

    #[test]
    fn test_secret_id_is_redacted() {
        let config = VaultConfigBuilder::new("http://vault:8200")
            .with_approle("role", "super-secret")
            .build();
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret"));
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let config = VaultConfigBuilder::new("http://vault:8200")
            .with_page_size(0)
            .build();
        assert_eq!(config.effective_page_size(), 1);
    }
}
