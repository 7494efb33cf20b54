//! 内存密钥注册表
//!
//! 密文每行一个十六进制私钥，按 sha256 指纹去重；transit 密钥以远程签名 handle 形式保存

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use keyloader_bulk::{BulkLoader, MappedResults, lines};
use keyloader_config::SelectionConfig;
use keyloader_errors::{AppError, AppResult};
use keyloader_ports::{ItemFetcher, PagedListingSource, SigningHandle};
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};
use tracing::info;

/// 从密文中解析出的一把私钥
pub struct RegistryEntry {
    source: String,
    fingerprint: String,
    material: Secret<Vec<u8>>,
}

impl RegistryEntry {
    /// 解析一行十六进制，允许 `0x` 前缀
    pub fn parse(source: &str, line: &str) -> AppResult<Self> {
        let digits = line
            .strip_prefix("0x")
            .or_else(|| line.strip_prefix("0X"))
            .unwrap_or(line);

        if digits.is_empty() {
            return Err(AppError::mapping(format!("Empty key in {}", source)));
        }

        let bytes = hex::decode(digits)
            .map_err(|e| AppError::mapping(format!("Invalid hex key in {}: {}", source, e)))?;

        let fingerprint = hex::encode(Sha256::digest(&bytes));

        Ok(Self {
            source: source.to_string(),
            fingerprint,
            material: Secret::new(bytes),
        })
    }

    /// 第一个产生该密钥的条目
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 私钥 sha256 的十六进制
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn material(&self) -> &Secret<Vec<u8>> {
        &self.material
    }

    pub fn len(&self) -> usize {
        self.material.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for RegistryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for RegistryEntry {}

impl Hash for RegistryEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("source", &self.source)
            .field("fingerprint", &self.fingerprint)
            .field("material", &"[REDACTED]")
            .finish()
    }
}

/// 按 key id 比较的签名 handle
#[derive(Debug, Clone)]
pub struct KeyRef(pub Arc<dyn SigningHandle>);

impl KeyRef {
    pub fn key_id(&self) -> &str {
        self.0.key_id()
    }

    pub fn handle(&self) -> &Arc<dyn SigningHandle> {
        &self.0
    }
}

impl PartialEq for KeyRef {
    fn eq(&self, other: &Self) -> bool {
        self.key_id() == other.key_id()
    }
}

impl Eq for KeyRef {}

impl Hash for KeyRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_id().hash(state);
    }
}

/// 启动时一次性加载的密钥集合
#[derive(Debug, Default)]
pub struct KeyRegistry {
    entries: HashSet<RegistryEntry>,
    keys: HashSet<KeyRef>,
    error_count: usize,
}

impl KeyRegistry {
    /// 按选择配置从 vault 加载密文和/或 transit 密钥
    pub async fn populate<V>(loader: &BulkLoader<V>, selection: &SelectionConfig) -> Self
    where
        V: PagedListingSource + ItemFetcher + ?Sized + 'static,
    {
        let mut registry = Self::default();

        if selection.secrets {
            let (entries, errors) = loader
                .load_secrets(&selection.tags, lines(RegistryEntry::parse))
                .await
                .into_parts();
            info!(entries = entries.len(), errors, "Loaded private keys from secrets");
            registry.entries = entries;
            registry.error_count += errors;
        }

        if selection.keys {
            let keys: MappedResults<KeyRef> = loader
                .load_keys(
                    &selection.tags,
                    |_name: &str, handle: Arc<dyn SigningHandle>| -> AppResult<Vec<KeyRef>> {
                        Ok(vec![KeyRef(handle)])
                    },
                )
                .await;
            let (keys, errors) = keys.into_parts();
            info!(keys = keys.len(), errors, "Loaded remote signing keys");
            registry.keys = keys;
            registry.error_count += errors;
        }

        registry
    }

    pub fn entries(&self) -> &HashSet<RegistryEntry> {
        &self.entries
    }

    pub fn keys(&self) -> &HashSet<KeyRef> {
        &self.keys
    }

    /// 查找指定 key id 的签名 handle
    pub fn key(&self, key_id: &str) -> Option<&Arc<dyn SigningHandle>> {
        self.keys
            .iter()
            .find(|k| k.key_id() == key_id)
            .map(KeyRef::handle)
    }

    pub fn contains_fingerprint(&self, fingerprint: &str) -> bool {
        self.entries.iter().any(|e| e.fingerprint() == fingerprint)
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// 私钥与签名 handle 总数
    pub fn len(&self) -> usize {
        self.entries.len() + self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
