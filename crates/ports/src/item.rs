//! 条目元数据

use std::collections::HashMap;
use std::fmt;

use keyloader_errors::AppError;

/// 条目类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// 任意字符串密文
    Secret,
    /// 只能远程签名的非导出密钥
    Key,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secret => "secret",
            Self::Key => "key",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 列表返回的条目快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMetadata {
    /// 库内唯一名称
    pub name: String,
    /// 标签，可能不存在
    pub tags: Option<HashMap<String, String>>,
    /// 厂商定义的版本，`None` 表示最新版本
    pub version: Option<String>,
}

impl ItemMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: None,
            version: None,
        }
    }

    /// 追加一个标签
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// 列表页中的一项
///
/// 元数据不可读的条目仍然出现在页中，由加载器计为一次失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    Item(ItemMetadata),
    Unreadable { name: String, error: AppError },
}

impl ListingEntry {
    pub fn unreadable(name: impl Into<String>, error: AppError) -> Self {
        Self::Unreadable {
            name: name.into(),
            error,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Item(item) => &item.name,
            Self::Unreadable { name, .. } => name,
        }
    }
}

impl From<ItemMetadata> for ListingEntry {
    fn from(item: ItemMetadata) -> Self {
        Self::Item(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_builder() {
        let item = ItemMetadata::new("validator-1")
            .with_tag("env", "prod")
            .with_tag("role", "signer")
            .with_version("3");

        let tags = item.tags.as_ref().unwrap();
        assert_eq!(tags.get("env").map(String::as_str), Some("prod"));
        assert_eq!(tags.len(), 2);
        assert_eq!(item.version.as_deref(), Some("3"));
    }

    #[test]
    fn test_metadata_without_tags() {
        let item = ItemMetadata::new("plain");
        assert!(item.tags.is_none());
        assert!(item.version.is_none());
    }

    #[test]
    fn test_listing_entry_name() {
        let item: ListingEntry = ItemMetadata::new("a").into();
        let failed = ListingEntry::unreadable("b", AppError::forbidden("denied"));
        assert_eq!(item.name(), "a");
        assert_eq!(failed.name(), "b");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ItemKind::Secret.to_string(), "secret");
        assert_eq!(ItemKind::Key.to_string(), "key");
    }
}
