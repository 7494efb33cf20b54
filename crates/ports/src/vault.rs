//! 密钥库协作方 trait 定义

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use keyloader_errors::AppResult;

use crate::item::{ItemKind, ListingEntry};
use crate::signing::SigningHandle;

/// 惰性分页流
///
/// 页级错误表示该页及之后都无法取得；单个条目的错误放在页内
pub type PageStream = BoxStream<'static, AppResult<Vec<ListingEntry>>>;

/// 分页列表源
#[async_trait]
pub trait PagedListingSource: Send + Sync {
    /// 打开指定类别的列表
    ///
    /// 外层错误表示在取得任何一页之前就失败（连接、认证等）
    async fn list_items(&self, kind: ItemKind) -> AppResult<PageStream>;
}

/// 条目读取
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    /// 读取密文原始值，不存在时返回 `AppError::NotFound`
    async fn fetch_secret_value(&self, name: &str) -> AppResult<String>;

    /// 获取远程签名句柄，不存在时返回 `AppError::NotFound`
    async fn fetch_key_handle(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> AppResult<Arc<dyn SigningHandle>>;
}
