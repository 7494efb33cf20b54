//! 远程签名句柄

use async_trait::async_trait;
use keyloader_errors::AppResult;

/// 绑定到库内密钥标识的签名句柄
///
/// 私钥永远不离开密钥库，所有签名与验签都在远端完成
#[async_trait]
pub trait SigningHandle: Send + Sync + std::fmt::Debug {
    /// 密钥库中的密钥标识
    fn key_id(&self) -> &str;

    /// 对数据签名，返回厂商格式的签名
    async fn sign(&self, data: &[u8]) -> AppResult<String>;

    /// 验证签名
    async fn verify(&self, data: &[u8], signature: &str) -> AppResult<bool>;
}
