//! keyloader-bootstrap - 签名服务密钥注册表启动
//!
//! 加载配置、初始化日志，并通过批量加载器从 Vault 填充内存注册表

mod registry;
mod runtime;

pub use registry::*;
pub use runtime::*;
