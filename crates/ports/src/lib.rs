//! ports - 抽象 trait 层
//!
//! 定义密钥库协作方的抽象接口，加载器只依赖这里的 trait

mod item;
mod signing;
mod vault;

pub use item::*;
pub use signing::*;
pub use vault::*;
