//! LBOS 映射器错误处理模块
//!
//! 提供统一的状态码与错误类型；C 风格调用方关心的 (状态码, 应答正文)
//! 二元组可以通过 [`LbosError::status`] 与 [`LbosError::answer`] 还原。

pub mod code;
pub mod lbos_error;

pub use code::LbosStatus;
pub use lbos_error::{LbosError, Result};
