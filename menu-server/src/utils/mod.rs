//! 工具模块
//!
//! - [`AppError`] - HTTP 边界错误类型
//! - 日志初始化

pub mod error;
pub mod logger;

pub use error::{AppError, AppResult, ok};
