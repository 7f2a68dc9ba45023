//! 工具模块 - 错误处理、日志

pub mod error;
pub mod logger;

pub use error::{AppError, AppResponse, ok, ok_with_message};

/// 处理器的 Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
