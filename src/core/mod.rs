//! 核心层：校验重试控制器与其错误分类

pub mod error;
pub mod retry;

pub use error::{AttemptFailure, RetryError};
pub use retry::{validated_retry, RetryPolicy, DEFAULT_MAX_RETRIES};
