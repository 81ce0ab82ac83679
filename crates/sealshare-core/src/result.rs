//! Convenience result type alias for SealShare.

use crate::error::AppError;

/// A specialized `Result` type for SealShare operations.
pub type AppResult<T> = Result<T, AppError>;
