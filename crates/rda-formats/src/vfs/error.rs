//! Virtual file system error types

use thiserror::Error;

use crate::error::ArgumentError;

/// Virtual file system result type
pub type VfsResult<T> = Result<T, VfsError>;

/// Errors raised while editing or merging trees
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    /// Add-mode precondition violated or invalid name
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Merge was cancelled
    #[error("operation was cancelled")]
    Cancelled,
}
