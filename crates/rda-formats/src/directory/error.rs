//! Directory loader error types

use std::path::PathBuf;

use thiserror::Error;

use crate::container::ContainerError;
use crate::vfs::VfsError;

/// Directory loader result type
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Errors raised while loading a directory of archives
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// An archive could not be loaded
    #[error("failed to load {}: {source}", path.display())]
    Load {
        /// Archive that failed
        path: PathBuf,
        /// Cause
        #[source]
        source: ContainerError,
    },

    /// The directory could not be listed
    #[error("failed to list directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Trees could not be merged
    #[error("failed to merge archives: {0}")]
    Merge(VfsError),

    /// Operation was cancelled
    #[error("operation was cancelled")]
    Cancelled,
}

impl From<VfsError> for DirectoryError {
    fn from(error: VfsError) -> Self {
        match error {
            VfsError::Cancelled => Self::Cancelled,
            error @ VfsError::Argument(_) => Self::Merge(error),
        }
    }
}
