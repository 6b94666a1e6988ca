//! Error types for content access

use thiserror::Error;

use crate::error::ArgumentError;

/// Content access result type
pub type ContentsResult<T> = Result<T, ContentsError>;

/// Errors raised while locating or opening archived content
#[derive(Debug, Error)]
pub enum ContentsError {
    /// A content source was described with invalid values
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Positions inside a memory-resident block only exist after decoding
    #[error(
        "global position is not meaningful for files in memory-resident blocks that are compressed or encrypted"
    )]
    UnsupportedPosition,

    /// I/O error while opening or decoding the archive
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
