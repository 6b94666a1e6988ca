//! Container error types

use std::fmt;
use std::io;

use thiserror::Error;

use crate::error::ArgumentError;
use crate::io::ContentsError;
use crate::vfs::VfsError;

/// Container result type
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Record of the archive an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Archive header (magic and first block offset)
    Header,
    /// Block header at the end of a block
    BlockHeader,
    /// File header, including the memory-resident info record
    FileHeader,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "header"),
            Self::BlockHeader => write!(f, "block header"),
            Self::FileHeader => write!(f, "file header"),
        }
    }
}

/// What is wrong with the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatErrorKind {
    /// Input ended in the middle of a record
    UnexpectedEndOfFile,
    /// A record field holds an impossible value
    InvalidValue,
}

impl fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEndOfFile => write!(f, "Unexpected end of file"),
            Self::InvalidValue => write!(f, "Invalid value"),
        }
    }
}

/// Input does not conform to the RDA V2.2 format.
///
/// `offset` is the position in the archive the error was detected at, when
/// the input can report one. Header regions decoded through a decompressor
/// have no meaningful position and carry `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    /// Record the error refers to
    pub entity: EntityKind,
    /// Kind of violation
    pub kind: FormatErrorKind,
    /// Position in the archive, if known
    pub offset: Option<u64>,
    /// Human readable explanation
    pub detail: Option<String>,
}

impl FormatError {
    /// Create a format error without detail message
    pub fn new(entity: EntityKind, kind: FormatErrorKind, offset: Option<u64>) -> Self {
        Self {
            entity,
            kind,
            offset,
            detail: None,
        }
    }

    /// Input ended while reading `entity`
    pub fn eof(entity: EntityKind, offset: Option<u64>) -> Self {
        Self::new(entity, FormatErrorKind::UnexpectedEndOfFile, offset)
    }

    /// `entity` holds an invalid value
    pub fn invalid(entity: EntityKind, offset: Option<u64>, detail: impl Into<String>) -> Self {
        Self::new(entity, FormatErrorKind::InvalidValue, offset).with_detail(detail)
    }

    /// Attach a detail message
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Input file or data stream does not conform to the expected file format specification: {} in {}",
            self.kind, self.entity
        )?;
        if let Some(offset) = self.offset {
            write!(f, " at offset {offset}")?;
        }
        write!(f, ".")?;
        if let Some(detail) = &self.detail {
            write!(f, " {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FormatError {}

/// Errors raised while loading or building containers
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Archive does not conform to the format
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Invalid value passed to or derived for a content source
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Content source could not be opened or decoded
    #[error(transparent)]
    Contents(#[from] ContentsError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Binary record encoding error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),

    /// Operation was cancelled
    #[error("operation was cancelled")]
    Cancelled,
}

impl From<VfsError> for ContainerError {
    fn from(error: VfsError) -> Self {
        match error {
            VfsError::Argument(error) => Self::Argument(error),
            VfsError::Cancelled => Self::Cancelled,
        }
    }
}

impl ContainerError {
    /// Whether the error reports malformed archive data
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Whether the error means the data is not a readable container.
    ///
    /// Used to decide if an embedded file that looked like a container is
    /// kept as a plain file. Failures of the outer archive itself, such as a
    /// missing file or cancellation, are not covered.
    pub fn is_not_a_container(&self) -> bool {
        match self {
            Self::Format(_)
            | Self::Argument(_)
            | Self::BinRw(_)
            | Self::Contents(ContentsError::Argument(_)) => true,
            Self::Io(error) | Self::Contents(ContentsError::Io(error)) => matches!(
                error.kind(),
                io::ErrorKind::InvalidData
                    | io::ErrorKind::InvalidInput
                    | io::ErrorKind::UnexpectedEof
            ),
            Self::Contents(ContentsError::UnsupportedPosition) | Self::Cancelled => false,
        }
    }
}
