//! Rewriting file headers of nested containers

use super::file_header::FileHeader;

/// Applied to every file header before it is added to the tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileHeaderTransformer {
    /// Headers are used as read
    #[default]
    PassThrough,
    /// Headers of a container embedded in another archive
    Prefixing {
        /// Prepended to every path, e.g. `"maps/island.a7m|"`
        path_prefix: String,
        /// Added to every data offset
        data_offset: i64,
    },
}

impl FileHeaderTransformer {
    /// Transformer for a container stored as `path` at `data_offset`
    pub fn nested(path: &str, data_offset: i64) -> Self {
        Self::Prefixing {
            path_prefix: format!("{path}|"),
            data_offset,
        }
    }

    /// Offset added to data positions
    pub fn data_offset(&self) -> i64 {
        match self {
            Self::PassThrough => 0,
            Self::Prefixing { data_offset, .. } => *data_offset,
        }
    }

    /// Rewrite a header
    pub fn transform(&self, header: FileHeader) -> FileHeader {
        match self {
            Self::PassThrough => header,
            Self::Prefixing {
                path_prefix,
                data_offset,
            } => FileHeader {
                path: format!("{path_prefix}{}", header.path),
                data_offset: header.data_offset.saturating_add(*data_offset),
                ..header
            },
        }
    }
}
