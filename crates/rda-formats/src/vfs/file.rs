//! Files of the virtual tree

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::io::FileContentsSource;

/// A file in the virtual tree.
///
/// Cloning is cheap: the contents source shares its block through an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File name, unique among the files of the parent folder
    pub name: String,
    /// Unix time in seconds
    pub modification_timestamp: i64,
    /// Where the bytes live, `None` for files created in memory
    pub contents_source: Option<FileContentsSource>,
}

impl File {
    /// Create a file without contents
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modification_timestamp: 0,
            contents_source: None,
        }
    }

    /// Set the modification timestamp
    #[must_use]
    pub fn with_timestamp(mut self, modification_timestamp: i64) -> Self {
        self.modification_timestamp = modification_timestamp;
        self
    }

    /// Set the contents source
    #[must_use]
    pub fn with_contents(mut self, contents_source: FileContentsSource) -> Self {
        self.contents_source = Some(contents_source);
        self
    }

    /// Modification time in UTC
    pub fn modification_date(&self) -> SystemTime {
        let magnitude = Duration::from_secs(self.modification_timestamp.unsigned_abs());
        if self.modification_timestamp >= 0 {
            UNIX_EPOCH + magnitude
        } else {
            UNIX_EPOCH - magnitude
        }
    }

    /// Set the modification time, rounding down to whole seconds
    pub fn set_modification_date(&mut self, date: SystemTime) {
        self.modification_timestamp = match date.duration_since(UNIX_EPOCH) {
            Ok(since) => i64::try_from(since.as_secs()).unwrap_or(i64::MAX),
            Err(before) => {
                let before = before.duration();
                let seconds = i64::try_from(before.as_secs()).unwrap_or(i64::MAX);
                if before.subsec_nanos() > 0 {
                    -seconds.saturating_add(1)
                } else {
                    -seconds
                }
            }
        };
    }
}
