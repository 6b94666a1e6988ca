//! Loading all archives of a game directory

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::error::{DirectoryError, DirectoryResult};
use super::natural::sort_container_paths;
use crate::cancel::CancellationToken;
use crate::container::{ContainerError, ContainerFileLoader, LoaderConfig};
use crate::vfs::FileSystem;

/// Configuration for [`ContainerDirectoryLoader`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryLoaderConfig {
    /// Archive names start with this, compared case-insensitively
    pub file_prefix: String,
    /// Archive names end with this, compared case-insensitively
    pub file_extension: String,
    /// Configuration for each archive
    pub loader: LoaderConfig,
}

impl Default for DirectoryLoaderConfig {
    fn default() -> Self {
        Self {
            file_prefix: "data".to_string(),
            file_extension: ".rda".to_string(),
            loader: LoaderConfig::default(),
        }
    }
}

impl DirectoryLoaderConfig {
    /// Set the archive name prefix
    #[must_use]
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Set the archive extension
    #[must_use]
    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    /// Set the per-archive configuration
    #[must_use]
    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    fn matches(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        name.starts_with(&self.file_prefix.to_lowercase())
            && name.ends_with(&self.file_extension.to_lowercase())
    }
}

/// Result of a directory load
#[derive(Debug, Clone)]
pub struct DirectoryLoad {
    /// All archives merged, later archives winning
    pub file_system: FileSystem,
    /// Archives in load order
    pub container_paths: Vec<PathBuf>,
}

/// Loads every archive of a directory into one tree.
///
/// Archives are loaded in natural name order (`data0.rda`, `data1.rda`, ...,
/// `data10.rda`) and merged so that files of later archives replace files of
/// earlier ones.
#[derive(Debug, Clone, Default)]
pub struct ContainerDirectoryLoader {
    config: DirectoryLoaderConfig,
}

impl ContainerDirectoryLoader {
    /// Loader with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with a custom configuration
    pub fn with_config(config: DirectoryLoaderConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &DirectoryLoaderConfig {
        &self.config
    }

    /// Archives of `dir` in load order
    pub fn find_container_paths(&self, dir: impl AsRef<Path>) -> DirectoryResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file() && self.config.matches(&entry.file_name().to_string_lossy()) {
                paths.push(entry.into_path());
            }
        }
        sort_container_paths(&mut paths);
        Ok(paths)
    }

    /// Load and merge all archives of `dir`
    pub fn load(&self, dir: impl AsRef<Path>) -> DirectoryResult<DirectoryLoad> {
        self.load_cancellable(dir, &CancellationToken::new())
    }

    /// Load and merge all archives of `dir`, checking `cancel` before the
    /// scan and before each archive
    pub fn load_cancellable(
        &self,
        dir: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> DirectoryResult<DirectoryLoad> {
        let dir = dir.as_ref();
        check_cancelled(cancel)?;

        let container_paths = self.find_container_paths(dir)?;
        info!(
            "Loading {} archives from {}",
            container_paths.len(),
            dir.display()
        );

        let loader = ContainerFileLoader::with_config(self.config.loader.clone());
        let mut file_system = FileSystem::new();
        for path in &container_paths {
            check_cancelled(cancel)?;

            let archive = loader
                .load_cancellable(path, cancel, &mut |block| {
                    debug!("{}: block {}", path.display(), block);
                })
                .map_err(|source| match source {
                    ContainerError::Cancelled => DirectoryError::Cancelled,
                    source => DirectoryError::Load {
                        path: path.clone(),
                        source,
                    },
                })?;
            file_system = file_system.merged_with(&archive, cancel)?;
        }

        info!("Loaded {} archives from {}", container_paths.len(), dir.display());
        Ok(DirectoryLoad {
            file_system,
            container_paths,
        })
    }
}

fn check_cancelled(cancel: &CancellationToken) -> DirectoryResult<()> {
    if cancel.is_cancelled() {
        return Err(DirectoryError::Cancelled);
    }
    Ok(())
}
