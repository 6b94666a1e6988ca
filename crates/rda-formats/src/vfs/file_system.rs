//! Root of a virtual tree

use super::error::{VfsError, VfsResult};
use super::file::File;
use super::folder::{AddMode, Folder};
use crate::cancel::CancellationToken;
use crate::error::ArgumentError;
use crate::io::FileContentsSource;

/// Separator of archive paths
pub const PATH_SEPARATOR: char = '/';

/// A virtual file tree with an unnamed root folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSystem {
    /// Root folder
    pub root: Folder,
}

impl FileSystem {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at a `/`-separated path, creating missing folders.
    ///
    /// Empty folder components are skipped. A path that is empty or ends
    /// with a separator has no file name and is rejected.
    pub fn add_file_at(
        &mut self,
        path: &str,
        modification_timestamp: i64,
        contents_source: Option<FileContentsSource>,
        mode: AddMode,
    ) -> VfsResult<()> {
        let (parent, name) = path.rsplit_once(PATH_SEPARATOR).unwrap_or(("", path));
        if name.is_empty() {
            return Err(ArgumentError::new("path", format!("`{path}` has no file name")).into());
        }

        let mut folder = &mut self.root;
        for component in parent.split(PATH_SEPARATOR).filter(|part| !part.is_empty()) {
            folder = folder.folder_or_create(component);
        }

        folder.add_file(
            File {
                name: name.to_string(),
                modification_timestamp,
                contents_source,
            },
            mode,
        )
    }

    /// Folder at a `/`-separated path, the root for an empty path
    pub fn find_folder(&self, path: &str) -> Option<&Folder> {
        path.split(PATH_SEPARATOR)
            .filter(|part| !part.is_empty())
            .try_fold(&self.root, |folder, name| folder.folder(name))
    }

    /// File at a `/`-separated path
    pub fn find_file(&self, path: &str) -> Option<&File> {
        let (parent, name) = match path.rsplit_once(PATH_SEPARATOR) {
            Some((parent, name)) => (parent, name),
            None => ("", path),
        };
        self.find_folder(parent)?.file(name)
    }

    /// All files with their full paths, depth first, folders before files
    pub fn walk_files(&self) -> Vec<(String, &File)> {
        let mut files = Vec::new();
        collect_files(&self.root, "", &mut files);
        files
    }

    /// Combine with `overlay` into a new tree, see [`Folder::merged_with`]
    pub fn merged_with(&self, overlay: &Self, cancel: &CancellationToken) -> VfsResult<Self> {
        Ok(Self {
            root: self.root.merged_with(&overlay.root, cancel)?,
        })
    }

    /// Merge `overlay` into `self`, see [`Folder::overwrite_with`]
    pub fn overwrite_with(&mut self, overlay: &Self, cancel: &CancellationToken) -> VfsResult<()> {
        self.root.overwrite_with(&overlay.root, cancel)
    }

    /// Merge several trees in order, later trees winning
    pub fn merge_all<'a, I>(trees: I, cancel: &CancellationToken) -> VfsResult<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        trees.into_iter().try_fold(Self::new(), |merged, tree| {
            if cancel.is_cancelled() {
                return Err(VfsError::Cancelled);
            }
            merged.merged_with(tree, cancel)
        })
    }
}

fn collect_files<'a>(folder: &'a Folder, prefix: &str, files: &mut Vec<(String, &'a File)>) {
    for child in folder.folders() {
        collect_files(child, &format!("{prefix}{}{PATH_SEPARATOR}", child.name()), files);
    }
    for file in folder.files() {
        files.push((format!("{prefix}{}", file.name), file));
    }
}
