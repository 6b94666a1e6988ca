//! Folders of the virtual tree and merging

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use super::error::{VfsError, VfsResult};
use super::file::File;
use crate::cancel::CancellationToken;
use crate::error::ArgumentError;

/// How [`Folder::add_folder`] and [`Folder::add_file`] treat an existing
/// entry with the same name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddMode {
    /// Fail if the name is taken
    New,
    /// Fail if the name is not taken
    Replace,
    /// Insert or replace
    #[default]
    NewOrReplace,
}

/// A folder in the virtual tree.
///
/// Subfolders and files live in separate namespaces, so a folder and a file
/// can share a name. Children are kept in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Folder {
    name: String,
    folders: BTreeMap<String, Folder>,
    files: BTreeMap<String, File>,
}

impl Folder {
    /// Create an empty folder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folders: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    /// Folder name, empty for the root
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subfolders in name order
    pub fn folders(&self) -> impl Iterator<Item = &Self> {
        self.folders.values()
    }

    /// Files in name order
    pub fn files(&self) -> impl Iterator<Item = &File> {
        self.files.values()
    }

    /// Subfolder by name
    pub fn folder(&self, name: &str) -> Option<&Self> {
        self.folders.get(name)
    }

    /// Mutable subfolder by name
    pub fn folder_mut(&mut self, name: &str) -> Option<&mut Self> {
        self.folders.get_mut(name)
    }

    /// File by name
    pub fn file(&self, name: &str) -> Option<&File> {
        self.files.get(name)
    }

    /// Mutable file by name
    pub fn file_mut(&mut self, name: &str) -> Option<&mut File> {
        self.files.get_mut(name)
    }

    /// Number of subfolders
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    /// Number of files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of direct children of both kinds
    pub fn child_count(&self) -> usize {
        self.folders.len() + self.files.len()
    }

    /// Whether the folder has no children
    pub fn is_empty(&self) -> bool {
        self.child_count() == 0
    }

    /// Add a subfolder
    pub fn add_folder(&mut self, folder: Self, mode: AddMode) -> VfsResult<()> {
        check_name("folder", &folder.name)?;
        insert(&mut self.folders, folder.name.clone(), folder, mode, "folder")
    }

    /// Add a file
    pub fn add_file(&mut self, file: File, mode: AddMode) -> VfsResult<()> {
        check_name("file", &file.name)?;
        insert(&mut self.files, file.name.clone(), file, mode, "file")
    }

    /// Remove a subfolder
    pub fn remove_folder(&mut self, name: &str) -> Option<Self> {
        self.folders.remove(name)
    }

    /// Remove a file
    pub fn remove_file(&mut self, name: &str) -> Option<File> {
        self.files.remove(name)
    }

    /// Subfolder by name, created empty if missing
    pub fn folder_or_create(&mut self, name: &str) -> &mut Self {
        self.folders
            .entry(name.to_string())
            .or_insert_with(|| Self::new(name))
    }

    /// Combine with `overlay` into a new tree.
    ///
    /// Files of `overlay` replace same-named files of `self`, folders of the
    /// same name are merged recursively, and everything present on only one
    /// side is kept. Neither input is modified.
    pub fn merged_with(&self, overlay: &Self, cancel: &CancellationToken) -> VfsResult<Self> {
        let mut merged = Self::new(self.name.clone());

        for (name, folder) in &self.folders {
            check_cancelled(cancel)?;
            let folder = match overlay.folders.get(name) {
                Some(other) => folder.merged_with(other, cancel)?,
                None => folder.clone(),
            };
            merged.folders.insert(name.clone(), folder);
        }
        for (name, folder) in &overlay.folders {
            check_cancelled(cancel)?;
            if !self.folders.contains_key(name) {
                merged.folders.insert(name.clone(), folder.clone());
            }
        }

        merged.files.clone_from(&self.files);
        for (name, file) in &overlay.files {
            check_cancelled(cancel)?;
            merged.files.insert(name.clone(), file.clone());
        }

        Ok(merged)
    }

    /// Merge `overlay` into `self` in place.
    ///
    /// Same precedence as [`merged_with`](Self::merged_with). On
    /// cancellation the tree is left partially merged.
    pub fn overwrite_with(&mut self, overlay: &Self, cancel: &CancellationToken) -> VfsResult<()> {
        for (name, folder) in &overlay.folders {
            check_cancelled(cancel)?;
            self.folder_or_create(name).overwrite_with(folder, cancel)?;
        }
        for (name, file) in &overlay.files {
            check_cancelled(cancel)?;
            self.files.insert(name.clone(), file.clone());
        }
        Ok(())
    }
}

fn check_cancelled(cancel: &CancellationToken) -> VfsResult<()> {
    if cancel.is_cancelled() {
        return Err(VfsError::Cancelled);
    }
    Ok(())
}

fn check_name(kind: &'static str, name: &str) -> VfsResult<()> {
    if name.is_empty() {
        return Err(ArgumentError::new(kind, "name cannot be empty").into());
    }
    Ok(())
}

fn insert<T>(
    children: &mut BTreeMap<String, T>,
    name: String,
    child: T,
    mode: AddMode,
    kind: &'static str,
) -> VfsResult<()> {
    match (children.entry(name), mode) {
        (Entry::Occupied(entry), AddMode::New) => Err(ArgumentError::new(
            kind,
            format!("`{}` already exists", entry.key()),
        )
        .into()),
        (Entry::Vacant(entry), AddMode::Replace) => Err(ArgumentError::new(
            kind,
            format!("`{}` does not exist", entry.key()),
        )
        .into()),
        (Entry::Occupied(mut entry), _) => {
            entry.insert(child);
            Ok(())
        }
        (Entry::Vacant(entry), _) => {
            entry.insert(child);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(name: &str, timestamp: i64) -> File {
        File::new(name).with_timestamp(timestamp)
    }

    fn folder_with_files(name: &str, files: &[(&str, i64)]) -> Folder {
        let mut folder = Folder::new(name);
        for (file_name, timestamp) in files {
            folder.add_file(file(file_name, *timestamp), AddMode::New).unwrap();
        }
        folder
    }

    #[test]
    fn test_add_modes() {
        let mut folder = Folder::new("");
        folder.add_file(file("a", 1), AddMode::New).unwrap();

        let err = folder.add_file(file("a", 2), AddMode::New).unwrap_err();
        assert!(matches!(err, VfsError::Argument(_)));
        assert_eq!(folder.file("a").unwrap().modification_timestamp, 1);

        folder.add_file(file("a", 3), AddMode::Replace).unwrap();
        assert_eq!(folder.file("a").unwrap().modification_timestamp, 3);

        assert!(folder.add_file(file("b", 1), AddMode::Replace).is_err());
        folder.add_file(file("b", 1), AddMode::NewOrReplace).unwrap();
        folder.add_file(file("b", 4), AddMode::default()).unwrap();
        assert_eq!(folder.file("b").unwrap().modification_timestamp, 4);

        assert!(folder.add_file(file("", 1), AddMode::New).is_err());
    }

    #[test]
    fn test_folder_and_file_may_share_name() {
        let mut folder = Folder::new("");
        folder.add_folder(Folder::new("same"), AddMode::New).unwrap();
        folder.add_file(file("same", 0), AddMode::New).unwrap();
        assert_eq!(folder.child_count(), 2);
        assert!(folder.folder("same").is_some());
        assert!(folder.file("same").is_some());
    }

    #[test]
    fn test_merge_disjoint_files() {
        let base = folder_with_files("", &[("1503", 0), ("1602", 0), ("1701", 0)]);
        let overlay = folder_with_files("", &[("1404", 0), ("2205", 0), ("2070", 0)]);

        let merged = base.merged_with(&overlay, &CancellationToken::new()).unwrap();
        assert_eq!(merged.folder_count(), 0);
        assert_eq!(merged.file_count(), 6);
        assert_eq!(base.file_count(), 3);
        assert_eq!(overlay.file_count(), 3);
    }

    #[test]
    fn test_merge_conflict_overlay_wins() {
        let base = folder_with_files("", &[("1503", 2001), ("1602", 2001), ("1701", 2001)]);
        let overlay = folder_with_files("", &[("1503", 2003), ("2205", 2003)]);

        let merged = base.merged_with(&overlay, &CancellationToken::new()).unwrap();
        assert_eq!(merged.file_count(), 4);
        assert_eq!(merged.file("1503").unwrap().modification_timestamp, 2003);
        assert_eq!(merged.file("1602").unwrap().modification_timestamp, 2001);
        assert_eq!(base.file("1503").unwrap().modification_timestamp, 2001);

        let mut destructive = base.clone();
        destructive
            .overwrite_with(&overlay, &CancellationToken::new())
            .unwrap();
        assert_eq!(destructive, merged);
    }

    #[test]
    fn test_merge_folders() {
        let mut base = folder_with_files("", &[("root file", 0)]);
        base.add_folder(folder_with_files("Max Design", &[("1602", 1)]), AddMode::New)
            .unwrap();
        base.add_folder(Folder::new("Related Designs"), AddMode::New)
            .unwrap();

        let mut overlay = Folder::new("");
        overlay
            .add_folder(folder_with_files("Max Design", &[("1503", 2)]), AddMode::New)
            .unwrap();
        overlay
            .add_folder(Folder::new("Blue Byte"), AddMode::New)
            .unwrap();

        let merged = base.merged_with(&overlay, &CancellationToken::new()).unwrap();
        assert_eq!(merged.folder_count(), 3);
        assert_eq!(merged.file_count(), 1);
        let max_design = merged.folder("Max Design").unwrap();
        assert_eq!(max_design.file_count(), 2);
        assert_eq!(max_design.name(), "Max Design");

        let mut destructive = base.clone();
        destructive
            .overwrite_with(&overlay, &CancellationToken::new())
            .unwrap();
        assert_eq!(destructive, merged);
    }

    #[test]
    fn test_merge_with_self_is_idempotent() {
        let mut tree = folder_with_files("", &[("a", 1)]);
        tree.add_folder(folder_with_files("sub", &[("b", 2)]), AddMode::New)
            .unwrap();

        let merged = tree.merged_with(&tree, &CancellationToken::new()).unwrap();
        assert_eq!(merged, tree);
    }

    #[test]
    fn test_cancelled_merge() {
        let base = folder_with_files("", &[("a", 1)]);
        let overlay = folder_with_files("", &[("b", 1)]);
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(
            base.merged_with(&overlay, &token).unwrap_err(),
            VfsError::Cancelled
        );
        let mut target = base.clone();
        assert_eq!(
            target.overwrite_with(&overlay, &token).unwrap_err(),
            VfsError::Cancelled
        );
    }
}
