//! In-memory virtual file tree
//!
//! Loading an archive produces a [`FileSystem`]: a tree of [`Folder`]s and
//! [`File`]s whose contents stay in the archive until read. Trees from
//! several archives are combined with [`FileSystem::merged_with`] (new tree)
//! or [`FileSystem::overwrite_with`] (in place); in both, the overlay wins.

mod error;
mod file;
mod file_system;
mod folder;

pub use error::{VfsError, VfsResult};
pub use file::File;
pub use file_system::{FileSystem, PATH_SEPARATOR};
pub use folder::{AddMode, Folder};
