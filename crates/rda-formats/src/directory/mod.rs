//! Loading a directory of archives into one tree

mod error;
mod loader;
mod natural;

pub use error::{DirectoryError, DirectoryResult};
pub use loader::{ContainerDirectoryLoader, DirectoryLoad, DirectoryLoaderConfig};
pub use natural::{natural_cmp, sort_container_paths};
