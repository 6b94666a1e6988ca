//! Reader, builder and virtual file system for RDA resource archives
//!
#![allow(clippy::cast_possible_wrap)] // On-disk sizes are signed
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! RDA V2.2 archives (`data0.rda`, `data1.rda`, ...) store game resources in
//! blocks of files. Blocks may be zlib compressed, encrypted with a 16-bit
//! XOR keystream, and may pack their files into one contiguous blob. Some
//! files are archives themselves and are expanded in place.
//!
//! # Modules
//!
//! - [`container`]: archive records, verification, loading and building
//! - [`vfs`]: the in-memory tree produced by loading, with merging
//! - [`directory`]: loading every archive of a directory in natural order
//! - [`io`]: bounded windows and on-demand decoding of file contents
//!
//! # Example
//!
//! ```no_run
//! use rda_formats::directory::ContainerDirectoryLoader;
//! use std::io::Read;
//!
//! let load = ContainerDirectoryLoader::new().load("/games/anno/maindata")?;
//! for (path, file) in load.file_system.walk_files() {
//!     if let Some(contents) = &file.contents_source {
//!         println!("{path}: {} bytes", contents.uncompressed_size());
//!     }
//! }
//!
//! if let Some(file) = load.file_system.find_file("data/config/game/assets.xml") {
//!     if let Some(contents) = &file.contents_source {
//!         let mut xml = String::new();
//!         contents.open()?.read_to_string(&mut xml)?;
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod cancel;
pub mod container;
pub mod directory;
pub mod error;
pub mod io;
pub mod vfs;

pub use cancel::CancellationToken;
pub use container::{ContainerError, ContainerFileLoader, ContainerResult, FormatError};
pub use directory::{ContainerDirectoryLoader, DirectoryError};
pub use error::ArgumentError;
pub use vfs::{File, FileSystem, Folder};
