//! RDA V2.2 container format
//!
//! Parsing, verification and loading of archives into a
//! [`FileSystem`](crate::vfs::FileSystem), and writing new archives.
//!
//! # Format
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 18 | Magic `"Resource File V2.2"` |
//! | 784 | 8 | First block offset (`i64`) |
//!
//! Every block ends with a 32-byte [`BlockHeader`]; the 560-byte
//! [`FileHeader`]s precede it, optionally compressed and encrypted.
//! All integers are little-endian.

mod block;
mod builder;
mod config;
mod error;
mod file_header;
mod header;
mod loader;
mod reader;
mod transformer;
mod verifier;

pub use block::{BLOCK_HEADER_SIZE, BlockFlags, BlockHeader, MEMORY_RESIDENT_INFO_SIZE, MemoryResidentInfo};
pub use builder::{BlockOptions, ContainerBuilder, ContainerEntry};
pub use config::LoaderConfig;
pub use error::{ContainerError, ContainerResult, EntityKind, FormatError, FormatErrorKind};
pub use file_header::{FILE_HEADER_SIZE, FileHeader, PATH_CODE_UNITS};
pub use header::{FIRST_BLOCK_OFFSET_POSITION, HEADER_MAGIC, HEADER_SIZE};
pub use loader::{ContainerFileLoader, LoadContext};
pub use reader::{ContainerReader, StructureReader};
pub use transformer::FileHeaderTransformer;
pub use verifier::{verify_block_header, verify_file_header};
