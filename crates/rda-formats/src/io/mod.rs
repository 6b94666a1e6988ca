//! Byte-level access to archived content
//!
//! - [`SubStream`] bounds reads to a window of a seekable source
//! - [`BlockContentsSource`] and [`FileContentsSource`] describe where the
//!   bytes of a block or file live and decode them on demand

mod contents;
mod error;
mod substream;

pub use contents::{
    BlockContentsSource, ContentsReader, FileContentsSource, ReadSeek, SeekableReader,
};
pub use error::{ContentsError, ContentsResult};
pub use substream::SubStream;
