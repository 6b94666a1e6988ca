//! Where archived bytes live and how to decode them
//!
//! Every block of an archive gets one [`BlockContentsSource`], shared through
//! an [`Arc`] by the [`FileContentsSource`] of each file in the block.
//!
//! Blocks come in two layouts:
//!
//! - **Streamed**: each file is stored (and compressed/encrypted) on its own;
//!   a file's position in the block is its absolute offset in the archive.
//! - **Memory resident**: all files form one blob that is compressed and
//!   encrypted as a whole. The blob is decoded into memory and file positions
//!   are offsets inside the decoded blob.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::read::ZlibDecoder;
use rda_crypto::CipherReader;

use super::error::{ContentsError, ContentsResult};
use super::substream::SubStream;
use crate::container::BlockFlags;
use crate::error::{ArgumentError, non_negative};

/// Readable and seekable byte source
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Boxed seekable reader returned by content sources
pub type SeekableReader = Box<dyn ReadSeek + Send>;

/// Boxed forward-only reader returned by content sources
pub type ContentsReader = Box<dyn Read + Send>;

/// Location and encoding of the bytes of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContentsSource {
    archive_path: PathBuf,
    flags: BlockFlags,
    position: u64,
    compressed_size: u64,
    uncompressed_size: u64,
}

impl BlockContentsSource {
    /// Describe a memory-resident blob stored at `position`.
    pub fn new(
        archive_path: impl Into<PathBuf>,
        flags: BlockFlags,
        position: i64,
        compressed_size: i64,
        uncompressed_size: i64,
    ) -> Result<Self, ArgumentError> {
        Ok(Self {
            archive_path: archive_path.into(),
            flags,
            position: non_negative("position", position)?,
            compressed_size: non_negative("compressed_size", compressed_size)?,
            uncompressed_size: non_negative("uncompressed_size", uncompressed_size)?,
        })
    }

    /// Describe a streamed block, where every file carries its own offset.
    pub fn streamed(
        archive_path: impl Into<PathBuf>,
        flags: BlockFlags,
    ) -> Result<Self, ArgumentError> {
        if flags.is_memory_resident() {
            return Err(ArgumentError::new(
                "flags",
                "memory-resident blocks need a position and sizes",
            ));
        }

        Ok(Self {
            archive_path: archive_path.into(),
            flags,
            position: 0,
            compressed_size: 0,
            uncompressed_size: 0,
        })
    }

    /// Archive file the block belongs to
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Block flags
    pub fn flags(&self) -> BlockFlags {
        self.flags
    }

    /// Start of the memory-resident blob, zero for streamed blocks
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Stored size of the memory-resident blob
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Decoded size of the memory-resident blob
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Open the block for reading decoded bytes.
    ///
    /// Streamed blocks return the archive file itself. Memory-resident blocks
    /// are decrypted and decompressed into memory first.
    pub fn open(&self) -> ContentsResult<SeekableReader> {
        let file = File::open(&self.archive_path)?;
        if !self.flags.is_memory_resident() {
            return Ok(Box::new(file));
        }

        let blob = SubStream::new(file, self.position, self.compressed_size)?;
        let decoded = decode(Box::new(blob), self.flags);
        Ok(Box::new(read_into_memory(decoded, self.uncompressed_size)?))
    }

    /// Open the block without decoding.
    ///
    /// For memory-resident blocks this loads the stored blob into memory,
    /// bounded by the blob's decoded size.
    pub fn open_raw(&self) -> ContentsResult<SeekableReader> {
        let file = File::open(&self.archive_path)?;
        if !self.flags.is_memory_resident() {
            return Ok(Box::new(file));
        }

        let blob = SubStream::new(file, self.position, self.compressed_size)?;
        Ok(Box::new(read_into_memory(blob, self.uncompressed_size)?))
    }
}

/// Location and size of one file inside its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContentsSource {
    block: Arc<BlockContentsSource>,
    position_in_block: u64,
    compressed_size: u64,
    uncompressed_size: u64,
}

impl FileContentsSource {
    /// Describe a file stored at `position_in_block` of `block`.
    pub fn new(
        block: Arc<BlockContentsSource>,
        position_in_block: i64,
        compressed_size: i64,
        uncompressed_size: i64,
    ) -> Result<Self, ArgumentError> {
        Ok(Self {
            block,
            position_in_block: non_negative("position_in_block", position_in_block)?,
            compressed_size: non_negative("compressed_size", compressed_size)?,
            uncompressed_size: non_negative("uncompressed_size", uncompressed_size)?,
        })
    }

    /// Block shared with the other files of the same block
    pub fn block(&self) -> &Arc<BlockContentsSource> {
        &self.block
    }

    /// Offset of the file inside its (decoded) block
    pub fn position_in_block(&self) -> u64 {
        self.position_in_block
    }

    /// Stored size of the file
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Decoded size of the file
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Absolute offset of the file in the archive.
    ///
    /// Fails for memory-resident blocks that are compressed or encrypted,
    /// since the file only has a position after the blob is decoded.
    pub fn global_position(&self) -> ContentsResult<u64> {
        let flags = self.block.flags();
        if flags.is_memory_resident() && (flags.is_compressed() || flags.is_encrypted()) {
            return Err(ContentsError::UnsupportedPosition);
        }
        Ok(self.block.position() + self.position_in_block)
    }

    /// Whether [`open_seekable`](Self::open_seekable) can avoid buffering
    pub fn is_seekable(&self) -> bool {
        let flags = self.block.flags();
        flags.is_memory_resident() || !(flags.is_compressed() || flags.is_encrypted())
    }

    /// Open the file for reading its decoded bytes.
    ///
    /// The archive is opened on every call and closed when the returned
    /// reader is dropped.
    pub fn open(&self) -> ContentsResult<ContentsReader> {
        let window = self.window()?;
        if self.block.flags().is_memory_resident() {
            return Ok(Box::new(window));
        }
        Ok(decode(Box::new(window), self.block.flags()))
    }

    /// Open the file as a seekable reader.
    ///
    /// Files that are decrypted or decompressed on the fly are read into
    /// memory first.
    pub fn open_seekable(&self) -> ContentsResult<SeekableReader> {
        if self.is_seekable() {
            return Ok(Box::new(self.window()?));
        }
        Ok(Box::new(read_into_memory(self.open()?, self.uncompressed_size)?))
    }

    /// Read the whole decoded file.
    pub fn read_to_vec(&self) -> ContentsResult<Vec<u8>> {
        let mut reader = self.open()?;
        let mut contents = Vec::with_capacity(capacity_hint(self.uncompressed_size));
        reader.read_to_end(&mut contents)?;
        Ok(contents)
    }

    fn window(&self) -> ContentsResult<SubStream<SeekableReader>> {
        let block = self.block.open()?;
        Ok(SubStream::new(
            block,
            self.position_in_block,
            self.compressed_size,
        )?)
    }
}

/// Decrypt and then decompress, as the block flags require.
fn decode(mut reader: ContentsReader, flags: BlockFlags) -> ContentsReader {
    if flags.is_encrypted() {
        reader = Box::new(CipherReader::new(reader));
    }
    if flags.is_compressed() {
        reader = Box::new(ZlibDecoder::new(reader));
    }
    reader
}

/// Read at most `limit` bytes into an in-memory cursor.
fn read_into_memory<R: Read>(reader: R, limit: u64) -> std::io::Result<Cursor<Vec<u8>>> {
    let mut buffer = Vec::with_capacity(capacity_hint(limit));
    reader.take(limit).read_to_end(&mut buffer)?;
    Ok(Cursor::new(buffer))
}

/// Sizes come from the archive, so cap the up-front allocation.
fn capacity_hint(size: u64) -> usize {
    const MAX_HINT: u64 = 64 * 1024 * 1024;
    size.min(MAX_HINT) as usize
}
