//! Writing new archives
//!
//! Each call to [`ContainerBuilder::add_block`] appends file data, the file
//! header region, the optional data section info and the block header, then
//! links the new block into the chain. Existing archives are never modified.

use std::io::{self, Seek, SeekFrom, Write};

use binrw::BinWriterExt;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use rda_crypto::CipherWriter;
use tracing::debug;

use super::block::{BlockFlags, BlockHeader, MemoryResidentInfo};
use super::error::ContainerResult;
use super::file_header::FileHeader;
use super::header::{FIRST_BLOCK_OFFSET_POSITION, HEADER_MAGIC, HEADER_SIZE};

/// Offset of `next_block_offset` inside an encoded block header
const NEXT_BLOCK_OFFSET_FIELD: u64 = 24;

/// Layout and encoding of a block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockOptions {
    /// Compress file data and headers with zlib
    pub compressed: bool,
    /// Encrypt file data and headers
    pub encrypted: bool,
    /// Store all files as one blob encoded as a whole
    pub contiguous: bool,
    /// Set the deleted flag
    pub deleted: bool,
}

impl BlockOptions {
    /// Plain streamed block
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable compression
    #[must_use]
    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    /// Enable encryption
    #[must_use]
    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    /// Store the files as one contiguous blob
    #[must_use]
    pub fn contiguous(mut self) -> Self {
        self.contiguous = true;
        self
    }

    /// Mark the block as deleted
    #[must_use]
    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// Block flags for these options
    pub fn flags(self) -> BlockFlags {
        BlockFlags::new(self.compressed, self.encrypted, self.contiguous, self.deleted)
    }
}

/// A file to store in a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    /// `/`-separated path inside the archive
    pub path: String,
    /// Decoded file contents
    pub contents: Vec<u8>,
    /// Unix time in seconds
    pub modification_timestamp: i64,
}

impl ContainerEntry {
    /// Create an entry
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>, modification_timestamp: i64) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            modification_timestamp,
        }
    }
}

/// Writes an RDA V2.2 archive.
///
/// ```
/// use std::io::Cursor;
/// use rda_formats::container::{BlockOptions, ContainerBuilder, ContainerEntry};
///
/// let mut builder = ContainerBuilder::new(Cursor::new(Vec::new()))?;
/// builder.add_block(
///     BlockOptions::new().compressed().encrypted(),
///     &[ContainerEntry::new("data/readme.txt", "hello", 1_448_398_881)],
/// )?;
/// let archive = builder.finish()?.into_inner();
/// assert!(archive.starts_with(b"Resource File V2.2"));
/// # Ok::<(), rda_formats::container::ContainerError>(())
/// ```
#[derive(Debug)]
pub struct ContainerBuilder<W> {
    writer: W,
    last_block_offset: Option<u64>,
}

impl<W: Write + Seek> ContainerBuilder<W> {
    /// Start an archive at the beginning of `writer`
    pub fn new(mut writer: W) -> ContainerResult<Self> {
        writer.seek(SeekFrom::Start(0))?;
        let mut header = vec![0u8; FIRST_BLOCK_OFFSET_POSITION as usize];
        header[..HEADER_MAGIC.len()].copy_from_slice(&HEADER_MAGIC);
        writer.write_all(&header)?;
        writer.write_all(&(HEADER_SIZE as i64).to_le_bytes())?;

        Ok(Self {
            writer,
            last_block_offset: None,
        })
    }

    /// Append a block holding `entries` and return its header offset
    pub fn add_block(&mut self, options: BlockOptions, entries: &[ContainerEntry]) -> ContainerResult<u64> {
        let flags = options.flags();
        self.writer.seek(SeekFrom::End(0))?;

        let mut headers = Vec::with_capacity(entries.len());
        let mut blob_info = None;
        if options.contiguous {
            let mut blob = Vec::new();
            for entry in entries {
                headers.push(file_header(entry, blob.len() as u64, entry.contents.len() as u64));
                blob.extend_from_slice(&entry.contents);
            }
            let encoded = encode(&blob, flags)?;
            self.writer.write_all(&encoded)?;
            blob_info = Some(MemoryResidentInfo {
                compressed_size: encoded.len() as i64,
                uncompressed_size: blob.len() as i64,
            });
        } else {
            for entry in entries {
                let position = self.writer.stream_position()?;
                let encoded = encode(&entry.contents, flags)?;
                self.writer.write_all(&encoded)?;
                headers.push(file_header(entry, position, encoded.len() as u64));
            }
        }

        let mut header_region = Vec::with_capacity(headers.len() * 560);
        for header in &headers {
            header_region.extend(header.to_bytes()?);
        }
        let encoded_headers = encode(&header_region, flags)?;
        self.writer.write_all(&encoded_headers)?;

        if let Some(info) = blob_info {
            self.writer.write_le(&info)?;
        }

        let offset = self.writer.stream_position()?;
        self.writer.write_le(&BlockHeader {
            offset,
            flags,
            num_files: entries.len() as u32,
            compressed_headers_size: encoded_headers.len() as i64,
            uncompressed_headers_size: header_region.len() as i64,
            next_block_offset: 0,
        })?;

        self.link_block(offset)?;
        debug!(
            "Wrote block at offset {} with {} files, flags {:#x}",
            offset,
            entries.len(),
            flags.bits()
        );
        Ok(offset)
    }

    /// Point the previous block, or the archive header, at `offset`
    fn link_block(&mut self, offset: u64) -> io::Result<()> {
        let field = match self.last_block_offset {
            Some(previous) => previous + NEXT_BLOCK_OFFSET_FIELD,
            None => FIRST_BLOCK_OFFSET_POSITION,
        };
        self.writer.seek(SeekFrom::Start(field))?;
        self.writer.write_all(&(offset as i64).to_le_bytes())?;
        self.writer.seek(SeekFrom::End(0))?;
        self.last_block_offset = Some(offset);
        Ok(())
    }

    /// Terminate the block chain and return the writer
    pub fn finish(mut self) -> ContainerResult<W> {
        let end = self.writer.seek(SeekFrom::End(0))?;
        if let Some(last) = self.last_block_offset {
            self.writer
                .seek(SeekFrom::Start(last + NEXT_BLOCK_OFFSET_FIELD))?;
            self.writer.write_all(&(end as i64).to_le_bytes())?;
            self.writer.seek(SeekFrom::Start(end))?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn file_header(entry: &ContainerEntry, data_offset: u64, compressed_size: u64) -> FileHeader {
    FileHeader {
        path: entry.path.clone(),
        data_offset: data_offset as i64,
        compressed_size: compressed_size as i64,
        uncompressed_size: entry.contents.len() as i64,
        modification_timestamp: entry.modification_timestamp,
    }
}

/// Compress and then encrypt, as the block flags require
fn encode(data: &[u8], flags: BlockFlags) -> io::Result<Vec<u8>> {
    let compressed = if flags.is_compressed() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        encoder.finish()?
    } else {
        data.to_vec()
    };

    if !flags.is_encrypted() {
        return Ok(compressed);
    }
    let mut writer = CipherWriter::new(Vec::with_capacity(compressed.len()));
    writer.write_all(&compressed)?;
    writer.finish()
}
