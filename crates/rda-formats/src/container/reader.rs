//! Reading archive records
//!
//! [`StructureReader`] reads little-endian values and whole records from any
//! byte source, reporting truncation as a [`FormatError`] with the position
//! at which the input ran out. [`ContainerReader`] adds the seeking needed to
//! walk an archive.

use std::io::{self, Read, Seek, SeekFrom};

use binrw::BinReaderExt;
use binrw::io::Cursor;

use super::block::{BLOCK_HEADER_SIZE, BlockHeader, MEMORY_RESIDENT_INFO_SIZE, MemoryResidentInfo};
use super::error::{ContainerResult, EntityKind, FormatError};
use super::file_header::{FILE_HEADER_SIZE, FileHeader, trim_nuls};
use super::header::{FIRST_BLOCK_OFFSET_POSITION, HEADER_MAGIC};

/// Little-endian record reader over a byte source.
///
/// When created with [`at_position`](Self::at_position), errors carry the
/// archive position where the input ended: the starting position plus the
/// bytes consumed so far. Sources without a meaningful position, such as a
/// decompressor, use [`new`](Self::new) and report no offset.
#[derive(Debug)]
pub struct StructureReader<R> {
    inner: R,
    origin: Option<u64>,
    consumed: u64,
}

impl<R: Read> StructureReader<R> {
    /// Reader whose errors carry no offset
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            origin: None,
            consumed: 0,
        }
    }

    /// Reader whose first byte sits at `position` in the archive
    pub fn at_position(inner: R, position: u64) -> Self {
        Self {
            inner,
            origin: Some(position),
            consumed: 0,
        }
    }

    /// Archive position of the next byte, if known
    pub fn position(&self) -> Option<u64> {
        self.origin.map(|origin| origin + self.consumed)
    }

    /// Unwrap the byte source
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` completely.
    ///
    /// Short reads are retried, so decompressors that hand out data in small
    /// pieces still produce whole records.
    fn fill(&mut self, buf: &mut [u8], entity: EntityKind) -> ContainerResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.consumed += filled as u64;
                    return Err(FormatError::eof(entity, self.position()).into());
                }
                Ok(n) => filled += n,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error.into()),
            }
        }
        self.consumed += filled as u64;
        Ok(())
    }

    fn read_array<const N: usize>(&mut self, entity: EntityKind) -> ContainerResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf, entity)?;
        Ok(buf)
    }

    /// Read exactly `len` bytes
    pub fn read_bytes(&mut self, len: usize, entity: EntityKind) -> ContainerResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf, entity)?;
        Ok(buf)
    }

    /// Read an `i32`
    pub fn read_i32(&mut self, entity: EntityKind) -> ContainerResult<i32> {
        Ok(i32::from_le_bytes(self.read_array(entity)?))
    }

    /// Read a `u32`
    pub fn read_u32(&mut self, entity: EntityKind) -> ContainerResult<u32> {
        Ok(u32::from_le_bytes(self.read_array(entity)?))
    }

    /// Read an `i64`
    pub fn read_i64(&mut self, entity: EntityKind) -> ContainerResult<i64> {
        Ok(i64::from_le_bytes(self.read_array(entity)?))
    }

    /// Read a `u64`
    pub fn read_u64(&mut self, entity: EntityKind) -> ContainerResult<u64> {
        Ok(u64::from_le_bytes(self.read_array(entity)?))
    }

    /// Read a UTF-16LE string stored in `byte_len` bytes, dropping trailing
    /// NULs
    pub fn read_utf16_string(
        &mut self,
        byte_len: usize,
        entity: EntityKind,
    ) -> ContainerResult<String> {
        let start = self.position();
        let bytes = self.read_bytes(byte_len, entity)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        String::from_utf16(trim_nuls(&units))
            .map_err(|_| FormatError::invalid(entity, start, "The string is not valid UTF-16.").into())
    }

    /// Read a block header; its `offset` is left at zero
    pub fn read_block_header(&mut self) -> ContainerResult<BlockHeader> {
        let bytes: [u8; BLOCK_HEADER_SIZE as usize] = self.read_array(EntityKind::BlockHeader)?;
        Ok(Cursor::new(bytes).read_le()?)
    }

    /// Read the sizes of a contiguous data blob
    pub fn read_memory_resident_info(&mut self) -> ContainerResult<MemoryResidentInfo> {
        let bytes: [u8; MEMORY_RESIDENT_INFO_SIZE as usize] =
            self.read_array(EntityKind::FileHeader)?;
        Ok(Cursor::new(bytes).read_le()?)
    }

    /// Read one file header
    pub fn read_file_header(&mut self) -> ContainerResult<FileHeader> {
        let start = self.position();
        let bytes: [u8; FILE_HEADER_SIZE as usize] = self.read_array(EntityKind::FileHeader)?;
        FileHeader::from_bytes(&bytes, start)
    }
}

/// Seeking reader over a whole archive.
#[derive(Debug)]
pub struct ContainerReader<R> {
    inner: R,
    len: u64,
}

impl<R: Read + Seek> ContainerReader<R> {
    /// Wrap an archive source and determine its length
    pub fn new(mut inner: R) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, len })
    }

    /// Total length of the archive
    pub fn stream_len(&self) -> u64 {
        self.len
    }

    /// Current position
    pub fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    /// Move to `position`
    pub fn set_position(&mut self, position: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    /// Mutable access to the source
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Unwrap the source
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn structure_at(&mut self, position: u64) -> ContainerResult<StructureReader<&mut R>> {
        self.set_position(position)?;
        Ok(StructureReader::at_position(&mut self.inner, position))
    }

    /// Check the magic text at the start of the archive
    pub fn read_header_magic(&mut self) -> ContainerResult<()> {
        let magic = self
            .structure_at(0)?
            .read_bytes(HEADER_MAGIC.len(), EntityKind::Header)?;
        if magic != HEADER_MAGIC {
            return Err(FormatError::invalid(
                EntityKind::Header,
                Some(0),
                "The file does not start with the expected magic text.",
            )
            .into());
        }
        Ok(())
    }

    /// Read the position of the first block header
    pub fn read_first_block_offset(&mut self) -> ContainerResult<i64> {
        self.structure_at(FIRST_BLOCK_OFFSET_POSITION)?
            .read_i64(EntityKind::Header)
    }

    /// Read the block header stored at `offset`
    pub fn read_block_header(&mut self, offset: u64) -> ContainerResult<BlockHeader> {
        let mut header = self.structure_at(offset)?.read_block_header()?;
        header.offset = offset;
        Ok(header)
    }

    /// Read the memory-resident info record stored at `offset`
    pub fn read_memory_resident_info(&mut self, offset: u64) -> ContainerResult<MemoryResidentInfo> {
        self.structure_at(offset)?.read_memory_resident_info()
    }
}
