//! File header records

use binrw::io::Cursor;
use binrw::{BinRead, BinReaderExt, BinWrite, BinWriterExt};

use super::error::{ContainerResult, EntityKind, FormatError};
use crate::error::ArgumentError;

/// Size of an encoded [`FileHeader`]
pub const FILE_HEADER_SIZE: u64 = 560;

/// Number of UTF-16 code units reserved for the path
pub const PATH_CODE_UNITS: usize = 260;

/// On-disk layout
#[derive(BinRead, BinWrite)]
#[brw(little)]
struct FileHeaderRecord {
    path: [u16; PATH_CODE_UNITS],
    data_offset: i64,
    compressed_size: i64,
    uncompressed_size: i64,
    modification_timestamp: i64,
    reserved: u64,
}

/// Entry of a block's file header region.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileHeader {
    /// `/`-separated path inside the archive
    pub path: String,
    /// Absolute offset for streamed blocks, offset in the decoded blob for
    /// memory-resident blocks
    pub data_offset: i64,
    /// Stored size
    pub compressed_size: i64,
    /// Decoded size
    pub uncompressed_size: i64,
    /// Unix time in seconds
    pub modification_timestamp: i64,
}

impl FileHeader {
    /// Decode a header from its 560-byte encoding.
    ///
    /// `offset` is only used for error reporting.
    pub fn from_bytes(bytes: &[u8], offset: Option<u64>) -> ContainerResult<Self> {
        if (bytes.len() as u64) < FILE_HEADER_SIZE {
            return Err(FormatError::eof(
                EntityKind::FileHeader,
                offset.map(|start| start + bytes.len() as u64),
            )
            .into());
        }

        let record: FileHeaderRecord = Cursor::new(bytes).read_le()?;
        let units = trim_nuls(&record.path);
        let path = String::from_utf16(units).map_err(|_| {
            FormatError::invalid(
                EntityKind::FileHeader,
                offset,
                "The file path is not valid UTF-16.",
            )
        })?;

        Ok(Self {
            path,
            data_offset: record.data_offset,
            compressed_size: record.compressed_size,
            uncompressed_size: record.uncompressed_size,
            modification_timestamp: record.modification_timestamp,
        })
    }

    /// Encode the header into its 560-byte form.
    pub fn to_bytes(&self) -> ContainerResult<Vec<u8>> {
        let units: Vec<u16> = self.path.encode_utf16().collect();
        if units.len() > PATH_CODE_UNITS {
            return Err(ArgumentError::new(
                "path",
                format!(
                    "is {} UTF-16 code units long, at most {PATH_CODE_UNITS} fit",
                    units.len()
                ),
            )
            .into());
        }

        let mut path = [0u16; PATH_CODE_UNITS];
        path[..units.len()].copy_from_slice(&units);
        let record = FileHeaderRecord {
            path,
            data_offset: self.data_offset,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            modification_timestamp: self.modification_timestamp,
            reserved: 0,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(FILE_HEADER_SIZE as usize));
        cursor.write_le(&record)?;
        Ok(cursor.into_inner())
    }
}

/// Strip trailing NUL code units
pub(crate) fn trim_nuls(units: &[u16]) -> &[u16] {
    let end = units.iter().rposition(|&unit| unit != 0).map_or(0, |i| i + 1);
    &units[..end]
}
