//! Block header and memory-resident info records

use binrw::{BinRead, BinWrite};

/// Size of an encoded [`BlockHeader`]
pub const BLOCK_HEADER_SIZE: u64 = 32;

/// Size of an encoded [`MemoryResidentInfo`]
pub const MEMORY_RESIDENT_INFO_SIZE: u64 = 16;

/// Block flag bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, BinRead, BinWrite)]
#[brw(little)]
pub struct BlockFlags(i32);

impl BlockFlags {
    /// File data and header region are zlib compressed
    pub const COMPRESSED: i32 = 1;
    /// File data and header region are encrypted with the keystream cipher
    pub const ENCRYPTED: i32 = 2;
    /// File data forms one contiguous blob decoded as a whole
    pub const MEMORY_RESIDENT: i32 = 4;
    /// Block is marked as deleted
    pub const DELETED: i32 = 8;

    /// Wrap raw flag bits, keeping unknown bits
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Build flags from booleans
    pub const fn new(compressed: bool, encrypted: bool, memory_resident: bool, deleted: bool) -> Self {
        let mut bits = 0;
        if compressed {
            bits |= Self::COMPRESSED;
        }
        if encrypted {
            bits |= Self::ENCRYPTED;
        }
        if memory_resident {
            bits |= Self::MEMORY_RESIDENT;
        }
        if deleted {
            bits |= Self::DELETED;
        }
        Self(bits)
    }

    /// Raw flag bits
    pub const fn bits(self) -> i32 {
        self.0
    }

    /// Whether the compressed bit is set
    pub const fn is_compressed(self) -> bool {
        self.0 & Self::COMPRESSED != 0
    }

    /// Whether the encrypted bit is set
    pub const fn is_encrypted(self) -> bool {
        self.0 & Self::ENCRYPTED != 0
    }

    /// Whether the contiguous data section bit is set
    pub const fn is_memory_resident(self) -> bool {
        self.0 & Self::MEMORY_RESIDENT != 0
    }

    /// Whether the deleted bit is set
    pub const fn is_deleted(self) -> bool {
        self.0 & Self::DELETED != 0
    }
}

/// Header stored at the end of each block.
///
/// Blocks are chained backwards from the end of the archive: `offset` is
/// where this header starts, the file header region sits right before it
/// (and before the memory-resident info record, when present).
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct BlockHeader {
    /// Position of this header in the archive, not part of the record
    #[brw(ignore)]
    pub offset: u64,
    /// Flag bits
    pub flags: BlockFlags,
    /// Number of file headers in the block
    pub num_files: u32,
    /// Stored size of the file header region
    pub compressed_headers_size: i64,
    /// Decoded size of the file header region, always `num_files * 560`
    pub uncompressed_headers_size: i64,
    /// Position of the next block header
    pub next_block_offset: i64,
}

/// Sizes of a contiguous data blob, stored right before the block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct MemoryResidentInfo {
    /// Stored size of the blob
    pub compressed_size: i64,
    /// Decoded size of the blob
    pub uncompressed_size: i64,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::io::Cursor;
    use binrw::{BinReaderExt, BinWriterExt};

    #[test]
    fn test_flags() {
        let flags = BlockFlags::new(true, false, true, false);
        assert_eq!(flags.bits(), 5);
        assert!(flags.is_compressed());
        assert!(!flags.is_encrypted());
        assert!(flags.is_memory_resident());
        assert!(!flags.is_deleted());

        let deleted = BlockFlags::from_bits(8 | 0x100);
        assert!(deleted.is_deleted());
        assert_eq!(deleted.bits(), 0x108);
    }

    #[test]
    fn test_block_header_layout() {
        let header = BlockHeader {
            offset: 0,
            flags: BlockFlags::new(true, true, false, false),
            num_files: 2,
            compressed_headers_size: 0x0102,
            uncompressed_headers_size: 1120,
            next_block_offset: -1,
        };

        let mut cursor = Cursor::new(Vec::new());
        cursor.write_le(&header).unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(bytes.len() as u64, BLOCK_HEADER_SIZE);
        assert_eq!(bytes[..8], [3, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(bytes[8..10], [0x02, 0x01]);
        assert_eq!(bytes[24..], [0xFF; 8]);

        let decoded: BlockHeader = Cursor::new(bytes).read_le().unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_memory_resident_info_layout() {
        let mut cursor = Cursor::new(Vec::new());
        cursor
            .write_le(&MemoryResidentInfo {
                compressed_size: 7,
                uncompressed_size: 9,
            })
            .unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(bytes.len() as u64, MEMORY_RESIDENT_INFO_SIZE);
        assert_eq!(bytes[0], 7);
        assert_eq!(bytes[8], 9);
    }
}
