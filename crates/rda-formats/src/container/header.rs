//! Archive header constants
//!
//! The fixed region at the start of every archive holds the magic text
//! followed by padding, and the offset of the first block at
//! [`FIRST_BLOCK_OFFSET_POSITION`].

/// Magic text at offset 0, ASCII without terminator
pub const HEADER_MAGIC: [u8; 18] = *b"Resource File V2.2";

/// Position of the first block offset (`i64`)
pub const FIRST_BLOCK_OFFSET_POSITION: u64 = 784;

/// End of the fixed header region; file data starts here or later
pub const HEADER_SIZE: u64 = 792;
