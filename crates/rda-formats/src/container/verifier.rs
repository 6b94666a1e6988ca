//! Consistency checks for block and file headers

use super::block::BlockHeader;
use super::error::{EntityKind, FormatError};
use super::file_header::{FILE_HEADER_SIZE, FileHeader};
use super::header::HEADER_SIZE;

/// Check that a block header is internally consistent.
///
/// Errors carry the block header offset.
pub fn verify_block_header(header: &BlockHeader) -> Result<(), FormatError> {
    let invalid = |detail: &str| FormatError::invalid(EntityKind::BlockHeader, Some(header.offset), detail);

    let expected = i128::from(header.num_files) * i128::from(FILE_HEADER_SIZE);
    if i128::from(header.uncompressed_headers_size) != expected {
        return Err(invalid(
            "The file headers size does not match the number of files.",
        ));
    }

    if !header.flags.is_compressed()
        && header.compressed_headers_size != header.uncompressed_headers_size
    {
        return Err(invalid(
            "The compressed file headers size should match the uncompressed size when compression is disabled.",
        ));
    }

    if i128::from(header.offset)
        < i128::from(HEADER_SIZE) + i128::from(header.compressed_headers_size)
    {
        return Err(invalid(
            "The file header offset must be after the end of the RDA header.",
        ));
    }

    Ok(())
}

/// Check a file header against the block it belongs to.
///
/// `offset` is the position of the header in the archive when it is known.
pub fn verify_file_header(
    header: &FileHeader,
    block_is_compressed: bool,
    offset: Option<u64>,
) -> Result<(), FormatError> {
    for (field, value) in [
        ("data offset", header.data_offset),
        ("compressed size", header.compressed_size),
        ("uncompressed size", header.uncompressed_size),
    ] {
        if value < 0 {
            return Err(FormatError::invalid(
                EntityKind::FileHeader,
                offset,
                format!("The file {field} {value} is negative."),
            ));
        }
    }

    if !block_is_compressed && header.compressed_size != header.uncompressed_size {
        return Err(FormatError::invalid(
            EntityKind::FileHeader,
            offset,
            "The compressed file size should match the uncompressed size when compression is disabled.",
        ));
    }

    Ok(())
}
