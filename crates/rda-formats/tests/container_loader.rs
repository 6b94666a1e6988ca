#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for loading single archives
//!
//! Archives are produced with `ContainerBuilder` in every block layout and
//! loaded back from disk, checking the tree, timestamps and decoded contents.

mod common;

use std::io::{Read, Seek, SeekFrom};

use common::{
    BASE_TIMESTAMP, OTHER_DIR_TEXT, ROOT_FILE_TEXT, all_block_options, archive_bytes,
    init_tracing, numbered_text, read_file, sample_entries, write_archive,
};
use pretty_assertions::assert_eq;
use rda_formats::container::{
    BlockOptions, ContainerEntry, ContainerError, ContainerFileLoader, EntityKind, FormatError,
    FormatErrorKind, HEADER_SIZE,
};
use rda_formats::io::ContentsError;
use rda_formats::CancellationToken;

fn format_error(result: Result<impl std::fmt::Debug, ContainerError>) -> FormatError {
    match result {
        Err(ContainerError::Format(error)) => error,
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn test_archive_without_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(dir.path(), "data0.rda", &[]);

    let file_system = ContainerFileLoader::new().load(&path).unwrap();
    assert!(file_system.root.is_empty());
}

#[test]
fn test_empty_blocks() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    for (i, options) in all_block_options().into_iter().enumerate() {
        let path = write_archive(dir.path(), &format!("empty{i}.rda"), &[(options, Vec::new())]);
        let file_system = ContainerFileLoader::new()
            .load(&path)
            .unwrap_or_else(|e| panic!("{options:?}: {e}"));
        assert!(file_system.root.is_empty(), "{options:?}");
    }
}

#[test]
fn test_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    for (i, options) in all_block_options().into_iter().enumerate() {
        let entries = vec![ContainerEntry::new("empty.txt", Vec::new(), BASE_TIMESTAMP)];
        let path = write_archive(dir.path(), &format!("data{i}.rda"), &[(options, entries)]);

        let file_system = ContainerFileLoader::new().load(&path).unwrap();
        let file = file_system.find_file("empty.txt").unwrap();
        assert_eq!(file.modification_timestamp, BASE_TIMESTAMP);
        let contents = file.contents_source.as_ref().unwrap();
        assert_eq!(contents.uncompressed_size(), 0);
        assert!(contents.read_to_vec().unwrap().is_empty(), "{options:?}");
    }
}

#[test]
fn test_single_file_every_layout() {
    let dir = tempfile::tempdir().unwrap();
    for (i, options) in all_block_options().into_iter().enumerate() {
        let entries = vec![ContainerEntry::new("file1.txt", numbered_text(1), BASE_TIMESTAMP)];
        let path = write_archive(dir.path(), &format!("data{i}.rda"), &[(options, entries)]);

        let file_system = ContainerFileLoader::new().load(&path).unwrap();
        assert_eq!(file_system.root.file_count(), 1);
        assert_eq!(
            read_file(&file_system, "file1.txt"),
            numbered_text(1).into_bytes(),
            "{options:?}"
        );

        let contents = file_system
            .find_file("file1.txt")
            .unwrap()
            .contents_source
            .clone()
            .unwrap();
        assert_eq!(contents.uncompressed_size(), 61);
        assert_eq!(contents.block().archive_path(), path.as_path());
        assert_eq!(contents.block().flags(), options.flags());
    }
}

#[test]
fn test_multiple_files_every_layout() {
    let dir = tempfile::tempdir().unwrap();
    for (i, options) in all_block_options().into_iter().enumerate() {
        let path = write_archive(dir.path(), &format!("data{i}.rda"), &[(options, sample_entries())]);
        let file_system = ContainerFileLoader::new().load(&path).unwrap();

        assert_eq!(file_system.root.folder_count(), 3, "{options:?}");
        assert_eq!(file_system.root.file_count(), 1);
        assert_eq!(file_system.find_folder("folder1").unwrap().file_count(), 2);
        assert_eq!(file_system.find_folder("folder2").unwrap().file_count(), 2);

        for n in 1..=4 {
            let folder = if n <= 2 { "folder1" } else { "folder2" };
            let file_path = format!("{folder}/file{n}.txt");
            assert_eq!(
                read_file(&file_system, &file_path),
                numbered_text(n).into_bytes(),
                "{options:?} {file_path}"
            );
            assert_eq!(
                file_system
                    .find_file(&file_path)
                    .unwrap()
                    .modification_timestamp,
                BASE_TIMESTAMP + n as i64 - 1
            );
        }
        assert_eq!(read_file(&file_system, "root.txt"), ROOT_FILE_TEXT.as_bytes());
        assert_eq!(
            read_file(&file_system, "other/dir/file.txt"),
            OTHER_DIR_TEXT.as_bytes()
        );
    }
}

#[test]
fn test_files_share_block_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(
        dir.path(),
        "data0.rda",
        &[(BlockOptions::new().contiguous().compressed(), sample_entries())],
    );
    let file_system = ContainerFileLoader::new().load(&path).unwrap();

    let first = file_system.find_file("folder1/file1.txt").unwrap();
    let second = file_system.find_file("folder2/file4.txt").unwrap();
    assert!(std::sync::Arc::ptr_eq(
        first.contents_source.as_ref().unwrap().block(),
        second.contents_source.as_ref().unwrap().block()
    ));
}

#[test]
fn test_multiple_blocks_later_block_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(
        dir.path(),
        "data0.rda",
        &[
            (BlockOptions::new(), sample_entries()),
            (
                BlockOptions::new().compressed().encrypted(),
                vec![ContainerEntry::new("root.txt", "patched", BASE_TIMESTAMP + 100)],
            ),
            (
                BlockOptions::new().contiguous().encrypted(),
                vec![ContainerEntry::new("new/extra.txt", "extra", BASE_TIMESTAMP + 101)],
            ),
        ],
    );

    let mut blocks = Vec::new();
    let file_system = ContainerFileLoader::new()
        .load_cancellable(&path, &CancellationToken::new(), &mut |block| {
            blocks.push(block);
        })
        .unwrap();
    assert_eq!(blocks, [0, 1, 2]);

    assert_eq!(read_file(&file_system, "root.txt"), b"patched");
    assert_eq!(
        file_system.find_file("root.txt").unwrap().modification_timestamp,
        BASE_TIMESTAMP + 100
    );
    assert_eq!(read_file(&file_system, "new/extra.txt"), b"extra");
    assert_eq!(read_file(&file_system, "folder1/file2.txt"), numbered_text(2).into_bytes());
}

#[test]
fn test_global_positions() {
    let dir = tempfile::tempdir().unwrap();
    let entries = vec![
        ContainerEntry::new("a.txt", "aaaa", 0),
        ContainerEntry::new("b.txt", "bbbbbb", 0),
    ];

    let path = write_archive(dir.path(), "streamed.rda", &[(BlockOptions::new(), entries.clone())]);
    let file_system = ContainerFileLoader::new().load(&path).unwrap();
    let b = file_system.find_file("b.txt").unwrap().contents_source.clone().unwrap();
    assert_eq!(b.global_position().unwrap(), HEADER_SIZE + 4);

    let path = write_archive(
        dir.path(),
        "contiguous.rda",
        &[(BlockOptions::new().contiguous(), entries.clone())],
    );
    let file_system = ContainerFileLoader::new().load(&path).unwrap();
    let b = file_system.find_file("b.txt").unwrap().contents_source.clone().unwrap();
    assert_eq!(b.block().position(), HEADER_SIZE);
    assert_eq!(b.position_in_block(), 4);
    assert_eq!(b.global_position().unwrap(), HEADER_SIZE + 4);

    let path = write_archive(
        dir.path(),
        "contiguous_compressed.rda",
        &[(BlockOptions::new().contiguous().compressed(), entries)],
    );
    let file_system = ContainerFileLoader::new().load(&path).unwrap();
    let b = file_system.find_file("b.txt").unwrap().contents_source.clone().unwrap();
    assert!(matches!(
        b.global_position(),
        Err(ContentsError::UnsupportedPosition)
    ));
    assert_eq!(b.read_to_vec().unwrap(), b"bbbbbb");
}

#[test]
fn test_seekable_and_raw_streams() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(
        dir.path(),
        "data0.rda",
        &[
            (BlockOptions::new().compressed().encrypted(), sample_entries()),
            (BlockOptions::new().contiguous().encrypted(), vec![ContainerEntry::new("blob.txt", "0123456789", 0)]),
        ],
    );
    let file_system = ContainerFileLoader::new().load(&path).unwrap();

    let contents = file_system.find_file("root.txt").unwrap().contents_source.clone().unwrap();
    assert!(!contents.is_seekable());
    let mut reader = contents.open_seekable().unwrap();
    reader.seek(SeekFrom::Start(7)).unwrap();
    let mut rest = String::new();
    reader.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, &ROOT_FILE_TEXT[7..]);

    let blob = file_system.find_file("blob.txt").unwrap().contents_source.clone().unwrap();
    assert!(blob.is_seekable());
    let mut reader = blob.open_seekable().unwrap();
    reader.seek(SeekFrom::End(-3)).unwrap();
    let mut tail = String::new();
    reader.read_to_string(&mut tail).unwrap();
    assert_eq!(tail, "789");

    let mut raw = Vec::new();
    blob.block().open_raw().unwrap().read_to_end(&mut raw).unwrap();
    assert_eq!(raw.len(), 10);
    assert_ne!(raw, b"0123456789");
}

#[test]
fn test_deleted_block_is_listed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(
        dir.path(),
        "data0.rda",
        &[(BlockOptions::new().deleted(), vec![ContainerEntry::new("gone.txt", "x", 0)])],
    );
    let file_system = ContainerFileLoader::new().load(&path).unwrap();
    let file = file_system.find_file("gone.txt").unwrap();
    assert!(file.contents_source.as_ref().unwrap().block().flags().is_deleted());
}

#[test]
fn test_load_reader() {
    let bytes = archive_bytes(&[(BlockOptions::new().compressed(), sample_entries())]);
    let file_system = ContainerFileLoader::new()
        .load_reader("in-memory.rda", std::io::Cursor::new(bytes), &CancellationToken::new())
        .unwrap();
    assert_eq!(file_system.walk_files().len(), 6);
}

#[test]
fn test_cancelled_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(dir.path(), "data0.rda", &[(BlockOptions::new(), sample_entries())]);
    let token = CancellationToken::new();
    token.cancel();

    let result = ContainerFileLoader::new().load_cancellable(&path, &token, &mut |_| {});
    assert!(matches!(result, Err(ContainerError::Cancelled)));
}

#[test]
fn test_missing_archive_is_io_error() {
    let result = ContainerFileLoader::new().load("/nonexistent/data0.rda");
    assert!(matches!(result, Err(ContainerError::Io(_))));
}

// Layout of a plain archive holding `a.txt` = "abc":
// 792 data, 795 file header, 1355 block header, 1387 end of file.
const PLAIN_HEADER_OFFSET: usize = 795;
const PLAIN_BLOCK_OFFSET: usize = 1355;

fn plain_archive() -> Vec<u8> {
    let bytes = archive_bytes(&[(BlockOptions::new(), vec![ContainerEntry::new("a.txt", "abc", 0)])]);
    assert_eq!(bytes.len(), PLAIN_BLOCK_OFFSET + 32);
    bytes
}

fn load_bytes(bytes: Vec<u8>) -> Result<rda_formats::FileSystem, ContainerError> {
    ContainerFileLoader::new().load_reader("broken.rda", std::io::Cursor::new(bytes), &CancellationToken::new())
}

fn patch_i64(bytes: &mut [u8], offset: usize, value: i64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[test]
fn test_empty_input() {
    assert_eq!(
        format_error(load_bytes(Vec::new())),
        FormatError::eof(EntityKind::Header, Some(0))
    );
}

#[test]
fn test_invalid_magic() {
    let mut bytes = plain_archive();
    bytes[0] = b'r';
    let error = format_error(load_bytes(bytes));
    assert_eq!(error.kind, FormatErrorKind::InvalidValue);
    assert_eq!(error.entity, EntityKind::Header);
    assert_eq!(error.offset, Some(0));
}

#[test]
fn test_truncated_block_header() {
    let mut bytes = plain_archive();
    bytes.truncate(PLAIN_BLOCK_OFFSET + 14);
    assert_eq!(
        format_error(load_bytes(bytes)),
        FormatError::eof(EntityKind::BlockHeader, Some(PLAIN_BLOCK_OFFSET as u64 + 14))
    );
}

#[test]
fn test_block_header_size_mismatch() {
    let mut bytes = plain_archive();
    bytes[PLAIN_BLOCK_OFFSET + 4..PLAIN_BLOCK_OFFSET + 8].copy_from_slice(&2u32.to_le_bytes());

    let error = format_error(load_bytes(bytes));
    assert_eq!(error.kind, FormatErrorKind::InvalidValue);
    assert_eq!(error.entity, EntityKind::BlockHeader);
    assert_eq!(error.offset, Some(PLAIN_BLOCK_OFFSET as u64));
    assert_eq!(
        error.detail.as_deref(),
        Some("The file headers size does not match the number of files.")
    );
}

#[test]
fn test_file_header_size_mismatch() {
    let mut bytes = plain_archive();
    patch_i64(&mut bytes, PLAIN_HEADER_OFFSET + 528, 4);

    let error = format_error(load_bytes(bytes));
    assert_eq!(error.entity, EntityKind::FileHeader);
    assert_eq!(error.offset, Some(PLAIN_HEADER_OFFSET as u64));
    assert_eq!(
        error.detail.as_deref(),
        Some("The compressed file size should match the uncompressed size when compression is disabled.")
    );
}

#[test]
fn test_negative_file_data_offset() {
    let mut bytes = plain_archive();
    patch_i64(&mut bytes, PLAIN_HEADER_OFFSET + 520, -1);

    assert_eq!(
        format_error(load_bytes(bytes)),
        FormatError::invalid(
            EntityKind::FileHeader,
            Some(PLAIN_HEADER_OFFSET as u64),
            "The file data offset -1 is negative."
        )
    );
}

#[test]
fn test_compressed_file_header_error_has_no_offset() {
    let mut bytes = archive_bytes(&[(
        BlockOptions::new().compressed(),
        vec![ContainerEntry::new("a.txt", "abc", 0)],
    )]);
    // Claim a second file header the compressed region does not contain
    let block_offset = bytes.len() - 32;
    bytes[block_offset + 4..block_offset + 8].copy_from_slice(&2u32.to_le_bytes());
    patch_i64(&mut bytes, block_offset + 16, 1120);

    assert_eq!(
        format_error(load_bytes(bytes)),
        FormatError::eof(EntityKind::FileHeader, None)
    );
}

#[test]
fn test_negative_and_looping_block_offsets() {
    let mut bytes = plain_archive();
    patch_i64(&mut bytes, 784, -5);
    let error = format_error(load_bytes(bytes));
    assert_eq!(error.kind, FormatErrorKind::InvalidValue);
    assert_eq!(error.entity, EntityKind::BlockHeader);

    let mut bytes = plain_archive();
    patch_i64(&mut bytes, PLAIN_BLOCK_OFFSET + 24, PLAIN_BLOCK_OFFSET as i64);
    let error = format_error(load_bytes(bytes));
    assert_eq!(error.entity, EntityKind::BlockHeader);
    assert_eq!(error.offset, Some(PLAIN_BLOCK_OFFSET as u64));
}

#[test]
fn test_first_block_offset_past_end_means_no_blocks() {
    let mut bytes = plain_archive();
    patch_i64(&mut bytes, 784, 1_000_000);
    assert!(load_bytes(bytes).unwrap().root.is_empty());
}

#[test]
fn test_error_display() {
    let mut bytes = plain_archive();
    bytes.truncate(PLAIN_BLOCK_OFFSET + 14);
    let error = load_bytes(bytes).unwrap_err();
    assert!(error.is_format_error());
    assert_eq!(
        error.to_string(),
        "Input file or data stream does not conform to the expected file format specification: \
         Unexpected end of file in block header at offset 1369."
    );
}
