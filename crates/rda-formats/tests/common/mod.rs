//! Shared fixtures for the integration suites

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use rda_formats::container::{BlockOptions, ContainerBuilder, ContainerEntry};
use rda_formats::vfs::FileSystem;

/// Timestamp of the first fixture file, 2015-11-24 21:01:21 UTC
pub const BASE_TIMESTAMP: i64 = 1_448_398_881;

pub const ROOT_FILE_TEXT: &str = "A file on the root level";
pub const OTHER_DIR_TEXT: &str = "Just a file in another directory";
pub const PLAIN_TEXT: &str = "This is just a test. Nothing to see here. Move along.";

/// Every combination of compression, encryption and contiguous layout
pub fn all_block_options() -> Vec<BlockOptions> {
    let mut options = Vec::new();
    for compressed in [false, true] {
        for encrypted in [false, true] {
            for contiguous in [false, true] {
                options.push(BlockOptions {
                    compressed,
                    encrypted,
                    contiguous,
                    deleted: false,
                });
            }
        }
    }
    options
}

pub fn numbered_text(number: usize) -> String {
    format!("File {number}: {PLAIN_TEXT}")
}

/// Four files in two folders plus two files elsewhere
pub fn sample_entries() -> Vec<ContainerEntry> {
    let mut entries: Vec<ContainerEntry> = (1..=4)
        .map(|n| {
            let folder = if n <= 2 { "folder1" } else { "folder2" };
            ContainerEntry::new(
                format!("{folder}/file{n}.txt"),
                numbered_text(n),
                BASE_TIMESTAMP + n as i64 - 1,
            )
        })
        .collect();
    entries.push(ContainerEntry::new("root.txt", ROOT_FILE_TEXT, BASE_TIMESTAMP + 4));
    entries.push(ContainerEntry::new(
        "other/dir/file.txt",
        OTHER_DIR_TEXT,
        BASE_TIMESTAMP + 5,
    ));
    entries
}

pub fn archive_bytes(blocks: &[(BlockOptions, Vec<ContainerEntry>)]) -> Vec<u8> {
    let mut builder = ContainerBuilder::new(Cursor::new(Vec::new())).expect("start archive");
    for (options, entries) in blocks {
        builder.add_block(*options, entries).expect("add block");
    }
    builder.finish().expect("finish archive").into_inner()
}

pub fn write_archive(
    dir: &Path,
    name: &str,
    blocks: &[(BlockOptions, Vec<ContainerEntry>)],
) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, archive_bytes(blocks)).expect("write archive");
    path
}

pub fn read_file(file_system: &FileSystem, path: &str) -> Vec<u8> {
    file_system
        .find_file(path)
        .unwrap_or_else(|| panic!("missing file {path}"))
        .contents_source
        .as_ref()
        .unwrap_or_else(|| panic!("file {path} has no contents"))
        .read_to_vec()
        .unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
