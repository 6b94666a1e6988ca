//! Loading archives into a virtual file tree
//!
//! Blocks are stored back to front: the archive header points at the first
//! block header, and every block header points at the next one. A chain
//! ends at an offset at or beyond the end of the archive.
//!
//! ```text
//! +--------+-----------+----------------+-------------+--------------+-----
//! | header | file data | file headers   | [blob info] | block header | ...
//! +--------+-----------+----------------+-------------+--------------+-----
//!                       ^ headers_start                ^ block offset
//! ```
//!
//! Files whose name marks them as containers are loaded recursively and
//! merged into the tree with their path as prefix (`outer.a7m|inner/path`).

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::read::ZlibDecoder;
use rda_crypto::CipherReader;
use tracing::{debug, trace};

use super::block::{BlockHeader, MEMORY_RESIDENT_INFO_SIZE};
use super::config::LoaderConfig;
use super::error::{ContainerError, ContainerResult, EntityKind, FormatError};
use super::file_header::FileHeader;
use super::reader::{ContainerReader, StructureReader};
use super::transformer::FileHeaderTransformer;
use super::verifier::{verify_block_header, verify_file_header};
use crate::cancel::CancellationToken;
use crate::io::{BlockContentsSource, FileContentsSource, SubStream};
use crate::vfs::{AddMode, FileSystem};

/// Where the parts of a block live in the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockLayout {
    headers_start: u64,
    headers_size: u64,
}

/// State of one archive being loaded.
///
/// Nested containers get their own context over the decoded container file,
/// with the outer archive path and a prefixing transformer.
#[derive(Debug)]
pub struct LoadContext<R> {
    archive_path: PathBuf,
    reader: ContainerReader<R>,
    transformer: FileHeaderTransformer,
    file_system: FileSystem,
    depth: usize,
}

impl<R: Read + Seek> LoadContext<R> {
    /// Create a context for the archive stored at `archive_path` and read
    /// through `reader`
    pub fn new(
        archive_path: impl Into<PathBuf>,
        reader: R,
        transformer: FileHeaderTransformer,
    ) -> ContainerResult<Self> {
        Ok(Self {
            archive_path: archive_path.into(),
            reader: ContainerReader::new(reader)?,
            transformer,
            file_system: FileSystem::new(),
            depth: 0,
        })
    }

    /// Archive that content sources created by this context read from
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Tree loaded so far
    pub fn file_system(&self) -> &FileSystem {
        &self.file_system
    }

    /// Take the loaded tree
    pub fn into_file_system(self) -> FileSystem {
        self.file_system
    }

    /// Locate the file header region of `block`
    fn layout(&self, block: &BlockHeader) -> ContainerResult<BlockLayout> {
        let headers_size = u64::try_from(block.compressed_headers_size).map_err(|_| {
            FormatError::invalid(
                EntityKind::BlockHeader,
                Some(block.offset),
                "The compressed file headers size cannot be negative.",
            )
        })?;

        let mut headers_end = block.offset;
        if block.flags.is_memory_resident() {
            headers_end = headers_end.saturating_sub(MEMORY_RESIDENT_INFO_SIZE);
        }
        let headers_start = headers_end.checked_sub(headers_size).ok_or_else(|| {
            FormatError::invalid(
                EntityKind::BlockHeader,
                Some(block.offset),
                "The file headers start before the beginning of the file.",
            )
        })?;

        Ok(BlockLayout {
            headers_start,
            headers_size,
        })
    }

    /// Describe where the file data of `block` lives.
    ///
    /// A contiguous blob is located relative to the archive being read and
    /// opened from `archive_path`, so inside a nested container it points
    /// into the raw outer archive.
    pub fn block_contents_source(&mut self, block: &BlockHeader) -> ContainerResult<BlockContentsSource> {
        if !block.flags.is_memory_resident() {
            return Ok(BlockContentsSource::streamed(
                self.archive_path.clone(),
                block.flags,
            )?);
        }

        let info_offset = block.offset.checked_sub(MEMORY_RESIDENT_INFO_SIZE).ok_or_else(|| {
            FormatError::invalid(
                EntityKind::FileHeader,
                Some(block.offset),
                "The data section info starts before the beginning of the file.",
            )
        })?;
        let info = self.reader.read_memory_resident_info(info_offset)?;
        let layout = self.layout(block)?;

        let blob_start = i128::from(layout.headers_start) - i128::from(info.compressed_size);
        let blob_start = i64::try_from(blob_start)
            .ok()
            .filter(|start| *start >= 0)
            .ok_or_else(|| {
                FormatError::invalid(
                    EntityKind::FileHeader,
                    Some(info_offset),
                    "The data section starts before the beginning of the file.",
                )
            })?;

        Ok(BlockContentsSource::new(
            self.archive_path.clone(),
            block.flags,
            blob_start,
            info.compressed_size,
            info.uncompressed_size,
        )?)
    }

    /// Read, transform and verify all file headers of `block`
    pub fn load_file_headers(&mut self, block: &BlockHeader) -> ContainerResult<Vec<FileHeader>> {
        let layout = self.layout(block)?;
        let compressed = block.flags.is_compressed();

        let region = SubStream::new(self.reader.get_mut(), layout.headers_start, layout.headers_size)?;
        let mut source: Box<dyn Read + '_> = Box::new(region);
        if block.flags.is_encrypted() {
            source = Box::new(CipherReader::new(source));
        }
        if compressed {
            source = Box::new(ZlibDecoder::new(source));
        }

        // Decompressed headers have no position in the archive
        let mut structure = if compressed {
            StructureReader::new(source)
        } else {
            StructureReader::at_position(source, layout.headers_start)
        };

        let mut headers = Vec::new();
        for _ in 0..block.num_files {
            let position = structure.position();
            let header = self.transformer.transform(structure.read_file_header()?);
            verify_file_header(&header, compressed, position)?;
            trace!(
                "File header '{}' at offset {}, {} bytes",
                header.path, header.data_offset, header.uncompressed_size
            );
            headers.push(header);
        }

        Ok(headers)
    }
}

/// Loads single archives.
///
/// ```no_run
/// use rda_formats::container::ContainerFileLoader;
///
/// let file_system = ContainerFileLoader::new().load("data0.rda")?;
/// if let Some(file) = file_system.find_file("data/config/game/properties.xml") {
///     println!("{} bytes", file.contents_source.as_ref().map_or(0, |c| c.uncompressed_size()));
/// }
/// # Ok::<(), rda_formats::container::ContainerError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContainerFileLoader {
    config: LoaderConfig,
}

impl ContainerFileLoader {
    /// Loader with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with a custom configuration
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load the archive at `path`
    pub fn load(&self, path: impl AsRef<Path>) -> ContainerResult<FileSystem> {
        self.load_cancellable(path, &CancellationToken::new(), &mut |_| {})
    }

    /// Load the archive at `path`.
    ///
    /// `progress` receives the index of each block before it is read. The
    /// token is checked between blocks.
    pub fn load_cancellable(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
        progress: &mut dyn FnMut(usize),
    ) -> ContainerResult<FileSystem> {
        let path = path.as_ref();
        debug!("Loading archive {}", path.display());

        let reader = BufReader::new(File::open(path)?);
        let mut context = LoadContext::new(path, reader, FileHeaderTransformer::PassThrough)?;
        self.run(&mut context, cancel, progress)?;
        Ok(context.into_file_system())
    }

    /// Load an archive from `reader`.
    ///
    /// Content sources of the resulting tree open `archive_path`, which must
    /// hold the same bytes as `reader` for file contents to be readable.
    pub fn load_reader<R: Read + Seek>(
        &self,
        archive_path: impl Into<PathBuf>,
        reader: R,
        cancel: &CancellationToken,
    ) -> ContainerResult<FileSystem> {
        let mut context = LoadContext::new(archive_path, reader, FileHeaderTransformer::PassThrough)?;
        self.run(&mut context, cancel, &mut |_| {})?;
        Ok(context.into_file_system())
    }

    /// Walk the block chain of `context` and add every file to its tree
    pub fn run<R: Read + Seek>(
        &self,
        context: &mut LoadContext<R>,
        cancel: &CancellationToken,
        progress: &mut dyn FnMut(usize),
    ) -> ContainerResult<()> {
        context.reader.read_header_magic()?;
        let mut next_block_offset = context.reader.read_first_block_offset()?;
        let stream_len = context.reader.stream_len();
        let mut visited = HashSet::new();

        for index in 0.. {
            let offset = u64::try_from(next_block_offset).map_err(|_| {
                FormatError::invalid(
                    EntityKind::BlockHeader,
                    None,
                    format!("The block offset {next_block_offset} is negative."),
                )
            })?;
            if offset >= stream_len {
                break;
            }
            if cancel.is_cancelled() {
                return Err(ContainerError::Cancelled);
            }
            if !visited.insert(offset) {
                return Err(FormatError::invalid(
                    EntityKind::BlockHeader,
                    Some(offset),
                    "The block chain loops back to an earlier block.",
                )
                .into());
            }
            progress(index);

            let block = context.reader.read_block_header(offset)?;
            verify_block_header(&block)?;
            debug!(
                "Block {} at offset {}: {} files, flags {:#x}",
                index,
                offset,
                block.num_files,
                block.flags.bits()
            );

            self.load_block(context, &block, cancel)?;
            next_block_offset = block.next_block_offset;
        }

        Ok(())
    }

    fn load_block<R: Read + Seek>(
        &self,
        context: &mut LoadContext<R>,
        block: &BlockHeader,
        cancel: &CancellationToken,
    ) -> ContainerResult<()> {
        let block_source = Arc::new(context.block_contents_source(block)?);
        for header in context.load_file_headers(block)? {
            self.add_file(context, &header, &block_source, cancel)?;
        }
        Ok(())
    }

    /// Add one file to the tree, expanding it if it is a nested container
    pub fn add_file<R: Read + Seek>(
        &self,
        context: &mut LoadContext<R>,
        header: &FileHeader,
        block_source: &Arc<BlockContentsSource>,
        cancel: &CancellationToken,
    ) -> ContainerResult<()> {
        let contents = FileContentsSource::new(
            Arc::clone(block_source),
            header.data_offset,
            header.compressed_size,
            header.uncompressed_size,
        )?;
        context.file_system.add_file_at(
            &header.path,
            header.modification_timestamp,
            Some(contents.clone()),
            AddMode::NewOrReplace,
        )?;

        if self.config.load_nested_containers
            && context.depth < self.config.max_nesting_depth
            && self.is_container_file(&header.path)
        {
            self.load_nested(context, header, &contents, cancel)?;
        }
        Ok(())
    }

    fn load_nested<R: Read + Seek>(
        &self,
        context: &mut LoadContext<R>,
        header: &FileHeader,
        contents: &FileContentsSource,
        cancel: &CancellationToken,
    ) -> ContainerResult<()> {
        trace!("Loading nested container '{}'", header.path);

        let result = contents
            .open_seekable()
            .map_err(ContainerError::from)
            .and_then(|reader| {
                let mut nested = LoadContext::new(
                    context.archive_path.clone(),
                    reader,
                    FileHeaderTransformer::nested(&header.path, header.data_offset),
                )?;
                nested.depth = context.depth + 1;
                self.run(&mut nested, cancel, &mut |_| {})?;
                Ok(nested.into_file_system())
            });

        match result {
            Ok(nested) => {
                context.file_system.overwrite_with(&nested, cancel)?;
                Ok(())
            }
            Err(error) if error.is_not_a_container() => {
                debug!("'{}' is not a container: {}", header.path, error);
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    /// Whether the file at `path` is loaded as a nested container
    pub fn is_container_file(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        if self.config.container_file_names.iter().any(|n| n == name) {
            return true;
        }
        extension(name).is_some_and(|ext| self.config.container_extensions.iter().any(|e| e == ext))
    }
}

/// Extension including the dot, ignoring a dot at the start of the name
fn extension(name: &str) -> Option<&str> {
    let index = name.rfind(['.', '/', '\\'])?;
    (index > 0 && name[index..].starts_with('.')).then(|| &name[index..])
}
