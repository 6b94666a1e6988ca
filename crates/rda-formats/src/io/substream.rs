//! Read-only window over part of a seekable source

use std::io::{self, Read, Seek, SeekFrom};

use tracing::warn;

/// Exposes only `[offset, offset + length)` of the wrapped source.
///
/// Reads never cross the end of the window even when the source has more
/// data, and seeks are relative to the window. A window reaching past the end
/// of the source is accepted; its length is clamped to the bytes that exist
/// and reads simply run out early.
///
/// The type has no `Write` implementation. Pass `&mut R` instead of `R` to
/// keep using the source afterwards.
#[derive(Debug)]
pub struct SubStream<R> {
    inner: R,
    offset: u64,
    length: u64,
    position: u64,
}

impl<R: Read + Seek> SubStream<R> {
    /// Create a window starting at `offset` and spanning up to `length` bytes.
    ///
    /// The source is positioned at the start of the window.
    pub fn new(mut inner: R, offset: u64, length: u64) -> io::Result<Self> {
        let source_len = inner.seek(SeekFrom::End(0))?;
        if source_len < offset {
            warn!(
                "Sub stream offset {} is beyond the end of the source ({} bytes)",
                offset, source_len
            );
        }

        inner.seek(SeekFrom::Start(offset))?;
        Ok(Self {
            inner,
            offset,
            length: length.min(source_len.saturating_sub(offset)),
            position: 0,
        })
    }
}

impl<R> SubStream<R> {
    /// Number of readable bytes in the window
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Whether the window is empty
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Position relative to the start of the window
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Absolute offset of the window in the source
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes left between the current position and the end of the window
    pub fn remaining(&self) -> u64 {
        self.length.saturating_sub(self.position)
    }

    /// Borrow the source
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the source. Its position is wherever the window left it.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for SubStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let max = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        let count = buf.len().min(max);
        if count == 0 {
            return Ok(0);
        }

        let read = self.inner.read(&mut buf[..count])?;
        self.position += read as u64;
        Ok(read)
    }
}

impl<R: Seek> Seek for SubStream<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(position) => Some(position),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => self.length.checked_add_signed(delta),
        }
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;

        let absolute = self.offset.checked_add(target).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek position overflows")
        })?;
        self.inner.seek(SeekFrom::Start(absolute))?;
        self.position = target;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}
