//! Streaming adaptors for the RDA word cipher.
//!
//! The cipher works on 16-bit little-endian words, but callers read and write
//! in whatever sizes suit them. Both adaptors keep the word pairing across
//! calls so that chunking never changes the output:
//!
//! - [`CipherReader`] buffers one source byte waiting for its partner and one
//!   transformed byte that did not fit the caller's buffer.
//! - [`CipherWriter`] buffers one input byte waiting for its partner.
//!
//! A final unpaired byte is passed through unmodified in both directions.
//!
//! ```rust
//! use rda_crypto::stream::{CipherReader, CipherWriter};
//! use std::io::{Read, Write};
//!
//! let mut writer = CipherWriter::new(Vec::new());
//! writer.write_all(b"Hello, RDA!").unwrap();
//! let encrypted = writer.finish().unwrap();
//!
//! let mut decrypted = Vec::new();
//! CipherReader::new(encrypted.as_slice())
//!     .read_to_end(&mut decrypted)
//!     .unwrap();
//! assert_eq!(decrypted, b"Hello, RDA!");
//! ```

use std::io::{self, Read, Write};

use crate::keystream::Keystream;

/// Upper bound for a single pass over the source
const CHUNK_SIZE: usize = 8 * 1024;

/// Read adaptor that applies the keystream to everything read from `inner`.
///
/// Decryption and encryption are the same transform, so the reader serves
/// both directions for read-only sources.
#[derive(Debug)]
pub struct CipherReader<R> {
    inner: R,
    keystream: Keystream,
    /// Source byte still waiting for the second half of its word
    pending_source: Option<u8>,
    /// Transformed byte that did not fit the previous caller buffer
    pending_output: Option<u8>,
    scratch: Vec<u8>,
}

impl<R: Read> CipherReader<R> {
    /// Wrap `inner` using the stock RDA keystream.
    pub fn new(inner: R) -> Self {
        Self::with_keystream(inner, Keystream::default())
    }

    /// Wrap `inner` using a specific keystream.
    pub fn with_keystream(inner: R, keystream: Keystream) -> Self {
        Self {
            inner,
            keystream,
            pending_source: None,
            pending_output: None,
            scratch: Vec::new(),
        }
    }

    /// Borrow the wrapped source
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the source, discarding any buffered bytes
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read enough source bytes to produce up to `wanted` output bytes.
    fn fill_scratch(&mut self, wanted: usize) -> io::Result<usize> {
        let words = wanted.div_ceil(2);
        let needed = (words * 2 - usize::from(self.pending_source.is_some())).clamp(1, CHUNK_SIZE);
        self.scratch.resize(needed, 0);
        self.inner.read(&mut self.scratch)
    }

    /// Pair up `count` scratch bytes and write the transformed words to `out`.
    fn transform_scratch(&mut self, count: usize, out: &mut [u8]) -> usize {
        let Self {
            keystream,
            pending_source,
            pending_output,
            scratch,
            ..
        } = self;

        let mut written = 0;
        for &byte in &scratch[..count] {
            let Some(low) = pending_source.take() else {
                *pending_source = Some(byte);
                continue;
            };

            let [first, second] = keystream.apply_word([low, byte]);
            out[written] = first;
            written += 1;
            if written < out.len() {
                out[written] = second;
                written += 1;
            } else {
                *pending_output = Some(second);
            }
        }
        written
    }
}

impl<R: Read> Read for CipherReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        if let Some(byte) = self.pending_output.take() {
            buf[0] = byte;
            written = 1;
        }

        while written < buf.len() {
            let count = self.fill_scratch(buf.len() - written)?;
            if count == 0 {
                // End of source: a lone byte is emitted as is
                if let Some(byte) = self.pending_source.take() {
                    buf[written] = byte;
                    written += 1;
                }
                break;
            }

            written += self.transform_scratch(count, &mut buf[written..]);
            if written > 0 {
                break;
            }
        }

        Ok(written)
    }
}

/// Write adaptor that applies the keystream to everything written to it.
///
/// Call [`finish`](Self::finish) to flush a trailing unpaired byte and get the
/// sink back. Dropping the writer flushes the byte as well but cannot report
/// errors.
///
/// The keystream advances before the sink is written to, so after the sink
/// fails the writer is poisoned and every further call returns an error.
#[derive(Debug)]
pub struct CipherWriter<W: Write> {
    inner: Option<W>,
    keystream: Keystream,
    /// Input byte still waiting for the second half of its word
    pending: Option<u8>,
    scratch: Vec<u8>,
    poisoned: bool,
}

impl<W: Write> CipherWriter<W> {
    /// Wrap `inner` using the stock RDA keystream.
    pub fn new(inner: W) -> Self {
        Self::with_keystream(inner, Keystream::default())
    }

    /// Wrap `inner` using a specific keystream.
    pub fn with_keystream(inner: W, keystream: Keystream) -> Self {
        Self {
            inner: Some(inner),
            keystream,
            pending: None,
            scratch: Vec::new(),
            poisoned: false,
        }
    }

    /// Borrow the wrapped sink
    pub fn get_ref(&self) -> Option<&W> {
        self.inner.as_ref()
    }

    /// Write the buffered unpaired byte unmodified, flush and return the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner_mut()?;
        self.write_pending()?;
        let mut inner = self
            .inner
            .take()
            .ok_or_else(|| io::Error::other("cipher writer already finished"))?;
        inner.flush()?;
        Ok(inner)
    }

    fn write_pending(&mut self) -> io::Result<()> {
        let Some(byte) = self.pending.take() else {
            return Ok(());
        };
        let result = self.inner_mut()?.write_all(&[byte]);
        self.poisoned = result.is_err();
        result
    }

    fn inner_mut(&mut self) -> io::Result<&mut W> {
        if self.poisoned {
            return Err(io::Error::other("cipher writer failed on an earlier write"));
        }
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::other("cipher writer already finished"))
    }
}

impl<W: Write> Write for CipherWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner_mut()?;
        self.scratch.clear();
        for &byte in buf {
            match self.pending.take() {
                Some(low) => {
                    let word = self.keystream.apply_word([low, byte]);
                    self.scratch.extend_from_slice(&word);
                }
                None => self.pending = Some(byte),
            }
        }

        let scratch = std::mem::take(&mut self.scratch);
        let result = self.inner_mut()?.write_all(&scratch);
        self.scratch = scratch;
        self.poisoned = result.is_err();
        result?;
        Ok(buf.len())
    }

    /// Flushes the sink. A buffered unpaired byte stays buffered because its
    /// partner may still arrive.
    fn flush(&mut self) -> io::Result<()> {
        self.inner_mut()?.flush()
    }
}

impl<W: Write> Drop for CipherWriter<W> {
    fn drop(&mut self) {
        if self.inner.is_some() && !self.poisoned {
            let _ = self.write_pending();
        }
    }
}
