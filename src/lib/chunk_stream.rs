//! A continuous byte stream over an ordered sequence of decompressed chunks.
//!
//! BGZF block boundaries carry no meaning for the BAM layer: a header field,
//! a reference name or a whole record may start in one block and end several
//! blocks later. [`ChunkStream`] hides those boundaries and exposes typed
//! little-endian reads over the concatenation of its chunks.
//!
//! ```
//! use fgbam_lib::chunk_stream::ChunkStream;
//!
//! # fn main() -> fgbam_lib::errors::Result<()> {
//! let chunks = vec![Ok(vec![0x01, 0x02]), Ok(vec![]), Ok(vec![0x00, 0x00, b'h', b'i'])];
//! let mut stream = ChunkStream::new(chunks.into_iter());
//! assert_eq!(stream.read_int::<u32>()?, 0x0201);
//! assert_eq!(stream.read_string(2)?, "hi");
//! assert!(stream.is_at_end()?);
//! # Ok(())
//! # }
//! ```

use std::io::{self, Read};

use crate::errors::{BamError, Result};

/// Upper bound on the up-front allocation of [`ChunkStream::read_bytes`].
///
/// Length fields come from untrusted input, so larger reads grow as the
/// bytes actually arrive.
const MAX_PREALLOCATION: usize = 1 << 16;

/// Fixed-width integers that can be decoded from little-endian bytes.
pub trait FixedWidthInt: Sized + Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Decode from exactly [`Self::WIDTH`] little-endian bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_fixed_width_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FixedWidthInt for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::WIDTH]);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_fixed_width_int!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Concatenation of ordered chunks with typed reads.
///
/// Chunks are pulled lazily, one at a time, only when a read needs bytes
/// beyond the current chunk. Empty chunks are skipped. An error yielded by
/// the chunk source is returned from the read that needed the failed chunk;
/// bytes before it remain readable.
pub struct ChunkStream<I> {
    chunks: I,
    current: Vec<u8>,
    cursor: usize,
    position: u64,
    exhausted: bool,
}

impl<I> ChunkStream<I>
where
    I: Iterator<Item = Result<Vec<u8>>>,
{
    /// Create a stream over `chunks`.
    pub fn new(chunks: I) -> Self {
        Self { chunks, current: Vec::new(), cursor: 0, position: 0, exhausted: false }
    }

    /// Number of bytes consumed since creation or the last [`reset`](Self::reset).
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns a reference to the chunk source.
    pub fn get_ref(&self) -> &I {
        &self.chunks
    }

    /// Returns a mutable reference to the chunk source.
    ///
    /// Advancing the source directly skips the chunks it yields.
    pub fn get_mut(&mut self) -> &mut I {
        &mut self.chunks
    }

    /// Returns the chunk source, discarding any buffered bytes.
    pub fn into_inner(self) -> I {
        self.chunks
    }

    /// Discard buffered bytes and restart position counting.
    ///
    /// Used after the chunk source itself has been rewound.
    pub fn reset(&mut self) {
        self.current.clear();
        self.cursor = 0;
        self.position = 0;
        self.exhausted = false;
    }

    /// Make sure the current chunk has unread bytes.
    ///
    /// Returns `false` once the source is exhausted.
    fn fill(&mut self) -> Result<bool> {
        while self.cursor >= self.current.len() {
            if self.exhausted {
                return Ok(false);
            }
            match self.chunks.next() {
                Some(Ok(chunk)) => {
                    self.current = chunk;
                    self.cursor = 0;
                }
                Some(Err(e)) => return Err(e),
                None => {
                    self.exhausted = true;
                    self.current.clear();
                    self.cursor = 0;
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Unread bytes of the current chunk.
    fn available(&self) -> &[u8] {
        &self.current[self.cursor..]
    }

    fn consume(&mut self, n: usize) {
        self.cursor += n;
        self.position += n as u64;
    }

    /// Returns true if no bytes remain.
    ///
    /// May pull (and skip) empty chunks from the source.
    pub fn is_at_end(&mut self) -> Result<bool> {
        Ok(!self.fill()?)
    }

    /// Fill `buf` completely.
    ///
    /// # Errors
    ///
    /// [`BamError::UnexpectedEndOfStream`] if the source runs out first. The
    /// bytes that were available have been consumed by then.
    pub fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            if !self.fill()? {
                return Err(BamError::UnexpectedEndOfStream {
                    requested: buf.len(),
                    available: filled,
                });
            }
            let n = self.available().len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&self.available()[..n]);
            self.consume(n);
            filled += n;
        }
        Ok(())
    }

    /// Read exactly `n` bytes into a new vector.
    ///
    /// # Errors
    ///
    /// [`BamError::UnexpectedEndOfStream`] if fewer than `n` bytes remain.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n.min(MAX_PREALLOCATION));
        while out.len() < n {
            if !self.fill()? {
                return Err(BamError::UnexpectedEndOfStream { requested: n, available: out.len() });
            }
            let take = self.available().len().min(n - out.len());
            out.extend_from_slice(&self.available()[..take]);
            self.consume(take);
        }
        Ok(out)
    }

    /// Read one little-endian integer.
    ///
    /// ```
    /// use fgbam_lib::chunk_stream::ChunkStream;
    ///
    /// let mut stream = ChunkStream::new(vec![Ok(vec![0xff]), Ok(vec![0xff, 0xff, 0xff])].into_iter());
    /// assert_eq!(stream.read_int::<i32>().unwrap(), -1);
    /// ```
    pub fn read_int<T: FixedWidthInt>(&mut self) -> Result<T> {
        let mut raw = [0u8; 8];
        self.read_exact_into(&mut raw[..T::WIDTH])?;
        Ok(T::from_le_slice(&raw[..T::WIDTH]))
    }

    /// Read `n` bytes as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// [`BamError::InvalidFormat`] if the bytes are not valid UTF-8.
    pub fn read_string(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        String::from_utf8(bytes)
            .map_err(|e| BamError::invalid_format(format!("invalid UTF-8 in string field: {e}")))
    }
}

impl<I> Read for ChunkStream<I>
where
    I: Iterator<Item = Result<Vec<u8>>>,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || !self.fill()? {
            return Ok(0);
        }
        let n = self.available().len().min(buf.len());
        buf[..n].copy_from_slice(&self.available()[..n]);
        self.consume(n);
        Ok(n)
    }
}
