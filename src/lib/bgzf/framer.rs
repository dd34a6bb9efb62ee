//! Raw BGZF block framing.
//!
//! This module reads framed BGZF blocks from a byte stream without
//! decompressing them, so that decompression can happen in worker threads,
//! and writes encoded blocks back out with the standard 18-byte header.

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::{trace, warn};

use super::codec::BgzfBlock;
use super::{BGZF_FOOTER_SIZE, BGZF_HEADER_SIZE};
use crate::errors::{BamError, Result};

/// Size of the fixed gzip member header that precedes the extra field.
const GZIP_FIXED_HEADER_SIZE: usize = 12;

const GZIP_ID1: u8 = 0x1f;
const GZIP_ID2: u8 = 0x8b;
const GZIP_CM_DEFLATE: u8 = 0x08;
const GZIP_FLG_FEXTRA: u8 = 0x04;
const GZIP_OS_UNKNOWN: u8 = 0xff;

/// Subfield identifier carrying the block size.
const BC_SUBFIELD_ID: [u8; 2] = [b'B', b'C'];

// ============================================================================
// Types
// ============================================================================

/// How to treat a stream that does not end with the BGZF EOF marker block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    /// A missing EOF marker is an [`BamError::InvalidFormat`] error.
    Strict,
    /// A missing EOF marker is logged as a warning.
    #[default]
    Lenient,
}

/// A block read from the stream together with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedBlock {
    /// 0-based position of the block in the physical stream.
    pub index: u64,
    /// Compressed byte offset of the first header byte.
    pub offset: u64,
    /// Total size of the block on disk (header + payload + footer).
    pub size: usize,
    /// The block's payload and trailer fields.
    pub block: BgzfBlock,
}

// ============================================================================
// Reading
// ============================================================================

/// Read into `buf` until it is full or the reader is exhausted.
///
/// Returns the number of bytes read.
fn read_fully<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Find the BSIZE value in the gzip extra field.
fn find_bsize(extra: &[u8]) -> Option<u16> {
    let mut pos = 0;
    while pos + 4 <= extra.len() {
        let id = [extra[pos], extra[pos + 1]];
        let len = u16::from_le_bytes([extra[pos + 2], extra[pos + 3]]) as usize;
        let data = extra.get(pos + 4..pos + 4 + len)?;
        if id == BC_SUBFIELD_ID && len == 2 {
            return Some(u16::from_le_bytes([data[0], data[1]]));
        }
        pos += 4 + len;
    }
    None
}

/// Read a single framed BGZF block.
///
/// Returns `Ok(Some(block))` if a block was read, `Ok(None)` if the stream
/// ended cleanly before the first header byte.
///
/// # Errors
///
/// - [`BamError::TruncatedStream`] if the stream ends inside the block
/// - [`BamError::InvalidFormat`] if the header is not a BGZF header
pub fn read_block<R: Read + ?Sized>(
    reader: &mut R,
    index: u64,
    offset: u64,
) -> Result<Option<FramedBlock>> {
    let mut fixed = [0u8; GZIP_FIXED_HEADER_SIZE];
    let n = read_fully(reader, &mut fixed)?;
    if n == 0 {
        return Ok(None);
    }
    if n < GZIP_FIXED_HEADER_SIZE {
        return Err(BamError::TruncatedStream { offset, expected: GZIP_FIXED_HEADER_SIZE, actual: n });
    }

    if fixed[0] != GZIP_ID1 || fixed[1] != GZIP_ID2 {
        return Err(BamError::invalid_format(format!(
            "invalid BGZF magic at offset {offset}: expected 0x1f 0x8b, got 0x{:02x} 0x{:02x}",
            fixed[0], fixed[1]
        )));
    }
    if fixed[2] != GZIP_CM_DEFLATE {
        return Err(BamError::invalid_format(format!(
            "invalid compression method at offset {offset}: expected 0x08, got 0x{:02x}",
            fixed[2]
        )));
    }
    if fixed[3] != GZIP_FLG_FEXTRA {
        return Err(BamError::invalid_format(format!(
            "unsupported gzip flags 0x{:02x} at offset {offset}: BGZF requires FEXTRA only",
            fixed[3]
        )));
    }

    let xlen = u16::from_le_bytes([fixed[10], fixed[11]]) as usize;
    let header_size = GZIP_FIXED_HEADER_SIZE + xlen;
    let mut extra = vec![0u8; xlen];
    let n = read_fully(reader, &mut extra)?;
    if n < xlen {
        return Err(BamError::TruncatedStream {
            offset,
            expected: header_size,
            actual: GZIP_FIXED_HEADER_SIZE + n,
        });
    }

    let bsize = find_bsize(&extra).ok_or_else(|| {
        BamError::invalid_format(format!("missing BC subfield in gzip header at offset {offset}"))
    })?;
    let size = bsize as usize + 1;
    if size < header_size + BGZF_FOOTER_SIZE {
        return Err(BamError::invalid_format(format!(
            "BGZF block at offset {offset} too small: {size} bytes"
        )));
    }

    let mut compressed_data = vec![0u8; size - header_size - BGZF_FOOTER_SIZE];
    let n = read_fully(reader, &mut compressed_data)?;
    if n < compressed_data.len() {
        return Err(BamError::TruncatedStream { offset, expected: size, actual: header_size + n });
    }

    let mut footer = [0u8; BGZF_FOOTER_SIZE];
    let n = read_fully(reader, &mut footer)?;
    if n < BGZF_FOOTER_SIZE {
        return Err(BamError::TruncatedStream {
            offset,
            expected: size,
            actual: size - BGZF_FOOTER_SIZE + n,
        });
    }

    let crc32 = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
    let input_size = u32::from_le_bytes([footer[4], footer[5], footer[6], footer[7]]);

    Ok(Some(FramedBlock { index, offset, size, block: BgzfBlock { compressed_data, input_size, crc32 } }))
}

/// Lazy sequence of framed blocks, ending at physical end of stream.
///
/// An EOF marker block in the middle of the stream is yielded like any other
/// block. Once an error has been yielded the framer is fused.
pub struct BlockFramer<R> {
    reader: R,
    index: u64,
    offset: u64,
    eof_policy: EofPolicy,
    last_was_eof_marker: bool,
    finished: bool,
}

impl<R: Read> BlockFramer<R> {
    /// Create a framer over a compressed byte stream.
    pub fn new(reader: R, eof_policy: EofPolicy) -> Self {
        Self { reader, index: 0, offset: 0, eof_policy, last_was_eof_marker: false, finished: false }
    }

    /// Number of blocks framed so far.
    #[must_use]
    pub fn blocks_read(&self) -> u64 {
        self.index
    }

    /// Compressed byte offset of the next block.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Applies the EOF policy once the physical stream has ended.
    fn check_terminal_marker(&self) -> Result<()> {
        if self.last_was_eof_marker {
            return Ok(());
        }
        match self.eof_policy {
            EofPolicy::Strict => Err(BamError::invalid_format(format!(
                "BGZF stream ended at offset {} without an EOF marker block",
                self.offset
            ))),
            EofPolicy::Lenient => {
                warn!("BGZF stream ended at offset {} without an EOF marker block", self.offset);
                Ok(())
            }
        }
    }
}

impl<R: Read + Seek> BlockFramer<R> {
    /// Seek the underlying reader back to byte zero and restart framing.
    pub fn rewind(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.index = 0;
        self.offset = 0;
        self.last_was_eof_marker = false;
        self.finished = false;
        Ok(())
    }
}

impl<R: Read> Iterator for BlockFramer<R> {
    type Item = Result<FramedBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match read_block(&mut self.reader, self.index, self.offset) {
            Ok(Some(framed)) => {
                trace!(
                    "Framed BGZF block {} at offset {} ({} bytes, isize {})",
                    framed.index, framed.offset, framed.size, framed.block.input_size
                );
                self.index += 1;
                self.offset += framed.size as u64;
                self.last_was_eof_marker = framed.block.is_eof_marker();
                Some(Ok(framed))
            }
            Ok(None) => {
                self.finished = true;
                self.check_terminal_marker().err().map(Err)
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Write one block with the standard 18-byte BGZF header.
///
/// Returns the number of bytes written.
pub fn write_block<W: Write + ?Sized>(writer: &mut W, block: &BgzfBlock) -> io::Result<usize> {
    let total = block.framed_size();
    let bsize = u16::try_from(total - 1).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("BGZF block too large: {total} bytes"))
    })?;

    let mut header = [0u8; BGZF_HEADER_SIZE];
    header[0] = GZIP_ID1;
    header[1] = GZIP_ID2;
    header[2] = GZIP_CM_DEFLATE;
    header[3] = GZIP_FLG_FEXTRA;
    // MTIME (4..8) and XFL (8) stay zero
    header[9] = GZIP_OS_UNKNOWN;
    header[10..12].copy_from_slice(&6u16.to_le_bytes()); // XLEN
    header[12..14].copy_from_slice(&BC_SUBFIELD_ID);
    header[14..16].copy_from_slice(&2u16.to_le_bytes()); // SLEN
    header[16..18].copy_from_slice(&bsize.to_le_bytes());

    writer.write_all(&header)?;
    writer.write_all(&block.compressed_data)?;
    writer.write_all(&block.crc32.to_le_bytes())?;
    writer.write_all(&block.input_size.to_le_bytes())?;

    Ok(total)
}

// ============================================================================
// Tests
// ============================================================================
