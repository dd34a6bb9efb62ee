//! Single-block BGZF codec.
//!
//! [`decode`] and [`encode`] are pure functions over one block: no I/O and no
//! shared state. The `_with` variants take a caller-owned libdeflater
//! (de)compressor so that a worker can reuse it across blocks; worker threads
//! use a thread-local one via `decode_on_worker` / `encode_on_worker`.

use std::cell::RefCell;

use libdeflater::{CompressionLvl, Compressor, Decompressor};

use super::{BGZF_FOOTER_SIZE, BGZF_HEADER_SIZE, MAX_BLOCK_PAYLOAD, MAX_BLOCK_SIZE};
use crate::errors::{BamError, Result};

/// Raw deflate encoding of an empty payload.
const EMPTY_DEFLATE: [u8; 2] = [0x03, 0x00];

/// Level used when [`CompressionLevel::Default`] is requested.
const DEFAULT_LEVEL: u8 = 6;

/// Highest level supported by libdeflate.
const MAX_LEVEL: u8 = 12;

/// The decoded view of one BGZF block: its deflate payload plus the trailer fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgzfBlock {
    /// Raw deflate data between the header and the footer.
    pub compressed_data: Vec<u8>,
    /// Uncompressed length (ISIZE). Zero marks an EOF block.
    pub input_size: u32,
    /// CRC32 of the uncompressed data.
    pub crc32: u32,
}

impl BgzfBlock {
    /// Returns true if this block carries no data (`input_size == 0`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input_size == 0
    }

    /// Returns true if this block is byte-for-byte the canonical EOF marker payload.
    #[must_use]
    pub fn is_eof_marker(&self) -> bool {
        self.input_size == 0 && self.crc32 == 0 && self.compressed_data == EMPTY_DEFLATE
    }

    /// Total framed size of this block when written with the standard header.
    #[must_use]
    pub fn framed_size(&self) -> usize {
        BGZF_HEADER_SIZE + self.compressed_data.len() + BGZF_FOOTER_SIZE
    }
}

/// Compression level for the encode path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionLevel {
    /// libdeflate's default level (6).
    #[default]
    Default,
    /// An explicit level in `1..=12`.
    Level(u8),
}

impl CompressionLevel {
    /// Create an explicit compression level, validating the range `1..=12`.
    pub fn new(level: u8) -> Result<Self> {
        if (1..=MAX_LEVEL).contains(&level) {
            Ok(Self::Level(level))
        } else {
            Err(BamError::invalid_parameter(
                "compression-level",
                format!("{level} is outside 1..={MAX_LEVEL}"),
            ))
        }
    }

    /// The numeric level this resolves to.
    #[must_use]
    pub fn value(self) -> u8 {
        match self {
            Self::Default => DEFAULT_LEVEL,
            Self::Level(level) => level,
        }
    }

    fn to_libdeflate(self) -> Result<CompressionLvl> {
        let level = Self::new(self.value())?.value();
        CompressionLvl::new(i32::from(level)).map_err(|e| {
            BamError::invalid_parameter("compression-level", format!("{level}: {e:?}"))
        })
    }

    /// Build a libdeflater compressor for this level.
    pub fn compressor(self) -> Result<Compressor> {
        Ok(Compressor::new(self.to_libdeflate()?))
    }
}

/// Decompress a block, validating its size and CRC32.
///
/// `offset` is the compressed byte offset of the block and is only used as
/// error context.
pub fn decode(block: &BgzfBlock, offset: u64) -> Result<Vec<u8>> {
    if block.is_empty() {
        return Ok(Vec::new());
    }
    decode_with(block, offset, &mut Decompressor::new())
}

/// Decompress a block using a reusable decompressor.
///
/// # Errors
///
/// Returns [`BamError::CorruptBlock`] if:
/// - ISIZE exceeds [`MAX_BLOCK_SIZE`]
/// - the deflate data is malformed
/// - the output length differs from ISIZE
/// - the CRC32 of the output differs from the footer
pub fn decode_with(
    block: &BgzfBlock,
    offset: u64,
    decompressor: &mut Decompressor,
) -> Result<Vec<u8>> {
    // EOF and other empty blocks are never validated
    if block.is_empty() {
        return Ok(Vec::new());
    }

    let expected = block.input_size as usize;
    if expected > MAX_BLOCK_SIZE {
        return Err(BamError::CorruptBlock {
            offset,
            reason: format!("ISIZE {expected} exceeds {MAX_BLOCK_SIZE}"),
        });
    }
    let mut uncompressed = vec![0u8; expected];

    let written = decompressor
        .deflate_decompress(&block.compressed_data, &mut uncompressed)
        .map_err(|e| BamError::CorruptBlock {
            offset,
            reason: format!("deflate decompression failed: {e:?}"),
        })?;

    if written != expected {
        return Err(BamError::CorruptBlock {
            offset,
            reason: format!("decompressed {written} bytes, ISIZE declares {expected}"),
        });
    }

    let actual_crc = crc32fast::hash(&uncompressed);
    if actual_crc != block.crc32 {
        return Err(BamError::CorruptBlock {
            offset,
            reason: format!(
                "CRC32 mismatch: expected 0x{:08x}, got 0x{actual_crc:08x}",
                block.crc32
            ),
        });
    }

    Ok(uncompressed)
}

/// Compress a payload into a block at the requested level.
pub fn encode(payload: &[u8], level: CompressionLevel) -> Result<BgzfBlock> {
    encode_with(payload, &mut level.compressor()?)
}

/// Compress a payload into a block using a reusable compressor.
///
/// # Errors
///
/// Returns [`BamError::InvalidParameter`] if the payload exceeds
/// [`MAX_BLOCK_PAYLOAD`], or if the compressed block would not fit the
/// 16-bit BSIZE field.
pub fn encode_with(payload: &[u8], compressor: &mut Compressor) -> Result<BgzfBlock> {
    if payload.len() > MAX_BLOCK_PAYLOAD {
        return Err(BamError::invalid_parameter(
            "payload",
            format!("{} bytes exceeds the BGZF block limit of {MAX_BLOCK_PAYLOAD}", payload.len()),
        ));
    }

    // libdeflate stores very short inputs uncompressed; keep the canonical
    // empty encoding so an empty block is always the EOF marker
    if payload.is_empty() {
        return Ok(BgzfBlock { compressed_data: EMPTY_DEFLATE.to_vec(), input_size: 0, crc32: 0 });
    }

    let bound = compressor.deflate_compress_bound(payload.len());
    let mut compressed = vec![0u8; bound];
    let written = compressor
        .deflate_compress(payload, &mut compressed)
        .map_err(|e| std::io::Error::other(format!("BGZF compression failed: {e:?}")))?;
    compressed.truncate(written);

    let block = BgzfBlock {
        compressed_data: compressed,
        input_size: payload.len() as u32,
        crc32: crc32fast::hash(payload),
    };

    if block.framed_size() > MAX_BLOCK_SIZE {
        return Err(BamError::invalid_parameter(
            "payload",
            format!("compressed block of {} bytes exceeds {MAX_BLOCK_SIZE}", block.framed_size()),
        ));
    }

    Ok(block)
}

#[cfg(any(feature = "parallel", test))]
thread_local! {
    static DECOMPRESSOR: RefCell<Option<Decompressor>> = const { RefCell::new(None) };
}

thread_local! {
    static COMPRESSOR: RefCell<Option<(u8, Compressor)>> = const { RefCell::new(None) };
}

/// [`decode_with`] using a decompressor owned by the current thread.
#[cfg(any(feature = "parallel", test))]
pub(crate) fn decode_on_worker(block: &BgzfBlock, offset: u64) -> Result<Vec<u8>> {
    DECOMPRESSOR.with(|cell| {
        let mut slot = cell.borrow_mut();
        let decompressor = slot.get_or_insert_with(Decompressor::new);
        decode_with(block, offset, decompressor)
    })
}

/// [`encode_with`] using a compressor owned by the current thread.
///
/// The cached compressor is rebuilt when a different level is requested.
pub(crate) fn encode_on_worker(payload: &[u8], level: CompressionLevel) -> Result<BgzfBlock> {
    COMPRESSOR.with(|cell| {
        let mut slot = cell.borrow_mut();
        let mut compressor = match slot.take() {
            Some((cached, compressor)) if cached == level.value() => compressor,
            _ => level.compressor()?,
        };
        let result = encode_with(payload, &mut compressor);
        *slot = Some((level.value(), compressor));
        result
    })
}

// ============================================================================
// Tests
// ============================================================================
