//! BGZF (Blocked GZIP Format) block I/O.
//!
//! BGZF is a variant of gzip that stores data in independent blocks, each up
//! to 64KB uncompressed. Every block is a complete gzip member:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ Header (12 bytes + XLEN)                                        │
//! │  - Magic: 0x1f 0x8b (gzip)                                      │
//! │  - Method: 0x08 (deflate)                                       │
//! │  - Flags: 0x04 (FEXTRA)                                         │
//! │  - MTIME, XFL, OS: 6 bytes                                      │
//! │  - XLEN: 2 bytes (= 6 for blocks we write)                      │
//! │  - Subfield: "BC" + len(2) + BSIZE(2)                           │
//! │    where BSIZE = total_block_size - 1                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Compressed data (raw deflate)                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Footer (8 bytes)                                                │
//! │  - CRC32: 4 bytes                                               │
//! │  - ISIZE: 4 bytes (uncompressed size)                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The modules here are layered leaves first:
//!
//! - [`codec`] - decode/encode a single block payload, no I/O
//! - [`framer`] - read/write block framing against a byte stream
//! - [`pipeline`] - ordered (optionally parallel) decompression of framed blocks
//! - [`writer`] - buffering [`std::io::Write`] that emits framed blocks and the EOF marker

pub mod codec;
pub mod framer;
pub mod pipeline;
pub mod writer;

pub use codec::{BgzfBlock, CompressionLevel, decode, encode};
pub use framer::{BlockFramer, EofPolicy, FramedBlock, read_block, write_block};
pub use pipeline::{DecompressionPipeline, PipelineStats};
pub use writer::BlockWriter;

/// Size of the BGZF block header as written by [`write_block`].
pub const BGZF_HEADER_SIZE: usize = 18;

/// Size of the BGZF block footer (CRC32 + ISIZE).
pub const BGZF_FOOTER_SIZE: usize = 8;

/// Maximum uncompressed payload of a single block (64KB - header/footer overhead).
pub const MAX_BLOCK_PAYLOAD: usize = 65280;

/// Maximum total size of a framed block, bounded by the 16-bit BSIZE field.
pub const MAX_BLOCK_SIZE: usize = 65536;

/// BGZF EOF marker block (empty block signaling end of file).
pub const BGZF_EOF: [u8; 28] = [
    0x1f, 0x8b, // ID1, ID2
    0x08, // CM = DEFLATE
    0x04, // FLG = FEXTRA
    0x00, 0x00, 0x00, 0x00, // MTIME = 0
    0x00, // XFL = 0
    0xff, // OS = 255 (unknown)
    0x06, 0x00, // XLEN = 6
    0x42, 0x43, // SI1, SI2
    0x02, 0x00, // SLEN = 2
    0x1b, 0x00, // BSIZE = 27
    0x03, 0x00, // CDATA
    0x00, 0x00, 0x00, 0x00, // CRC32 = 0x00000000
    0x00, 0x00, 0x00, 0x00, // ISIZE = 0
];
