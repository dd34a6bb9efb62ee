//! BAM container reading and writing on top of BGZF.
//!
//! - [`header`] - header text and reference dictionary values
//! - [`reader`] - container parser with lazy record iteration and rewind
//! - [`record`] - opaque record blobs with in-place flag patching
//! - [`writer`] - container serialization into a BGZF stream

pub mod header;
pub mod reader;
pub mod record;
pub mod writer;

pub use header::{Header, ReferenceSequence};
pub use reader::{Alignments, BamReader, ParserState};
pub use record::{RecordBlob, flags};
pub use writer::{BamWriter, write_container_header};

/// Magic bytes at the start of the decompressed container.
pub const BAM_MAGIC: &[u8; 4] = b"BAM\x01";
