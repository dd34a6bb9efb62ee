//! Custom error types for fgbam operations.

use std::io;

use thiserror::Error;

/// Result type alias for fgbam operations
pub type Result<T> = std::result::Result<T, BamError>;

/// Error type for BGZF and BAM operations
#[derive(Error, Debug)]
pub enum BamError {
    /// Bad magic, structurally impossible counts, or a non-BGZF block header
    #[error("Invalid format: {reason}")]
    InvalidFormat {
        /// Explanation of the problem
        reason: String,
    },

    /// Fewer bytes were available than a length field declared
    #[error("Truncated stream at offset {offset}: expected {expected} bytes, got {actual}")]
    TruncatedStream {
        /// Compressed byte offset of the block being read
        offset: u64,
        /// Number of bytes declared by the framing
        expected: usize,
        /// Number of bytes actually available
        actual: usize,
    },

    /// Size or checksum mismatch after decompressing a block
    #[error("Corrupt BGZF block at offset {offset}: {reason}")]
    CorruptBlock {
        /// Compressed byte offset of the block
        offset: u64,
        /// What failed to validate
        reason: String,
    },

    /// The decompressed stream ran out in the middle of a read
    #[error("Unexpected end of stream: requested {requested} bytes, {available} available")]
    UnexpectedEndOfStream {
        /// Number of bytes the read asked for
        requested: usize,
        /// Number of bytes that were left
        available: usize,
    },

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// I/O error from the underlying reader or writer
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BamError {
    pub(crate) fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat { reason: reason.into() }
    }

    pub(crate) fn invalid_parameter(parameter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { parameter: parameter.to_string(), reason: reason.into() }
    }
}

impl From<BamError> for io::Error {
    fn from(error: BamError) -> Self {
        match error {
            BamError::Io(e) => e,
            BamError::UnexpectedEndOfStream { .. } | BamError::TruncatedStream { .. } => {
                io::Error::new(io::ErrorKind::UnexpectedEof, error)
            }
            BamError::InvalidParameter { .. } => io::Error::new(io::ErrorKind::InvalidInput, error),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
