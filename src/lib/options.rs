//! Reader and writer configuration.
//!
//! Both option types follow the builder idiom: start from `default()` and
//! chain `with_*` calls. Values are validated when a reader or writer is
//! constructed from them.
//!
//! ```
//! use fgbam_lib::bgzf::{CompressionLevel, EofPolicy};
//! use fgbam_lib::options::{ReaderOptions, WriterOptions};
//!
//! # fn main() -> fgbam_lib::errors::Result<()> {
//! let reader_options = ReaderOptions::default()
//!     .with_threads(4)?
//!     .with_granularity(32)
//!     .with_eof_policy(EofPolicy::Strict);
//! assert_eq!(reader_options.granularity(), 32);
//!
//! let writer_options =
//!     WriterOptions::default().with_compression_level(CompressionLevel::new(9)?);
//! assert_eq!(writer_options.compression_level().value(), 9);
//! # Ok(())
//! # }
//! ```

use crate::bgzf::{CompressionLevel, EofPolicy, MAX_BLOCK_PAYLOAD};
use crate::errors::{BamError, Result};
use crate::worker_pool::WorkerPool;

/// Default number of blocks allowed in flight on the worker pool.
pub const DEFAULT_GRANULARITY: usize = 64;

fn validate_granularity(granularity: usize) -> Result<()> {
    if granularity == 0 {
        return Err(BamError::invalid_parameter("granularity", "must be >= 1"));
    }
    Ok(())
}

/// Whether a configured pool is actually used by this build.
fn effective_pool(pool: Option<&WorkerPool>) -> Option<&WorkerPool> {
    if cfg!(feature = "parallel") { pool } else { None }
}

// ============================================================================
// ReaderOptions
// ============================================================================

/// Options for [`DecompressionPipeline`](crate::bgzf::DecompressionPipeline)
/// and [`BamReader`](crate::bam::BamReader).
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pool: Option<WorkerPool>,
    granularity: usize,
    eof_policy: EofPolicy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { pool: None, granularity: DEFAULT_GRANULARITY, eof_policy: EofPolicy::default() }
    }
}

impl ReaderOptions {
    /// Decompress on an existing (possibly shared) pool.
    #[must_use]
    pub fn with_pool(mut self, pool: WorkerPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Decompress on a new private pool of `threads` threads.
    ///
    /// A single thread selects serial decompression on the calling thread.
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        self.pool = match threads {
            0 => return Err(BamError::invalid_parameter("threads", "must be >= 1")),
            1 => None,
            n => Some(WorkerPool::new(n)?),
        };
        Ok(self)
    }

    /// Decompress serially on the calling thread.
    #[must_use]
    pub fn serial(mut self) -> Self {
        self.pool = None;
        self
    }

    /// Maximum number of blocks decoded ahead of the consumer.
    #[must_use]
    pub fn with_granularity(mut self, granularity: usize) -> Self {
        self.granularity = granularity;
        self
    }

    /// How to treat a stream missing its EOF marker.
    #[must_use]
    pub fn with_eof_policy(mut self, eof_policy: EofPolicy) -> Self {
        self.eof_policy = eof_policy;
        self
    }

    /// The pool decompression will run on, if any.
    ///
    /// Always `None` when the crate is built without the `parallel` feature.
    #[must_use]
    pub fn pool(&self) -> Option<&WorkerPool> {
        effective_pool(self.pool.as_ref())
    }

    /// Maximum number of blocks in flight.
    #[must_use]
    pub fn granularity(&self) -> usize {
        self.granularity
    }

    /// The configured EOF policy.
    #[must_use]
    pub fn eof_policy(&self) -> EofPolicy {
        self.eof_policy
    }

    /// Check the option values.
    pub fn validate(&self) -> Result<()> {
        validate_granularity(self.granularity)
    }
}

// ============================================================================
// WriterOptions
// ============================================================================

/// Options for [`BlockWriter`](crate::bgzf::BlockWriter) and
/// [`BamWriter`](crate::bam::BamWriter).
#[derive(Debug, Clone)]
pub struct WriterOptions {
    compression_level: CompressionLevel,
    block_size: usize,
    pool: Option<WorkerPool>,
    granularity: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression_level: CompressionLevel::Default,
            block_size: MAX_BLOCK_PAYLOAD,
            pool: None,
            granularity: DEFAULT_GRANULARITY,
        }
    }
}

impl WriterOptions {
    /// Sets the compression level.
    #[must_use]
    pub fn with_compression_level(mut self, level: CompressionLevel) -> Self {
        self.compression_level = level;
        self
    }

    /// Sets the maximum uncompressed size per block (`1..=65280`).
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Compress on an existing (possibly shared) pool.
    #[must_use]
    pub fn with_pool(mut self, pool: WorkerPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Compress on a new private pool of `threads` threads.
    ///
    /// A single thread selects inline compression on the calling thread.
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        self.pool = match threads {
            0 => return Err(BamError::invalid_parameter("threads", "must be >= 1")),
            1 => None,
            n => Some(WorkerPool::new(n)?),
        };
        Ok(self)
    }

    /// Maximum number of blocks compressed ahead of the output.
    #[must_use]
    pub fn with_granularity(mut self, granularity: usize) -> Self {
        self.granularity = granularity;
        self
    }

    /// The configured compression level.
    #[must_use]
    pub fn compression_level(&self) -> CompressionLevel {
        self.compression_level
    }

    /// Maximum uncompressed bytes per block.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The pool compression will run on, if any.
    ///
    /// Always `None` when the crate is built without the `parallel` feature.
    #[must_use]
    pub fn pool(&self) -> Option<&WorkerPool> {
        effective_pool(self.pool.as_ref())
    }

    /// Maximum number of blocks in flight.
    #[must_use]
    pub fn granularity(&self) -> usize {
        self.granularity
    }

    /// Check the option values.
    pub fn validate(&self) -> Result<()> {
        validate_granularity(self.granularity)?;
        if !(1..=MAX_BLOCK_PAYLOAD).contains(&self.block_size) {
            return Err(BamError::invalid_parameter(
                "block-size",
                format!("{} is outside 1..={MAX_BLOCK_PAYLOAD}", self.block_size),
            ));
        }
        // Validates explicit levels constructed without `CompressionLevel::new`
        CompressionLevel::new(self.compression_level.value())?;
        Ok(())
    }
}
