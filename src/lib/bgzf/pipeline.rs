//! Ordered BGZF decompression, serial or on a worker pool.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  BlockFramer    │───>│  Ticket FIFO    │───>│    Consumer     │
//! │ (caller thread) │    │ (≤ granularity) │    │ (ordered pops)  │
//! └─────────────────┘    └────────┬────────┘    └─────────────────┘
//!                                 │ submit / wait
//!                        ┌────────┴────────┐
//!                        │   WorkerPool    │
//!                        │ (decode blocks) │
//!                        └─────────────────┘
//! ```
//!
//! Each framed block is either decoded inline (serial mode) or submitted to
//! the pool, and its slot is appended to a FIFO. The consumer always pops the
//! front slot, so chunks and errors come out in source-block order even when
//! workers finish out of order. A framing or decode error therefore surfaces
//! exactly when its block's turn comes.

use std::collections::VecDeque;
use std::io::{Read, Seek};

use libdeflater::Decompressor;
use log::debug;

#[cfg(feature = "parallel")]
use super::codec::decode_on_worker;
use super::codec::decode_with;
use super::framer::{BlockFramer, FramedBlock};
use crate::errors::Result;
use crate::logging::{format_bytes, format_count};
use crate::options::ReaderOptions;
#[cfg(feature = "parallel")]
use crate::worker_pool::Ticket;
use crate::worker_pool::WorkerPool;

/// Counters for one pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Blocks delivered to the consumer.
    pub blocks: u64,
    /// Framed (compressed) bytes of the delivered blocks.
    pub compressed_bytes: u64,
    /// Decompressed bytes delivered.
    pub decompressed_bytes: u64,
}

enum Mode {
    Serial(Decompressor),
    #[cfg(feature = "parallel")]
    Parallel(WorkerPool),
}

enum Slot {
    /// Already decoded, or an error from the framer.
    Ready { size: usize, result: Result<Vec<u8>> },
    /// Decoding on the pool.
    #[cfg(feature = "parallel")]
    Pending { size: usize, ticket: Ticket<Result<Vec<u8>>> },
}

/// Iterator of decompressed chunks in source-block order.
pub struct DecompressionPipeline<R> {
    framer: BlockFramer<R>,
    mode: Mode,
    queue: VecDeque<Slot>,
    granularity: usize,
    stats: PipelineStats,
    done: bool,
}

impl<R: Read> DecompressionPipeline<R> {
    /// Build a pipeline from reader options.
    ///
    /// Uses the options' pool when one is configured (and the `parallel`
    /// feature is enabled), otherwise decodes serially.
    pub fn new(reader: R, options: &ReaderOptions) -> Result<Self> {
        options.validate()?;
        let framer = BlockFramer::new(reader, options.eof_policy());
        let mode = match options.pool() {
            Some(pool) => Self::pool_mode(pool.clone()),
            None => Mode::Serial(Decompressor::new()),
        };
        Ok(Self::with_mode(framer, mode, options.granularity()))
    }

    /// A pipeline that decodes every block on the calling thread.
    pub fn serial(framer: BlockFramer<R>) -> Self {
        Self::with_mode(framer, Mode::Serial(Decompressor::new()), 1)
    }

    /// A pipeline that decodes on `pool` with at most `granularity` blocks in flight.
    ///
    /// A granularity of zero is treated as one. Without the `parallel`
    /// feature the pool is ignored and blocks are decoded serially.
    pub fn parallel(framer: BlockFramer<R>, pool: WorkerPool, granularity: usize) -> Self {
        Self::with_mode(framer, Self::pool_mode(pool), granularity.max(1))
    }

    #[cfg(feature = "parallel")]
    fn pool_mode(pool: WorkerPool) -> Mode {
        Mode::Parallel(pool)
    }

    #[cfg(not(feature = "parallel"))]
    fn pool_mode(_pool: WorkerPool) -> Mode {
        Mode::Serial(Decompressor::new())
    }

    fn with_mode(framer: BlockFramer<R>, mode: Mode, granularity: usize) -> Self {
        Self {
            framer,
            mode,
            queue: VecDeque::new(),
            granularity,
            stats: PipelineStats::default(),
            done: false,
        }
    }

    /// Returns true if blocks are decoded on a worker pool.
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        match self.mode {
            Mode::Serial(_) => false,
            #[cfg(feature = "parallel")]
            Mode::Parallel(_) => true,
        }
    }

    /// Counters for the chunks delivered so far.
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Number of blocks framed but not yet delivered.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.queue.len()
    }

    /// Returns the underlying reader, discarding any in-flight blocks.
    pub fn into_inner(self) -> R {
        self.framer.into_inner()
    }

    fn schedule(&mut self, framed: FramedBlock) -> Slot {
        let size = framed.size;
        match &mut self.mode {
            Mode::Serial(decompressor) => {
                Slot::Ready { size, result: decode_with(&framed.block, framed.offset, decompressor) }
            }
            #[cfg(feature = "parallel")]
            Mode::Parallel(pool) => {
                let ticket = pool.submit(move || decode_on_worker(&framed.block, framed.offset));
                Slot::Pending { size, ticket }
            }
        }
    }

    /// Frame blocks until `granularity` slots are queued or the framer ends.
    fn fill(&mut self) {
        while self.queue.len() < self.granularity {
            let slot = match self.framer.next() {
                None => break,
                Some(Ok(framed)) => self.schedule(framed),
                Some(Err(e)) => Slot::Ready { size: 0, result: Err(e) },
            };
            self.queue.push_back(slot);
        }
    }
}

impl<R: Read + Seek> DecompressionPipeline<R> {
    /// Discard in-flight blocks and restart from byte zero of the reader.
    pub fn rewind(&mut self) -> Result<()> {
        self.queue.clear();
        self.framer.rewind()?;
        self.stats = PipelineStats::default();
        self.done = false;
        Ok(())
    }
}

impl<R: Read> Iterator for DecompressionPipeline<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.fill();

        let (size, result) = match self.queue.pop_front() {
            None => {
                self.done = true;
                self.log_summary();
                return None;
            }
            Some(Slot::Ready { size, result }) => (size, result),
            #[cfg(feature = "parallel")]
            Some(Slot::Pending { size, ticket }) => (size, ticket.wait().and_then(|r| r)),
        };

        match &result {
            Ok(chunk) => {
                self.stats.blocks += 1;
                self.stats.compressed_bytes += size as u64;
                self.stats.decompressed_bytes += chunk.len() as u64;
            }
            Err(_) => {
                // Everything after the failed block is unreachable
                self.done = true;
                self.queue.clear();
            }
        }
        Some(result)
    }
}

impl<R> DecompressionPipeline<R> {
    fn log_summary(&self) {
        debug!(
            "Decompressed {} BGZF blocks: {} -> {}",
            format_count(self.stats.blocks),
            format_bytes(self.stats.compressed_bytes),
            format_bytes(self.stats.decompressed_bytes),
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
