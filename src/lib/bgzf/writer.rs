//! Buffering BGZF writer.
//!
//! [`BlockWriter`] accumulates bytes up to the configured block size, encodes
//! each full buffer as one BGZF block and writes it to the inner writer.
//! [`finish`](BlockWriter::finish) writes the trailing partial block and the
//! EOF marker. With a [`WorkerPool`] in the options, encoding runs on the pool
//! and blocks are written in submission order.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::mem;

use libdeflater::Compressor;
use log::{debug, warn};

use super::codec::{BgzfBlock, CompressionLevel, encode_on_worker, encode_with};
use super::framer::write_block;
use super::BGZF_EOF;
use crate::errors::Result;
use crate::logging::{format_bytes, format_count};
use crate::options::WriterOptions;
use crate::worker_pool::{Ticket, WorkerPool};

/// A [`Write`] implementation producing a BGZF stream.
///
/// Dropping an unfinished writer finishes it; errors during that implicit
/// finish can only be logged, so call [`finish`](Self::finish) explicitly.
/// Once encoding or writing a block has failed the writer is poisoned: it
/// never writes the EOF marker, so the damaged stream does not look complete.
pub struct BlockWriter<W: Write> {
    inner: Option<W>,
    buffer: Vec<u8>,
    block_size: usize,
    level: CompressionLevel,
    compressor: Compressor,
    pool: Option<WorkerPool>,
    granularity: usize,
    pending: VecDeque<Ticket<Result<BgzfBlock>>>,
    blocks_written: u64,
    bytes_written: u64,
    poisoned: bool,
}

impl<W: Write> BlockWriter<W> {
    /// Create a writer with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`BamError::InvalidParameter`](crate::errors::BamError::InvalidParameter)
    /// if the options are invalid.
    pub fn new(writer: W, options: &WriterOptions) -> Result<Self> {
        options.validate()?;
        let level = options.compression_level();
        Ok(Self {
            inner: Some(writer),
            buffer: Vec::with_capacity(options.block_size()),
            block_size: options.block_size(),
            level,
            compressor: level.compressor()?,
            pool: options.pool().cloned(),
            granularity: options.granularity(),
            pending: VecDeque::new(),
            blocks_written: 0,
            bytes_written: 0,
            poisoned: false,
        })
    }

    /// Number of blocks written to the inner writer, including the EOF marker.
    #[must_use]
    pub fn blocks_written(&self) -> u64 {
        self.blocks_written
    }

    /// Number of compressed bytes written to the inner writer.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Returns true if an earlier block failed to encode or write.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Returns a reference to the inner writer, or `None` once finished.
    pub fn get_ref(&self) -> Option<&W> {
        self.inner.as_ref()
    }

    fn inner_mut(&mut self) -> io::Result<&mut W> {
        self.inner.as_mut().ok_or_else(|| io::Error::other("BGZF writer already finished"))
    }

    fn check_poisoned(&self) -> io::Result<()> {
        if self.poisoned {
            return Err(io::Error::other("BGZF writer is poisoned by an earlier error"));
        }
        Ok(())
    }

    /// Record a failure so the stream is never completed with an EOF marker.
    fn poison_on_error<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    fn write_framed(&mut self, block: &BgzfBlock) -> Result<()> {
        let n = write_block(self.inner_mut()?, block)?;
        self.blocks_written += 1;
        self.bytes_written += n as u64;
        Ok(())
    }

    /// Encode the buffered bytes as one block.
    fn send_buffer(&mut self) -> Result<()> {
        let result = self.try_send_buffer();
        self.poison_on_error(result)
    }

    fn try_send_buffer(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let payload = mem::replace(&mut self.buffer, Vec::with_capacity(self.block_size));
        let Some(pool) = &self.pool else {
            let block = encode_with(&payload, &mut self.compressor)?;
            return self.write_framed(&block);
        };
        let level = self.level;
        let ticket = pool.submit(move || encode_on_worker(&payload, level));
        self.pending.push_back(ticket);
        while self.pending.len() >= self.granularity {
            self.write_next_pending()?;
        }
        Ok(())
    }

    /// Wait for the oldest in-flight block and write it.
    fn write_next_pending(&mut self) -> Result<()> {
        if let Some(ticket) = self.pending.pop_front() {
            let block = ticket.wait().and_then(|r| r)?;
            self.write_framed(&block)?;
        }
        Ok(())
    }

    fn drain_pending(&mut self) -> Result<()> {
        let mut result = Ok(());
        while result.is_ok() && !self.pending.is_empty() {
            result = self.write_next_pending();
        }
        self.poison_on_error(result)
    }

    fn write_eof(&mut self) -> Result<()> {
        let inner = self.inner_mut()?;
        inner.write_all(&BGZF_EOF)?;
        inner.flush()?;
        self.blocks_written += 1;
        self.bytes_written += BGZF_EOF.len() as u64;
        Ok(())
    }

    /// Write any buffered data, the EOF marker, and return the inner writer.
    ///
    /// # Errors
    ///
    /// Fails if encoding or writing fails, if an earlier write failed, or if
    /// the writer was already finished.
    pub fn finish(&mut self) -> Result<W> {
        self.inner_mut()?;
        self.check_poisoned()?;
        self.send_buffer()?;
        self.drain_pending()?;

        let result = self.write_eof();
        self.poison_on_error(result)?;

        debug!(
            "Wrote {} BGZF blocks ({})",
            format_count(self.blocks_written),
            format_bytes(self.bytes_written)
        );
        self.inner.take().ok_or_else(|| io::Error::other("BGZF writer already finished").into())
    }
}

impl<W: Write> Write for BlockWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner_mut()?;
        self.check_poisoned()?;
        let n = buf.len().min(self.block_size - self.buffer.len());
        self.buffer.extend_from_slice(&buf[..n]);
        if self.buffer.len() == self.block_size {
            self.send_buffer()?;
        }
        Ok(n)
    }

    /// Emit the partial buffer as a block and flush the inner writer.
    fn flush(&mut self) -> io::Result<()> {
        self.check_poisoned()?;
        self.send_buffer()?;
        self.drain_pending()?;
        self.inner_mut()?.flush()
    }
}

impl<W: Write> Drop for BlockWriter<W> {
    fn drop(&mut self) {
        if self.inner.is_none() {
            return;
        }
        if self.poisoned {
            warn!("Dropping poisoned BGZF writer; the stream has no EOF marker");
            return;
        }
        if let Err(e) = self.finish() {
            warn!("Failed to finish BGZF stream on drop: {e}");
        }
    }
}
