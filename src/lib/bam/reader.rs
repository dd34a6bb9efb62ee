//! BAM container parser.
//!
//! The decompressed container is laid out as:
//!
//! ```text
//! magic      "BAM\1"
//! l_text     i32
//! text       l_text bytes
//! n_ref      i32
//! n_ref x {
//!   l_name   i32
//!   name     l_name bytes, NUL terminated
//!   l_ref    i32
//! }
//! records    { block_size: i32, block_size bytes }*
//! ```
//!
//! [`BamReader`] parses everything up to the records when it is opened and
//! then hands out records lazily through [`BamReader::alignments`].

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::debug;

use super::BAM_MAGIC;
use super::header::{Header, ReferenceSequence};
use super::record::{FIXED_FIELDS_SIZE, RecordBlob};
use crate::bgzf::{DecompressionPipeline, PipelineStats};
use crate::chunk_stream::ChunkStream;
use crate::errors::{BamError, Result};
use crate::logging::format_count;
use crate::options::ReaderOptions;

/// Upper bound on the reference dictionary capacity reserved up front.
const MAX_REFERENCE_PREALLOCATION: usize = 1024;

/// How far the parser has read into the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Nothing parsed since the start of the stream.
    Unopened,
    /// Magic and header text parsed.
    HeaderRead,
    /// Reference dictionary parsed; positioned at the first record.
    ReferencesRead,
    /// Reading of the records section has been attempted.
    AlignmentsStreaming,
}

/// Reader for a BGZF-compressed BAM container.
pub struct BamReader<R> {
    stream: ChunkStream<DecompressionPipeline<R>>,
    header: Header,
    references: Vec<ReferenceSequence>,
    state: ParserState,
}

impl BamReader<BufReader<File>> {
    /// Open the BAM file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or its header cannot be parsed.
    pub fn from_path<P: AsRef<Path>>(path: P, options: &ReaderOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file), options)
    }
}

impl<R: Read> BamReader<R> {
    /// Create a reader and parse the container header.
    ///
    /// # Errors
    ///
    /// - [`BamError::InvalidFormat`] for a bad magic or impossible counts
    /// - [`BamError::InvalidParameter`] for invalid options
    /// - any BGZF error from the blocks holding the header
    pub fn new(reader: R, options: &ReaderOptions) -> Result<Self> {
        let pipeline = DecompressionPipeline::new(reader, options)?;
        let mut this = Self {
            stream: ChunkStream::new(pipeline),
            header: Header::default(),
            references: Vec::new(),
            state: ParserState::Unopened,
        };
        let (header, references) = this.read_preamble()?;
        debug!(
            "Opened BAM: {} bytes of header text, {} reference sequences",
            format_count(header.len() as u64),
            format_count(references.len() as u64)
        );
        this.header = header;
        this.references = references;
        Ok(this)
    }

    /// The container header text.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The reference dictionary, in file order.
    #[must_use]
    pub fn reference_sequences(&self) -> &[ReferenceSequence] {
        &self.references
    }

    /// Index of the reference named `name`.
    #[must_use]
    pub fn reference_index(&self, name: &str) -> Option<usize> {
        self.references.iter().position(|r| r.name == name)
    }

    /// Current parser state.
    #[must_use]
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Decompression counters since the last (re)start.
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        self.stream.get_ref().stats()
    }

    /// Read the next record, or `None` at a clean end of stream.
    ///
    /// # Errors
    ///
    /// - [`BamError::InvalidFormat`] if `block_size` is below 32, or the
    ///   reader is not positioned inside the records section
    /// - [`BamError::UnexpectedEndOfStream`] if the stream ends mid-record
    pub fn read_record(&mut self) -> Result<Option<RecordBlob>> {
        if !matches!(self.state, ParserState::ReferencesRead | ParserState::AlignmentsStreaming) {
            return Err(BamError::invalid_format(
                "BAM reader is not positioned at the alignment records",
            ));
        }
        // Any attempt counts, so a failed first read still forces a rewind
        self.state = ParserState::AlignmentsStreaming;
        if self.stream.is_at_end()? {
            return Ok(None);
        }

        let offset = self.stream.position();
        let block_size: i32 = self.stream.read_int()?;
        let size = usize::try_from(block_size)
            .ok()
            .filter(|&size| size >= FIXED_FIELDS_SIZE)
            .ok_or_else(|| {
                BamError::invalid_format(format!(
                    "invalid BAM record block_size {block_size} at decompressed offset {offset}"
                ))
            })?;
        let data = self.stream.read_bytes(size)?;
        RecordBlob::new(data).map(Some)
    }

    /// Parse magic, header text and reference dictionary.
    fn read_preamble(&mut self) -> Result<(Header, Vec<ReferenceSequence>)> {
        let mut magic = [0u8; 4];
        self.stream.read_exact_into(&mut magic).map_err(|e| match e {
            BamError::UnexpectedEndOfStream { available, .. } => BamError::invalid_format(format!(
                "stream too short for BAM magic: {available} bytes"
            )),
            other => other,
        })?;
        if &magic != BAM_MAGIC {
            return Err(BamError::invalid_format(format!(
                "not a BAM file: expected magic {BAM_MAGIC:?}, got {magic:?}"
            )));
        }

        let l_text = self.read_length("l_text")?;
        let header = Header::new(self.stream.read_bytes(l_text)?);
        self.state = ParserState::HeaderRead;

        let n_ref = self.read_length("n_ref")?;
        let mut references = Vec::with_capacity(n_ref.min(MAX_REFERENCE_PREALLOCATION));
        for _ in 0..n_ref {
            let l_name = self.read_length("l_name")?;
            if l_name == 0 {
                return Err(BamError::invalid_format(
                    "reference l_name must include the NUL terminator",
                ));
            }
            let mut name = self.stream.read_bytes(l_name)?;
            if let Some(nul) = name.iter().position(|&b| b == 0) {
                name.truncate(nul);
            }
            let name = String::from_utf8(name).map_err(|e| {
                BamError::invalid_format(format!("reference name is not valid UTF-8: {e}"))
            })?;
            let length: i32 = self.stream.read_int()?;
            if length < 0 {
                return Err(BamError::invalid_format(format!(
                    "negative length {length} for reference '{name}'"
                )));
            }
            references.push(ReferenceSequence::new(name, length));
        }
        self.state = ParserState::ReferencesRead;

        Ok((header, references))
    }

    /// Read an `i32` length or count field, rejecting negative values.
    fn read_length(&mut self, field: &str) -> Result<usize> {
        let value: i32 = self.stream.read_int()?;
        usize::try_from(value)
            .map_err(|_| BamError::invalid_format(format!("negative BAM {field}: {value}")))
    }
}

impl<R: Read + Seek> BamReader<R> {
    /// Lazy iterator over the alignment records.
    ///
    /// Straight after opening this starts at the first record without
    /// touching the underlying reader. Once records have been read, the
    /// stream is rewound first so every call yields all records.
    ///
    /// # Errors
    ///
    /// Fails if the implicit rewind fails.
    pub fn alignments(&mut self) -> Result<Alignments<'_, R>> {
        if self.state != ParserState::ReferencesRead {
            self.rewind()?;
        }
        Ok(Alignments { reader: self, done: false })
    }

    /// Seek back to byte zero and re-parse the container header.
    ///
    /// # Errors
    ///
    /// [`BamError::InvalidFormat`] if the header or reference dictionary
    /// differs from the one parsed when the reader was opened.
    pub fn rewind(&mut self) -> Result<()> {
        self.stream.get_mut().rewind()?;
        self.stream.reset();
        self.state = ParserState::Unopened;

        let (header, references) = self.read_preamble()?;
        if header != self.header || references != self.references {
            return Err(BamError::invalid_format("BAM header changed between reads"));
        }
        debug!("Rewound BAM stream to the first alignment record");
        Ok(())
    }
}

/// Forward-only iterator of records, from [`BamReader::alignments`].
///
/// Fused after the first error.
pub struct Alignments<'a, R> {
    reader: &'a mut BamReader<R>,
    done: bool,
}

impl<R: Read> Iterator for Alignments<'_, R> {
    type Item = Result<RecordBlob>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
