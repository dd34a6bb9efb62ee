//! BAM container writing.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::BAM_MAGIC;
use super::header::{Header, ReferenceSequence};
use super::record::RecordBlob;
use crate::bgzf::BlockWriter;
use crate::errors::{BamError, Result};
use crate::options::WriterOptions;

fn to_i32(value: usize, parameter: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| BamError::invalid_parameter(parameter, format!("{value} exceeds i32::MAX")))
}

/// Write magic, header text and reference dictionary (uncompressed).
///
/// Each name is written with its NUL terminator, so `l_name` is the name
/// length plus one. Every reference is checked before anything is written.
///
/// # Errors
///
/// [`BamError::InvalidParameter`] if a size does not fit its `i32` field, a
/// reference name contains NUL, or a reference length is negative.
pub fn write_container_header<W: Write + ?Sized>(
    writer: &mut W,
    header: &Header,
    references: &[ReferenceSequence],
) -> Result<()> {
    let l_text = to_i32(header.len(), "header")?;
    let n_ref = to_i32(references.len(), "references")?;
    let l_names = references.iter().map(validate_reference).collect::<Result<Vec<_>>>()?;

    writer.write_all(BAM_MAGIC)?;
    writer.write_all(&l_text.to_le_bytes())?;
    writer.write_all(header.text())?;

    writer.write_all(&n_ref.to_le_bytes())?;
    for (reference, l_name) in references.iter().zip(l_names) {
        writer.write_all(&l_name.to_le_bytes())?;
        writer.write_all(reference.name.as_bytes())?;
        writer.write_all(&[0])?;
        writer.write_all(&reference.length.to_le_bytes())?;
    }
    Ok(())
}

/// Check one reference and return its `l_name`.
fn validate_reference(reference: &ReferenceSequence) -> Result<i32> {
    let name = reference.name.as_bytes();
    if name.contains(&0) {
        return Err(BamError::invalid_parameter(
            "reference-name",
            format!("'{}' contains a NUL byte", reference.name.escape_debug()),
        ));
    }
    if reference.length < 0 {
        return Err(BamError::invalid_parameter(
            "reference-length",
            format!("{} for '{}' is negative", reference.length, reference.name),
        ));
    }
    to_i32(name.len() + 1, "reference-name")
}

/// Writer for a BGZF-compressed BAM container.
///
/// The header must be written before any record.
pub struct BamWriter<W: Write> {
    inner: BlockWriter<W>,
    header_written: bool,
    records_written: u64,
}

impl BamWriter<BufWriter<File>> {
    /// Create (or truncate) the BAM file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created or the options are invalid.
    pub fn create<P: AsRef<Path>>(path: P, options: &WriterOptions) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Self::new(BufWriter::new(file), options)
    }
}

impl<W: Write> BamWriter<W> {
    /// Wrap `writer` in a BGZF stream.
    ///
    /// # Errors
    ///
    /// [`BamError::InvalidParameter`] if the options are invalid.
    pub fn new(writer: W, options: &WriterOptions) -> Result<Self> {
        Ok(Self { inner: BlockWriter::new(writer, options)?, header_written: false, records_written: 0 })
    }

    /// Write the container header.
    ///
    /// # Errors
    ///
    /// Fails if the header was already written or cannot be encoded.
    pub fn write_header(&mut self, header: &Header, references: &[ReferenceSequence]) -> Result<()> {
        if self.header_written {
            return Err(BamError::invalid_parameter("header", "already written"));
        }
        write_container_header(&mut self.inner, header, references)?;
        self.header_written = true;
        Ok(())
    }

    /// Append one record, prefixed with its `block_size`.
    ///
    /// # Errors
    ///
    /// Fails if the header has not been written yet or the write fails.
    pub fn write_record(&mut self, record: &RecordBlob) -> Result<()> {
        if !self.header_written {
            return Err(BamError::invalid_parameter("record", "header must be written first"));
        }
        self.inner.write_all(&to_i32(record.len(), "record")?.to_le_bytes())?;
        self.inner.write_all(record.as_bytes())?;
        self.records_written += 1;
        Ok(())
    }

    /// Number of records written.
    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Finish the BGZF stream and return the inner writer.
    ///
    /// # Errors
    ///
    /// Fails if the final blocks cannot be written.
    pub fn finish(mut self) -> Result<W> {
        self.inner.finish()
    }
}
