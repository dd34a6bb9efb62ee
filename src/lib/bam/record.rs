//! Opaque BAM alignment records with in-place flag patching.
//!
//! A [`RecordBlob`] holds one record's bytes exactly as stored in the
//! container, without the leading `block_size` field. Nothing beyond the
//! fixed-width prefix is parsed; accessors read fields at known offsets.
//!
//! # BAM Record Binary Layout
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0-3     4     refID (i32) - reference sequence ID
//! 4-7     4     pos (i32) - 0-based leftmost position
//! 8       1     l_read_name (u8) - length of read name + NUL
//! 9       1     mapq (u8) - mapping quality
//! 10-11   2     bin (u16) - BAM bin
//! 12-13   2     n_cigar_op (u16) - number of CIGAR operations
//! 14-15   2     flag (u16) - bitwise flags
//! 16-19   4     l_seq (u32) - length of sequence
//! 20-23   4     next_refID (i32) - mate reference sequence ID
//! 24-27   4     next_pos (i32) - mate 0-based position
//! 28-31   4     tlen (i32) - template length
//! 32+     var   read_name, cigar, seq, qual, aux (not interpreted)
//! ```

use bstr::BStr;

use crate::errors::{BamError, Result};

/// BAM flag bits.
pub mod flags {
    /// Read is paired in sequencing.
    pub const PAIRED: u16 = 0x1;
    /// Each segment properly aligned.
    pub const PROPER_PAIR: u16 = 0x2;
    /// Read is unmapped.
    pub const UNMAPPED: u16 = 0x4;
    /// Mate is unmapped.
    pub const MATE_UNMAPPED: u16 = 0x8;
    /// Read is reverse complemented.
    pub const REVERSE: u16 = 0x10;
    /// Mate is reverse complemented.
    pub const MATE_REVERSE: u16 = 0x20;
    /// First segment in the template.
    pub const FIRST_SEGMENT: u16 = 0x40;
    /// Last segment in the template.
    pub const LAST_SEGMENT: u16 = 0x80;
    /// Secondary alignment.
    pub const SECONDARY: u16 = 0x100;
    /// Read fails platform/vendor quality checks.
    pub const QC_FAIL: u16 = 0x200;
    /// PCR or optical duplicate.
    pub const DUPLICATE: u16 = 0x400;
    /// Supplementary alignment.
    pub const SUPPLEMENTARY: u16 = 0x800;
}

/// Size of the fixed-width record prefix.
pub const FIXED_FIELDS_SIZE: usize = 32;

const REF_ID_OFFSET: usize = 0;
const POS_OFFSET: usize = 4;
const L_READ_NAME_OFFSET: usize = 8;
const MAPQ_OFFSET: usize = 9;
/// Offset of the little-endian `flag` field.
pub const FLAG_OFFSET: usize = 14;

/// One alignment record as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordBlob {
    data: Vec<u8>,
}

impl RecordBlob {
    /// Wrap record bytes (without the `block_size` prefix).
    ///
    /// # Errors
    ///
    /// [`BamError::InvalidFormat`] if `data` is shorter than the 32-byte fixed prefix.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        if data.len() < FIXED_FIELDS_SIZE {
            return Err(BamError::invalid_format(format!(
                "BAM record of {} bytes is shorter than the {FIXED_FIELDS_SIZE}-byte fixed fields",
                data.len()
            )));
        }
        Ok(Self { data })
    }

    /// The record bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// A copy of the record bytes.
    #[must_use]
    pub fn to_blob(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Unwrap into the record bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Length of the record in bytes (the value of its `block_size` field).
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; a blob holds at least the fixed fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn read_i32(&self, offset: usize) -> i32 {
        i32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Reference sequence index, `-1` if unplaced.
    #[must_use]
    pub fn reference_id(&self) -> i32 {
        self.read_i32(REF_ID_OFFSET)
    }

    /// 0-based leftmost position, `-1` if unplaced.
    #[must_use]
    pub fn position(&self) -> i32 {
        self.read_i32(POS_OFFSET)
    }

    /// Mapping quality.
    #[must_use]
    pub fn mapping_quality(&self) -> u8 {
        self.data[MAPQ_OFFSET]
    }

    /// Read name without its NUL terminator.
    ///
    /// `None` if `l_read_name` points past the end of the record.
    #[must_use]
    pub fn read_name(&self) -> Option<&BStr> {
        let l_read_name = self.data[L_READ_NAME_OFFSET] as usize;
        let end = FIXED_FIELDS_SIZE + l_read_name.saturating_sub(1);
        if l_read_name == 0 || FIXED_FIELDS_SIZE + l_read_name > self.data.len() {
            return None;
        }
        Some(BStr::new(&self.data[FIXED_FIELDS_SIZE..end]))
    }

    /// The 16-bit flag field.
    #[must_use]
    pub fn flags(&self) -> u16 {
        u16::from_le_bytes([self.data[FLAG_OFFSET], self.data[FLAG_OFFSET + 1]])
    }

    fn write_flags(&mut self, value: u16) {
        self.data[FLAG_OFFSET..FLAG_OFFSET + 2].copy_from_slice(&value.to_le_bytes());
    }

    /// Set the bits of `mask` in the flag field; no other byte changes.
    pub fn set_flags(&mut self, mask: u16) {
        self.write_flags(self.flags() | mask);
    }

    /// Clear the bits of `mask` in the flag field; no other byte changes.
    pub fn clear_flags(&mut self, mask: u16) {
        self.write_flags(self.flags() & !mask);
    }

    /// Mark the record as failing quality checks.
    ///
    /// Idempotent.
    pub fn set_qc_fail(&mut self) {
        self.set_flags(flags::QC_FAIL);
    }

    /// Returns true if the QC-fail bit is set.
    #[must_use]
    pub fn is_qc_fail(&self) -> bool {
        self.flags() & flags::QC_FAIL != 0
    }
}

impl AsRef<[u8]> for RecordBlob {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl TryFrom<Vec<u8>> for RecordBlob {
    type Error = BamError;

    fn try_from(data: Vec<u8>) -> Result<Self> {
        Self::new(data)
    }
}
