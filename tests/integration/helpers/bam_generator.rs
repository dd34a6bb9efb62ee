//! Utilities for generating test BAM data programmatically.

#![allow(dead_code)]

use std::io::Cursor;

use fgbam_lib::bam::{BamReader, BamWriter, Header, RecordBlob, ReferenceSequence};
use fgbam_lib::options::{ReaderOptions, WriterOptions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Header text used by most tests.
pub const TEST_HEADER_TEXT: &str = "@HD\tVN:1.0\n";

/// The two-reference dictionary used by most tests.
pub fn test_references() -> Vec<ReferenceSequence> {
    vec![ReferenceSequence::new("chr1", 1000), ReferenceSequence::new("chr2", 2000)]
}

/// Builds a record blob with the given fixed fields, name and a random sequence.
///
/// The sequence is packed 4-bit as on disk and followed by qualities and a
/// single `NM:C` auxiliary field, so the blob has realistic variable-length
/// content after the fixed fields.
pub fn build_record(
    ref_id: i32,
    pos: i32,
    flag: u16,
    name: &str,
    seq_len: usize,
    rng: &mut StdRng,
) -> RecordBlob {
    let l_seq = u32::try_from(seq_len).unwrap();
    let mut data = Vec::new();
    data.extend_from_slice(&ref_id.to_le_bytes());
    data.extend_from_slice(&pos.to_le_bytes());
    data.push(u8::try_from(name.len() + 1).unwrap());
    data.push(60); // mapq
    data.extend_from_slice(&0u16.to_le_bytes()); // bin
    data.extend_from_slice(&1u16.to_le_bytes()); // n_cigar_op
    data.extend_from_slice(&flag.to_le_bytes());
    data.extend_from_slice(&l_seq.to_le_bytes());
    data.extend_from_slice(&(-1i32).to_le_bytes()); // next_refID
    data.extend_from_slice(&(-1i32).to_le_bytes()); // next_pos
    data.extend_from_slice(&0i32.to_le_bytes()); // tlen
    data.extend_from_slice(name.as_bytes());
    data.push(0);
    data.extend_from_slice(&(l_seq << 4).to_le_bytes()); // cigar: {seq_len}M
    for _ in 0..seq_len.div_ceil(2) {
        let hi: u8 = [1, 2, 4, 8][rng.random_range(0..4)];
        let lo: u8 = [1, 2, 4, 8][rng.random_range(0..4)];
        data.push((hi << 4) | lo);
    }
    for _ in 0..seq_len {
        data.push(rng.random_range(2..41));
    }
    data.extend_from_slice(b"NMC");
    data.push(rng.random_range(0..5));
    RecordBlob::new(data).unwrap()
}

/// Generates `count` records spread over the test references.
pub fn generate_records(count: usize, seed: u64) -> Vec<RecordBlob> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let ref_id = i32::from(i % 2 == 1);
            let pos = rng.random_range(0..900);
            let seq_len = rng.random_range(1..=150);
            build_record(ref_id, pos, 0, &format!("read{i:06}"), seq_len, &mut rng)
        })
        .collect()
}

/// Writes a complete BAM container to memory.
pub fn write_bam(
    header: &Header,
    references: &[ReferenceSequence],
    records: &[RecordBlob],
    options: &WriterOptions,
) -> Vec<u8> {
    let mut writer = BamWriter::new(Vec::new(), options).unwrap();
    writer.write_header(header, references).unwrap();
    for record in records {
        writer.write_record(record).unwrap();
    }
    writer.finish().unwrap()
}

/// Opens an in-memory BAM container.
pub fn open_bam(bytes: Vec<u8>, options: &ReaderOptions) -> BamReader<Cursor<Vec<u8>>> {
    BamReader::new(Cursor::new(bytes), options).unwrap()
}

/// Reads every record, panicking on the first error.
pub fn read_all(reader: &mut BamReader<Cursor<Vec<u8>>>) -> Vec<RecordBlob> {
    reader.alignments().unwrap().map(|r| r.unwrap()).collect()
}
