//! Error path integration tests.
//!
//! These tests verify that malformed or damaged input is reported at the
//! right position, with the right error, in both serial and parallel mode.

use std::io::Cursor;

use fgbam_lib::BamError;
use fgbam_lib::WorkerPool;
use fgbam_lib::bam::{BamReader, Header};
use fgbam_lib::bgzf::{BGZF_EOF, BlockFramer, EofPolicy, FramedBlock};
use fgbam_lib::options::{ReaderOptions, WriterOptions};
use rstest::rstest;

use crate::helpers::*;

fn framed_blocks(bytes: &[u8]) -> Vec<FramedBlock> {
    BlockFramer::new(Cursor::new(bytes), EofPolicy::Strict).map(|b| b.unwrap()).collect()
}

fn reader_options(threads: usize) -> ReaderOptions {
    match threads {
        1 => ReaderOptions::default(),
        n => ReaderOptions::default().with_pool(WorkerPool::new(n).unwrap()).with_granularity(8),
    }
}

// ==================== Corrupt Blocks ====================

#[rstest]
#[case::serial(1)]
#[case::parallel(4)]
fn test_corrupt_block_surfaces_in_order(#[case] threads: usize) {
    init_logging();
    let records = generate_records(400, 41);
    let options = WriterOptions::default().with_block_size(600);
    let mut bytes = write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &records, &options);

    let blocks = framed_blocks(&bytes);
    assert!(blocks.len() > 20);
    let target = &blocks[10];
    // Flip a CRC byte of the target block
    let crc_pos = usize::try_from(target.offset).unwrap() + target.size - 8;
    bytes[crc_pos] ^= 0xff;

    let mut reader = BamReader::new(Cursor::new(bytes), &reader_options(threads)).unwrap();
    let results: Vec<_> = reader.alignments().unwrap().collect();

    let (last, good) = results.split_last().unwrap();
    assert!(
        matches!(last, Err(BamError::CorruptBlock { offset, .. }) if *offset == target.offset),
        "expected CorruptBlock at {}, got {last:?}",
        target.offset
    );
    let good: Vec<_> = good.iter().map(|r| r.as_ref().unwrap().clone()).collect();
    assert!(!good.is_empty());
    assert!(good.len() < records.len());
    assert_records_eq(&good, &records[..good.len()]);
}

#[rstest]
#[case::serial(1)]
#[case::parallel(3)]
fn test_truncated_stream_is_reported(#[case] threads: usize) {
    let records = generate_records(200, 42);
    let options = WriterOptions::default().with_block_size(1000);
    let mut bytes = write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &records, &options);
    // Cut in the middle of a block well past the header
    let blocks = framed_blocks(&bytes);
    let cut = usize::try_from(blocks[5].offset).unwrap() + 10;
    bytes.truncate(cut);

    let mut reader = BamReader::new(Cursor::new(bytes), &reader_options(threads)).unwrap();
    let results: Vec<_> = reader.alignments().unwrap().collect();
    assert!(matches!(results.last(), Some(Err(BamError::TruncatedStream { .. }))));
    assert!(results[..results.len() - 1].iter().all(Result::is_ok));
}

// ==================== Format Errors ====================

#[test]
fn test_plain_bytes_are_not_bgzf() {
    let result = BamReader::new(Cursor::new(b"not a bgzf file at all".to_vec()), &ReaderOptions::default());
    assert!(matches!(result, Err(BamError::InvalidFormat { .. })));
}

#[test]
fn test_empty_input_is_not_bam() {
    let result = BamReader::new(Cursor::new(Vec::new()), &ReaderOptions::default());
    assert!(matches!(result, Err(BamError::InvalidFormat { .. })));
}

#[test]
fn test_bgzf_without_bam_magic() {
    use std::io::Write;

    let mut writer =
        fgbam_lib::bgzf::BlockWriter::new(Vec::new(), &WriterOptions::default()).unwrap();
    writer.write_all(b"@HD\tVN:1.6\n").unwrap();
    let bytes = writer.finish().unwrap();
    let result = BamReader::new(Cursor::new(bytes), &ReaderOptions::default());
    assert!(matches!(result, Err(BamError::InvalidFormat { .. })));
}

// ==================== EOF Marker Policy ====================

fn without_eof_marker() -> (Vec<u8>, usize) {
    let records = generate_records(20, 43);
    let mut bytes =
        write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &records, &WriterOptions::default());
    bytes.truncate(bytes.len() - BGZF_EOF.len());
    (bytes, records.len())
}

#[test]
fn test_missing_eof_marker_lenient() {
    let (bytes, count) = without_eof_marker();
    let mut reader = open_bam(bytes, &ReaderOptions::default().with_eof_policy(EofPolicy::Lenient));
    assert_eq!(read_all(&mut reader).len(), count);
}

#[test]
fn test_missing_eof_marker_strict() {
    let (bytes, count) = without_eof_marker();
    let options = ReaderOptions::default().with_eof_policy(EofPolicy::Strict);
    let mut reader = open_bam(bytes, &options);
    let results: Vec<_> = reader.alignments().unwrap().collect();
    assert_eq!(results.len(), count + 1);
    assert!(matches!(results[count], Err(BamError::InvalidFormat { .. })));
}

// ==================== Invalid Options ====================

#[test]
fn test_invalid_options_rejected() {
    let bytes = write_bam(&Header::default(), &[], &[], &WriterOptions::default());
    let options = ReaderOptions::default().with_granularity(0);
    assert!(matches!(
        BamReader::new(Cursor::new(bytes), &options),
        Err(BamError::InvalidParameter { .. })
    ));
    assert!(matches!(ReaderOptions::default().with_threads(0), Err(BamError::InvalidParameter { .. })));
}
