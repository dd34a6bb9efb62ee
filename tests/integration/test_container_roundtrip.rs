//! Container round-trip tests through memory and files.

use fgbam_lib::bam::{BamReader, BamWriter, Header, ParserState, ReferenceSequence};
use fgbam_lib::bgzf::{BGZF_EOF, CompressionLevel};
use fgbam_lib::options::{ReaderOptions, WriterOptions};
use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::*;

#[test]
fn test_written_container_reads_back() {
    init_logging();
    let header = Header::new(TEST_HEADER_TEXT);
    let references = test_references();
    let records = generate_records(500, 1);

    let bytes = write_bam(&header, &references, &records, &WriterOptions::default());
    assert!(bytes.ends_with(&BGZF_EOF));

    let mut reader = open_bam(bytes, &ReaderOptions::default());
    assert_eq!(reader.header().text(), TEST_HEADER_TEXT);
    assert_eq!(
        reader.reference_sequences(),
        &[ReferenceSequence::new("chr1", 1000), ReferenceSequence::new("chr2", 2000)]
    );
    assert_records_eq(&read_all(&mut reader), &records);
}

#[test]
fn test_header_only_container() {
    let bytes = write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &[], &WriterOptions::default());
    let mut reader = open_bam(bytes, &ReaderOptions::default());
    assert_eq!(reader.state(), ParserState::ReferencesRead);
    assert!(read_all(&mut reader).is_empty());
}

#[rstest]
#[case::tiny_blocks(37)]
#[case::small_blocks(1024)]
#[case::full_blocks(65280)]
fn test_records_spanning_block_boundaries(#[case] block_size: usize) {
    let records = generate_records(300, 2);
    let options = WriterOptions::default().with_block_size(block_size);
    let bytes = write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &records, &options);

    let mut reader = open_bam(bytes, &ReaderOptions::default());
    assert_records_eq(&read_all(&mut reader), &records);
}

#[rstest]
#[case(1)]
#[case(6)]
#[case(12)]
fn test_compression_levels_round_trip(#[case] level: u8) {
    let records = generate_records(200, 3);
    let options =
        WriterOptions::default().with_compression_level(CompressionLevel::new(level).unwrap());
    let bytes = write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &records, &options);

    let mut reader = open_bam(bytes, &ReaderOptions::default());
    assert_records_eq(&read_all(&mut reader), &records);
}

#[test]
fn test_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("roundtrip.bam");
    let records = generate_records(1000, 4);

    let mut writer = BamWriter::create(&path, &WriterOptions::default()).unwrap();
    writer.write_header(&Header::new(TEST_HEADER_TEXT), &test_references()).unwrap();
    for record in &records {
        writer.write_record(record).unwrap();
    }
    writer.finish().unwrap();

    let mut reader = BamReader::from_path(&path, &ReaderOptions::default()).unwrap();
    assert_eq!(reader.reference_index("chr1"), Some(0));
    let read_back: Vec<_> = reader.alignments().unwrap().map(|r| r.unwrap()).collect();
    assert_records_eq(&read_back, &records);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = BamReader::from_path(dir.path().join("missing.bam"), &ReaderOptions::default());
    assert!(matches!(result, Err(fgbam_lib::BamError::Io(_))));
}
