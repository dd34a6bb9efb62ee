//! Repeated iteration over the same container.

use fgbam_lib::bam::{Header, ParserState};
use fgbam_lib::options::{ReaderOptions, WriterOptions};

use crate::helpers::*;

#[test]
fn test_iterating_twice_yields_identical_records() {
    let records = generate_records(400, 21);
    let options = WriterOptions::default().with_block_size(500);
    let bytes = write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &records, &options);

    let mut reader = open_bam(bytes, &ReaderOptions::default());
    let first = read_all(&mut reader);
    let second = read_all(&mut reader);
    assert_records_eq(&first, &records);
    assert_records_eq(&second, &first);
}

#[test]
fn test_rewind_after_partial_iteration() {
    let records = generate_records(100, 22);
    let bytes =
        write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &records, &WriterOptions::default());

    let mut reader = open_bam(bytes, &ReaderOptions::default().with_threads(2).unwrap());
    let partial: Vec<_> = reader.alignments().unwrap().take(10).map(|r| r.unwrap()).collect();
    assert_records_eq(&partial, &records[..10]);
    assert_eq!(reader.state(), ParserState::AlignmentsStreaming);

    reader.rewind().unwrap();
    assert_eq!(reader.state(), ParserState::ReferencesRead);
    assert_eq!(reader.header().text(), TEST_HEADER_TEXT);
    assert_records_eq(&read_all(&mut reader), &records);
}

#[test]
fn test_explicit_rewind_is_idempotent() {
    let records = generate_records(50, 23);
    let bytes =
        write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &records, &WriterOptions::default());

    let mut reader = open_bam(bytes, &ReaderOptions::default());
    reader.rewind().unwrap();
    reader.rewind().unwrap();
    assert_eq!(reader.reference_sequences(), test_references().as_slice());
    assert_records_eq(&read_all(&mut reader), &records);
}
