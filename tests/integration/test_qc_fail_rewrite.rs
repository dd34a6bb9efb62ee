//! Read, mark QC-fail, write and read back.

use fgbam_lib::bam::{BamWriter, Header, flags};
use fgbam_lib::options::{ReaderOptions, WriterOptions};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::helpers::*;

#[test]
fn test_qc_fail_rewrite_end_to_end() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(31);
    let originals = vec![
        build_record(0, 10, 0, "r1", 50, &mut rng),
        build_record(0, 20, flags::PAIRED | flags::REVERSE, "r2", 75, &mut rng),
        build_record(1, 5, flags::QC_FAIL, "r3", 10, &mut rng),
        build_record(-1, -1, flags::UNMAPPED, "r4", 100, &mut rng),
    ];
    let input = write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &originals, &WriterOptions::default());

    let mut reader = open_bam(input, &ReaderOptions::default());
    let mut writer = BamWriter::new(Vec::new(), &WriterOptions::default()).unwrap();
    writer.write_header(reader.header(), reader.reference_sequences()).unwrap();
    for record in reader.alignments().unwrap() {
        let mut record = record.unwrap();
        record.set_qc_fail();
        writer.write_record(&record).unwrap();
    }
    let output = writer.finish().unwrap();

    let mut reader = open_bam(output, &ReaderOptions::default());
    assert_eq!(reader.header().text(), TEST_HEADER_TEXT);
    assert_eq!(reader.reference_sequences(), test_references().as_slice());

    let rewritten = read_all(&mut reader);
    assert_eq!(rewritten.len(), originals.len());
    for (before, after) in originals.iter().zip(&rewritten) {
        assert!(after.is_qc_fail());
        assert_eq!(after.flags(), before.flags() | flags::QC_FAIL);
        assert_only_flags_differ(before, after);
    }
}

#[test]
fn test_qc_fail_rewrite_is_idempotent() {
    let mut records = generate_records(100, 32);
    for record in &mut records {
        record.set_qc_fail();
    }
    let once = write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &records, &WriterOptions::default());

    let mut reread = read_all(&mut open_bam(once.clone(), &ReaderOptions::default()));
    for record in &mut reread {
        record.set_qc_fail();
    }
    let twice = write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &reread, &WriterOptions::default());
    assert_eq!(once, twice);
}
