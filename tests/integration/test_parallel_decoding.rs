//! Parallel decompression produces the same bytes and records as serial.

use std::io::Cursor;
use std::thread;

use fgbam_lib::WorkerPool;
use fgbam_lib::bam::Header;
use fgbam_lib::bgzf::DecompressionPipeline;
use fgbam_lib::options::{ReaderOptions, WriterOptions};
use rstest::rstest;

use crate::helpers::*;

fn test_bam(records: usize, block_size: usize) -> Vec<u8> {
    let options = WriterOptions::default().with_block_size(block_size);
    write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &generate_records(records, 11), &options)
}

fn decompress(bytes: &[u8], options: &ReaderOptions) -> Vec<u8> {
    let pipeline = DecompressionPipeline::new(Cursor::new(bytes), options).unwrap();
    pipeline.map(|chunk| chunk.unwrap()).collect::<Vec<_>>().concat()
}

#[rstest]
#[case(2, 1)]
#[case(2, 3)]
#[case(4, 16)]
#[case(8, 64)]
#[case(3, 1000)]
fn test_parallel_bytes_match_serial(#[case] threads: usize, #[case] granularity: usize) {
    init_logging();
    let bytes = test_bam(2000, 4096);
    let serial = decompress(&bytes, &ReaderOptions::default());

    let options = ReaderOptions::default()
        .with_pool(WorkerPool::new(threads).unwrap())
        .with_granularity(granularity);
    assert_eq!(decompress(&bytes, &options), serial);
}

#[rstest]
#[case(2, 2)]
#[case(4, 64)]
fn test_parallel_records_match_serial(#[case] threads: usize, #[case] granularity: usize) {
    let bytes = test_bam(1500, 997);
    let serial = read_all(&mut open_bam(bytes.clone(), &ReaderOptions::default()));

    let options = ReaderOptions::default().with_threads(threads).unwrap().with_granularity(granularity);
    let parallel = read_all(&mut open_bam(bytes, &options));
    assert_records_eq(&parallel, &serial);
}

#[test]
fn test_shared_pool_across_concurrent_readers() {
    let pool = WorkerPool::new(4).unwrap();
    let bytes = test_bam(1000, 2048);
    let expected = read_all(&mut open_bam(bytes.clone(), &ReaderOptions::default()));

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let options = ReaderOptions::default().with_pool(pool.clone()).with_granularity(8);
            let bytes = bytes.clone();
            thread::spawn(move || read_all(&mut open_bam(bytes, &options)))
        })
        .collect();

    for handle in handles {
        assert_records_eq(&handle.join().unwrap(), &expected);
    }
}

#[test]
fn test_pooled_writer_output_reads_back() {
    let records = generate_records(800, 12);
    let options = WriterOptions::default()
        .with_block_size(3000)
        .with_pool(WorkerPool::new(3).unwrap())
        .with_granularity(5);
    let bytes = write_bam(&Header::new(TEST_HEADER_TEXT), &test_references(), &records, &options);

    assert_records_eq(&read_all(&mut open_bam(bytes, &ReaderOptions::default())), &records);
}
