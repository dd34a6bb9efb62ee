//! Custom assertion helpers for integration tests.

#![allow(dead_code)]

use fgbam_lib::bam::RecordBlob;
use fgbam_lib::bam::record::FLAG_OFFSET;

/// Asserts that two record blobs are identical except for the two flag bytes.
///
/// # Panics
///
/// Panics if the lengths differ or any other byte differs.
pub fn assert_only_flags_differ(before: &RecordBlob, after: &RecordBlob) {
    let (a, b) = (before.as_bytes(), after.as_bytes());
    assert_eq!(a.len(), b.len(), "record length changed");
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        if i != FLAG_OFFSET && i != FLAG_OFFSET + 1 {
            assert_eq!(x, y, "byte {i} changed in record {:?}", before.read_name());
        }
    }
}

/// Asserts that two record sequences are equal, reporting the first mismatch.
///
/// # Panics
///
/// Panics if the sequences differ.
pub fn assert_records_eq(actual: &[RecordBlob], expected: &[RecordBlob]) {
    assert_eq!(actual.len(), expected.len(), "record count mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(a, e, "record {i} differs ({:?})", e.read_name());
    }
}
