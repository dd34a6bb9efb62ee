//! Integration tests for fgbam library.
//!
//! These tests validate end-to-end workflows that span multiple modules,
//! from BGZF blocks through the container parser and writer.

mod test_container_roundtrip;
mod test_error_paths;
mod test_parallel_decoding;
mod test_qc_fail_rewrite;
mod test_rewind;
