//! Scratch directories for tests that write files.

/// Create a temporary directory that is removed when dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    temp_test_dir_with_prefix("geocoding-test-")
}

/// Create a temporary directory with a custom name prefix.
pub fn temp_test_dir_with_prefix(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .unwrap_or_else(|e| panic!("Failed to create temp dir: {}", e))
}
