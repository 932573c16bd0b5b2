//! Shared test utilities for the mediagal test suite.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_tree(tmp.path(), &["a.jpg", "sub/b.mp4"]);
//! // ... walk ...
//! let html = read_page(&out.join("index.html"));
//! ```

use std::path::Path;

/// Create empty files (and their parent directories) under `root`.
///
/// Paths use `/` separators and are relative to `root`.
pub fn write_tree(root: &Path, files: &[&str]) {
    for rel in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, b"").unwrap();
    }
}

/// Read a generated page. Panics with the path on failure.
pub fn read_page(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read page {}: {e}", path.display()))
}
