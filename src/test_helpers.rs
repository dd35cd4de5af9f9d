//! Shared test utilities for the notegarden test suite.
//!
//! Fixture builders write small content trees into a temp directory, lookup
//! helpers panic with the list of available names on a miss.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = write_tree(&[
//!     ("index.md", "See [[Alpha]]"),
//!     ("Projects/Alpha.md", "# Alpha\n"),
//! ]);
//! let discovery = scan(tmp.path(), &[]).unwrap();
//! let alpha = find_page(&discovery.pages, "Alpha");
//! assert_eq!(alpha.web_path, "Projects/Alpha.html");
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::page::Page;
use crate::scan::{self, Discovery};

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(relative path, contents)` pairs into a fresh temp directory.
pub fn write_tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, contents) in files {
        write_file(tmp.path(), rel, contents);
    }
    tmp
}

/// Write one file below `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
}

/// Write a tree and discover it.
pub fn discover(files: &[(&str, &str)]) -> (TempDir, Discovery) {
    let tmp = write_tree(files);
    let discovery = scan::scan(tmp.path(), &[]).unwrap();
    (tmp, discovery)
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a page by title. Panics if not found.
pub fn find_page<'a>(pages: &'a [Page], title: &str) -> &'a Page {
    pages.iter().find(|p| p.title == title).unwrap_or_else(|| {
        let titles: Vec<&str> = pages.iter().map(|p| p.title.as_str()).collect();
        panic!("page '{title}' not found. Available: {titles:?}")
    })
}

// =========================================================================
// Output assertions
// =========================================================================

/// Read a generated file below `output`. Panics if missing.
pub fn read_output(output: &Path, rel: &str) -> String {
    fs::read_to_string(output.join(rel))
        .unwrap_or_else(|e| panic!("cannot read output '{rel}': {e}"))
}

/// Assert that `haystack` contains `needle`, showing the haystack on failure.
pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "expected to find {needle:?} in:\n{haystack}"
    );
}
