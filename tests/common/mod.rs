//! Shared fixture helpers: build a throwaway project tree and index it.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use ucn::index::{BuildOptions, ProjectIndex};

/// Write `(path, content)` pairs under a fresh temp dir and build an index
/// over them.
pub fn project(files: &[(&str, &str)]) -> (TempDir, ProjectIndex) {
    let tmp = TempDir::new().expect("temp dir");
    write_files(tmp.path(), files);
    let mut index = ProjectIndex::new(tmp.path()).expect("index");
    index.build(BuildOptions::default()).expect("build");
    (tmp, index)
}

pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).expect("mkdir");
        }
        fs::write(&path, content).expect("write fixture");
    }
}

pub fn rebuild(index: &mut ProjectIndex) {
    index.build(BuildOptions::default()).expect("rebuild");
}
