//! File discovery: directory walk with default + conditional +
//! `.gitignore`-derived ignores, and test-file detection.
//!
//! Only a deliberately small subset of gitignore is honored: name-level
//! patterns and filename globs. Negations and path-qualified patterns are
//! skipped rather than approximated.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use glob::Pattern;
use regex::Regex;
use walkdir::WalkDir;

use crate::parser::languages::{Language, detect_language_for_path};

pub const DEFAULT_IGNORES: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    "coverage",
    ".next",
    ".nuxt",
    ".cache",
    ".ucn-cache",
];

/// Name-level ignore set: directory/file names plus filename globs.
#[derive(Debug, Default)]
pub struct IgnoreSet {
    names: HashSet<String>,
    globs: Vec<Pattern>,
}

impl IgnoreSet {
    pub fn matches(&self, file_name: &str) -> bool {
        self.names.contains(file_name) || self.globs.iter().any(|g| g.matches(file_name))
    }
}

/// Build the ignore set for a project root: defaults, conditional vendor
/// dirs tied to project markers, and the `.gitignore` subset.
pub fn build_ignore_set(root: &Path, extra: &[String]) -> IgnoreSet {
    let mut set = IgnoreSet::default();
    for name in DEFAULT_IGNORES {
        set.names.insert((*name).to_string());
    }

    // Conditional ignores: only projects that actually vendor dependencies
    // get these, so a Go file tree named `vendor/` elsewhere still indexes.
    if root.join("go.mod").exists() || root.join("composer.json").exists() {
        set.names.insert("vendor".into());
    }
    if root.join("Podfile").exists() {
        set.names.insert("Pods".into());
    }

    if let Ok(text) = fs::read_to_string(root.join(".gitignore")) {
        for line in text.lines() {
            add_gitignore_pattern(&mut set, line);
        }
    }

    for pattern in extra {
        add_name_or_glob(&mut set, pattern);
    }

    set
}

/// One `.gitignore` line → at most one name-level ignore.
fn add_gitignore_pattern(set: &mut IgnoreSet, line: &str) {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return;
    }
    let line = line.strip_prefix('/').unwrap_or(line);
    let line = line.strip_suffix('/').unwrap_or(line);
    // Path-qualified patterns are out of the supported subset.
    if line.contains('/') || line.is_empty() {
        return;
    }
    if DEFAULT_IGNORES.contains(&line) {
        return;
    }
    add_name_or_glob(set, line);
}

fn add_name_or_glob(set: &mut IgnoreSet, pattern: &str) {
    if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
        if let Ok(glob) = Pattern::new(pattern) {
            set.globs.push(glob);
        }
    } else {
        set.names.insert(pattern.to_string());
    }
}

/// One discovered, indexable file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub language: Language,
}

/// Walk the project tree and return every indexable file, sorted by
/// relative path for deterministic builds.
pub fn collect_files(root: &Path, extra_ignores: &[String]) -> Vec<DiscoveredFile> {
    let ignores = build_ignore_set(root, extra_ignores);
    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(false).into_iter();
    let it = walker.filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        if entry.depth() == 0 {
            return true;
        }
        // Hidden entries and ignored names are pruned whole.
        if name.starts_with('.') {
            return false;
        }
        !ignores.matches(&name)
    });

    for entry in it {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("walk error: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(language) = detect_language_for_path(entry.path()) else {
            continue;
        };
        let relative_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        files.push(DiscoveredFile {
            path: entry.path().to_path_buf(),
            relative_path,
            language,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    files
}

static TEST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // JS/TS
        r"\.test\.[jt]sx?$",
        r"\.spec\.[jt]sx?$",
        r"(^|/)__tests__/",
        // Python
        r"(^|/)test_[^/]*\.py$",
        r"[^/]_test\.py$",
        r"(^|/)conftest\.py$",
        // Go
        r"_test\.go$",
        // Rust
        r"(^|/)tests/[^/]*\.rs$",
        r"(^|/)benches/[^/]*\.rs$",
        // Java
        r"(^|/)src/test/",
        r"(^|/)[^/]*Tests?\.java$",
        r"(^|/)[^/]*IT\.java$",
        // Generic test directories
        r"(^|/)tests?/",
        r"(^|/)spec/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("test-file pattern"))
    .collect()
});

/// Whether a PROJECT-RELATIVE path is a test file. Absolute paths must
/// never reach this check: an ancestor directory named `test/` outside the
/// project must not taint inner files.
pub fn is_test_file(relative_path: &str) -> bool {
    TEST_PATTERNS.iter().any(|re| re.is_match(relative_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_patterns() {
        assert!(is_test_file("src/app.test.js"));
        assert!(is_test_file("src/app.spec.ts"));
        assert!(is_test_file("src/__tests__/x.js"));
        assert!(is_test_file("test/helpers.js"));
        assert!(is_test_file("tests/integration.rs"));
        assert!(is_test_file("pkg/server_test.go"));
        assert!(is_test_file("app/test_models.py"));
        assert!(is_test_file("src/test/java/com/x/AppTest.java"));

        assert!(!is_test_file("src/spectrum.js"));
        assert!(!is_test_file("src/inspector.js"));
        assert!(!is_test_file("src/contest.js"));
        assert!(!is_test_file("src/latest.py"));
        assert!(!is_test_file("pkg/server.go"));
    }

    #[test]
    fn gitignore_subset() {
        let mut set = IgnoreSet::default();
        add_gitignore_pattern(&mut set, "# comment");
        add_gitignore_pattern(&mut set, "");
        add_gitignore_pattern(&mut set, "!keep.log");
        add_gitignore_pattern(&mut set, "src/generated");
        add_gitignore_pattern(&mut set, "/secrets");
        add_gitignore_pattern(&mut set, "tmp/");
        add_gitignore_pattern(&mut set, "*.log");

        assert!(set.matches("secrets"));
        assert!(set.matches("tmp"));
        assert!(set.matches("debug.log"));
        assert!(!set.matches("generated"));
        assert!(!set.matches("keep.log"));
    }

    #[test]
    fn conditional_vendor_ignore() {
        let tmp = TempDir::new().unwrap();
        let set = build_ignore_set(tmp.path(), &[]);
        assert!(!set.matches("vendor"));

        std::fs::write(tmp.path().join("go.mod"), "module example.com/m\n").unwrap();
        let set = build_ignore_set(tmp.path(), &[]);
        assert!(set.matches("vendor"));
    }

    #[test]
    fn collects_only_indexable_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("src")).unwrap();
        std::fs::create_dir_all(tmp.path().join("node_modules/pkg")).unwrap();
        std::fs::write(tmp.path().join("src/a.js"), "function a() {}\n").unwrap();
        std::fs::write(tmp.path().join("src/b.py"), "def b():\n    pass\n").unwrap();
        std::fs::write(tmp.path().join("src/readme.md"), "# hi\n").unwrap();
        std::fs::write(tmp.path().join("node_modules/pkg/x.js"), "x\n").unwrap();

        let files = collect_files(tmp.path(), &[]);
        let rels: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(rels, vec!["src/a.js", "src/b.py"]);
    }
}
