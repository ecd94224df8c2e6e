//! Query operators over the project index. Every operator returns a serde
//! shape that formatters and protocol wrappers consume as-is; "not found"
//! is a value (`None`, an empty vec, or the `file-not-found` sentinel),
//! never an error.

pub mod about;
pub mod context;
pub mod deadcode;
pub mod diff_impact;
pub mod files;
pub mod find;
pub mod graph;
pub mod impact;
pub mod search;
pub mod smart;
pub mod stacktrace;
pub mod trace;
pub mod typedef;
pub mod usages;

use serde::Serialize;

use crate::index::ProjectIndex;

/// Sentinel-or-value result for file-keyed operators.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FileQuery<T: Serialize> {
    Found(T),
    NotFound {
        error: &'static str,
        #[serde(rename = "filePath")]
        file_path: String,
    },
}

impl<T: Serialize> FileQuery<T> {
    pub fn not_found(file_path: impl Into<String>) -> Self {
        FileQuery::NotFound {
            error: "file-not-found",
            file_path: file_path.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, FileQuery::Found(_))
    }
}

/// Shared meta block surfaced by `about`, `context` and `trace`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMeta {
    pub complete: bool,
    pub skipped: usize,
    pub dynamic_imports: usize,
    pub uncertain: usize,
    pub include_methods: bool,
    pub is_method: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl QueryMeta {
    pub fn for_index(index: &ProjectIndex, include_methods: bool) -> Self {
        let completeness = index.completeness();
        let dynamic_imports = completeness
            .warnings
            .iter()
            .find(|w| w.pattern == "dynamic-import")
            .map(|w| w.count)
            .unwrap_or(0);
        QueryMeta {
            complete: completeness.complete,
            skipped: 0,
            dynamic_imports,
            uncertain: 0,
            include_methods,
            is_method: false,
            class_name: None,
        }
    }
}

/// Read a 1-based inclusive line range out of an indexed file.
pub(crate) fn read_code(index: &ProjectIndex, rel: &str, start: u32, end: u32) -> Option<String> {
    let record = index.files.get(rel)?;
    let text = std::fs::read_to_string(&record.path).ok()?;
    let lines: Vec<&str> = text.lines().collect();
    if start == 0 || start as usize > lines.len() {
        return None;
    }
    let end = (end as usize).min(lines.len());
    Some(lines[start as usize - 1..end].join("\n"))
}

/// Context lines around a 1-based line: (before, after), nearest-first in
/// source order.
pub(crate) fn context_lines(text: &str, line: u32, n: usize) -> (Vec<String>, Vec<String>) {
    let lines: Vec<&str> = text.lines().collect();
    let idx = line.saturating_sub(1) as usize;
    let from = idx.saturating_sub(n);
    let before = lines[from..idx.min(lines.len())]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let after = if idx + 1 <= lines.len() {
        lines[(idx + 1).min(lines.len())..(idx + 1 + n).min(lines.len())]
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        Vec::new()
    };
    (before, after)
}
