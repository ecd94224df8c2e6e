//! `search`: literal text search across indexed files with context lines.

use regex::RegexBuilder;
use serde::Serialize;

use crate::index::{Filters, ProjectIndex};
use crate::query::context_lines;

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub context: usize,
    /// Skip matches inside strings and comments.
    pub code_only: bool,
    pub filters: Filters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub line: u32,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub before: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMatches {
    pub file: String,
    pub matches: Vec<SearchMatch>,
}

/// The pattern is always treated literally — regex metacharacters are
/// escaped before matching.
pub fn search(index: &ProjectIndex, pattern: &str, options: &SearchOptions) -> Vec<FileMatches> {
    let escaped = regex::escape(pattern);
    let re = match RegexBuilder::new(&escaped)
        .case_insensitive(!options.case_sensitive)
        .build()
    {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("search pattern failed to compile: {e}");
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    for (rel, record) in &index.files {
        if !index.matches_filters(rel, &options.filters) {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&record.path) else {
            continue;
        };
        let mut matches = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let Some(hit) = re.find(line) else { continue };
            let line_no = idx as u32 + 1;
            if options.code_only
                && !record.position_is_code(line_no, hit.start() as u32 + 1)
            {
                continue;
            }
            let (before, after) = if options.context > 0 {
                context_lines(&text, line_no, options.context)
            } else {
                (Vec::new(), Vec::new())
            };
            matches.push(SearchMatch {
                line: line_no,
                content: line.trim().to_string(),
                before,
                after,
            });
        }
        if !matches.is_empty() {
            out.push(FileMatches {
                file: rel.clone(),
                matches,
            });
        }
    }
    out
}
