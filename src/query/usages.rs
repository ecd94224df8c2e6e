//! `usages`: every occurrence of a name across the project, classified.

use serde::Serialize;

use crate::index::{Filters, ProjectIndex};
use crate::parser::facts::{UsageType, UsageFact};
use crate::query::context_lines;

#[derive(Debug, Clone, Default)]
pub struct UsagesOptions {
    /// Drop string/comment hits.
    pub code_only: bool,
    /// Lines of surrounding context to attach.
    pub context: usize,
    pub filters: Filters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageHit {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub content: String,
    pub is_definition: bool,
    pub usage_type: UsageType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub before: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
}

pub fn usages(index: &ProjectIndex, name: &str, options: &UsagesOptions) -> Vec<UsageHit> {
    let mut hits = Vec::new();

    for (rel, record) in &index.files {
        if !index.matches_filters(rel, &options.filters) {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&record.path) else {
            continue;
        };
        if !text.contains(name) {
            continue;
        }
        let found: Vec<UsageFact> =
            match crate::parser::find_usages_in_code(record.language, &text, name) {
                Ok(u) => u,
                Err(e) => {
                    tracing::warn!("usage scan failed for {rel}: {e}");
                    continue;
                }
            };

        let lines: Vec<&str> = text.lines().collect();
        for usage in found {
            if options.code_only && usage.usage_type == UsageType::StringRef {
                continue;
            }
            let content = lines
                .get(usage.line.saturating_sub(1) as usize)
                .map(|l| l.trim().to_string())
                .unwrap_or_default();
            let (before, after) = if options.context > 0 {
                context_lines(&text, usage.line, options.context)
            } else {
                (Vec::new(), Vec::new())
            };
            hits.push(UsageHit {
                file: rel.clone(),
                line: usage.line,
                column: usage.column,
                content,
                is_definition: usage.usage_type == UsageType::Definition,
                usage_type: usage.usage_type,
                before,
                after,
            });
        }
    }

    hits.sort_by(|a, b| (&a.file, a.line, a.column).cmp(&(&b.file, b.line, b.column)));
    // Dedup on (file, line, usage type, is-definition).
    hits.dedup_by(|a, b| {
        a.file == b.file
            && a.line == b.line
            && a.usage_type == b.usage_type
            && a.is_definition == b.is_definition
    });
    hits
}
