//! `find`: locate symbol definitions by name, with per-entry usage counts.

use serde::Serialize;

use crate::index::calls::{CallOptions, find_callers};
use crate::index::{Filters, ProjectIndex, Symbol};
use crate::parser::facts::SymbolKind;

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Exact name match; the default matches case-insensitive substrings.
    pub exact: bool,
    pub file: Option<String>,
    pub kind: Option<SymbolKind>,
    pub filters: Filters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResult {
    #[serde(flatten)]
    pub symbol: Symbol,
    pub binding_id: String,
    /// Call sites plus importing files that name this symbol.
    pub usage_count: usize,
}

pub fn find(index: &ProjectIndex, name: &str, options: &FindOptions) -> Vec<FindResult> {
    let needle = name.to_lowercase();
    let mut matches: Vec<&Symbol> = index
        .all_symbols()
        .filter(|s| {
            if options.exact {
                s.name == name
            } else {
                s.name.to_lowercase().contains(&needle)
            }
        })
        .filter(|s| {
            options
                .file
                .as_deref()
                .is_none_or(|f| s.relative_path.contains(f))
        })
        .filter(|s| options.kind.is_none_or(|k| s.kind == k))
        .filter(|s| index.matches_filters(&s.relative_path, &options.filters))
        .collect();
    matches.sort_by(|a, b| {
        (&a.relative_path, a.start_line, a.name.as_str())
            .cmp(&(&b.relative_path, b.start_line, b.name.as_str()))
    });

    matches
        .into_iter()
        .map(|symbol| FindResult {
            binding_id: symbol.binding_id(),
            usage_count: usage_count(index, symbol),
            symbol: symbol.clone(),
        })
        .collect()
}

/// Calls plus import references. Re-export chains count because importers
/// of any re-exporting file still name the symbol in their import lists.
fn usage_count(index: &ProjectIndex, symbol: &Symbol) -> usize {
    let options = CallOptions {
        include_methods: Some(true),
        include_uncertain: false,
        filters: Filters {
            include_tests: true,
            ..Filters::default()
        },
    };
    let calls = find_callers(index, symbol, &options).len();

    let imports: usize = index
        .export_graph
        .values()
        .flatten()
        .filter(|edge| edge.names.iter().any(|n| n == &symbol.name))
        .count();

    calls + imports
}
