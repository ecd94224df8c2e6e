//! `deadcode`: symbols with no remaining callers, after peeling away
//! everything a runtime or framework can invoke on its own.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::index::calls::{CallOptions, find_callers};
use crate::index::{Filters, ProjectIndex, Symbol};
use crate::parser::facts::SymbolKind;
use crate::parser::languages::Language;

/// A single line this long means generated/minified output.
const MINIFIED_LINE_LEN: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct DeadcodeOptions {
    pub include_exported: bool,
    pub include_decorated: bool,
    pub filters: Filters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadSymbol {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub file: String,
    pub line: u32,
    pub is_exported: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadcodeResult {
    pub dead: Vec<DeadSymbol>,
    pub excluded_exported: usize,
    pub excluded_decorated: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<String>,
}

pub fn deadcode(index: &ProjectIndex, options: &DeadcodeOptions) -> DeadcodeResult {
    let mut dead = Vec::new();
    let mut excluded_exported = 0usize;
    let mut excluded_decorated = 0usize;
    let mut skipped_files: BTreeSet<String> = BTreeSet::new();
    let mut bundled_checked: BTreeSet<String> = BTreeSet::new();

    let call_options = CallOptions {
        include_methods: Some(true),
        include_uncertain: true,
        filters: Filters {
            include_tests: true,
            ..Filters::default()
        },
    };

    let mut candidates: Vec<&Symbol> = index
        .all_symbols()
        .filter(|s| s.kind.is_callable() || (s.kind.is_class_like() && s.kind != SymbolKind::Impl))
        .collect();
    candidates.sort_by(|a, b| {
        (&a.relative_path, a.start_line, &a.name).cmp(&(&b.relative_path, b.start_line, &b.name))
    });

    for symbol in candidates {
        if !index.matches_filters(&symbol.relative_path, &options.filters) {
            continue;
        }
        // Bundled/minified output hides real call edges; skip whole files.
        if bundled_checked.insert(symbol.relative_path.clone())
            && is_bundled(index, &symbol.relative_path)
        {
            skipped_files.insert(symbol.relative_path.clone());
        }
        if skipped_files.contains(&symbol.relative_path) {
            continue;
        }
        if is_entry_point(symbol) {
            continue;
        }
        if is_decorated(symbol) && !options.include_decorated {
            excluded_decorated += 1;
            continue;
        }
        // Python's publicness is a naming convention, not an export: a
        // public-but-uncalled def is still dead.
        if symbol.is_exported
            && symbol.language != Language::Python
            && !options.include_exported
        {
            excluded_exported += 1;
            continue;
        }

        if find_callers(index, symbol, &call_options).is_empty() {
            dead.push(DeadSymbol {
                name: symbol.name.clone(),
                kind: symbol.kind,
                file: symbol.relative_path.clone(),
                line: symbol.start_line,
                is_exported: symbol.is_exported,
            });
        }
    }

    DeadcodeResult {
        dead,
        excluded_exported,
        excluded_decorated,
        skipped_files: skipped_files.into_iter().collect(),
    }
}

/// Symbols the runtime or a framework invokes with no visible caller.
fn is_entry_point(symbol: &Symbol) -> bool {
    let name = symbol.name.as_str();
    if name == "main" || name == "init" {
        return true;
    }
    if symbol.modifiers.iter().any(|m| m == "override") {
        return true;
    }
    match symbol.language {
        Language::Python => {
            matches!(
                name,
                "__init__" | "__call__" | "__enter__" | "__exit__" | "setUp" | "tearDown"
            ) || name.starts_with("pytest_")
                || name.starts_with("test_")
        }
        Language::Rust => symbol
            .modifiers
            .iter()
            .any(|m| m == "test" || m == "bench"),
        Language::Java => {
            name == "main"
                && symbol.modifiers.iter().any(|m| m == "public")
                && symbol.modifiers.iter().any(|m| m == "static")
        }
        _ => false,
    }
}

/// Decorated/annotated symbols are wired up by frameworks: Python
/// dotted decorators, any Java annotation, Rust trait-impl methods.
fn is_decorated(symbol: &Symbol) -> bool {
    match symbol.language {
        Language::Python => symbol.decorators.iter().any(|d| d.contains('.')),
        Language::Java => !symbol.decorators.is_empty(),
        Language::Rust => symbol.modifiers.iter().any(|m| m == "trait-impl"),
        _ => false,
    }
}

fn is_bundled(index: &ProjectIndex, rel: &str) -> bool {
    let Some(record) = index.files.get(rel) else {
        return false;
    };
    let Ok(text) = std::fs::read_to_string(&record.path) else {
        return false;
    };
    text.contains("__webpack_require__") || text.lines().any(|l| l.len() > MINIFIED_LINE_LEN)
}
