//! `typedef`, `tests`, `api` and `example`: smaller lookups sharing the
//! symbol table.

use serde::Serialize;

use crate::discover;
use crate::index::calls::{CallOptions, find_callers};
use crate::index::{Filters, ProjectIndex, Symbol, SymbolQuery};
use crate::parser::facts::{SymbolKind, UsageType};
use crate::query::read_code;

// ---------------------------------------------------------------------------
// typedef
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedefResult {
    #[serde(flatten)]
    pub symbol: Symbol,
    pub code: String,
}

/// Class-like definitions of a name, source attached.
pub fn typedef(index: &ProjectIndex, name: &str) -> Vec<TypedefResult> {
    let mut found: Vec<&Symbol> = index
        .symbols_named(name)
        .iter()
        .filter(|s| s.kind.is_class_like())
        .collect();
    found.sort_by(|a, b| (&a.relative_path, a.start_line).cmp(&(&b.relative_path, b.start_line)));
    found
        .into_iter()
        .map(|s| TypedefResult {
            code: read_code(index, &s.relative_path, s.start_line, s.end_line)
                .unwrap_or_default(),
            symbol: s.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// tests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestRefCategory {
    TestCase,
    Call,
    StringRef,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRef {
    pub file: String,
    pub line: u32,
    pub content: String,
    pub category: TestRefCategory,
}

#[derive(Debug, Clone, Default)]
pub struct TestsOptions {
    pub calls_only: bool,
}

/// References to a name inside test files, categorized.
pub fn tests(index: &ProjectIndex, name: &str, options: &TestsOptions) -> Vec<TestRef> {
    let mut out = Vec::new();

    for (rel, record) in &index.files {
        if !discover::is_test_file(rel) {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&record.path) else {
            continue;
        };
        if !text.contains(name) {
            continue;
        }
        let usages = match crate::parser::find_usages_in_code(record.language, &text, name) {
            Ok(u) => u,
            Err(_) => continue,
        };
        let lines: Vec<&str> = text.lines().collect();
        for usage in usages {
            let content = lines
                .get(usage.line.saturating_sub(1) as usize)
                .map(|l| l.trim().to_string())
                .unwrap_or_default();
            let category = match usage.usage_type {
                UsageType::Call => TestRefCategory::Call,
                UsageType::StringRef => {
                    // A name inside a test description string is a test case
                    // about the symbol.
                    if is_test_case_line(&content) {
                        TestRefCategory::TestCase
                    } else {
                        TestRefCategory::StringRef
                    }
                }
                UsageType::Definition | UsageType::Import | UsageType::Reference => continue,
            };
            if options.calls_only && category != TestRefCategory::Call {
                continue;
            }
            out.push(TestRef {
                file: rel.clone(),
                line: usage.line,
                content,
                category,
            });
        }
    }

    out.sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
    out
}

fn is_test_case_line(content: &str) -> bool {
    let t = content.trim_start();
    t.starts_with("it(")
        || t.starts_with("test(")
        || t.starts_with("it.")
        || t.starts_with("test.")
        || t.starts_with("describe(")
        || t.starts_with("def test_")
        || t.starts_with("func Test")
}

// ---------------------------------------------------------------------------
// api
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ApiOptions {
    pub filters: Filters,
}

/// Exported symbols, test files excluded by default.
pub fn api(index: &ProjectIndex, options: &ApiOptions) -> Vec<Symbol> {
    let mut out: Vec<Symbol> = index
        .all_symbols()
        .filter(|s| s.is_exported)
        .filter(|s| index.matches_filters(&s.relative_path, &options.filters))
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        (&a.relative_path, a.start_line, &a.name).cmp(&(&b.relative_path, b.start_line, &b.name))
    });
    out
}

// ---------------------------------------------------------------------------
// example
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleResult {
    pub file: String,
    pub line: u32,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub before: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
    pub total_calls: usize,
}

/// The best-scored call site of a name: assignments of the result beat
/// bare statements, non-test files beat tests.
pub fn example(index: &ProjectIndex, name: &str) -> Option<ExampleResult> {
    let (symbol, _) = index.resolve_symbol(name, &SymbolQuery::default())?;
    let sites = find_callers(
        index,
        symbol,
        &CallOptions {
            include_methods: Some(true),
            include_uncertain: false,
            filters: Filters {
                include_tests: true,
                ..Filters::default()
            },
        },
    );
    if sites.is_empty() {
        return None;
    }
    let total_calls = sites.len();

    let best = sites
        .iter()
        .max_by_key(|site| {
            let mut score = 0i32;
            let content = site.content.as_str();
            if content.contains('=') && !content.starts_with("if") {
                score += 30;
            }
            if content.contains("await ") {
                score += 10;
            }
            if !discover::is_test_file(&site.file) {
                score += 20;
            }
            if site.caller_name.is_some() {
                score += 5;
            }
            score += (content.len().min(120)) as i32 / 10;
            score
        })
        .expect("sites not empty");

    let record = index.files.get(&best.file)?;
    let (before, after) = std::fs::read_to_string(&record.path)
        .map(|text| crate::query::context_lines(&text, best.line, 2))
        .unwrap_or_default();

    Some(ExampleResult {
        file: best.file.clone(),
        line: best.line,
        content: best.content.clone(),
        before,
        after,
        total_calls,
    })
}
