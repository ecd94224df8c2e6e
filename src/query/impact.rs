//! `impact`, `verify` and `plan`: every caller of a symbol, grouped and
//! checked. All three share one call-site collection so their totals agree.

use serde::Serialize;

use crate::index::calls::{CallOptions, CallerSite, find_callers};
use crate::index::{Filters, ProjectIndex, Symbol, SymbolQuery};
use crate::parser::languages::Language;

#[derive(Debug, Clone, Default)]
pub struct ImpactOptions {
    pub file: Option<String>,
    pub filters: Filters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileImpact {
    pub file: String,
    pub sites: Vec<CallerSite>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactResult {
    pub name: String,
    pub file: String,
    pub line: u32,
    pub files: Vec<FileImpact>,
    pub total_call_sites: usize,
}

/// The shared collection: uncertain sites included (and flagged) so
/// `impact`, `verify` and `plan` count the same set.
fn call_sites(index: &ProjectIndex, symbol: &Symbol, filters: &Filters) -> Vec<CallerSite> {
    find_callers(
        index,
        symbol,
        &CallOptions {
            include_methods: Some(true),
            include_uncertain: true,
            filters: filters.clone(),
        },
    )
}

pub fn impact(index: &ProjectIndex, name: &str, options: &ImpactOptions) -> Option<ImpactResult> {
    let query = SymbolQuery {
        file: options.file.clone(),
        kind: None,
    };
    let (symbol, _) = index.resolve_symbol(name, &query)?;
    let sites = call_sites(index, symbol, &options.filters);

    let mut files: Vec<FileImpact> = Vec::new();
    for site in sites {
        match files.iter_mut().find(|f| f.file == site.file) {
            Some(group) => group.sites.push(site),
            None => files.push(FileImpact {
                file: site.file.clone(),
                sites: vec![site],
            }),
        }
    }
    let total_call_sites = files.iter().map(|f| f.sites.len()).sum();

    Some(ImpactResult {
        name: symbol.name.clone(),
        file: symbol.relative_path.clone(),
        line: symbol.start_line,
        files,
        total_call_sites,
    })
}

// ---------------------------------------------------------------------------
// verify
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedArgs {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgMismatch {
    pub file: String,
    pub line: u32,
    pub content: String,
    pub arg_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    pub found: bool,
    pub name: String,
    pub expected_args: ExpectedArgs,
    pub params: Vec<String>,
    pub valid: usize,
    pub mismatches: Vec<ArgMismatch>,
    pub uncertain: usize,
    pub total_calls: usize,
}

pub fn verify(index: &ProjectIndex, name: &str, options: &ImpactOptions) -> Option<VerifyResult> {
    let query = SymbolQuery {
        file: options.file.clone(),
        kind: None,
    };
    let (symbol, _) = index.resolve_symbol(name, &query)?;
    let params = split_params(&symbol.params, symbol.language);
    let expected = expected_args(&params, symbol.language);

    let sites = call_sites(index, symbol, &options.filters);
    let mut valid = 0usize;
    let mut uncertain = 0usize;
    let mut mismatches = Vec::new();

    for site in &sites {
        if site.uncertain {
            uncertain += 1;
            continue;
        }
        // Callback references carry no argument list of their own.
        let arg_count = arg_count_at(index, site);
        if site.is_callback || (arg_count >= expected.min && arg_count <= expected.max) {
            valid += 1;
        } else {
            mismatches.push(ArgMismatch {
                file: site.file.clone(),
                line: site.line,
                content: site.content.clone(),
                arg_count,
            });
        }
    }

    let total_calls = valid + mismatches.len() + uncertain;
    Some(VerifyResult {
        found: true,
        name: symbol.name.clone(),
        expected_args: expected,
        params,
        valid,
        mismatches,
        uncertain,
        total_calls,
    })
}

fn arg_count_at(index: &ProjectIndex, site: &CallerSite) -> u32 {
    index
        .calls_cache
        .get(&site.file)
        .and_then(|fc| {
            fc.calls
                .iter()
                .find(|c| c.line == site.line && c.column == site.column)
        })
        .map(|c| c.arg_count)
        .unwrap_or(0)
}

/// Split a parameter list at top-level commas; `self`/`cls` never count.
pub fn split_params(params: &str, language: Language) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in params.chars() {
        match c {
            '(' | '[' | '{' | '<' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' | '>' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                push_param(&mut parts, &current, language);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_param(&mut parts, &current, language);
    parts
}

fn push_param(parts: &mut Vec<String>, raw: &str, language: Language) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    if language == Language::Python && (trimmed == "self" || trimmed == "cls") && parts.is_empty()
    {
        return;
    }
    if language == Language::Rust && (trimmed == "&self" || trimmed == "&mut self" || trimmed == "self")
    {
        return;
    }
    parts.push(trimmed.to_string());
}

fn expected_args(params: &[String], language: Language) -> ExpectedArgs {
    let mut min = 0u32;
    let mut max = 0u32;
    let mut variadic = false;
    for p in params {
        if p.starts_with("**") || p.starts_with("...") || p.starts_with('*') {
            variadic = true;
            continue;
        }
        max += 1;
        let has_default = p.contains('=');
        let optional_ts = language.is_js_family() && p.contains('?');
        if !has_default && !optional_ts {
            min += 1;
        }
    }
    if variadic {
        max = u32::MAX;
    }
    ExpectedArgs { min, max }
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub rename_to: Option<String>,
    pub add_param: Option<String>,
    pub file: Option<String>,
    pub filters: Filters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSite {
    pub file: String,
    pub line: u32,
    pub content: String,
    pub action: String,
    pub uncertain: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub name: String,
    pub file: String,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_param: Option<String>,
    pub definition_action: String,
    pub sites: Vec<PlanSite>,
}

pub fn plan(index: &ProjectIndex, name: &str, options: &PlanOptions) -> Option<PlanResult> {
    let query = SymbolQuery {
        file: options.file.clone(),
        kind: None,
    };
    let (symbol, _) = index.resolve_symbol(name, &query)?;
    let sites = call_sites(index, symbol, &options.filters);

    let action = match (&options.rename_to, &options.add_param) {
        (Some(to), _) => format!("rename call to {to}"),
        (None, Some(param)) => format!("pass a value for {param}"),
        (None, None) => "review call site".to_string(),
    };
    let definition_action = match (&options.rename_to, &options.add_param) {
        (Some(to), _) => format!("rename definition to {to}"),
        (None, Some(param)) => format!("add parameter {param} to the definition"),
        (None, None) => "review definition".to_string(),
    };

    let sites = sites
        .into_iter()
        .map(|s| PlanSite {
            file: s.file,
            line: s.line,
            content: s.content,
            action: if s.uncertain {
                format!("{action} (uncertain — verify manually)")
            } else {
                action.clone()
            },
            uncertain: s.uncertain,
        })
        .collect();

    Some(PlanResult {
        name: symbol.name.clone(),
        file: symbol.relative_path.clone(),
        line: symbol.start_line,
        rename_to: options.rename_to.clone(),
        add_param: options.add_param.clone(),
        definition_action,
        sites,
    })
}
