//! `context`: a symbol's definition plus its callers and callees (or its
//! methods, for class-like targets).

use serde::Serialize;

use crate::index::calls::{CallOptions, CalleeSite, CallerSite, find_callees, find_callers};
use crate::index::{Filters, ProjectIndex, SymbolQuery};
use crate::parser::facts::MemberFact;
use crate::query::QueryMeta;

#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub file: Option<String>,
    pub include_methods: Option<bool>,
    pub filters: Filters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResult {
    pub function: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<MemberFact>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub callers: Vec<CallerSite>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub callees: Vec<CalleeSite>,
    pub meta: QueryMeta,
}

/// `None` when the symbol is not defined in this project (externally
/// imported names included — they have no local definition).
pub fn context(index: &ProjectIndex, name: &str, options: &ContextOptions) -> Option<ContextResult> {
    let query = SymbolQuery {
        file: options.file.clone(),
        kind: None,
    };
    let (symbol, _all) = index.resolve_symbol(name, &query)?;

    let call_options = CallOptions {
        include_methods: options.include_methods,
        include_uncertain: false,
        filters: options.filters.clone(),
    };

    let mut meta = QueryMeta::for_index(
        index,
        call_options.effective_include_methods(symbol.language),
    );
    meta.is_method = symbol.is_method;
    meta.class_name = symbol.class_name.clone();

    if symbol.kind.is_class_like() {
        return Some(ContextResult {
            function: symbol.name.clone(),
            name: symbol.name.clone(),
            kind: symbol.kind.to_string(),
            file: symbol.relative_path.clone(),
            start_line: symbol.start_line,
            end_line: symbol.end_line,
            methods: Some(symbol.members.clone()),
            callers: Vec::new(),
            callees: Vec::new(),
            meta,
        });
    }

    let callers = find_callers(index, symbol, &call_options);
    let callees = find_callees(index, symbol, &call_options);
    meta.uncertain = callers.iter().filter(|c| c.uncertain).count()
        + callees.iter().filter(|c| c.uncertain).count();

    Some(ContextResult {
        function: symbol.name.clone(),
        name: symbol.name.clone(),
        kind: symbol.kind.to_string(),
        file: symbol.relative_path.clone(),
        start_line: symbol.start_line,
        end_line: symbol.end_line,
        methods: None,
        callers,
        callees,
        meta,
    })
}
