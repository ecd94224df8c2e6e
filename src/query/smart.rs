//! `smart`: a symbol's source block plus the source of everything it
//! calls.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::index::calls::{CallOptions, find_callees};
use crate::index::{ProjectIndex, SymbolQuery};
use crate::query::read_code;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    pub name: String,
    pub relative_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartResult {
    pub target: CodeBlock,
    pub dependencies: Vec<CodeBlock>,
}

pub fn smart(index: &ProjectIndex, name: &str) -> Option<SmartResult> {
    let (symbol, _) = index.resolve_symbol(name, &SymbolQuery::default())?;

    let code = read_code(index, &symbol.relative_path, symbol.start_line, symbol.end_line)
        .unwrap_or_default();
    let target = CodeBlock {
        name: symbol.name.clone(),
        relative_path: symbol.relative_path.clone(),
        start_line: symbol.start_line,
        end_line: symbol.end_line,
        code,
    };

    let callees = find_callees(
        index,
        symbol,
        &CallOptions {
            include_methods: Some(true),
            include_uncertain: false,
            filters: Default::default(),
        },
    );

    let mut seen = BTreeSet::new();
    let mut dependencies = Vec::new();
    for callee in callees {
        let Some(resolved) = callee.target else {
            continue;
        };
        let Some(dep) = index
            .symbols_named(&resolved.name)
            .iter()
            .find(|s| s.relative_path == resolved.file && s.start_line == resolved.line)
        else {
            continue;
        };
        let id = dep.binding_id();
        // The target appears as its own dependency only when it is
        // genuinely recursive (the callee came from inside its body).
        if !seen.insert(id) {
            continue;
        }
        let code = read_code(index, &dep.relative_path, dep.start_line, dep.end_line)
            .unwrap_or_default();
        dependencies.push(CodeBlock {
            name: dep.name.clone(),
            relative_path: dep.relative_path.clone(),
            start_line: dep.start_line,
            end_line: dep.end_line,
            code,
        });
    }

    Some(SmartResult {
        target,
        dependencies,
    })
}
