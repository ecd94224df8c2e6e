//! `trace`: a depth-bounded call tree rooted at one symbol, in either
//! direction, with cycle protection.

use std::collections::HashSet;

use serde::Serialize;

use crate::index::calls::{CallOptions, find_callees, find_callers};
use crate::index::{ProjectIndex, Symbol, SymbolQuery};
use crate::query::QueryMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceDirection {
    Callees,
    Callers,
}

#[derive(Debug, Clone)]
pub struct TraceOptions {
    pub depth: u32,
    pub direction: TraceDirection,
    pub include_methods: Option<bool>,
    pub include_uncertain: bool,
    pub file: Option<String>,
}

impl Default for TraceOptions {
    fn default() -> Self {
        TraceOptions {
            depth: 3,
            direction: TraceDirection::Callees,
            include_methods: None,
            include_uncertain: false,
            file: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceNode {
    pub name: String,
    pub file: String,
    pub line: u32,
    pub uncertain: bool,
    /// Set when this node was already expanded elsewhere in the tree.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub recursion: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TraceNode>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceResult {
    pub root: TraceNode,
    pub direction: TraceDirection,
    pub depth: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub meta: QueryMeta,
}

pub fn trace(index: &ProjectIndex, name: &str, options: &TraceOptions) -> Option<TraceResult> {
    let query = SymbolQuery {
        file: options.file.clone(),
        kind: None,
    };
    let (symbol, all) = index.resolve_symbol(name, &query)?;

    // Trace defaults to including methods so `self.m()` chains connect.
    let call_options = CallOptions {
        include_methods: Some(options.include_methods.unwrap_or(true)),
        include_uncertain: options.include_uncertain,
        filters: Default::default(),
    };

    let mut visited = HashSet::new();
    let root = expand(index, symbol, options.depth, options, &call_options, &mut visited);

    let mut warnings = Vec::new();
    if root.children.is_empty() && all.len() > 1 {
        warnings.push(format!(
            "{} has no {} here; {} other definition(s) exist — narrow with a file filter",
            symbol.name,
            match options.direction {
                TraceDirection::Callees => "callees",
                TraceDirection::Callers => "callers",
            },
            all.len() - 1
        ));
    }

    let mut meta = QueryMeta::for_index(
        index,
        call_options.effective_include_methods(symbol.language),
    );
    meta.is_method = symbol.is_method;
    meta.class_name = symbol.class_name.clone();

    Some(TraceResult {
        root,
        direction: options.direction,
        depth: options.depth,
        warnings,
        meta,
    })
}

fn expand(
    index: &ProjectIndex,
    symbol: &Symbol,
    depth: u32,
    options: &TraceOptions,
    call_options: &CallOptions,
    visited: &mut HashSet<String>,
) -> TraceNode {
    let id = symbol.binding_id();
    let mut node = TraceNode {
        name: symbol.name.clone(),
        file: symbol.relative_path.clone(),
        line: symbol.start_line,
        uncertain: false,
        recursion: false,
        children: Vec::new(),
    };
    if depth == 0 {
        return node;
    }
    if !visited.insert(id) {
        node.recursion = true;
        return node;
    }

    match options.direction {
        TraceDirection::Callees => {
            for callee in find_callees(index, symbol, call_options) {
                let Some(target) = callee.target else {
                    if callee.uncertain && options.include_uncertain {
                        node.children.push(TraceNode {
                            name: callee.name,
                            file: symbol.relative_path.clone(),
                            line: callee.line,
                            uncertain: true,
                            recursion: false,
                            children: Vec::new(),
                        });
                    }
                    continue;
                };
                let Some(child) = index
                    .symbols_named(&target.name)
                    .iter()
                    .find(|s| s.relative_path == target.file && s.start_line == target.line)
                else {
                    continue;
                };
                let mut child_node =
                    expand(index, child, depth - 1, options, call_options, visited);
                child_node.uncertain = callee.uncertain;
                node.children.push(child_node);
            }
        }
        TraceDirection::Callers => {
            for caller in find_callers(index, symbol, call_options) {
                let Some(caller_name) = caller.caller_name else {
                    continue;
                };
                let parent = index.symbols_named(&caller_name).iter().find(|s| {
                    s.relative_path == caller.file
                        && s.kind.is_callable()
                        && s.contains_line(caller.line)
                });
                let Some(parent) = parent else { continue };
                let mut child_node =
                    expand(index, parent, depth - 1, options, call_options, visited);
                child_node.uncertain = caller.uncertain;
                node.children.push(child_node);
            }
        }
    }

    // Duplicate edges (several call sites into one callee) collapse.
    node.children
        .sort_by(|a, b| (&a.file, a.line, &a.name).cmp(&(&b.file, b.line, &b.name)));
    node.children
        .dedup_by(|a, b| a.file == b.file && a.line == b.line && a.name == b.name);
    node
}
