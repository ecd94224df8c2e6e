//! `about`: one consolidated report — definition, usages, callers,
//! callees, tests and related types.

use serde::Serialize;

use crate::index::calls::{CallOptions, CalleeSite, CallerSite, find_callees, find_callers};
use crate::index::{Filters, ProjectIndex, Symbol, SymbolQuery};
use crate::query::QueryMeta;
use crate::query::typedef::{TestRef, TestsOptions, tests};
use crate::query::usages::{UsageHit, UsagesOptions, usages};

#[derive(Debug, Clone, Default)]
pub struct AboutOptions {
    pub include_methods: Option<bool>,
    pub file: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutResult {
    pub definition: Symbol,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub other_definitions: Vec<Symbol>,
    pub usages: Vec<UsageHit>,
    pub callers: Vec<CallerSite>,
    pub callees: Vec<CalleeSite>,
    pub tests: Vec<TestRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_types: Vec<Symbol>,
    pub meta: QueryMeta,
}

pub fn about(index: &ProjectIndex, name: &str, options: &AboutOptions) -> Option<AboutResult> {
    let query = SymbolQuery {
        file: options.file.clone(),
        kind: None,
    };
    let (symbol, all) = index.resolve_symbol(name, &query)?;

    // `about` wants the full picture: methods included unless explicitly
    // disabled.
    let call_options = CallOptions {
        include_methods: Some(options.include_methods.unwrap_or(true)),
        include_uncertain: false,
        filters: Filters {
            include_tests: true,
            ..Filters::default()
        },
    };

    let callers = find_callers(index, symbol, &call_options);
    let callees = find_callees(index, symbol, &call_options);

    let mut meta = QueryMeta::for_index(
        index,
        call_options.effective_include_methods(symbol.language),
    );
    meta.is_method = symbol.is_method;
    meta.class_name = symbol.class_name.clone();
    meta.uncertain = callers.iter().filter(|c| c.uncertain).count()
        + callees.iter().filter(|c| c.uncertain).count();

    // Types this symbol mentions: parents plus its return type.
    let mut related_types: Vec<Symbol> = Vec::new();
    let mut related_names: Vec<String> = symbol.extends.clone();
    related_names.extend(symbol.implements.clone());
    if let Some(class) = &symbol.class_name {
        related_names.push(class.clone());
    }
    for related in related_names {
        let base = related.split('<').next().unwrap_or(&related).trim();
        if let Some(t) = index
            .symbols_named(base)
            .iter()
            .find(|s| s.kind.is_class_like())
        {
            related_types.push((*t).clone());
        }
    }

    let other_definitions = all
        .iter()
        .filter(|s| s.binding_id() != symbol.binding_id())
        .map(|s| (*s).clone())
        .collect();

    Some(AboutResult {
        definition: symbol.clone(),
        other_definitions,
        usages: usages(
            index,
            name,
            &UsagesOptions {
                code_only: true,
                context: 0,
                filters: Filters {
                    include_tests: true,
                    ..Filters::default()
                },
            },
        ),
        callers,
        callees,
        tests: tests(index, name, &TestsOptions::default()),
        related_types,
        meta,
    })
}
