//! Call resolution: classify every recorded call against a target symbol
//! (callers) or resolve each call inside a function to its definition
//! (callees).
//!
//! Classification order, per call: same-class `self`/`this`/`cls`
//! resolution, typed-receiver bindings, same-file (same-package for Go)
//! preference, then cross-type uncertainty. Same-class calls are never
//! uncertain; method calls on unknown receivers never silently link to
//! standalone functions.

use serde::Serialize;

use crate::index::symbol::BindingTarget;
use crate::index::{Filters, ProjectIndex, Symbol};
use crate::parser::facts::CallFact;
use crate::parser::languages::Language;

#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// `None` = language default: Go/Java/Rust auto-include method calls,
    /// JS/TS/Python require the explicit flag.
    pub include_methods: Option<bool>,
    pub include_uncertain: bool,
    pub filters: Filters,
}

impl CallOptions {
    pub fn effective_include_methods(&self, lang: Language) -> bool {
        self.include_methods
            .unwrap_or(matches!(lang, Language::Go | Language::Java | Language::Rust))
    }
}

/// One call site attributed to its enclosing function.
#[derive(Debug, Clone, Serialize)]
pub struct CallerSite {
    #[serde(rename = "callerName", skip_serializing_if = "Option::is_none")]
    pub caller_name: Option<String>,
    #[serde(rename = "callerClass", skip_serializing_if = "Option::is_none")]
    pub caller_class: Option<String>,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub content: String,
    #[serde(rename = "isMethod")]
    pub is_method: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub uncertain: bool,
    #[serde(rename = "isCallback")]
    pub is_callback: bool,
}

/// The resolved definition a callee points at.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTarget {
    pub name: String,
    pub file: String,
    pub line: u32,
    #[serde(rename = "className", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalleeSite {
    pub name: String,
    pub line: u32,
    pub content: String,
    #[serde(rename = "isMethod")]
    pub is_method: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub uncertain: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<ResolvedTarget>,
}

const SELF_RECEIVERS: &[&str] = &["self", "this", "cls", "Self"];

fn receiver_root(receiver: &str) -> &str {
    receiver
        .split(['.', '[', '(', ':', '?'])
        .next()
        .unwrap_or(receiver)
        .trim_start_matches('&')
        .trim_start_matches('*')
}

// ---------------------------------------------------------------------------
// Callers
// ---------------------------------------------------------------------------

/// Every call site of `target` across the project, attributed to its
/// enclosing function.
pub fn find_callers(index: &ProjectIndex, target: &Symbol, options: &CallOptions) -> Vec<CallerSite> {
    let mut sites = Vec::new();

    for (file, file_calls) in &index.calls_cache {
        let Some(record) = index.files.get(file) else {
            continue;
        };
        if !index.matches_filters(file, &options.filters) {
            continue;
        }
        let lang = record.language;

        for call in &file_calls.calls {
            let name_matches = call.name == target.name
                || call.resolved_name.as_deref() == Some(target.name.as_str());
            if !name_matches {
                continue;
            }
            // Regex/text artifacts never survive this: the identifier must
            // sit in code, not in a comment or string.
            if !record.position_is_code(call.line, call.column) {
                continue;
            }
            let Some(uncertain) = classify_for_target(index, file, lang, call, target, options)
            else {
                continue;
            };
            if uncertain && !options.include_uncertain {
                continue;
            }
            sites.push(CallerSite {
                caller_name: call.enclosing_function.clone(),
                caller_class: call.enclosing_class.clone(),
                file: file.clone(),
                line: call.line,
                column: call.column,
                content: call.content.clone(),
                is_method: call.is_method,
                receiver: call.receiver.clone(),
                uncertain,
                is_callback: call.is_potential_callback,
            });
        }
    }

    sites.sort_by(|a, b| (&a.file, a.line, a.column).cmp(&(&b.file, b.line, b.column)));
    sites.dedup_by(|a, b| a.file == b.file && a.line == b.line && a.column == b.column);
    sites
}

/// Does this call site belong to `target`? `Some(uncertain)` includes it,
/// `None` drops it.
fn classify_for_target(
    index: &ProjectIndex,
    file: &str,
    lang: Language,
    call: &CallFact,
    target: &Symbol,
    options: &CallOptions,
) -> Option<bool> {
    let include_methods = options.effective_include_methods(lang);

    if !call.is_method {
        // Constructions (`new T`, composite literals) match class targets
        // directly.
        if call.resolved_name.as_deref() == Some(target.name.as_str()) {
            return Some(false);
        }
        if target.is_method {
            // A bare call never reaches a class-bound method (Java implicit
            // this-calls are recorded as method calls).
            return None;
        }
        // Local override: a same-named definition in the calling file owns
        // its call sites.
        if target.relative_path != file
            && index
                .symbols_named(&call.name)
                .iter()
                .any(|s| s.relative_path == file && s.kind.is_callable())
        {
            return None;
        }
        // Aliased import flowing to a different original name never matches
        // here (the alias IS the call name); certain direct call.
        return Some(false);
    }

    // Method call.
    let receiver = call.receiver.as_deref().unwrap_or("");
    let root = receiver_root(receiver);

    if SELF_RECEIVERS.contains(&root) {
        // Typed self attribute: `self.attr.m()` where attr's class is known.
        if let Some(attr) = &call.self_attribute {
            if let Some(class) = call
                .enclosing_class
                .as_deref()
                .and_then(|c| index.attribute_types.get(c))
                .and_then(|attrs| attrs.get(attr))
            {
                return match target.class_name.as_deref() {
                    Some(t) if t == class => Some(false),
                    _ => None,
                };
            }
            // Unknown attribute type: cross-type rules apply.
            return unknown_receiver(target, include_methods);
        }
        // Same-class resolution, never uncertain.
        return match (&call.enclosing_class, &target.class_name) {
            (Some(caller_class), Some(target_class)) if caller_class == target_class => {
                Some(false)
            }
            // Entry-point receivers are filtered from cross-class sets
            // unless methods are explicitly included.
            _ if include_methods && options.include_uncertain && target.is_method => Some(true),
            _ => None,
        };
    }

    // Known receiver type via bindings.
    if let Some(binding) = index.bindings.get(file).and_then(|b| b.get(root)) {
        return match binding {
            BindingTarget::Class { name } => match target.class_name.as_deref() {
                Some(t) if t == name.as_str() => Some(false),
                _ => None,
            },
            BindingTarget::File { path } => {
                // Module alias: `lib.parse()` reaches symbols of that file.
                if target.relative_path == *path && !target.is_method {
                    Some(false)
                } else {
                    None
                }
            }
            BindingTarget::Symbol { path, name } => {
                if target.relative_path == *path && target.name == *name {
                    Some(false)
                } else {
                    None
                }
            }
        };
    }

    // Receiver may itself be a type (static/associated calls):
    // `Engine::new()`, `Store.of(…)`.
    if target.class_name.as_deref() == Some(root) {
        return Some(false);
    }

    if !include_methods {
        return None;
    }
    unknown_receiver(target, include_methods)
}

/// Cross-type rules for method calls with no binding evidence.
fn unknown_receiver(target: &Symbol, include_methods: bool) -> Option<bool> {
    if !include_methods {
        return None;
    }
    if target.is_method {
        // Unambiguous only when no other class declares this method name.
        Some(false)
    } else {
        // `m.get()` must not silently link to a standalone `get`.
        Some(true)
    }
}

/// How a callee resolution was reached; gates the include-methods default.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Via {
    Direct,
    SameClass,
    Binding,
    TypeReceiver,
    Unknown,
}

// ---------------------------------------------------------------------------
// Callees
// ---------------------------------------------------------------------------

/// Every call made inside `function`, resolved to definitions where
/// possible.
pub fn find_callees(
    index: &ProjectIndex,
    function: &Symbol,
    options: &CallOptions,
) -> Vec<CalleeSite> {
    let Some(file_calls) = index.calls_cache.get(&function.relative_path) else {
        return Vec::new();
    };
    let Some(record) = index.files.get(&function.relative_path) else {
        return Vec::new();
    };
    let lang = record.language;
    let include_methods = options.effective_include_methods(lang);
    let mut out = Vec::new();

    for call in &file_calls.calls {
        if !function.contains_line(call.line) {
            continue;
        }
        // Innermost attribution: nested functions own their calls.
        match &call.enclosing_function {
            Some(enclosing) if *enclosing != function.name => continue,
            None => continue,
            _ => {}
        }
        if !record.position_is_code(call.line, call.column) {
            continue;
        }

        let (target, uncertain, via) = resolve_callee(index, &function.relative_path, call);

        if call.is_method {
            // Unknown-receiver method calls are included only behind the
            // include-methods default/flag; bound and same-class ones are
            // always real.
            if via == Via::Unknown && !include_methods {
                continue;
            }
            if uncertain && !options.include_uncertain {
                continue;
            }
        } else if target.is_none() {
            // Unresolved plain call (external/builtin leftovers).
            if !options.include_uncertain {
                continue;
            }
        }

        out.push(CalleeSite {
            name: call.name.clone(),
            line: call.line,
            content: call.content.clone(),
            is_method: call.is_method,
            receiver: call.receiver.clone(),
            uncertain,
            target,
        });
    }

    out.sort_by_key(|c| c.line);
    out
}

/// Resolve a call fact to a definition: same-class first, then typed
/// receivers and module aliases, then name lookup with same-file (Go:
/// same-package) preference.
fn resolve_callee(
    index: &ProjectIndex,
    file: &str,
    call: &CallFact,
) -> (Option<ResolvedTarget>, bool, Via) {
    let to_target = |s: &Symbol| ResolvedTarget {
        name: s.name.clone(),
        file: s.relative_path.clone(),
        line: s.start_line,
        class_name: s.class_name.clone(),
    };

    let candidates = index.symbols_named(&call.name);

    if call.is_method {
        let receiver = call.receiver.as_deref().unwrap_or("");
        let root = receiver_root(receiver);

        // Same-class: `self.m()` / `this.m()` / implicit Java this, across
        // Rust impl blocks of the same struct.
        if SELF_RECEIVERS.contains(&root) {
            if let Some(attr) = &call.self_attribute {
                if let Some(class) = call
                    .enclosing_class
                    .as_deref()
                    .and_then(|c| index.attribute_types.get(c))
                    .and_then(|attrs| attrs.get(attr))
                {
                    let hit = candidates
                        .iter()
                        .find(|s| s.class_name.as_deref() == Some(class.as_str()));
                    return match hit {
                        Some(s) => (Some(to_target(s)), false, Via::Binding),
                        None => (None, true, Via::Binding),
                    };
                }
                return (None, true, Via::Unknown);
            }
            if let Some(class) = &call.enclosing_class {
                let hit = candidates
                    .iter()
                    .find(|s| s.class_name.as_deref() == Some(class.as_str()));
                if let Some(s) = hit {
                    return (Some(to_target(s)), false, Via::SameClass);
                }
                // Inherited or dynamic: unknown.
                return (None, true, Via::SameClass);
            }
            return (None, true, Via::Unknown);
        }

        // Typed receiver / module alias bindings.
        if let Some(binding) = index.bindings.get(file).and_then(|b| b.get(root)) {
            match binding {
                BindingTarget::Class { name } => {
                    let hit = candidates
                        .iter()
                        .find(|s| s.class_name.as_deref() == Some(name.as_str()));
                    return match hit {
                        Some(s) => (Some(to_target(s)), false, Via::Binding),
                        None => (None, true, Via::Binding),
                    };
                }
                BindingTarget::File { path } => {
                    let hit = candidates
                        .iter()
                        .find(|s| s.relative_path == *path && !s.is_method);
                    return match hit {
                        Some(s) => (Some(to_target(s)), false, Via::Binding),
                        None => (None, true, Via::Binding),
                    };
                }
                BindingTarget::Symbol { path, name } => {
                    let hit = index
                        .symbols_named(name)
                        .iter()
                        .find(|s| s.relative_path == *path);
                    return match hit {
                        Some(s) => (Some(to_target(s)), false, Via::Binding),
                        None => (None, true, Via::Binding),
                    };
                }
            }
        }

        // Static/associated form: receiver is the type itself.
        if let Some(hit) = candidates
            .iter()
            .find(|s| s.class_name.as_deref() == Some(root))
        {
            return (Some(to_target(hit)), false, Via::TypeReceiver);
        }

        // Unknown receiver: method candidates only, and only unambiguously.
        let methods: Vec<&Symbol> = candidates.iter().filter(|s| s.is_method).collect();
        match methods.len() {
            0 => {
                // Cross-type: a standalone same-named function is NOT a
                // match; report it only as uncertain.
                let standalone = candidates.iter().find(|s| s.kind.is_callable());
                (standalone.map(to_target), true, Via::Unknown)
            }
            1 => (Some(to_target(methods[0])), false, Via::Unknown),
            _ => {
                let best = index.pick_best_definition(&methods);
                (Some(to_target(best)), true, Via::Unknown)
            }
        }
    } else {
        // Aliased imports call through the alias name.
        if let Some(BindingTarget::Symbol { path, name }) =
            index.bindings.get(file).and_then(|b| b.get(&call.name))
        {
            let hit = index
                .symbols_named(name)
                .iter()
                .find(|s| s.relative_path == *path);
            return match hit {
                Some(s) => (Some(to_target(s)), false, Via::Binding),
                None => (None, true, Via::Binding),
            };
        }

        let callable: Vec<&Symbol> = candidates
            .iter()
            .filter(|s| s.kind.is_callable() || s.kind.is_class_like())
            .collect();
        if callable.is_empty() {
            return (None, false, Via::Direct);
        }
        // Same-file beats everything; Go extends that to the package dir.
        if let Some(same_file) = callable
            .iter()
            .find(|s| s.relative_path == file && !s.is_method)
        {
            return (Some(to_target(same_file)), false, Via::Direct);
        }
        let dir = file.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        if let Some(same_pkg) = callable.iter().find(|s| {
            s.language == Language::Go
                && s.relative_path.rsplit_once('/').map(|(d, _)| d).unwrap_or("") == dir
                && !s.is_method
        }) {
            return (Some(to_target(same_pkg)), false, Via::Direct);
        }
        let plain: Vec<&Symbol> = callable
            .iter()
            .filter(|s| !s.is_method)
            .copied()
            .collect();
        let pool = if plain.is_empty() { &callable } else { &plain };
        let best = index.pick_best_definition(pool);
        (Some(to_target(best)), false, Via::Direct)
    }
}
