//! Rust symbol and call extraction: impl blocks (inherent and trait),
//! `use`/`mod`/`include!` imports, scoped and field calls, and attribute
//! collection for test/bench detection.

use tree_sitter::{Node, Tree};

use crate::parser::LanguageAdapter;
use crate::parser::facts::*;
use crate::parser::helpers::*;
use crate::parser::languages::Language;

/// Constructor-shaped std calls that are noise in a call graph.
const RUST_BUILTIN_CALLS: &[&str] = &["Some", "Ok", "Err", "drop"];

/// Std container types whose associated calls (`Vec::new`, `String::from`)
/// are noise.
const RUST_BUILTIN_TYPES: &[&str] = &[
    "Box", "Vec", "String", "Rc", "Arc", "RefCell", "Cell", "HashMap", "HashSet", "BTreeMap",
    "BTreeSet", "VecDeque", "Option", "Result", "PathBuf", "Cow", "Mutex", "RwLock",
];

pub struct RustAdapter;

impl LanguageAdapter for RustAdapter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn extract(&self, tree: &Tree, source: &str, out: &mut ParsedFile) {
        let root = tree.root_node();
        walk(root, source, Ctx::default(), out, 0);
    }
}

#[derive(Clone, Copy, Default)]
struct Ctx<'a> {
    enclosing_fn: Option<&'a str>,
    /// Base type of the enclosing `impl` block.
    impl_type: Option<&'a str>,
    /// Set inside `impl Trait for Type` blocks.
    in_trait_impl: bool,
}

fn walk(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }

    match node.kind() {
        "function_item" | "function_signature_item" => {
            let name = extract_function(node, source, ctx, out);
            bind_params(node, source, out);
            if let Some(body) = field(node, "body") {
                let inner = Ctx {
                    enclosing_fn: name.as_deref().or(ctx.enclosing_fn),
                    ..ctx
                };
                walk(body, source, inner, out, depth + 1);
            }
            return;
        }
        "struct_item" => {
            extract_named_type(node, source, SymbolKind::Struct, out);
            return;
        }
        "enum_item" => {
            extract_named_type(node, source, SymbolKind::Enum, out);
            return;
        }
        "trait_item" => {
            extract_trait(node, source, out, depth);
            return;
        }
        "type_item" => {
            extract_named_type(node, source, SymbolKind::Type, out);
            return;
        }
        "impl_item" => {
            extract_impl(node, source, out, depth);
            return;
        }
        "mod_item" => {
            extract_mod(node, source, ctx, out, depth);
            return;
        }
        "use_declaration" => {
            extract_use(node, source, out);
            return;
        }
        "macro_invocation" => {
            extract_include_macro(node, source, out);
            // Macro bodies may contain interesting calls but are token
            // trees; skip them.
            return;
        }
        "call_expression" => {
            extract_call(node, source, ctx, out);
        }
        "struct_expression" => {
            extract_struct_expression(node, source, ctx, out);
        }
        "let_declaration" => {
            extract_let(node, source, out);
        }
        "line_comment" | "block_comment" => {
            push_span(node, TextKind::Comment, &mut out.spans);
            return;
        }
        "string_literal" | "raw_string_literal" => {
            push_span(node, TextKind::String, &mut out.spans);
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, ctx, out, depth + 1);
    }
}

// ---------------------------------------------------------------------------
// Attributes and visibility
// ---------------------------------------------------------------------------

fn is_pub(node: Node, source: &str) -> bool {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "visibility_modifier" {
            return node_text(child, source).starts_with("pub");
        }
    }
    false
}

/// Attribute names on the item: `#[test]` → `test`, `#[derive(Debug)]` →
/// `derive(Debug)`.
fn attributes_of(node: Node, source: &str) -> Vec<String> {
    let mut attrs = Vec::new();
    let mut sib = node.prev_sibling();
    while let Some(prev) = sib {
        if prev.kind() != "attribute_item" {
            break;
        }
        let raw = node_text(prev, source);
        let inner = raw
            .trim_start_matches("#[")
            .trim_end_matches(']')
            .trim()
            .to_string();
        attrs.push(inner);
        sib = prev.prev_sibling();
    }
    attrs.reverse();
    attrs
}

/// Doc comments sit above any attributes: `/// doc` then `#[test]` then the
/// item.
fn doc_comment(node: Node, source: &str) -> Option<String> {
    let mut anchor = node;
    while let Some(prev) = anchor.prev_sibling() {
        if prev.kind() == "attribute_item" {
            anchor = prev;
        } else {
            break;
        }
    }
    preceding_doc_comment(anchor, source, &["line_comment", "block_comment"])
}

fn base_type_name(text: &str) -> String {
    text.trim()
        .split(['<', '('])
        .next()
        .unwrap_or(text)
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

fn extract_function(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) -> Option<String> {
    let name = field(node, "name").map(|n| node_text(n, source))?;
    let exported = is_pub(node, source);
    let attrs = attributes_of(node, source);

    let mut modifiers = Vec::new();
    if exported {
        modifiers.push("public".into());
    }
    {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "function_modifiers" {
                for token in node_text(child, source).split_whitespace() {
                    modifiers.push(token.to_string());
                }
            }
        }
    }
    for attr in &attrs {
        if attr == "test" || attr.ends_with("::test") || attr == "tokio::test" {
            modifiers.push("test".into());
        }
        if attr == "bench" {
            modifiers.push("bench".into());
        }
    }
    if ctx.in_trait_impl {
        modifiers.push("trait-impl".into());
    }

    let is_method = ctx.impl_type.is_some();

    out.functions.push(FunctionFact {
        name: name.clone(),
        kind: if is_method {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        },
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        params: field(node, "parameters")
            .map(|p| params_text(p, source))
            .unwrap_or_default(),
        return_type: field(node, "return_type")
            .map(|n| collapse_whitespace(&node_text(n, source))),
        generics: field(node, "type_parameters").map(|n| node_text(n, source)),
        modifiers,
        decorators: attrs,
        is_method,
        class_name: ctx.impl_type.map(String::from),
        receiver: ctx.impl_type.map(String::from),
        docstring: doc_comment(node, source),
        is_exported: exported,
    });

    if exported && !is_method {
        out.exports.push(ExportFact {
            name: name.clone(),
            line: start_line(node),
            kind: Some(SymbolKind::Function),
            decl_kind: None,
            type_annotation: None,
            is_type_export: false,
            is_default: false,
            reexport_from: None,
        });
    }
    Some(name)
}

fn extract_named_type(node: Node, source: &str, kind: SymbolKind, out: &mut ParsedFile) {
    let name = match field(node, "name") {
        Some(n) => node_text(n, source),
        None => return,
    };
    let exported = is_pub(node, source);
    let attrs = attributes_of(node, source);

    let mut modifiers = Vec::new();
    if exported {
        modifiers.push("public".into());
    }

    out.classes.push(ClassFact {
        name: name.clone(),
        kind,
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        generics: field(node, "type_parameters").map(|n| node_text(n, source)),
        modifiers,
        decorators: attrs,
        extends: Vec::new(),
        implements: Vec::new(),
        docstring: doc_comment(node, source),
        is_exported: exported,
        members: Vec::new(),
    });

    if exported {
        out.exports.push(ExportFact {
            name,
            line: start_line(node),
            kind: Some(kind),
            decl_kind: None,
            type_annotation: None,
            is_type_export: true,
            is_default: false,
            reexport_from: None,
        });
    }
}

fn extract_trait(node: Node, source: &str, out: &mut ParsedFile, depth: usize) {
    let name = match field(node, "name") {
        Some(n) => node_text(n, source),
        None => return,
    };
    let exported = is_pub(node, source);

    let mut extends = Vec::new();
    {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "trait_bounds" {
                let raw = node_text(child, source);
                let raw = raw.trim_start_matches(':').trim();
                extends.push(collapse_whitespace(raw));
            }
        }
    }

    let mut members = Vec::new();
    if let Some(body) = field(node, "body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            if matches!(child.kind(), "function_item" | "function_signature_item")
                && let Some(m) = field(child, "name")
            {
                members.push(MemberFact {
                    name: node_text(m, source),
                    kind: SymbolKind::Method,
                    start_line: start_line(child),
                });
            }
        }
    }

    let mut modifiers = Vec::new();
    if exported {
        modifiers.push("public".into());
    }

    out.classes.push(ClassFact {
        name: name.clone(),
        kind: SymbolKind::Trait,
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        generics: field(node, "type_parameters").map(|n| node_text(n, source)),
        modifiers,
        decorators: attributes_of(node, source),
        extends,
        implements: Vec::new(),
        docstring: doc_comment(node, source),
        is_exported: exported,
        members,
    });

    if exported {
        out.exports.push(ExportFact {
            name: name.clone(),
            line: start_line(node),
            kind: Some(SymbolKind::Trait),
            decl_kind: None,
            type_annotation: None,
            is_type_export: true,
            is_default: false,
            reexport_from: None,
        });
    }

    // Default method bodies contain calls.
    if let Some(body) = field(node, "body") {
        let inner = Ctx {
            impl_type: Some(name.as_str()),
            ..Ctx::default()
        };
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            walk(child, source, inner, out, depth + 1);
        }
    }
}

/// `impl Type { … }` and `impl Trait for Type { … }`. Methods across all
/// impl blocks of one type share its class name, which is what makes
/// same-struct `self.m()` resolution work.
fn extract_impl(node: Node, source: &str, out: &mut ParsedFile, depth: usize) {
    let type_node = match field(node, "type") {
        Some(t) => t,
        None => return,
    };
    let impl_type = base_type_name(&node_text(type_node, source));
    let trait_node = field(node, "trait");
    let implements = trait_node
        .map(|t| vec![collapse_whitespace(&node_text(t, source))])
        .unwrap_or_default();

    let mut members = Vec::new();
    if let Some(body) = field(node, "body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            if child.kind() == "function_item"
                && let Some(m) = field(child, "name")
            {
                members.push(MemberFact {
                    name: node_text(m, source),
                    kind: SymbolKind::Method,
                    start_line: start_line(child),
                });
            }
        }
    }

    out.classes.push(ClassFact {
        name: impl_type.clone(),
        kind: SymbolKind::Impl,
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        generics: field(node, "type_parameters").map(|n| node_text(n, source)),
        modifiers: Vec::new(),
        decorators: Vec::new(),
        extends: Vec::new(),
        implements,
        docstring: doc_comment(node, source),
        is_exported: false,
        members,
    });

    if let Some(body) = field(node, "body") {
        let inner = Ctx {
            impl_type: Some(impl_type.as_str()),
            in_trait_impl: trait_node.is_some(),
            enclosing_fn: None,
        };
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            walk(child, source, inner, out, depth + 1);
        }
    }
}

fn extract_mod(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile, depth: usize) {
    let name = match field(node, "name") {
        Some(n) => node_text(n, source),
        None => return,
    };
    match field(node, "body") {
        // `mod x;` pulls in another file.
        None => {
            out.imports.push(ImportFact {
                module: name,
                names: Vec::new(),
                kind: ImportKind::Mod,
                is_dynamic: false,
                line: start_line(node),
                aliases: Vec::new(),
            });
        }
        // Inline module: keep walking.
        Some(body) => {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                walk(child, source, ctx, out, depth + 1);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Use / include imports
// ---------------------------------------------------------------------------

fn extract_use(node: Node, source: &str, out: &mut ParsedFile) {
    let arg = match field(node, "argument") {
        Some(a) => a,
        None => return,
    };
    let line = start_line(node);
    let mut paths = Vec::new();
    expand_use_tree(arg, source, String::new(), &mut paths);
    for (path, leaf) in paths {
        out.imports.push(ImportFact {
            module: path,
            names: if leaf.is_empty() { Vec::new() } else { vec![leaf] },
            kind: ImportKind::Use,
            is_dynamic: false,
            line,
            aliases: Vec::new(),
        });
    }
}

/// Expand a use tree into (full path, leaf name) pairs:
/// `use crate::a::{b, c as d};` → `crate::a::b` / `b`, `crate::a::c` / `d`.
fn expand_use_tree(node: Node, source: &str, prefix: String, out: &mut Vec<(String, String)>) {
    let join = |prefix: &str, seg: &str| {
        if prefix.is_empty() {
            seg.to_string()
        } else {
            format!("{prefix}::{seg}")
        }
    };
    match node.kind() {
        "identifier" | "crate" | "super" | "self" | "metavariable" => {
            let seg = node_text(node, source);
            let full = join(&prefix, &seg);
            let leaf = seg;
            out.push((full, leaf));
        }
        "scoped_identifier" => {
            let text = collapse_whitespace(&node_text(node, source)).replace(' ', "");
            let full = join(&prefix, &text);
            let leaf = text.rsplit("::").next().unwrap_or("").to_string();
            out.push((full, leaf));
        }
        "use_as_clause" => {
            if let (Some(path), Some(alias)) = (field(node, "path"), field(node, "alias")) {
                let text = collapse_whitespace(&node_text(path, source)).replace(' ', "");
                out.push((join(&prefix, &text), node_text(alias, source)));
            }
        }
        "use_wildcard" => {
            let text = node_text(node, source);
            let path = text.trim_end_matches("::*").replace(' ', "");
            out.push((join(&prefix, &path), "*".to_string()));
        }
        "scoped_use_list" => {
            let path = field(node, "path")
                .map(|p| collapse_whitespace(&node_text(p, source)).replace(' ', ""))
                .unwrap_or_default();
            let new_prefix = join(&prefix, &path);
            if let Some(list) = field(node, "list") {
                let mut cursor = list.walk();
                for child in list.named_children(&mut cursor) {
                    expand_use_tree(child, source, new_prefix.clone(), out);
                }
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                expand_use_tree(child, source, prefix.clone(), out);
            }
        }
        _ => {}
    }
}

/// `include!("gen.rs")`, `include_str!` and `include_bytes!` pull files in.
fn extract_include_macro(node: Node, source: &str, out: &mut ParsedFile) {
    let name = match field(node, "macro") {
        Some(m) => node_text(m, source),
        None => return,
    };
    if !matches!(name.as_str(), "include" | "include_str" | "include_bytes") {
        return;
    }
    // The token tree holds the path literal.
    let raw = node_text(node, source);
    let Some(start) = raw.find('"') else { return };
    let Some(end) = raw[start + 1..].find('"') else {
        return;
    };
    out.imports.push(ImportFact {
        module: raw[start + 1..start + 1 + end].to_string(),
        names: Vec::new(),
        kind: ImportKind::Include,
        is_dynamic: false,
        line: start_line(node),
        aliases: Vec::new(),
    });
}

// ---------------------------------------------------------------------------
// Calls and bindings
// ---------------------------------------------------------------------------

fn base_call(node: Node, source: &str, ctx: Ctx, name: String) -> CallFact {
    CallFact {
        name,
        line: start_line(node),
        column: start_col(node),
        content: line_content(node, source),
        receiver: None,
        self_attribute: None,
        resolved_name: None,
        is_method: false,
        is_function_reference: false,
        is_potential_callback: false,
        uncertain: false,
        enclosing_function: ctx.enclosing_fn.map(String::from),
        enclosing_class: ctx.impl_type.map(String::from),
        arg_count: 0,
    }
}

fn extract_call(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) {
    let func = match field(node, "function") {
        Some(f) => f,
        None => return,
    };
    let arg_count = field(node, "arguments").map(count_args).unwrap_or(0);

    match func.kind() {
        "identifier" => {
            let name = node_text(func, source);
            if RUST_BUILTIN_CALLS.contains(&name.as_str()) {
                return;
            }
            let mut call = base_call(func, source, ctx, name);
            call.arg_count = arg_count;
            out.calls.push(call);
        }
        "field_expression" => {
            let field_node = match field(func, "field") {
                Some(f) => f,
                None => return,
            };
            let value = match field(func, "value") {
                Some(v) => v,
                None => return,
            };
            let mut call = base_call(field_node, source, ctx, node_text(field_node, source));
            call.is_method = true;
            call.receiver = Some(collapse_whitespace(&node_text(value, source)));
            call.arg_count = arg_count;
            out.calls.push(call);
        }
        "scoped_identifier" => {
            let name_node = match field(func, "name") {
                Some(n) => n,
                None => return,
            };
            let path = field(func, "path")
                .map(|p| node_text(p, source))
                .unwrap_or_default();
            let path_base = base_type_name(&path);
            if RUST_BUILTIN_TYPES.contains(&path_base.as_str()) {
                return;
            }
            let mut call = base_call(name_node, source, ctx, node_text(name_node, source));
            call.is_method = true;
            call.receiver = Some(path_base);
            call.arg_count = arg_count;
            out.calls.push(call);
        }
        "generic_function" => {
            // `foo::<T>()` — unwrap to the inner function.
            if let Some(inner) = field(func, "function") {
                let name = node_text(inner, source);
                let base = name.split("::").last().unwrap_or(&name).to_string();
                let mut call = base_call(inner, source, ctx, base);
                call.arg_count = arg_count;
                out.calls.push(call);
            }
        }
        _ => {}
    }
}

/// `T { … }` struct expressions count as construction sites.
fn extract_struct_expression(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) {
    let Some(name_node) = field(node, "name") else {
        return;
    };
    let name = base_type_name(&node_text(name_node, source));
    if name.is_empty() || !starts_uppercase(&name) || name == "Self" {
        return;
    }
    // `Enum::Variant { … }` constructs a variant, not the searched type.
    if name.contains("::") {
        return;
    }
    let mut call = base_call(node, source, ctx, name.clone());
    call.resolved_name = Some(name);
    out.calls.push(call);
}

/// `let x = T::new()` / `let x: T = …` bind x to T.
fn extract_let(node: Node, source: &str, out: &mut ParsedFile) {
    let Some(pattern) = field(node, "pattern") else {
        return;
    };
    if pattern.kind() != "identifier" {
        return;
    }
    let name = node_text(pattern, source);

    if let Some(ty) = field(node, "type") {
        let type_name = base_type_name(&node_text(ty, source));
        if starts_uppercase(&type_name) && !RUST_BUILTIN_TYPES.contains(&type_name.as_str()) {
            out.type_bindings.insert(name, type_name);
            return;
        }
    }

    if let Some(value) = field(node, "value") {
        match value.kind() {
            "call_expression" => {
                if let Some(func) = field(value, "function")
                    && func.kind() == "scoped_identifier"
                    && let Some(path) = field(func, "path")
                {
                    let type_name = base_type_name(&node_text(path, source));
                    if starts_uppercase(&type_name)
                        && !RUST_BUILTIN_TYPES.contains(&type_name.as_str())
                    {
                        out.type_bindings.insert(name, type_name);
                    }
                }
            }
            "struct_expression" => {
                if let Some(ty) = field(value, "name") {
                    let type_name = base_type_name(&node_text(ty, source));
                    if starts_uppercase(&type_name) && !type_name.contains("::") {
                        out.type_bindings.insert(name, type_name);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Typed parameters bind their names for receiver-type resolution.
fn bind_params(node: Node, source: &str, out: &mut ParsedFile) {
    let Some(params) = field(node, "parameters") else {
        return;
    };
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        if param.kind() != "parameter" {
            continue;
        }
        let pattern = field(param, "pattern");
        let ty = field(param, "type");
        if let (Some(pattern), Some(ty)) = (pattern, ty)
            && pattern.kind() == "identifier"
        {
            let type_name = base_type_name(
                node_text(ty, source)
                    .trim_start_matches('&')
                    .trim_start_matches("mut ")
                    .trim(),
            );
            if starts_uppercase(&type_name) && !RUST_BUILTIN_TYPES.contains(&type_name.as_str()) {
                out.type_bindings
                    .insert(node_text(pattern, source), type_name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn parse(src: &str) -> ParsedFile {
        parse_source(Language::Rust, src).unwrap()
    }

    #[test]
    fn impl_methods_share_the_type() {
        let src = "struct Engine;\n\nimpl Engine {\n    pub fn start(&self) {\n        self.warm_up();\n    }\n    fn warm_up(&self) {}\n}\n";
        let parsed = parse(src);
        let start = parsed.functions.iter().find(|f| f.name == "start").unwrap();
        assert_eq!(start.class_name.as_deref(), Some("Engine"));
        assert!(start.is_method);
        let call = parsed.calls.iter().find(|c| c.name == "warm_up").unwrap();
        assert_eq!(call.receiver.as_deref(), Some("self"));
        assert_eq!(call.enclosing_class.as_deref(), Some("Engine"));
    }

    #[test]
    fn trait_impl_methods_are_tagged() {
        let src = "use std::fmt;\nstruct W;\nimpl fmt::Display for W {\n    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, \"w\") }\n}\n";
        let parsed = parse(src);
        let fmt = parsed.functions.iter().find(|f| f.name == "fmt").unwrap();
        assert!(fmt.modifiers.contains(&"trait-impl".to_string()));
    }

    #[test]
    fn test_attribute_is_a_modifier() {
        let src = "#[test]\nfn checks_math() { assert_eq!(2, 2); }\n";
        let parsed = parse(src);
        let f = &parsed.functions[0];
        assert!(f.modifiers.contains(&"test".to_string()));
        assert!(f.decorators.contains(&"test".to_string()));
    }

    #[test]
    fn use_trees_expand() {
        let src = "use crate::engine::{Engine, config as cfg};\nuse super::util::helper;\n";
        let parsed = parse(src);
        let modules: Vec<_> = parsed.imports.iter().map(|i| i.module.as_str()).collect();
        assert!(modules.contains(&"crate::engine::Engine"));
        assert!(modules.contains(&"crate::engine::config"));
        assert!(modules.contains(&"super::util::helper"));
        let aliased = parsed
            .imports
            .iter()
            .find(|i| i.module == "crate::engine::config")
            .unwrap();
        assert_eq!(aliased.names, vec!["cfg"]);
    }

    #[test]
    fn mod_declaration_is_an_import() {
        let parsed = parse("mod cache;\n");
        assert_eq!(parsed.imports[0].kind, ImportKind::Mod);
        assert_eq!(parsed.imports[0].module, "cache");
    }

    #[test]
    fn scoped_calls_filter_std_types() {
        let src = "fn f() -> Vec<u32> { let v = Vec::new(); helper::run(); v }\n";
        let parsed = parse(src);
        assert!(parsed.calls.iter().all(|c| c.name != "new"));
        assert!(parsed.calls.iter().any(|c| c.name == "run"));
    }

    #[test]
    fn doc_comment_above_attributes() {
        let src = "/// Runs the suite.\n#[test]\nfn suite() {}\n";
        let parsed = parse(src);
        assert_eq!(
            parsed.functions[0].docstring.as_deref(),
            Some("Runs the suite.")
        );
    }

    #[test]
    fn struct_expression_is_construction() {
        let src = "struct Point { x: i32 }\nfn f() -> Point { Point { x: 1 } }\n";
        let parsed = parse(src);
        assert!(parsed.calls.iter().any(|c| c.name == "Point"));
    }
}
