//! JavaScript/JSX symbol, import/export and call extraction.
//!
//! The walk here also serves the TypeScript adapter: the TS/TSX grammars are
//! a superset of the JavaScript node kinds handled, so the TS-only arms
//! (interfaces, enums, type aliases, annotations) simply never match when a
//! JavaScript tree is walked.

use std::collections::HashSet;

use tree_sitter::{Node, Tree};

use crate::parser::LanguageAdapter;
use crate::parser::facts::*;
use crate::parser::helpers::*;
use crate::parser::languages::Language;

/// Built-in receivers whose method calls are noise (`JSON.parse`,
/// `console.log`, `Math.max`, …). A user-defined local or imported
/// identifier with the same name wins over this list.
const BUILTIN_RECEIVERS: &[&str] = &[
    "console", "JSON", "Math", "Object", "Array", "Promise", "Number", "String", "Boolean",
    "Symbol", "Reflect", "Date", "RegExp", "process", "path", "fs", "window", "document",
    "navigator", "Buffer",
];

/// Methods whose first argument is a callback slot.
const CALLBACK_ARG0_METHODS: &[&str] = &["then", "catch", "map", "filter", "forEach", "reduce"];

/// Plain functions whose first argument is a callback slot.
const CALLBACK_ARG0_FUNCTIONS: &[&str] = &["setTimeout", "setInterval"];

pub struct JavascriptAdapter;

impl LanguageAdapter for JavascriptAdapter {
    fn language(&self) -> Language {
        Language::Javascript
    }

    fn extract(&self, tree: &Tree, source: &str, out: &mut ParsedFile) {
        extract(tree, source, out);
    }
}

/// File-level name environment gathered in a prepass.
#[derive(Default)]
pub(crate) struct Scope {
    /// Identifiers declared or imported anywhere in the file.
    pub locals: HashSet<String>,
    /// Names only ever bound to non-callable literals.
    pub literal_only: HashSet<String>,
}

impl Scope {
    fn declare(&mut self, name: &str) {
        self.locals.insert(name.to_string());
        self.literal_only.remove(name);
    }

    fn declare_literal(&mut self, name: &str) {
        if self.locals.insert(name.to_string()) {
            self.literal_only.insert(name.to_string());
        }
    }
}

#[derive(Clone, Copy, Default)]
struct Ctx<'a> {
    enclosing_fn: Option<&'a str>,
    enclosing_class: Option<&'a str>,
}

pub(crate) fn extract(tree: &Tree, source: &str, out: &mut ParsedFile) {
    let root = tree.root_node();
    let mut scope = Scope::default();
    collect_scope(root, source, &mut scope, 0);
    walk(root, source, Ctx::default(), &scope, out, 0);
}

// ---------------------------------------------------------------------------
// Scope prepass
// ---------------------------------------------------------------------------

fn collect_scope(node: Node, source: &str, scope: &mut Scope, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    match node.kind() {
        "variable_declarator" => {
            if let Some(name) = field(node, "name") {
                if name.kind() == "identifier" {
                    let ident = node_text(name, source);
                    match field(node, "value") {
                        Some(value) if is_noncallable_literal(value) => {
                            scope.declare_literal(&ident)
                        }
                        _ => scope.declare(&ident),
                    }
                } else {
                    // Destructuring patterns: every bound identifier is local.
                    collect_pattern_identifiers(name, source, scope);
                }
            }
        }
        "function_declaration"
        | "generator_function_declaration"
        | "class_declaration"
        | "abstract_class_declaration" => {
            if let Some(name) = field(node, "name") {
                scope.declare(&node_text(name, source));
            }
        }
        "import_specifier" => {
            let local = field(node, "alias").or_else(|| field(node, "name"));
            if let Some(local) = local {
                scope.declare(&node_text(local, source));
            }
        }
        "namespace_import" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "identifier" {
                    scope.declare(&node_text(child, source));
                }
            }
        }
        "import_clause" => {
            // Default import: bare identifier child.
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "identifier" {
                    scope.declare(&node_text(child, source));
                }
            }
        }
        "formal_parameters" => {
            collect_pattern_identifiers(node, source, scope);
        }
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_scope(child, source, scope, depth + 1);
    }
}

fn collect_pattern_identifiers(node: Node, source: &str, scope: &mut Scope) {
    if matches!(node.kind(), "identifier" | "shorthand_property_identifier_pattern") {
        scope.declare(&node_text(node, source));
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_pattern_identifiers(child, source, scope);
    }
}

/// A literal with no function values: number, string, boolean, null, or an
/// array/object whose elements contain no function expressions.
fn is_noncallable_literal(value: Node) -> bool {
    match value.kind() {
        "number" | "string" | "template_string" | "true" | "false" | "null" | "undefined"
        | "regex" => true,
        "array" | "object" => !contains_function(value, 0),
        _ => false,
    }
}

fn contains_function(node: Node, depth: usize) -> bool {
    if depth > MAX_DEPTH {
        return false;
    }
    if matches!(
        node.kind(),
        "arrow_function" | "function_expression" | "function" | "generator_function"
    ) {
        return true;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if contains_function(child, depth + 1) {
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Main walk
// ---------------------------------------------------------------------------

fn walk(node: Node, source: &str, ctx: Ctx, scope: &Scope, out: &mut ParsedFile, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }

    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            let name = extract_function(node, source, ctx, out);
            if let Some(body) = field(node, "body") {
                let inner = Ctx {
                    enclosing_fn: name.as_deref().or(ctx.enclosing_fn),
                    ..ctx
                };
                walk_with(body, source, inner, scope, out, depth);
            }
            return;
        }
        "method_definition" | "method_signature" => {
            let name = extract_method(node, source, ctx, out);
            if let Some(body) = field(node, "body") {
                let inner = Ctx {
                    enclosing_fn: name.as_deref().or(ctx.enclosing_fn),
                    ..ctx
                };
                walk_with(body, source, inner, scope, out, depth);
            }
            return;
        }
        "class_declaration" | "abstract_class_declaration" | "class" => {
            extract_class(node, source, ctx, scope, out, depth);
            return;
        }
        "interface_declaration" => {
            extract_interface(node, source, SymbolKind::Interface, out);
            return;
        }
        "enum_declaration" => {
            extract_interface(node, source, SymbolKind::Enum, out);
            return;
        }
        "type_alias_declaration" => {
            extract_interface(node, source, SymbolKind::Type, out);
            return;
        }
        "lexical_declaration" | "variable_declaration" => {
            extract_variable_decl(node, source, ctx, scope, out, depth);
            return;
        }
        "field_definition" | "public_field_definition" => {
            extract_class_field(node, source, ctx, scope, out, depth);
            return;
        }
        "import_statement" => {
            extract_import(node, source, out);
            return;
        }
        "export_statement" => {
            extract_export(node, source, out);
            // Fall through into the declaration so symbols are extracted.
        }
        "assignment_expression" => {
            extract_assignment(node, source, ctx, out);
            if let Some(rhs) = field(node, "right") {
                walk_with(rhs, source, ctx, scope, out, depth);
            }
            return;
        }
        "call_expression" => {
            extract_call(node, source, ctx, scope, out);
            // Recurse for nested calls inside the callee and arguments.
        }
        "new_expression" => {
            extract_new(node, source, ctx, out);
        }
        "jsx_opening_element" | "jsx_self_closing_element" => {
            extract_jsx_element(node, source, ctx, scope, out);
            // Recurse: attribute expressions may contain calls.
        }
        "arrow_function" | "function_expression" | "function" | "generator_function" => {
            // Anonymous function: walk body under the current context.
            if let Some(body) = field(node, "body") {
                walk_with(body, source, ctx, scope, out, depth);
            }
            return;
        }
        "comment" => {
            push_span(node, TextKind::Comment, &mut out.spans);
            return;
        }
        "string" | "regex" => {
            push_span(node, TextKind::String, &mut out.spans);
            return;
        }
        "template_string" => {
            extract_template_spans(node, source, ctx, scope, out, depth);
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, ctx, scope, out, depth + 1);
    }
}

/// Recurse into a subtree with a (possibly changed) context.
fn walk_with(node: Node, source: &str, ctx: Ctx, scope: &Scope, out: &mut ParsedFile, depth: usize) {
    walk(node, source, ctx, scope, out, depth + 1);
}

/// Template strings: fragments are text spans, `${…}` substitutions are code.
fn extract_template_spans(
    node: Node,
    source: &str,
    ctx: Ctx,
    scope: &Scope,
    out: &mut ParsedFile,
    depth: usize,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "template_substitution" {
            walk_with(child, source, ctx, scope, out, depth);
        } else {
            push_span(child, TextKind::String, &mut out.spans);
        }
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

fn is_exported(node: Node) -> bool {
    let mut current = node.parent();
    while let Some(p) = current {
        match p.kind() {
            "export_statement" => return true,
            "program" => return false,
            _ => current = p.parent(),
        }
    }
    false
}

fn collect_fn_modifiers(node: Node, source: &str, modifiers: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "async" => modifiers.push("async".into()),
            "static" => modifiers.push("static".into()),
            "get" => modifiers.push("get".into()),
            "set" => modifiers.push("set".into()),
            "accessibility_modifier" => modifiers.push(node_text(child, source)),
            "override_modifier" => modifiers.push("override".into()),
            "readonly" => modifiers.push("readonly".into()),
            "abstract" => modifiers.push("abstract".into()),
            _ => {}
        }
    }
}

fn extract_function(node: Node, source: &str, _ctx: Ctx, out: &mut ParsedFile) -> Option<String> {
    let name = field(node, "name").map(|n| node_text(n, source))?;
    let exported = is_exported(node);

    let mut modifiers = Vec::new();
    collect_fn_modifiers(node, source, &mut modifiers);
    if exported {
        modifiers.push("export".into());
    }

    out.functions.push(FunctionFact {
        name: name.clone(),
        kind: SymbolKind::Function,
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        params: field(node, "parameters")
            .map(|p| params_text(p, source))
            .unwrap_or_default(),
        return_type: field(node, "return_type").map(|n| annotation_text(n, source)),
        generics: field(node, "type_parameters").map(|n| node_text(n, source)),
        modifiers,
        decorators: Vec::new(),
        is_method: false,
        class_name: None,
        receiver: None,
        docstring: preceding_doc_comment(node, source, &["comment"]),
        is_exported: exported,
    });
    Some(name)
}

fn extract_method(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) -> Option<String> {
    let name_node = field(node, "name")?;
    let name = node_text(name_node, source);

    let mut modifiers = Vec::new();
    collect_fn_modifiers(node, source, &mut modifiers);

    let mut decorators = Vec::new();
    let mut sib = node.prev_sibling();
    while let Some(prev) = sib {
        if prev.kind() == "decorator" {
            decorators.push(node_text(prev, source).trim_start_matches('@').to_string());
        } else {
            break;
        }
        sib = prev.prev_sibling();
    }
    decorators.reverse();

    let kind = if name == "constructor" {
        SymbolKind::Constructor
    } else {
        SymbolKind::Method
    };

    out.functions.push(FunctionFact {
        name: name.clone(),
        kind,
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        params: field(node, "parameters")
            .map(|p| params_text(p, source))
            .unwrap_or_default(),
        return_type: field(node, "return_type").map(|n| annotation_text(n, source)),
        generics: field(node, "type_parameters").map(|n| node_text(n, source)),
        modifiers,
        decorators,
        is_method: true,
        class_name: ctx.enclosing_class.map(String::from),
        receiver: None,
        docstring: preceding_doc_comment(node, source, &["comment"]),
        is_exported: false,
    });
    Some(name)
}

fn extract_class(
    node: Node,
    source: &str,
    ctx: Ctx,
    scope: &Scope,
    out: &mut ParsedFile,
    depth: usize,
) {
    let name = match field(node, "name") {
        Some(n) => node_text(n, source),
        None => return,
    };
    let exported = is_exported(node);

    let mut extends = Vec::new();
    let mut implements = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "class_heritage" {
            parse_heritage(child, source, &mut extends, &mut implements);
        }
    }

    let mut modifiers = Vec::new();
    if node.kind() == "abstract_class_declaration" {
        modifiers.push("abstract".into());
    }
    if exported {
        modifiers.push("export".into());
    }

    let mut members = Vec::new();
    if let Some(body) = field(node, "body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            let kind = match child.kind() {
                "method_definition" | "method_signature" => SymbolKind::Method,
                "field_definition" | "public_field_definition" => SymbolKind::Variable,
                _ => continue,
            };
            if let Some(member_name) = field(child, "name").map(|n| node_text(n, source)) {
                let kind = if member_name == "constructor" {
                    SymbolKind::Constructor
                } else {
                    kind
                };
                members.push(MemberFact {
                    name: member_name,
                    kind,
                    start_line: start_line(child),
                });
            }
        }
    }

    out.classes.push(ClassFact {
        name: name.clone(),
        kind: SymbolKind::Class,
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        generics: field(node, "type_parameters").map(|n| node_text(n, source)),
        modifiers,
        decorators: Vec::new(),
        extends,
        implements,
        docstring: preceding_doc_comment(node, source, &["comment"]),
        is_exported: exported,
        members,
    });

    if let Some(body) = field(node, "body") {
        let inner = Ctx {
            enclosing_class: Some(name.as_str()),
            enclosing_fn: ctx.enclosing_fn,
        };
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            walk(child, source, inner, scope, out, depth + 1);
        }
    }
}

/// `class_heritage` differs between grammars: plain JS exposes `extends X`
/// as raw text, TS nests `extends_clause`/`implements_clause`.
fn parse_heritage(node: Node, source: &str, extends: &mut Vec<String>, implements: &mut Vec<String>) {
    let mut saw_clause = false;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "extends_clause" => {
                saw_clause = true;
                let mut c2 = child.walk();
                for value in child.named_children(&mut c2) {
                    extends.push(collapse_whitespace(&node_text(value, source)));
                }
            }
            "implements_clause" => {
                saw_clause = true;
                let mut c2 = child.walk();
                for value in child.named_children(&mut c2) {
                    implements.push(collapse_whitespace(&node_text(value, source)));
                }
            }
            _ => {}
        }
    }
    if !saw_clause {
        let raw = node_text(node, source);
        let raw = raw.trim().trim_start_matches("extends").trim();
        if !raw.is_empty() {
            extends.push(collapse_whitespace(raw));
        }
    }
}

fn extract_interface(node: Node, source: &str, kind: SymbolKind, out: &mut ParsedFile) {
    let name = match field(node, "name") {
        Some(n) => node_text(n, source),
        None => return,
    };
    let exported = is_exported(node);

    let mut extends = Vec::new();
    let mut members = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(child.kind(), "extends_type_clause" | "extends_clause") {
            let mut c2 = child.walk();
            for value in child.named_children(&mut c2) {
                extends.push(collapse_whitespace(&node_text(value, source)));
            }
        }
    }
    if let Some(body) = field(node, "body") {
        let mut c2 = body.walk();
        for child in body.named_children(&mut c2) {
            if matches!(child.kind(), "method_signature" | "property_signature")
                && let Some(member_name) = field(child, "name").map(|n| node_text(n, source))
            {
                let member_kind = if child.kind() == "method_signature" {
                    SymbolKind::Method
                } else {
                    SymbolKind::Variable
                };
                members.push(MemberFact {
                    name: member_name,
                    kind: member_kind,
                    start_line: start_line(child),
                });
            }
        }
    }

    let mut modifiers = Vec::new();
    if exported {
        modifiers.push("export".into());
    }

    out.classes.push(ClassFact {
        name,
        kind,
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        generics: field(node, "type_parameters").map(|n| node_text(n, source)),
        modifiers,
        decorators: Vec::new(),
        extends,
        implements: Vec::new(),
        docstring: preceding_doc_comment(node, source, &["comment"]),
        is_exported: exported,
        members,
    });
}

fn extract_variable_decl(
    node: Node,
    source: &str,
    ctx: Ctx,
    scope: &Scope,
    out: &mut ParsedFile,
    depth: usize,
) {
    let decl_kind = node
        .child(0)
        .map(|c| node_text(c, source))
        .unwrap_or_else(|| "var".into());
    let exported = is_exported(node);

    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let name_node = match field(declarator, "name") {
            Some(n) => n,
            None => continue,
        };
        let value = field(declarator, "value");

        if name_node.kind() == "identifier" {
            let name = node_text(name_node, source);
            match value {
                Some(func)
                    if matches!(
                        func.kind(),
                        "arrow_function" | "function_expression" | "function"
                            | "generator_function"
                    ) =>
                {
                    let mut modifiers = Vec::new();
                    if exported {
                        modifiers.push("export".into());
                    }
                    if func
                        .child(0)
                        .map(|c| c.kind() == "async")
                        .unwrap_or(false)
                    {
                        modifiers.push("async".into());
                    }
                    out.functions.push(FunctionFact {
                        name: name.clone(),
                        kind: SymbolKind::Function,
                        start_line: start_line(node),
                        end_line: end_line(node),
                        indent: line_indent(node, source),
                        params: field(func, "parameters")
                            .or_else(|| field(func, "parameter"))
                            .map(|p| params_text(p, source))
                            .unwrap_or_default(),
                        return_type: field(func, "return_type").map(|n| annotation_text(n, source)),
                        generics: field(func, "type_parameters").map(|n| node_text(n, source)),
                        modifiers,
                        decorators: Vec::new(),
                        is_method: false,
                        class_name: None,
                        receiver: None,
                        docstring: preceding_doc_comment(node, source, &["comment"]),
                        is_exported: exported,
                    });
                    let inner = Ctx {
                        enclosing_fn: Some(name.as_str()),
                        ..ctx
                    };
                    if let Some(body) = field(func, "body") {
                        walk_with(body, source, inner, scope, out, depth);
                    }
                    continue;
                }
                Some(init) if init.kind() == "new_expression" => {
                    if let Some(ctor) = field(init, "constructor") {
                        out.type_bindings
                            .insert(name.clone(), node_text(ctor, source));
                    }
                }
                _ => {}
            }
        }

        if let Some(value) = value {
            walk_with(value, source, ctx, scope, out, depth);
        }
    }

    // Exported value declarations are export facts too.
    if exported {
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            if let Some(name_node) = field(declarator, "name")
                && name_node.kind() == "identifier"
            {
                out.exports.push(ExportFact {
                    name: node_text(name_node, source),
                    line: start_line(node),
                    kind: Some(SymbolKind::Variable),
                    decl_kind: Some(decl_kind.clone()),
                    type_annotation: field(declarator, "type").map(|n| annotation_text(n, source)),
                    is_type_export: false,
                    is_default: false,
                    reexport_from: None,
                });
            }
        }
    }
}

fn extract_class_field(
    node: Node,
    source: &str,
    ctx: Ctx,
    scope: &Scope,
    out: &mut ParsedFile,
    depth: usize,
) {
    let name = field(node, "name").map(|n| node_text(n, source));
    let value = field(node, "value");

    // `handleClick = () => {…}` class properties behave like methods.
    if let (Some(name), Some(value)) = (&name, value)
        && matches!(value.kind(), "arrow_function" | "function_expression" | "function")
    {
        let mut modifiers = Vec::new();
        collect_fn_modifiers(node, source, &mut modifiers);
        out.functions.push(FunctionFact {
            name: name.clone(),
            kind: SymbolKind::Method,
            start_line: start_line(node),
            end_line: end_line(node),
            indent: line_indent(node, source),
            params: field(value, "parameters")
                .or_else(|| field(value, "parameter"))
                .map(|p| params_text(p, source))
                .unwrap_or_default(),
            return_type: field(value, "return_type").map(|n| annotation_text(n, source)),
            generics: None,
            modifiers,
            decorators: Vec::new(),
            is_method: true,
            class_name: ctx.enclosing_class.map(String::from),
            receiver: None,
            docstring: preceding_doc_comment(node, source, &["comment"]),
            is_exported: false,
        });
        let inner = Ctx {
            enclosing_fn: Some(name.as_str()),
            ..ctx
        };
        if let Some(body) = field(value, "body") {
            walk_with(body, source, inner, scope, out, depth);
        }
        return;
    }

    if let Some(value) = value {
        walk_with(value, source, ctx, scope, out, depth);
    }
}

// ---------------------------------------------------------------------------
// Imports / exports
// ---------------------------------------------------------------------------

fn string_value(node: Node, source: &str) -> String {
    let raw = node_text(node, source);
    raw.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

fn extract_import(node: Node, source: &str, out: &mut ParsedFile) {
    let module = match field(node, "source") {
        Some(s) => string_value(s, source),
        None => return,
    };

    let mut names = Vec::new();
    let mut aliases = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "import_clause" {
            collect_import_clause(child, source, &mut names, &mut aliases);
        }
    }

    out.imports.push(ImportFact {
        module,
        names,
        kind: ImportKind::Esm,
        is_dynamic: false,
        line: start_line(node),
        aliases,
    });
}

fn collect_import_clause(
    node: Node,
    source: &str,
    names: &mut Vec<String>,
    aliases: &mut Vec<(String, String)>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => names.push(node_text(child, source)),
            "namespace_import" => {
                let mut c2 = child.walk();
                for n in child.named_children(&mut c2) {
                    if n.kind() == "identifier" {
                        names.push(node_text(n, source));
                    }
                }
            }
            "named_imports" => {
                let mut c2 = child.walk();
                for spec in child.named_children(&mut c2) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    let imported = field(spec, "name").map(|n| node_text(n, source));
                    let alias = field(spec, "alias").map(|n| node_text(n, source));
                    match (imported, alias) {
                        (Some(imported), Some(alias)) => {
                            names.push(alias.clone());
                            aliases.push((alias, imported));
                        }
                        (Some(imported), None) => names.push(imported),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

fn extract_export(node: Node, source: &str, out: &mut ParsedFile) {
    let line = start_line(node);
    let reexport_from = field(node, "source").map(|s| string_value(s, source));
    let is_default = {
        let mut has_default = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "default" {
                has_default = true;
            }
        }
        has_default
    };

    if let Some(decl) = field(node, "declaration") {
        let (kind, is_type) = match decl.kind() {
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                (Some(SymbolKind::Function), false)
            }
            "class_declaration" | "abstract_class_declaration" => (Some(SymbolKind::Class), false),
            "interface_declaration" => (Some(SymbolKind::Interface), true),
            "enum_declaration" => (Some(SymbolKind::Enum), true),
            "type_alias_declaration" => (Some(SymbolKind::Type), true),
            // Lexical declarations are emitted in extract_variable_decl with
            // decl_kind and type annotations.
            "lexical_declaration" | "variable_declaration" => return,
            _ => (None, false),
        };
        let name = field(decl, "name")
            .map(|n| node_text(n, source))
            .unwrap_or_else(|| "default".into());
        out.exports.push(ExportFact {
            name,
            line,
            kind,
            decl_kind: None,
            type_annotation: None,
            is_type_export: is_type,
            is_default,
            reexport_from: None,
        });
        return;
    }

    // `export { a, b as c } [from './other']`, `export * from './other'`
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "export_clause" => {
                let mut c2 = child.walk();
                for spec in child.named_children(&mut c2) {
                    if spec.kind() != "export_specifier" {
                        continue;
                    }
                    let name = field(spec, "alias")
                        .or_else(|| field(spec, "name"))
                        .map(|n| node_text(n, source));
                    if let Some(name) = name {
                        out.exports.push(ExportFact {
                            name,
                            line,
                            kind: None,
                            decl_kind: None,
                            type_annotation: None,
                            is_type_export: false,
                            is_default: false,
                            reexport_from: reexport_from.clone(),
                        });
                    }
                }
            }
            "namespace_export" | "export_all" => {
                out.exports.push(ExportFact {
                    name: "*".into(),
                    line,
                    kind: None,
                    decl_kind: None,
                    type_annotation: None,
                    is_type_export: false,
                    is_default: false,
                    reexport_from: reexport_from.clone(),
                });
            }
            _ => {}
        }
    }

    // Bare `export * from 'x'` has no named child for the star in some
    // grammar versions; record it off the source text.
    if out.exports.iter().all(|e| e.line != line)
        && let Some(from) = reexport_from
    {
        out.exports.push(ExportFact {
            name: "*".into(),
            line,
            kind: None,
            decl_kind: None,
            type_annotation: None,
            is_type_export: false,
            is_default,
            reexport_from: Some(from),
        });
    }

    // Default-exported expressions: `export default foo`.
    if is_default
        && field(node, "declaration").is_none()
        && let Some(value) = field(node, "value")
    {
        let name = if value.kind() == "identifier" {
            node_text(value, source)
        } else {
            "default".into()
        };
        out.exports.push(ExportFact {
            name,
            line,
            kind: None,
            decl_kind: None,
            type_annotation: None,
            is_type_export: false,
            is_default: true,
            reexport_from: None,
        });
    }
}

/// `module.exports = {…}`, `module.exports.x = …`, `exports.x = …`, and
/// `this.attr = new T(…)` attribute typing.
fn extract_assignment(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) {
    let left = match field(node, "left") {
        Some(l) => l,
        None => return,
    };
    let right = field(node, "right");
    if left.kind() != "member_expression" {
        return;
    }
    let left_text = node_text(left, source);
    let line = start_line(node);

    if left_text == "module.exports" {
        if let Some(value) = right
            && value.kind() == "object"
        {
            let mut cursor = value.walk();
            for prop in value.named_children(&mut cursor) {
                let name = match prop.kind() {
                    "shorthand_property_identifier" => Some(node_text(prop, source)),
                    "pair" => field(prop, "key").map(|k| string_value(k, source)),
                    _ => None,
                };
                if let Some(name) = name {
                    out.exports.push(ExportFact {
                        name,
                        line,
                        kind: None,
                        decl_kind: None,
                        type_annotation: None,
                        is_type_export: false,
                        is_default: false,
                        reexport_from: None,
                    });
                }
            }
        }
        return;
    }

    if let Some(rest) = left_text
        .strip_prefix("module.exports.")
        .or_else(|| left_text.strip_prefix("exports."))
    {
        if !rest.contains('.') {
            out.exports.push(ExportFact {
                name: rest.to_string(),
                line,
                kind: None,
                decl_kind: None,
                type_annotation: None,
                is_type_export: false,
                is_default: false,
                reexport_from: None,
            });
        }
        return;
    }

    // `this.x = new T(...)` inside a class: attribute type.
    if let Some(class_name) = ctx.enclosing_class
        && let Some(attr) = left_text.strip_prefix("this.")
        && !attr.contains('.')
        && let Some(value) = right
        && value.kind() == "new_expression"
        && let Some(ctor) = field(value, "constructor")
    {
        out.attribute_types
            .entry(class_name.to_string())
            .or_default()
            .insert(attr.to_string(), node_text(ctor, source));
    }
}

// ---------------------------------------------------------------------------
// Calls
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
        enclosing_class: ctx.enclosing_class.map(String::from),
        arg_count: 0,
    }
}

fn extract_call(node: Node, source: &str, ctx: Ctx, scope: &Scope, out: &mut ParsedFile) {
    let func = match field(node, "function") {
        Some(f) => f,
        None => return,
    };
    let args = field(node, "arguments");
    let arg_count = args.map(count_args).unwrap_or(0);

    // `foo?.()` — the optional chain sits right before the arguments.
    let optional = args.is_some_and(|a| {
        let start = a.start_byte();
        start >= 2 && &source[start - 2..start] == "?."
    });

    match func.kind() {
        "import" => {
            // Dynamic import: `import('mod')` / `import(expr)`.
            if let Some(args) = args {
                let first = args.named_child(0);
                let (module, dynamic) = match first {
                    Some(a) if a.kind() == "string" => (string_value(a, source), false),
                    Some(a) => (node_text(a, source), true),
                    None => return,
                };
                out.imports.push(ImportFact {
                    module,
                    names: Vec::new(),
                    kind: ImportKind::Dynamic,
                    is_dynamic: dynamic,
                    line: start_line(node),
                    aliases: Vec::new(),
                });
            }
            return;
        }
        "identifier" => {
            let name = node_text(func, source);
            if name == "require" {
                extract_require(node, source, args, out);
                return;
            }
            let mut call = base_call(func, source, ctx, name.clone());
            call.arg_count = arg_count;
            call.uncertain = optional;
            out.calls.push(call);

            if CALLBACK_ARG0_FUNCTIONS.contains(&name.as_str()) {
                record_callback_arg(args, 0, source, ctx, scope, out);
            }
        }
        "member_expression" => {
            let prop = match field(func, "property") {
                Some(p) => p,
                None => return,
            };
            let object = match field(func, "object") {
                Some(o) => o,
                None => return,
            };
            let name = node_text(prop, source);
            let receiver_text = node_text(object, source);
            let receiver_root = receiver_text
                .split(['.', '[', '(', '?'])
                .next()
                .unwrap_or("")
                .to_string();

            // Built-in receivers are noise unless shadowed by a local.
            if BUILTIN_RECEIVERS.contains(&receiver_root.as_str())
                && !scope.locals.contains(&receiver_root)
            {
                return;
            }

            let mut call = base_call(prop, source, ctx, name.clone());
            call.is_method = true;
            call.receiver = Some(collapse_whitespace(&receiver_text));
            call.arg_count = arg_count;
            call.uncertain = optional;
            // `this.attr.method()` — remember the attribute for typed
            // resolution.
            if let Some(rest) = receiver_text.strip_prefix("this.")
                && !rest.contains('.')
            {
                call.self_attribute = Some(rest.to_string());
            }
            out.calls.push(call);

            if CALLBACK_ARG0_METHODS.contains(&name.as_str()) {
                record_callback_arg(args, 0, source, ctx, scope, out);
            } else if name == "addEventListener" {
                record_callback_arg(args, 1, source, ctx, scope, out);
            }
        }
        _ => {}
    }
}

/// `const a = require('x')` / `const { parse: myParse } = require('./lib')`.
fn extract_require(node: Node, source: &str, args: Option<Node>, out: &mut ParsedFile) {
    let arg = args.and_then(|a| a.named_child(0));
    let (module, kind, dynamic) = match arg {
        Some(a) if a.kind() == "string" => (string_value(a, source), ImportKind::Cjs, false),
        Some(a) if a.kind() == "identifier" => {
            (node_text(a, source), ImportKind::CommonjsVariable, true)
        }
        Some(a) => (node_text(a, source), ImportKind::CommonjsVariable, true),
        None => return,
    };

    let mut names = Vec::new();
    let mut aliases = Vec::new();
    if let Some(declarator) = node.parent().filter(|p| p.kind() == "variable_declarator")
        && let Some(name_node) = field(declarator, "name")
    {
        match name_node.kind() {
            "identifier" => names.push(node_text(name_node, source)),
            "object_pattern" => {
                let mut cursor = name_node.walk();
                for prop in name_node.named_children(&mut cursor) {
                    match prop.kind() {
                        "shorthand_property_identifier_pattern" => {
                            names.push(node_text(prop, source));
                        }
                        "pair_pattern" => {
                            let key = field(prop, "key").map(|k| node_text(k, source));
                            let value = field(prop, "value").map(|v| node_text(v, source));
                            if let (Some(key), Some(value)) = (key, value) {
                                names.push(value.clone());
                                aliases.push((value, key));
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    out.imports.push(ImportFact {
        module,
        names,
        kind,
        is_dynamic: dynamic,
        line: start_line(node),
        aliases,
    });
}

fn extract_new(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) {
    let ctor = match field(node, "constructor") {
        Some(c) => c,
        None => return,
    };
    let name = node_text(ctor, source);
    let mut call = base_call(node, source, ctx, name.clone());
    call.resolved_name = Some(name);
    call.arg_count = field(node, "arguments").map(count_args).unwrap_or(0);
    out.calls.push(call);
}

/// Record a function-valued argument flowing into a callback slot.
fn record_callback_arg(
    args: Option<Node>,
    position: u32,
    source: &str,
    ctx: Ctx,
    scope: &Scope,
    out: &mut ParsedFile,
) {
    let arg = match args.and_then(|a| a.named_child(position as usize)) {
        Some(a) => a,
        None => return,
    };
    match arg.kind() {
        "identifier" => {
            let name = node_text(arg, source);
            // Names bound only to non-callable literals are not callbacks.
            if scope.literal_only.contains(&name) {
                return;
            }
            let mut call = base_call(arg, source, ctx, name);
            call.is_function_reference = true;
            call.is_potential_callback = true;
            out.calls.push(call);
        }
        "member_expression" => {
            let prop = field(arg, "property");
            let object = field(arg, "object");
            if let (Some(prop), Some(object)) = (prop, object) {
                let mut call = base_call(arg, source, ctx, node_text(prop, source));
                call.is_function_reference = true;
                call.is_potential_callback = true;
                call.is_method = true;
                call.receiver = Some(node_text(object, source));
                out.calls.push(call);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// JSX
// ---------------------------------------------------------------------------

/// `<Name />` / `<ns.Name />` are call sites of the component; `onX={fn}`
/// props are callback references.
fn extract_jsx_element(node: Node, source: &str, ctx: Ctx, scope: &Scope, out: &mut ParsedFile) {
    if let Some(name_node) = field(node, "name") {
        let full = node_text(name_node, source);
        let is_component = starts_uppercase(&full) || full.contains('.');
        if is_component {
            let (name, receiver) = match full.rsplit_once('.') {
                Some((obj, last)) => (last.to_string(), Some(obj.to_string())),
                None => (full.clone(), None),
            };
            let mut call = base_call(node, source, ctx, name);
            call.receiver = receiver;
            out.calls.push(call);
        }
    }

    let mut cursor = node.walk();
    for attr in node.named_children(&mut cursor) {
        if attr.kind() != "jsx_attribute" {
            continue;
        }
        let attr_name = attr
            .named_child(0)
            .map(|n| node_text(n, source))
            .unwrap_or_default();
        if !attr_name.starts_with("on") {
            continue;
        }
        // `onX={expr}` — only bare identifiers / member refs are callback
        // references; arrow bodies are walked as code elsewhere.
        let Some(expr) = attr
            .named_child(1)
            .filter(|n| n.kind() == "jsx_expression")
            .and_then(|n| n.named_child(0))
        else {
            continue;
        };
        match expr.kind() {
            "identifier" => {
                let name = node_text(expr, source);
                if scope.literal_only.contains(&name) {
                    continue;
                }
                let mut call = base_call(expr, source, ctx, name);
                call.is_function_reference = true;
                call.is_potential_callback = true;
                out.calls.push(call);
            }
            "member_expression" => {
                if let (Some(prop), Some(object)) = (field(expr, "property"), field(expr, "object"))
                {
                    let mut call = base_call(expr, source, ctx, node_text(prop, source));
                    call.is_function_reference = true;
                    call.is_potential_callback = true;
                    call.is_method = true;
                    call.receiver = Some(node_text(object, source));
                    out.calls.push(call);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn parse(src: &str) -> ParsedFile {
        parse_source(Language::Javascript, src).unwrap()
    }

    #[test]
    fn function_with_jsdoc() {
        let src = "/** Greets. */\nfunction greet(name) { return 'hi ' + name; }\n";
        let parsed = parse(src);
        assert_eq!(parsed.functions.len(), 1);
        let f = &parsed.functions[0];
        assert_eq!(f.name, "greet");
        assert_eq!(f.params, "name");
        assert_eq!(f.docstring.as_deref(), Some("Greets."));
    }

    #[test]
    fn const_arrow_is_a_function() {
        let parsed = parse("const add = (a, b) => a + b;\n");
        assert_eq!(parsed.functions.len(), 1);
        assert_eq!(parsed.functions[0].name, "add");
        assert_eq!(parsed.functions[0].params, "a, b");
    }

    #[test]
    fn method_calls_carry_receiver_and_enclosing() {
        let src = "function run() { helper.go(1); }\n";
        let parsed = parse(src);
        let call = parsed.calls.iter().find(|c| c.name == "go").unwrap();
        assert!(call.is_method);
        assert_eq!(call.receiver.as_deref(), Some("helper"));
        assert_eq!(call.enclosing_function.as_deref(), Some("run"));
        assert_eq!(call.arg_count, 1);
    }

    #[test]
    fn builtin_receivers_are_filtered() {
        let parsed = parse("function f() { JSON.parse('{}'); console.log('x'); }\n");
        assert!(parsed.calls.iter().all(|c| c.name != "parse"));
        assert!(parsed.calls.iter().all(|c| c.name != "log"));
    }

    #[test]
    fn local_shadow_of_builtin_receiver_is_kept() {
        let parsed = parse("const path = makePath();\nfunction f() { path.parse('x'); }\n");
        assert!(parsed.calls.iter().any(|c| c.name == "parse"));
    }

    #[test]
    fn optional_chain_call_is_uncertain() {
        let parsed = parse("function f(cb) { cb?.(); f(cb?.x); }\n");
        let call = parsed.calls.iter().find(|c| c.name == "cb").unwrap();
        assert!(call.uncertain);
        let direct = parsed.calls.iter().find(|c| c.name == "f").unwrap();
        assert!(!direct.uncertain);
    }

    #[test]
    fn callback_positions() {
        let src = "function f(items, handler) {\n  items.map(handler);\n  setTimeout(handler, 10);\n  el.addEventListener('click', handler);\n}\n";
        let parsed = parse(src);
        let callbacks: Vec<_> = parsed
            .calls
            .iter()
            .filter(|c| c.is_potential_callback && c.name == "handler")
            .collect();
        assert_eq!(callbacks.len(), 3);
    }

    #[test]
    fn literal_bound_name_is_not_a_callback() {
        let src = "const config = { retries: 3 };\nfunction f(items) { items.map(config); }\n";
        let parsed = parse(src);
        assert!(
            parsed
                .calls
                .iter()
                .all(|c| !(c.name == "config" && c.is_potential_callback))
        );
    }

    #[test]
    fn require_destructuring_alias() {
        let parsed = parse("const { parse: myParse } = require('./lib');\n");
        assert_eq!(parsed.imports.len(), 1);
        let import = &parsed.imports[0];
        assert_eq!(import.module, "./lib");
        assert_eq!(import.kind, ImportKind::Cjs);
        assert_eq!(import.aliases, vec![("myParse".into(), "parse".into())]);
    }

    #[test]
    fn variable_require_is_dynamic() {
        let parsed = parse("function load(mod) { return require(mod); }\n");
        let import = &parsed.imports[0];
        assert_eq!(import.kind, ImportKind::CommonjsVariable);
        assert!(import.is_dynamic);
        assert_eq!(import.module, "mod");
    }

    #[test]
    fn module_exports_object() {
        let parsed = parse("function a() {}\nfunction b() {}\nmodule.exports = { a, b };\n");
        let names: Vec<_> = parsed.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn this_attribute_types_from_constructor() {
        let src =
            "class App {\n  constructor() { this.store = new Store(); }\n  run() { this.store.save(); }\n}\n";
        let parsed = parse(src);
        assert_eq!(
            parsed.attribute_types["App"].get("store").map(String::as_str),
            Some("Store")
        );
        let call = parsed.calls.iter().find(|c| c.name == "save").unwrap();
        assert_eq!(call.self_attribute.as_deref(), Some("store"));
        assert_eq!(call.enclosing_class.as_deref(), Some("App"));
    }

    #[test]
    fn new_expression_resolves_type() {
        let parsed = parse("function f() { return new Widget(1, 2); }\n");
        let call = parsed.calls.iter().find(|c| c.name == "Widget").unwrap();
        assert_eq!(call.resolved_name.as_deref(), Some("Widget"));
        assert_eq!(call.arg_count, 2);
    }
}
