//! Java symbol and call extraction: classes/interfaces/enums with
//! annotations, constructors emitted once, static and wildcard imports, and
//! typed local/field bindings.

use tree_sitter::{Node, Tree};

use crate::parser::LanguageAdapter;
use crate::parser::facts::*;
use crate::parser::helpers::*;
use crate::parser::languages::Language;

/// Receivers whose method calls are JDK noise (`System.out.println`,
/// `Collections.sort`, …).
const JAVA_BUILTIN_RECEIVERS: &[&str] = &[
    "System", "Objects", "Math", "Arrays", "Collections", "String", "Integer", "Long", "Double",
    "Float", "Boolean", "Character", "Byte", "Short", "Thread", "Optional", "Stream", "Files",
    "Paths", "Logger",
];

pub struct JavaAdapter;

impl LanguageAdapter for JavaAdapter {
    fn language(&self) -> Language {
        Language::Java
    }

    fn extract(&self, tree: &Tree, source: &str, out: &mut ParsedFile) {
        let root = tree.root_node();
        walk(root, source, Ctx::default(), out, 0);
    }
}

#[derive(Clone, Copy, Default)]
struct Ctx<'a> {
    enclosing_fn: Option<&'a str>,
    enclosing_class: Option<&'a str>,
}

fn walk(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }

    match node.kind() {
        "package_declaration" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if matches!(child.kind(), "scoped_identifier" | "identifier") {
                    out.package_name = Some(node_text(child, source));
                }
            }
        }
        "import_declaration" => {
            extract_import(node, source, out);
            return;
        }
        "class_declaration" => {
            extract_type(node, source, SymbolKind::Class, out, depth);
            return;
        }
        "interface_declaration" => {
            extract_type(node, source, SymbolKind::Interface, out, depth);
            return;
        }
        "enum_declaration" => {
            extract_type(node, source, SymbolKind::Enum, out, depth);
            return;
        }
        "method_declaration" => {
            let name = extract_method(node, source, ctx, false, out);
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
        "constructor_declaration" => {
            let name = extract_method(node, source, ctx, true, out);
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
        "field_declaration" => {
            extract_field(node, source, ctx, out);
        }
        "local_variable_declaration" => {
            extract_local(node, source, out);
        }
        "method_invocation" => {
            extract_invocation(node, source, ctx, out);
        }
        "object_creation_expression" => {
            extract_new(node, source, ctx, out);
        }
        "line_comment" | "block_comment" => {
            push_span(node, TextKind::Comment, &mut out.spans);
            return;
        }
        "string_literal" => {
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
// Modifiers and annotations
// ---------------------------------------------------------------------------

/// (canonical modifier tokens, annotation names) from a declaration's
/// `modifiers` child.
fn modifiers_of(node: Node, source: &str) -> (Vec<String>, Vec<String>) {
    let mut modifiers = Vec::new();
    let mut annotations = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "modifiers" {
            continue;
        }
        let mut c2 = child.walk();
        for tok in child.children(&mut c2) {
            match tok.kind() {
                "marker_annotation" | "annotation" => {
                    if let Some(name) = field(tok, "name") {
                        let ann = node_text(name, source);
                        modifiers.push(ann.to_lowercase());
                        annotations.push(ann);
                    }
                }
                _ => {
                    let text = node_text(tok, source);
                    if !text.is_empty() {
                        modifiers.push(text);
                    }
                }
            }
        }
    }
    (modifiers, annotations)
}

fn base_type_text(text: &str) -> String {
    text.trim()
        .split('<')
        .next()
        .unwrap_or(text)
        .trim_end_matches("[]")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

fn extract_type(node: Node, source: &str, kind: SymbolKind, out: &mut ParsedFile, depth: usize) {
    let name = match field(node, "name") {
        Some(n) => node_text(n, source),
        None => return,
    };
    let (modifiers, annotations) = modifiers_of(node, source);
    let is_exported = modifiers.iter().any(|m| m == "public");

    let mut extends = Vec::new();
    let mut implements = Vec::new();
    {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "superclass" => {
                    let raw = node_text(child, source);
                    extends.push(collapse_whitespace(
                        raw.trim_start_matches("extends").trim(),
                    ));
                }
                "super_interfaces" => {
                    let raw = node_text(child, source);
                    let raw = raw.trim_start_matches("implements").trim().to_string();
                    for part in split_type_list(&raw) {
                        implements.push(part);
                    }
                }
                "extends_interfaces" => {
                    let raw = node_text(child, source);
                    let raw = raw.trim_start_matches("extends").trim().to_string();
                    for part in split_type_list(&raw) {
                        extends.push(part);
                    }
                }
                _ => {}
            }
        }
    }

    let mut members = Vec::new();
    if let Some(body) = field(node, "body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            let member_kind = match child.kind() {
                "method_declaration" => SymbolKind::Method,
                "constructor_declaration" => SymbolKind::Constructor,
                "field_declaration" => SymbolKind::Variable,
                _ => continue,
            };
            let name_node = match member_kind {
                SymbolKind::Variable => field(child, "declarator").and_then(|d| field(d, "name")),
                _ => field(child, "name"),
            };
            if let Some(n) = name_node {
                members.push(MemberFact {
                    name: node_text(n, source),
                    kind: member_kind,
                    start_line: start_line(child),
                });
            }
        }
    }

    out.classes.push(ClassFact {
        name: name.clone(),
        kind,
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        generics: field(node, "type_parameters").map(|n| node_text(n, source)),
        modifiers,
        decorators: annotations,
        extends,
        implements,
        docstring: preceding_doc_comment(node, source, &["block_comment", "line_comment"]),
        is_exported,
        members,
    });

    if is_exported {
        out.exports.push(ExportFact {
            name: name.clone(),
            line: start_line(node),
            kind: Some(kind),
            decl_kind: None,
            type_annotation: None,
            is_type_export: true,
            is_default: false,
            reexport_from: None,
        });
    }

    if let Some(body) = field(node, "body") {
        let inner = Ctx {
            enclosing_class: Some(name.as_str()),
            enclosing_fn: None,
        };
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            walk(child, source, inner, out, depth + 1);
        }
    }
}

/// Split `A, B<C, D>, E` at top-level commas.
fn split_type_list(raw: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in raw.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                let t = collapse_whitespace(current.trim());
                if !t.is_empty() {
                    parts.push(t);
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let t = collapse_whitespace(current.trim());
    if !t.is_empty() {
        parts.push(t);
    }
    parts
}

fn extract_method(
    node: Node,
    source: &str,
    ctx: Ctx,
    is_constructor: bool,
    out: &mut ParsedFile,
) -> Option<String> {
    let name = field(node, "name").map(|n| node_text(n, source))?;
    let (modifiers, annotations) = modifiers_of(node, source);
    let is_exported = modifiers.iter().any(|m| m == "public");

    out.functions.push(FunctionFact {
        name: name.clone(),
        kind: if is_constructor {
            SymbolKind::Constructor
        } else {
            SymbolKind::Method
        },
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        params: field(node, "parameters")
            .map(|p| params_text(p, source))
            .unwrap_or_default(),
        return_type: field(node, "type").map(|n| collapse_whitespace(&node_text(n, source))),
        generics: field(node, "type_parameters").map(|n| node_text(n, source)),
        modifiers,
        decorators: annotations,
        is_method: true,
        class_name: ctx.enclosing_class.map(String::from),
        receiver: None,
        docstring: preceding_doc_comment(node, source, &["block_comment", "line_comment"]),
        is_exported,
    });
    Some(name)
}

/// Instance fields with class types feed the attribute-type map:
/// `private Store store = new Store();` → `store: Store`.
fn extract_field(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) {
    let Some(class_name) = ctx.enclosing_class else {
        return;
    };
    let ty = match field(node, "type") {
        Some(t) => base_type_text(&node_text(t, source)),
        None => return,
    };
    if !starts_uppercase(&ty) {
        return;
    }
    if let Some(declarator) = field(node, "declarator")
        && let Some(name) = field(declarator, "name")
    {
        out.attribute_types
            .entry(class_name.to_string())
            .or_default()
            .insert(node_text(name, source), ty);
    }
}

/// `Foo x = …` binds x to Foo for receiver-type resolution.
fn extract_local(node: Node, source: &str, out: &mut ParsedFile) {
    let ty = match field(node, "type") {
        Some(t) => base_type_text(&node_text(t, source)),
        None => return,
    };
    if !starts_uppercase(&ty) || ty == "String" {
        return;
    }
    if let Some(declarator) = field(node, "declarator")
        && let Some(name) = field(declarator, "name")
    {
        out.type_bindings.insert(node_text(name, source), ty);
    }
}

fn bind_params(node: Node, source: &str, out: &mut ParsedFile) {
    let Some(params) = field(node, "parameters") else {
        return;
    };
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        if param.kind() != "formal_parameter" {
            continue;
        }
        let ty = field(param, "type").map(|t| base_type_text(&node_text(t, source)));
        let name = field(param, "name").map(|n| node_text(n, source));
        if let (Some(ty), Some(name)) = (ty, name)
            && starts_uppercase(&ty)
            && ty != "String"
        {
            out.type_bindings.insert(name, ty);
        }
    }
}

// ---------------------------------------------------------------------------
// Imports and calls
// ---------------------------------------------------------------------------

fn extract_import(node: Node, source: &str, out: &mut ParsedFile) {
    let mut is_static = false;
    let mut path = None;
    let mut wildcard = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => is_static = true,
            "scoped_identifier" | "identifier" => path = Some(node_text(child, source)),
            "asterisk" => wildcard = true,
            _ => {}
        }
    }

    let Some(path) = path else { return };
    let names = if wildcard {
        vec!["*".to_string()]
    } else {
        vec![path.rsplit('.').next().unwrap_or(&path).to_string()]
    };

    out.imports.push(ImportFact {
        module: if wildcard {
            format!("{path}.*")
        } else {
            path
        },
        names,
        kind: if is_static {
            ImportKind::JavaStaticImport
        } else {
            ImportKind::JavaImport
        },
        is_dynamic: false,
        line: start_line(node),
        aliases: Vec::new(),
    });
}

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

fn extract_invocation(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) {
    let name_node = match field(node, "name") {
        Some(n) => n,
        None => return,
    };
    let name = node_text(name_node, source);
    let arg_count = field(node, "arguments").map(count_args).unwrap_or(0);
    let object = field(node, "object");

    if let Some(object) = object {
        let receiver_text = node_text(object, source);
        let receiver_root = receiver_text.split('.').next().unwrap_or("").to_string();
        if JAVA_BUILTIN_RECEIVERS.contains(&receiver_root.as_str()) {
            return;
        }
        let mut call = base_call(name_node, source, ctx, name);
        call.is_method = true;
        call.receiver = Some(collapse_whitespace(&receiver_text));
        call.arg_count = arg_count;
        out.calls.push(call);
    } else {
        // Unqualified call: an implicit `this.name(...)` inside a class.
        let mut call = base_call(name_node, source, ctx, name);
        call.arg_count = arg_count;
        if ctx.enclosing_class.is_some() {
            call.is_method = true;
            call.receiver = Some("this".to_string());
        }
        out.calls.push(call);
    }
}

fn extract_new(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) {
    let ty = match field(node, "type") {
        Some(t) => t,
        None => return,
    };
    let name = base_type_text(&node_text(ty, source));
    if name.is_empty() {
        return;
    }
    let mut call = base_call(node, source, ctx, name.clone());
    call.resolved_name = Some(name);
    call.arg_count = field(node, "arguments").map(count_args).unwrap_or(0);
    out.calls.push(call);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn parse(src: &str) -> ParsedFile {
        parse_source(Language::Java, src).unwrap()
    }

    #[test]
    fn class_with_constructor_and_methods() {
        let src = "package com.example;\n\npublic class Greeter {\n    public Greeter() {}\n    public String greet(String name) { return format(name); }\n    private String format(String name) { return \"hi \" + name; }\n}\n";
        let parsed = parse(src);
        assert_eq!(parsed.package_name.as_deref(), Some("com.example"));

        let ctors: Vec<_> = parsed
            .functions
            .iter()
            .filter(|f| f.kind == SymbolKind::Constructor)
            .collect();
        assert_eq!(ctors.len(), 1);
        assert_eq!(ctors[0].name, "Greeter");

        // Unqualified call inside a class is an implicit this-call.
        let call = parsed.calls.iter().find(|c| c.name == "format").unwrap();
        assert_eq!(call.receiver.as_deref(), Some("this"));
        assert_eq!(call.enclosing_class.as_deref(), Some("Greeter"));
        assert_eq!(call.enclosing_function.as_deref(), Some("greet"));
    }

    #[test]
    fn annotations_become_modifiers_and_decorators() {
        let src = "public class A {\n    @Override\n    public String toString() { return \"a\"; }\n}\n";
        let parsed = parse(src);
        let m = parsed.functions.iter().find(|f| f.name == "toString").unwrap();
        assert!(m.modifiers.contains(&"override".to_string()));
        assert!(m.decorators.contains(&"Override".to_string()));
    }

    #[test]
    fn static_and_wildcard_imports() {
        let src = "import com.x.Y;\nimport static com.x.Y.helper;\nimport com.util.*;\nclass A {}\n";
        let parsed = parse(src);
        assert_eq!(parsed.imports.len(), 3);
        assert_eq!(parsed.imports[0].kind, ImportKind::JavaImport);
        assert_eq!(parsed.imports[1].kind, ImportKind::JavaStaticImport);
        assert_eq!(parsed.imports[2].module, "com.util.*");
        assert_eq!(parsed.imports[2].names, vec!["*"]);
    }

    #[test]
    fn system_out_is_filtered() {
        let src = "class A { void f() { System.out.println(\"x\"); } }\n";
        let parsed = parse(src);
        assert!(parsed.calls.iter().all(|c| c.name != "println"));
    }

    #[test]
    fn typed_locals_bind() {
        let src = "class A { void f() { Store store = new Store(); store.save(); } }\n";
        let parsed = parse(src);
        assert_eq!(
            parsed.type_bindings.get("store").map(String::as_str),
            Some("Store")
        );
        let new_call = parsed.calls.iter().find(|c| c.name == "Store").unwrap();
        assert_eq!(new_call.resolved_name.as_deref(), Some("Store"));
    }

    #[test]
    fn extends_and_implements() {
        let src =
            "public class Impl extends Base implements Runnable, Comparable<Impl> { }\n";
        let parsed = parse(src);
        let c = &parsed.classes[0];
        assert_eq!(c.extends, vec!["Base"]);
        assert_eq!(c.implements, vec!["Runnable", "Comparable<Impl>"]);
    }
}
