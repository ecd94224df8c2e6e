//! Go symbol and call extraction: receivers, package-scoped bindings,
//! `:=` closures that shadow package-level functions, and the Go builtin
//! filter.

use tree_sitter::{Node, Tree};

use crate::parser::LanguageAdapter;
use crate::parser::facts::*;
use crate::parser::helpers::*;
use crate::parser::languages::Language;

const GO_BUILTINS: &[&str] = &[
    "append", "len", "make", "cap", "copy", "new", "delete", "panic", "recover", "print",
    "println", "close", "min", "max", "clear",
];

pub struct GoAdapter;

impl LanguageAdapter for GoAdapter {
    fn language(&self) -> Language {
        Language::Go
    }

    fn extract(&self, tree: &Tree, source: &str, out: &mut ParsedFile) {
        let root = tree.root_node();
        walk(root, source, Ctx::default(), out, 0);
    }
}

#[derive(Clone, Copy, Default)]
struct Ctx<'a> {
    enclosing_fn: Option<&'a str>,
    /// Receiver type of the enclosing method.
    enclosing_type: Option<&'a str>,
}

fn walk(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }

    match node.kind() {
        "package_clause" => {
            if let Some(name) = node.named_child(0) {
                out.package_name = Some(node_text(name, source));
            }
        }
        "function_declaration" => {
            let name = extract_function(node, source, None, out);
            bind_params(node, source, out);
            if let Some(body) = field(node, "body") {
                let inner = Ctx {
                    enclosing_fn: name.as_deref().or(ctx.enclosing_fn),
                    enclosing_type: None,
                };
                walk(body, source, inner, out, depth + 1);
            }
            return;
        }
        "method_declaration" => {
            let receiver_type = receiver_type_name(node, source);
            let name = extract_function(node, source, receiver_type.as_deref(), out);
            bind_receiver(node, source, receiver_type.as_deref(), out);
            bind_params(node, source, out);
            if let Some(body) = field(node, "body") {
                let inner = Ctx {
                    enclosing_fn: name.as_deref().or(ctx.enclosing_fn),
                    enclosing_type: receiver_type.as_deref(),
                };
                walk(body, source, inner, out, depth + 1);
            }
            return;
        }
        "type_declaration" => {
            let mut cursor = node.walk();
            for spec in node.named_children(&mut cursor) {
                if spec.kind() == "type_spec" {
                    extract_type_spec(spec, source, out);
                }
            }
            return;
        }
        "import_declaration" => {
            extract_imports(node, source, out);
            return;
        }
        "short_var_declaration" => {
            extract_short_var(node, source, ctx, out, depth);
            // Recurse so calls on the right-hand side are recorded.
        }
        "var_declaration" | "const_declaration" => {
            extract_var_decl(node, source, out);
        }
        "call_expression" => {
            extract_call(node, source, ctx, out);
        }
        "composite_literal" => {
            extract_composite(node, source, ctx, out);
        }
        "comment" => {
            push_span(node, TextKind::Comment, &mut out.spans);
            return;
        }
        "interpreted_string_literal" | "raw_string_literal" => {
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
// Declarations
// ---------------------------------------------------------------------------

fn go_exported(name: &str) -> bool {
    starts_uppercase(name)
}

/// Bare type name of a method receiver: `(s *Server)` → `Server`.
fn receiver_type_name(node: Node, source: &str) -> Option<String> {
    let receiver = field(node, "receiver")?;
    let param = receiver.named_child(0)?;
    let ty = field(param, "type")?;
    Some(base_type_name(&node_text(ty, source)))
}

fn base_type_name(text: &str) -> String {
    let t = text.trim().trim_start_matches(['*', '&']).trim();
    let t = t.trim_start_matches("[]");
    // Generic receivers: `Server[T]` → `Server`.
    t.split('[').next().unwrap_or(t).trim().to_string()
}

fn extract_function(
    node: Node,
    source: &str,
    receiver: Option<&str>,
    out: &mut ParsedFile,
) -> Option<String> {
    let name = field(node, "name").map(|n| node_text(n, source))?;
    let exported = go_exported(&name);

    let mut modifiers = Vec::new();
    if exported {
        modifiers.push("export".into());
    }

    out.functions.push(FunctionFact {
        name: name.clone(),
        kind: if receiver.is_some() {
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
        return_type: field(node, "result").map(|n| collapse_whitespace(&node_text(n, source))),
        generics: field(node, "type_parameters").map(|n| node_text(n, source)),
        modifiers,
        decorators: Vec::new(),
        is_method: receiver.is_some(),
        class_name: receiver.map(String::from),
        receiver: receiver.map(String::from),
        docstring: preceding_doc_comment(node, source, &["comment"]),
        is_exported: exported,
    });

    if exported {
        out.exports.push(ExportFact {
            name: name.clone(),
            line: start_line(node),
            kind: Some(if receiver.is_some() {
                SymbolKind::Method
            } else {
                SymbolKind::Function
            }),
            decl_kind: None,
            type_annotation: None,
            is_type_export: false,
            is_default: false,
            reexport_from: None,
        });
    }
    Some(name)
}

fn extract_type_spec(spec: Node, source: &str, out: &mut ParsedFile) {
    let name = match field(spec, "name") {
        Some(n) => node_text(n, source),
        None => return,
    };
    let ty = field(spec, "type");
    let kind = match ty.map(|t| t.kind()) {
        Some("struct_type") => SymbolKind::Struct,
        Some("interface_type") => SymbolKind::Interface,
        _ => SymbolKind::Type,
    };
    let exported = go_exported(&name);

    let mut members = Vec::new();
    // Interface method sets are members; struct fields are not symbols but
    // embedded types feed `extends`.
    let mut extends = Vec::new();
    if let Some(ty) = ty {
        match ty.kind() {
            "interface_type" => {
                let mut cursor = ty.walk();
                for child in ty.named_children(&mut cursor) {
                    if child.kind() == "method_elem"
                        && let Some(m) = field(child, "name")
                    {
                        members.push(MemberFact {
                            name: node_text(m, source),
                            kind: SymbolKind::Method,
                            start_line: start_line(child),
                        });
                    } else if child.kind() == "type_elem" {
                        extends.push(collapse_whitespace(&node_text(child, source)));
                    }
                }
            }
            "struct_type" => {
                if let Some(fields) = ty.named_child(0) {
                    let mut cursor = fields.walk();
                    for f in fields.named_children(&mut cursor) {
                        // Embedded field: declaration with a type but no name.
                        if f.kind() == "field_declaration"
                            && field(f, "name").is_none()
                            && let Some(ty) = field(f, "type")
                        {
                            extends.push(base_type_name(&node_text(ty, source)));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let mut modifiers = Vec::new();
    if exported {
        modifiers.push("export".into());
    }

    // Anchor the docstring on the enclosing type_declaration.
    let doc_anchor = spec.parent().unwrap_or(spec);

    out.classes.push(ClassFact {
        name: name.clone(),
        kind,
        start_line: start_line(spec),
        end_line: end_line(spec),
        indent: line_indent(spec, source),
        generics: field(spec, "type_parameters").map(|n| node_text(n, source)),
        modifiers,
        decorators: Vec::new(),
        extends,
        implements: Vec::new(),
        docstring: preceding_doc_comment(doc_anchor, source, &["comment"]),
        is_exported: exported,
        members,
    });

    if exported {
        out.exports.push(ExportFact {
            name,
            line: start_line(spec),
            kind: Some(kind),
            decl_kind: None,
            type_annotation: None,
            is_type_export: true,
            is_default: false,
            reexport_from: None,
        });
    }
}

fn extract_var_decl(node: Node, source: &str, out: &mut ParsedFile) {
    // Only top-level uppercase vars/consts are part of the package API.
    if node.parent().map(|p| p.kind()) != Some("source_file") {
        return;
    }
    let mut cursor = node.walk();
    for spec in node.named_children(&mut cursor) {
        if !matches!(spec.kind(), "var_spec" | "const_spec") {
            continue;
        }
        if let Some(name_node) = field(spec, "name") {
            let name = node_text(name_node, source);
            if go_exported(&name) {
                out.exports.push(ExportFact {
                    name,
                    line: start_line(spec),
                    kind: Some(SymbolKind::Variable),
                    decl_kind: None,
                    type_annotation: field(spec, "type")
                        .map(|t| collapse_whitespace(&node_text(t, source))),
                    is_type_export: false,
                    is_default: false,
                    reexport_from: None,
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Typed parameters bind their names: `func f(t *T)` → `t: T`.
fn bind_params(node: Node, source: &str, out: &mut ParsedFile) {
    let params = match field(node, "parameters") {
        Some(p) => p,
        None => return,
    };
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        if param.kind() != "parameter_declaration" {
            continue;
        }
        let Some(ty) = field(param, "type") else {
            continue;
        };
        let type_name = base_type_name(&node_text(ty, source));
        if type_name.is_empty() || !starts_uppercase(&type_name) {
            continue;
        }
        let mut c2 = param.walk();
        for child in param.named_children(&mut c2) {
            if child.kind() == "identifier" {
                out.type_bindings
                    .insert(node_text(child, source), type_name.clone());
            }
        }
    }
}

fn bind_receiver(node: Node, source: &str, receiver_type: Option<&str>, out: &mut ParsedFile) {
    let Some(receiver_type) = receiver_type else {
        return;
    };
    if let Some(receiver) = field(node, "receiver")
        && let Some(param) = receiver.named_child(0)
    {
        let mut cursor = param.walk();
        for child in param.named_children(&mut cursor) {
            if child.kind() == "identifier" {
                out.type_bindings
                    .insert(node_text(child, source), receiver_type.to_string());
            }
        }
    }
}

/// `x := T{…}` binds x; `handler := func(…) {…}` declares a local closure
/// that shadows any package-level function of the same name.
fn extract_short_var(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile, _depth: usize) {
    let left = field(node, "left");
    let right = field(node, "right");
    let (Some(left), Some(right)) = (left, right) else {
        return;
    };
    let names: Vec<Node> = {
        let mut cursor = left.walk();
        left.named_children(&mut cursor).collect()
    };
    let values: Vec<Node> = {
        let mut cursor = right.walk();
        right.named_children(&mut cursor).collect()
    };

    for (name_node, value) in names.iter().zip(values.iter()) {
        if name_node.kind() != "identifier" {
            continue;
        }
        let name = node_text(*name_node, source);
        match value.kind() {
            "composite_literal" => {
                if let Some(ty) = field(*value, "type")
                    && ty.kind() == "type_identifier"
                {
                    out.type_bindings.insert(name, node_text(ty, source));
                }
            }
            "func_literal" => {
                out.functions.push(FunctionFact {
                    name,
                    kind: SymbolKind::Function,
                    start_line: start_line(*value),
                    end_line: end_line(*value),
                    indent: line_indent(node, source),
                    params: field(*value, "parameters")
                        .map(|p| params_text(p, source))
                        .unwrap_or_default(),
                    return_type: field(*value, "result")
                        .map(|n| collapse_whitespace(&node_text(n, source))),
                    generics: None,
                    modifiers: Vec::new(),
                    decorators: Vec::new(),
                    is_method: false,
                    class_name: None,
                    receiver: None,
                    docstring: None,
                    is_exported: false,
                });
            }
            "unary_expression" => {
                // `x := &T{…}`
                if let Some(operand) = field(*value, "operand")
                    && operand.kind() == "composite_literal"
                    && let Some(ty) = field(operand, "type")
                    && ty.kind() == "type_identifier"
                {
                    out.type_bindings.insert(name, node_text(ty, source));
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Imports and calls
// ---------------------------------------------------------------------------

fn extract_imports(node: Node, source: &str, out: &mut ParsedFile) {
    let mut specs = Vec::new();
    collect_import_specs(node, &mut specs, 0);
    for spec in specs {
        let path_node = match field(spec, "path") {
            Some(p) => p,
            None => continue,
        };
        let module = node_text(path_node, source)
            .trim_matches('"')
            .to_string();
        let name = match field(spec, "name") {
            Some(n) => node_text(n, source),
            None => module.rsplit('/').next().unwrap_or(&module).to_string(),
        };
        out.imports.push(ImportFact {
            module,
            names: vec![name],
            kind: ImportKind::Import,
            is_dynamic: false,
            line: start_line(spec),
            aliases: Vec::new(),
        });
    }
}

fn collect_import_specs<'a>(node: Node<'a>, specs: &mut Vec<Node<'a>>, depth: usize) {
    if depth > 4 {
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "import_spec" {
            specs.push(child);
        } else {
            collect_import_specs(child, specs, depth + 1);
        }
    }
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
        enclosing_class: ctx.enclosing_type.map(String::from),
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
            if GO_BUILTINS.contains(&name.as_str()) {
                return;
            }
            let mut call = base_call(func, source, ctx, name);
            call.arg_count = arg_count;
            out.calls.push(call);
        }
        "selector_expression" => {
            let sel = match field(func, "field") {
                Some(f) => f,
                None => return,
            };
            let operand = match field(func, "operand") {
                Some(o) => o,
                None => return,
            };
            let mut call = base_call(sel, source, ctx, node_text(sel, source));
            call.is_method = true;
            call.receiver = Some(collapse_whitespace(&node_text(operand, source)));
            call.arg_count = arg_count;
            out.calls.push(call);
        }
        _ => {}
    }
}

/// `T{…}` composite literals count as construction sites for struct types.
fn extract_composite(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) {
    let Some(ty) = field(node, "type") else {
        return;
    };
    if ty.kind() != "type_identifier" {
        return;
    }
    let name = node_text(ty, source);
    if !starts_uppercase(&name) {
        return;
    }
    let mut call = base_call(node, source, ctx, name.clone());
    call.resolved_name = Some(name);
    out.calls.push(call);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn parse(src: &str) -> ParsedFile {
        parse_source(Language::Go, src).unwrap()
    }

    #[test]
    fn methods_carry_receiver_type() {
        let src = "package s\n\nfunc (s *Server) Start() error { return s.listen() }\n";
        let parsed = parse(src);
        let start = parsed.functions.iter().find(|f| f.name == "Start").unwrap();
        assert!(start.is_method);
        assert_eq!(start.receiver.as_deref(), Some("Server"));
        assert_eq!(start.class_name.as_deref(), Some("Server"));
        // The receiver variable is type-bound for call resolution.
        assert_eq!(
            parsed.type_bindings.get("s").map(String::as_str),
            Some("Server")
        );
        let call = parsed.calls.iter().find(|c| c.name == "listen").unwrap();
        assert_eq!(call.enclosing_class.as_deref(), Some("Server"));
    }

    #[test]
    fn builtins_are_filtered() {
        let src = "package s\n\nfunc f(xs []int) int { xs = append(xs, 1); return len(xs) }\n";
        let parsed = parse(src);
        assert!(parsed.calls.iter().all(|c| c.name != "append" && c.name != "len"));
    }

    #[test]
    fn local_closure_shadows_package_function() {
        let src = "package s\n\nfunc outer() {\n\thandler := func(x int) int { return x }\n\thandler(1)\n}\n";
        let parsed = parse(src);
        assert!(
            parsed
                .functions
                .iter()
                .any(|f| f.name == "handler" && !f.is_exported)
        );
    }

    #[test]
    fn uppercase_names_are_exported() {
        let src = "package s\n\ntype Server struct{}\n\nfunc New() *Server { return &Server{} }\n\nfunc helper() {}\n";
        let parsed = parse(src);
        let names: Vec<_> = parsed.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"Server"));
        assert!(names.contains(&"New"));
        assert!(!names.contains(&"helper"));
    }

    #[test]
    fn struct_doc_comment() {
        let src = "package s\n\n// Server handles requests.\ntype Server struct{}\n";
        let parsed = parse(src);
        let server = parsed.classes.iter().find(|c| c.name == "Server").unwrap();
        assert_eq!(server.docstring.as_deref(), Some("Server handles requests."));
        assert_eq!(server.kind, SymbolKind::Struct);
    }

    #[test]
    fn composite_literal_is_a_construction_site() {
        let src = "package s\n\ntype Config struct{}\n\nfunc f() Config { return Config{} }\n";
        let parsed = parse(src);
        assert!(parsed.calls.iter().any(|c| c.name == "Config"));
    }

    #[test]
    fn go_import_paths() {
        let src = "package s\n\nimport (\n\t\"fmt\"\n\talias \"example.com/mod/pkg\"\n)\n";
        let parsed = parse(src);
        assert_eq!(parsed.imports.len(), 2);
        let aliased = parsed
            .imports
            .iter()
            .find(|i| i.module == "example.com/mod/pkg")
            .unwrap();
        assert_eq!(aliased.names, vec!["alias"]);
    }
}
