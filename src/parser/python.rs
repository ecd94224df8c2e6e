//! Python symbol and call extraction: defs/classes with decorators and
//! docstrings, dotted imports, attribute calls with `self` tracking, and
//! instance-attribute types from `__init__` and `@dataclass` fields.

use tree_sitter::{Node, Tree};

use crate::parser::LanguageAdapter;
use crate::parser::facts::*;
use crate::parser::helpers::*;
use crate::parser::languages::Language;

/// Built-in calls that are noise in a call graph. Reflection builtins
/// (`getattr`, `setattr`, `hasattr`, `eval`, `exec`, `__import__`) are
/// deliberately NOT here — the completeness detector counts them.
const PY_BUILTINS: &[&str] = &[
    "print", "len", "range", "str", "int", "float", "bool", "list", "dict", "set", "tuple",
    "type", "super", "enumerate", "zip", "sorted", "reversed", "min", "max", "sum", "abs",
    "open", "repr", "id", "iter", "next", "vars", "dir", "format", "isinstance", "issubclass",
];

pub struct PythonAdapter;

impl LanguageAdapter for PythonAdapter {
    fn language(&self) -> Language {
        Language::Python
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
        "decorated_definition" => {
            // Decorators are collected by the inner definition; walk the
            // decorator expressions too so their calls are recorded.
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                walk(child, source, ctx, out, depth + 1);
            }
            return;
        }
        "function_definition" => {
            let name = extract_function(node, source, ctx, out);
            if let Some(body) = field(node, "body") {
                let inner = Ctx {
                    enclosing_fn: name.as_deref().or(ctx.enclosing_fn),
                    ..ctx
                };
                walk(body, source, inner, out, depth + 1);
            }
            return;
        }
        "class_definition" => {
            extract_class(node, source, out, depth);
            return;
        }
        "import_statement" => {
            extract_import(node, source, out);
            return;
        }
        "import_from_statement" => {
            extract_from_import(node, source, out);
            return;
        }
        "call" => {
            extract_call(node, source, ctx, out);
            // Recurse for nested calls in arguments.
        }
        "assignment" => {
            extract_assignment(node, source, ctx, out);
        }
        "comment" => {
            push_span(node, TextKind::Comment, &mut out.spans);
            return;
        }
        "string" => {
            extract_string_spans(node, source, ctx, out, depth);
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, ctx, out, depth + 1);
    }
}

/// F-string interpolations are code; plain string content is a text span.
fn extract_string_spans(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile, depth: usize) {
    let mut has_interpolation = false;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "interpolation" {
            has_interpolation = true;
            walk(child, source, ctx, out, depth + 1);
        }
    }
    if has_interpolation {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "string_content" {
                push_span(child, TextKind::String, &mut out.spans);
            }
        }
    } else {
        push_span(node, TextKind::String, &mut out.spans);
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

fn decorators_of(node: Node, source: &str) -> Vec<String> {
    let mut decorators = Vec::new();
    if let Some(parent) = node.parent()
        && parent.kind() == "decorated_definition"
    {
        let mut cursor = parent.walk();
        for child in parent.named_children(&mut cursor) {
            if child.kind() == "decorator" {
                decorators.push(node_text(child, source).trim_start_matches('@').to_string());
            }
        }
    }
    decorators
}

fn body_docstring(node: Node, source: &str) -> Option<String> {
    let body = field(node, "body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }
    let raw = node_text(expr, source);
    let text = raw
        .trim_start_matches(['r', 'b', 'f', 'u', 'R', 'B', 'F', 'U'])
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string();
    if text.is_empty() { None } else { Some(text) }
}

fn extract_function(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) -> Option<String> {
    let name = field(node, "name").map(|n| node_text(n, source))?;

    let mut modifiers = Vec::new();
    // `async def` has the async keyword as a leading child.
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "async" {
            modifiers.push("async".into());
        }
    }
    if name.starts_with("__") && name.ends_with("__") {
        modifiers.push("magic".into());
    }

    let decorators = decorators_of(node, source);
    for dec in &decorators {
        if dec == "staticmethod" {
            modifiers.push("static".into());
        }
    }

    let is_method = ctx.enclosing_class.is_some();
    let kind = if is_method && name == "__init__" {
        SymbolKind::Constructor
    } else if is_method {
        SymbolKind::Method
    } else {
        SymbolKind::Function
    };

    // Top-level defs without a leading underscore are the module's API.
    let is_exported = !is_method && ctx.enclosing_fn.is_none() && !name.starts_with('_');

    out.functions.push(FunctionFact {
        name: name.clone(),
        kind,
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        params: field(node, "parameters")
            .map(|p| params_text(p, source))
            .unwrap_or_default(),
        return_type: field(node, "return_type").map(|n| collapse_whitespace(&node_text(n, source))),
        generics: None,
        modifiers,
        decorators,
        is_method,
        class_name: ctx.enclosing_class.map(String::from),
        receiver: None,
        docstring: body_docstring(node, source),
        is_exported,
    });
    Some(name)
}

fn extract_class(node: Node, source: &str, out: &mut ParsedFile, depth: usize) {
    let name = match field(node, "name") {
        Some(n) => node_text(n, source),
        None => return,
    };
    let decorators = decorators_of(node, source);
    let is_dataclass = decorators
        .iter()
        .any(|d| d == "dataclass" || d.starts_with("dataclass(") || d.ends_with(".dataclass"));

    let mut extends = Vec::new();
    if let Some(supers) = field(node, "superclasses") {
        let mut cursor = supers.walk();
        for parent in supers.named_children(&mut cursor) {
            let text = collapse_whitespace(&node_text(parent, source));
            // Keyword arguments like metaclass=… are not parents.
            if !text.contains('=') {
                extends.push(text);
            }
        }
    }

    let mut members = Vec::new();
    if let Some(body) = field(node, "body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            let def = if child.kind() == "decorated_definition" {
                field(child, "definition").unwrap_or(child)
            } else {
                child
            };
            if def.kind() == "function_definition"
                && let Some(member_name) = field(def, "name").map(|n| node_text(n, source))
            {
                let kind = if member_name == "__init__" {
                    SymbolKind::Constructor
                } else {
                    SymbolKind::Method
                };
                members.push(MemberFact {
                    name: member_name,
                    kind,
                    start_line: start_line(def),
                });
            }
        }
    }

    let is_exported = !name.starts_with('_');

    out.classes.push(ClassFact {
        name: name.clone(),
        kind: SymbolKind::Class,
        start_line: start_line(node),
        end_line: end_line(node),
        indent: line_indent(node, source),
        generics: None,
        modifiers: Vec::new(),
        decorators,
        extends,
        implements: Vec::new(),
        docstring: body_docstring(node, source),
        is_exported,
        members,
    });

    if is_dataclass {
        extract_dataclass_fields(node, source, &name, out);
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

/// `@dataclass` class-body annotations type the instance attributes.
fn extract_dataclass_fields(node: Node, source: &str, class_name: &str, out: &mut ParsedFile) {
    let body = match field(node, "body") {
        Some(b) => b,
        None => return,
    };
    let mut cursor = body.walk();
    for stmt in body.named_children(&mut cursor) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        let Some(assign) = stmt.named_child(0).filter(|n| n.kind() == "assignment") else {
            continue;
        };
        let left = field(assign, "left");
        let ty = field(assign, "type");
        if let (Some(left), Some(ty)) = (left, ty)
            && left.kind() == "identifier"
        {
            let type_name = base_type_name(&node_text(ty, source));
            if !type_name.is_empty() {
                out.attribute_types
                    .entry(class_name.to_string())
                    .or_default()
                    .insert(node_text(left, source), type_name);
            }
        }
    }
}

/// `Optional[Foo]` / `list[Foo]` / `pkg.Foo` → `Foo`.
fn base_type_name(annotation: &str) -> String {
    let inner = annotation
        .split_once('[')
        .map(|(head, rest)| {
            if matches!(head.trim(), "Optional" | "Union" | "list" | "List") {
                rest.trim_end_matches(']')
            } else {
                head
            }
        })
        .unwrap_or(annotation);
    inner
        .split(',')
        .next()
        .unwrap_or("")
        .rsplit('.')
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

fn extract_import(node: Node, source: &str, out: &mut ParsedFile) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let module = node_text(child, source);
                let last = module.rsplit('.').next().unwrap_or(&module).to_string();
                out.imports.push(ImportFact {
                    module,
                    names: vec![last],
                    kind: ImportKind::Import,
                    is_dynamic: false,
                    line: start_line(node),
                    aliases: Vec::new(),
                });
            }
            "aliased_import" => {
                let module = field(child, "name")
                    .map(|n| node_text(n, source))
                    .unwrap_or_default();
                let alias = field(child, "alias")
                    .map(|n| node_text(n, source))
                    .unwrap_or_default();
                out.imports.push(ImportFact {
                    module,
                    names: vec![alias],
                    kind: ImportKind::Import,
                    is_dynamic: false,
                    line: start_line(node),
                    aliases: Vec::new(),
                });
            }
            _ => {}
        }
    }
}

fn extract_from_import(node: Node, source: &str, out: &mut ParsedFile) {
    let module = match field(node, "module_name") {
        Some(m) => node_text(m, source),
        None => return,
    };

    let mut names = Vec::new();
    let mut aliases = Vec::new();
    let mut cursor = node.walk();
    let mut saw_module = false;
    for child in node.named_children(&mut cursor) {
        // The first dotted_name/relative_import is the module itself.
        if !saw_module
            && matches!(child.kind(), "dotted_name" | "relative_import")
        {
            saw_module = true;
            continue;
        }
        match child.kind() {
            "dotted_name" | "identifier" => names.push(node_text(child, source)),
            "aliased_import" => {
                let imported = field(child, "name").map(|n| node_text(n, source));
                let alias = field(child, "alias").map(|n| node_text(n, source));
                if let (Some(imported), Some(alias)) = (imported, alias) {
                    names.push(alias.clone());
                    aliases.push((alias, imported));
                }
            }
            "wildcard_import" => names.push("*".into()),
            _ => {}
        }
    }

    out.imports.push(ImportFact {
        module,
        names,
        kind: ImportKind::FromImport,
        is_dynamic: false,
        line: start_line(node),
        aliases,
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
        enclosing_class: ctx.enclosing_class.map(String::from),
        arg_count: 0,
    }
}

fn extract_call(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) {
    let func = match field(node, "function") {
        Some(f) => f,
        None => return,
    };
    let arg_count = field(node, "arguments")
        .map(count_positional_args)
        .unwrap_or(0);

    match func.kind() {
        "identifier" => {
            let name = node_text(func, source);
            if PY_BUILTINS.contains(&name.as_str()) {
                return;
            }
            let mut call = base_call(func, source, ctx, name);
            call.arg_count = arg_count;
            out.calls.push(call);
        }
        "attribute" => {
            let attr = match field(func, "attribute") {
                Some(a) => a,
                None => return,
            };
            let object = match field(func, "object") {
                Some(o) => o,
                None => return,
            };
            let receiver_text = node_text(object, source);

            let mut call = base_call(attr, source, ctx, node_text(attr, source));
            call.is_method = true;
            call.receiver = Some(collapse_whitespace(&receiver_text));
            call.arg_count = arg_count;
            // `self.attr.method()` — remember the attribute for typed
            // resolution against the instance-attribute map.
            if let Some(rest) = receiver_text.strip_prefix("self.")
                && !rest.contains('.')
                && !rest.contains('(')
            {
                call.self_attribute = Some(rest.to_string());
            }
            out.calls.push(call);
        }
        _ => {}
    }
}

/// Positional arguments only: `self`/`cls` live in the parameter list, not
/// the call, and keyword arguments are counted like positionals for the
/// min/max check.
fn count_positional_args(args: Node) -> u32 {
    let mut count = 0u32;
    let mut cursor = args.walk();
    for child in args.named_children(&mut cursor) {
        if !child.kind().contains("comment") {
            count += 1;
        }
    }
    count
}

/// `x = T()` local bindings and `self.x = …` attribute types inside
/// `__init__`.
fn extract_assignment(node: Node, source: &str, ctx: Ctx, out: &mut ParsedFile) {
    let left = match field(node, "left") {
        Some(l) => l,
        None => return,
    };
    let right = match field(node, "right") {
        Some(r) => r,
        None => return,
    };

    if left.kind() == "identifier"
        && let Some(type_name) = init_value_type(right, source)
    {
        out.type_bindings
            .insert(node_text(left, source), type_name);
        return;
    }

    // self.x = … in __init__ feeds the class-attribute type map.
    if left.kind() == "attribute"
        && ctx.enclosing_fn == Some("__init__")
        && let Some(class_name) = ctx.enclosing_class
        && let Some(object) = field(left, "object")
        && node_text(object, source) == "self"
        && let Some(attr) = field(left, "attribute")
        && let Some(type_name) = init_value_type(right, source)
    {
        out.attribute_types
            .entry(class_name.to_string())
            .or_default()
            .insert(node_text(attr, source), type_name);
    }
}

/// The class of an initializer value: the first non-literal call target in
/// the expression. Handles `T(...)`, `a or T()`, `cond and T()`,
/// `x if p else T()` and parenthesized forms. Primitive literals resolve to
/// nothing.
fn init_value_type(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "call" => {
            let func = field(node, "function")?;
            let name = match func.kind() {
                "identifier" => node_text(func, source),
                "attribute" => field(func, "attribute").map(|a| node_text(a, source))?,
                _ => return None,
            };
            if PY_BUILTINS.contains(&name.as_str()) {
                return None;
            }
            Some(name)
        }
        "parenthesized_expression" => init_value_type(node.named_child(0)?, source),
        "boolean_operator" | "conditional_expression" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if let Some(found) = init_value_type(child, source) {
                    return Some(found);
                }
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn parse(src: &str) -> ParsedFile {
        parse_source(Language::Python, src).unwrap()
    }

    #[test]
    fn def_with_docstring_and_decorator() {
        let src = "@app.route('/x')\ndef handler(req):\n    \"\"\"Handles a request.\"\"\"\n    return req\n";
        let parsed = parse(src);
        assert_eq!(parsed.functions.len(), 1);
        let f = &parsed.functions[0];
        assert_eq!(f.name, "handler");
        assert_eq!(f.decorators, vec!["app.route('/x')"]);
        assert_eq!(f.docstring.as_deref(), Some("Handles a request."));
        assert!(f.is_exported);
    }

    #[test]
    fn underscored_defs_are_private() {
        let parsed = parse("def _internal():\n    pass\n");
        assert!(!parsed.functions[0].is_exported);
    }

    #[test]
    fn init_is_constructor_and_magic() {
        let src = "class A:\n    def __init__(self):\n        pass\n";
        let parsed = parse(src);
        let init = parsed.functions.iter().find(|f| f.name == "__init__").unwrap();
        assert_eq!(init.kind, SymbolKind::Constructor);
        assert!(init.modifiers.contains(&"magic".to_string()));
        assert_eq!(init.class_name.as_deref(), Some("A"));
    }

    #[test]
    fn self_method_calls() {
        let src = "class A:\n    def a(self):\n        self.b()\n    def b(self):\n        pass\n";
        let parsed = parse(src);
        let call = parsed.calls.iter().find(|c| c.name == "b").unwrap();
        assert_eq!(call.receiver.as_deref(), Some("self"));
        assert_eq!(call.enclosing_function.as_deref(), Some("a"));
        assert_eq!(call.enclosing_class.as_deref(), Some("A"));
    }

    #[test]
    fn instance_attribute_types() {
        let src = "class App:\n    def __init__(self, db):\n        self.db = db or Database()\n        self.cache = Cache()\n        self.count = 0\n";
        let parsed = parse(src);
        let attrs = &parsed.attribute_types["App"];
        assert_eq!(attrs.get("db").map(String::as_str), Some("Database"));
        assert_eq!(attrs.get("cache").map(String::as_str), Some("Cache"));
        assert!(!attrs.contains_key("count"));
    }

    #[test]
    fn dataclass_field_annotations() {
        let src = "@dataclass\nclass Point:\n    store: Store = None\n";
        let parsed = parse(src);
        assert_eq!(
            parsed.attribute_types["Point"].get("store").map(String::as_str),
            Some("Store")
        );
    }

    #[test]
    fn relative_from_import() {
        let parsed = parse("from ..core import engine as eng\n");
        let import = &parsed.imports[0];
        assert_eq!(import.module, "..core");
        assert_eq!(import.kind, ImportKind::FromImport);
        assert_eq!(import.names, vec!["eng"]);
        assert_eq!(import.aliases, vec![("eng".into(), "engine".into())]);
    }

    #[test]
    fn reflection_calls_are_kept_for_completeness() {
        let parsed = parse("def f(o):\n    return getattr(o, 'x')\n");
        assert!(parsed.calls.iter().any(|c| c.name == "getattr"));
    }

    #[test]
    fn print_is_filtered() {
        let parsed = parse("def f():\n    print('x')\n");
        assert!(parsed.calls.iter().all(|c| c.name != "print"));
    }
}
