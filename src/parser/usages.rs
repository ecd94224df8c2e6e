//! Generic usage classification shared by all language adapters.
//!
//! A usage walk visits every identifier-like node whose text equals the
//! searched name and classifies it by its syntactic position. Languages with
//! diverging node kinds hook in through the small match arms below rather
//! than overriding the whole walk.

use tree_sitter::{Node, Tree};

use crate::parser::facts::{UsageFact, UsageType};
use crate::parser::helpers::{MAX_DEPTH, node_text, starts_uppercase};
use crate::parser::languages::Language;

const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "property_identifier",
    "field_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
];

/// Walk the tree collecting classified usages of `name`.
pub fn walk_usages(lang: Language, tree: &Tree, source: &str, name: &str, out: &mut Vec<UsageFact>) {
    walk(lang, tree.root_node(), source, name, out, 0);
}

fn walk(
    lang: Language,
    node: Node,
    source: &str,
    name: &str,
    out: &mut Vec<UsageFact>,
    depth: usize,
) {
    if depth > MAX_DEPTH {
        return;
    }

    if IDENTIFIER_KINDS.contains(&node.kind()) && node_text(node, source) == name {
        if let Some(usage_type) = classify(lang, node, source, name) {
            out.push(UsageFact {
                line: node.start_position().row as u32 + 1,
                column: node.start_position().column as u32 + 1,
                usage_type,
            });
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(lang, child, source, name, out, depth + 1);
    }
}

/// Classify one matching identifier occurrence; `None` filters it out.
fn classify(lang: Language, node: Node, source: &str, name: &str) -> Option<UsageType> {
    let parent = match node.parent() {
        Some(p) => p,
        None => return Some(UsageType::Reference),
    };
    let parent_kind = parent.kind();

    // Rust enum variants: `Enum::Variant` where the left side is an
    // uppercase type path is a variant use, not a hit on a same-named
    // struct/function.
    if lang == Language::Rust
        && parent_kind == "scoped_identifier"
        && parent.child_by_field_name("name").map(|n| n.id()) == Some(node.id())
        && let Some(path) = parent.child_by_field_name("path")
    {
        let path_text = node_text(path, source);
        if starts_uppercase(&path_text) && path_text != name {
            // Keep it only when the scoped path is itself called.
            let called = parent
                .parent()
                .is_some_and(|gp| gp.kind() == "call_expression");
            return if called { Some(UsageType::Call) } else { None };
        }
    }

    // Definition: this node is the `name` field of its parent declaration.
    if parent.child_by_field_name("name").map(|n| n.id()) == Some(node.id())
        && is_declaration_kind(parent_kind)
    {
        return Some(UsageType::Definition);
    }

    // Import contexts.
    if has_import_ancestor(node) {
        return Some(UsageType::Import);
    }

    // Call: callee position of a call-like node.
    if is_callee_position(node, parent, parent_kind) {
        return Some(UsageType::Call);
    }

    // Type identifiers used to construct values count as calls: Go composite
    // literals, Rust struct expressions, `new T(...)`.
    if node.kind() == "type_identifier" || starts_uppercase(name) {
        if matches!(
            parent_kind,
            "composite_literal" | "struct_expression" | "object_creation_expression"
        ) {
            return Some(UsageType::Call);
        }
        if parent_kind == "new_expression" {
            return Some(UsageType::Call);
        }
    }

    Some(UsageType::Reference)
}

fn is_declaration_kind(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "generator_function_declaration"
            | "function_definition"
            | "function_item"
            | "method_definition"
            | "method_declaration"
            | "class_declaration"
            | "class_definition"
            | "interface_declaration"
            | "enum_declaration"
            | "type_alias_declaration"
            | "struct_item"
            | "enum_item"
            | "trait_item"
            | "type_item"
            | "type_spec"
            | "variable_declarator"
            | "constructor_declaration"
    )
}

fn has_import_ancestor(node: Node) -> bool {
    let mut current = node.parent();
    let mut hops = 0;
    while let Some(n) = current {
        if hops > 6 {
            return false;
        }
        if matches!(
            n.kind(),
            "import_statement"
                | "import_from_statement"
                | "import_declaration"
                | "import_spec"
                | "use_declaration"
        ) {
            return true;
        }
        current = n.parent();
        hops += 1;
    }
    false
}

fn is_callee_position(node: Node, parent: Node, parent_kind: &str) -> bool {
    match parent_kind {
        // Direct call: `name(...)` — the identifier is the function field.
        "call_expression" | "call" => {
            parent.child_by_field_name("function").map(|n| n.id()) == Some(node.id())
        }
        // Method call: the identifier is the property/attribute/field of a
        // member access that is itself the callee.
        "member_expression" | "attribute" | "selector_expression" | "field_expression"
        | "scoped_identifier" => {
            let is_member_name = parent
                .child_by_field_name("property")
                .or_else(|| parent.child_by_field_name("attribute"))
                .or_else(|| parent.child_by_field_name("field"))
                .or_else(|| parent.child_by_field_name("name"))
                .map(|n| n.id())
                == Some(node.id());
            if !is_member_name {
                return false;
            }
            parent.parent().is_some_and(|gp| {
                matches!(gp.kind(), "call_expression" | "call" | "method_invocation")
                    && gp.child_by_field_name("function").map(|n| n.id()) == Some(parent.id())
            })
        }
        // Java: `name(...)` or `obj.name(...)`.
        "method_invocation" => {
            parent.child_by_field_name("name").map(|n| n.id()) == Some(node.id())
        }
        _ => false,
    }
}

/// Scan string and comment nodes for word-boundary occurrences of `name`,
/// emitting them as `string-ref` usages.
pub fn scan_text_refs(tree: &Tree, source: &str, name: &str, out: &mut Vec<UsageFact>) {
    scan_node(tree.root_node(), source, name, out, 0);
}

fn scan_node(node: Node, source: &str, name: &str, out: &mut Vec<UsageFact>, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    let kind = node.kind();

    if kind.contains("comment") || is_string_kind(kind) {
        // Template substitutions inside a template string are code, not
        // text — they are walked by the usage pass, not this one.
        let text = node_text(node, source);
        for (offset, _) in word_boundary_matches(&text, name) {
            if kind == "template_string" && in_substitution(node, source, offset) {
                continue;
            }
            let (line, column) = offset_to_position(node, &text, offset);
            out.push(UsageFact {
                line,
                column,
                usage_type: UsageType::StringRef,
            });
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        scan_node(child, source, name, out, depth + 1);
    }
}

fn is_string_kind(kind: &str) -> bool {
    matches!(
        kind,
        "string"
            | "template_string"
            | "string_literal"
            | "raw_string_literal"
            | "interpreted_string_literal"
            | "string_fragment"
    ) || kind == "concatenated_string"
}

/// Byte offsets of word-boundary occurrences of `name` within `text`.
fn word_boundary_matches<'a>(text: &'a str, name: &str) -> Vec<(usize, &'a str)> {
    let mut found = Vec::new();
    if name.is_empty() {
        return found;
    }
    let mut start = 0;
    while let Some(pos) = text[start..].find(name) {
        let at = start + pos;
        let before_ok = at == 0 || !is_word_byte(text.as_bytes()[at - 1]);
        let end = at + name.len();
        let after_ok = end >= text.len() || !is_word_byte(text.as_bytes()[end]);
        if before_ok && after_ok {
            found.push((at, &text[at..end]));
        }
        start = at + name.len().max(1);
    }
    found
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Whether a byte offset inside a template string falls within a `${…}`
/// substitution child.
fn in_substitution(node: Node, _source: &str, offset: usize) -> bool {
    let abs = node.start_byte() + offset;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "template_substitution"
            && abs >= child.start_byte()
            && abs < child.end_byte()
        {
            return true;
        }
    }
    false
}

/// Translate a byte offset inside a node's text into a 1-based file
/// position.
fn offset_to_position(node: Node, text: &str, offset: usize) -> (u32, u32) {
    let prefix = &text[..offset];
    let newlines = prefix.bytes().filter(|&b| b == b'\n').count() as u32;
    let line = node.start_position().row as u32 + 1 + newlines;
    let column = if newlines == 0 {
        node.start_position().column as u32 + 1 + offset as u32
    } else {
        (offset - prefix.rfind('\n').unwrap_or(0)) as u32
    };
    (line, column)
}
