//! Shared helpers for tree-sitter extraction across all languages.

use tree_sitter::Node;

use crate::parser::facts::{TextKind, TextSpan};

/// Recursion guard for pathological nesting.
pub const MAX_DEPTH: usize = 100;

/// Get the text content of a tree-sitter node.
pub fn node_text(node: Node, source: &str) -> String {
    source[node.start_byte()..node.end_byte()].to_string()
}

/// 1-based start line of a node.
pub fn start_line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// 1-based end line of a node.
///
/// When a node ends at column 0 it ends at the start of the next line (e.g.
/// a line comment including its trailing newline), so the actual end line is
/// the previous row.
pub fn end_line(node: Node) -> u32 {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        end.row as u32
    } else {
        end.row as u32 + 1
    }
}

/// 1-based column of a node's start.
pub fn start_col(node: Node) -> u32 {
    node.start_position().column as u32 + 1
}

/// Find a child node by its field name.
pub fn field<'a>(node: Node<'a>, name: &str) -> Option<Node<'a>> {
    node.child_by_field_name(name)
}

/// Leading-space count of the line a node starts on.
pub fn line_indent(node: Node, source: &str) -> u32 {
    let row = node.start_position().row;
    match source.lines().nth(row) {
        Some(line) => line.len().saturating_sub(line.trim_start().len()) as u32,
        None => 0,
    }
}

/// The trimmed source line a node starts on.
pub fn line_content(node: Node, source: &str) -> String {
    let row = node.start_position().row;
    source
        .lines()
        .nth(row)
        .map(|l| l.trim().to_string())
        .unwrap_or_default()
}

/// Record a string or comment node as a column-precise text span.
pub fn push_span(node: Node, kind: TextKind, spans: &mut Vec<TextSpan>) {
    spans.push(TextSpan {
        kind,
        start_line: node.start_position().row as u32 + 1,
        start_col: node.start_position().column as u32 + 1,
        end_line: node.end_position().row as u32 + 1,
        end_col: node.end_position().column as u32 + 1,
    });
}

/// Strip outer parentheses from a parameter-list node's text.
pub fn params_text(node: Node, source: &str) -> String {
    let text = node_text(node, source);
    let text = text.trim();
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text);
    collapse_whitespace(inner.trim())
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_ws = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_ws {
                result.push(' ');
            }
            prev_ws = true;
        } else {
            result.push(c);
            prev_ws = false;
        }
    }
    result
}

/// Strip a leading `: ` from a type-annotation node's text.
pub fn annotation_text(node: Node, source: &str) -> String {
    let text = node_text(node, source);
    collapse_whitespace(text.trim_start_matches(':').trim())
}

/// Strip `///`, `//!`, `//` or `#` prefixes from each line of a comment run.
pub fn strip_line_comment_prefix(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let trimmed = line.trim();
            for prefix in ["///", "//!", "//", "#"] {
                if let Some(rest) = trimmed.strip_prefix(prefix) {
                    return rest.strip_prefix(' ').unwrap_or(rest);
                }
            }
            trimmed
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Strip `/* */` delimiters and leading `*` from block comments.
pub fn strip_block_comment(raw: &str) -> String {
    let s = raw
        .strip_prefix("/**")
        .or_else(|| raw.strip_prefix("/*!"))
        .or_else(|| raw.strip_prefix("/*"))
        .unwrap_or(raw);
    let s = s.strip_suffix("*/").unwrap_or(s);

    s.lines()
        .map(|line| {
            let trimmed = line.trim();
            trimmed
                .strip_prefix("* ")
                .or_else(|| trimmed.strip_prefix('*'))
                .unwrap_or(trimmed)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Clean a raw comment into docstring text, handling both line and block
/// styles.
pub fn clean_comment(raw: &str) -> String {
    if raw.starts_with("/*") {
        strip_block_comment(raw)
    } else {
        strip_line_comment_prefix(raw)
    }
}

/// Collect the doc comment block immediately preceding a declaration.
///
/// Walks preceding siblings of `comment_kind` as long as they are adjacent
/// (each ending on the line right above the next), merging a run of line
/// comments or taking a single block comment.
pub fn preceding_doc_comment(node: Node, source: &str, comment_kinds: &[&str]) -> Option<String> {
    // Decorated declarations: look above the outermost wrapper.
    let mut anchor = node;
    if let Some(parent) = node.parent()
        && matches!(parent.kind(), "decorated_definition" | "export_statement")
    {
        anchor = parent;
    }

    let mut parts: Vec<String> = Vec::new();
    let mut expect_end_row = anchor.start_position().row;
    let mut sib = anchor.prev_sibling();

    while let Some(prev) = sib {
        if !comment_kinds.contains(&prev.kind()) {
            break;
        }
        let prev_end = prev.end_position().row;
        // Adjacent means the comment ends on the line above (or same line for
        // trailing-newline comments).
        if prev_end + 1 < expect_end_row {
            break;
        }
        let raw = node_text(prev, source);
        let is_block = raw.starts_with("/*");
        parts.push(clean_comment(&raw));
        expect_end_row = prev.start_position().row;
        if is_block {
            break;
        }
        sib = prev.prev_sibling();
    }

    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    let text = parts.join("\n").trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

/// Count the arguments of a call's argument-list node (named children only).
pub fn count_args(args: Node) -> u32 {
    let mut count = 0u32;
    let mut cursor = args.walk();
    for child in args.named_children(&mut cursor) {
        if !child.kind().contains("comment") {
            count += 1;
        }
    }
    count
}

/// Whether an identifier starts with an ASCII uppercase letter.
pub fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(collapse_whitespace("a  b\n\t c"), "a b c");
    }

    #[test]
    fn strips_line_comments() {
        assert_eq!(
            strip_line_comment_prefix("/// first\n/// second"),
            "first\nsecond"
        );
        assert_eq!(strip_line_comment_prefix("# hash comment"), "hash comment");
    }

    #[test]
    fn strips_block_comments() {
        let raw = "/**\n * Adds numbers.\n * @param a left\n */";
        assert_eq!(strip_block_comment(raw), "Adds numbers.\n@param a left");
    }

    #[test]
    fn span_containment_is_column_precise() {
        let span = TextSpan {
            kind: TextKind::String,
            start_line: 3,
            start_col: 10,
            end_line: 3,
            end_col: 20,
        };
        assert!(span.contains(3, 10));
        assert!(span.contains(3, 19));
        assert!(!span.contains(3, 9));
        assert!(!span.contains(3, 20));
        assert!(!span.contains(2, 15));
    }
}
