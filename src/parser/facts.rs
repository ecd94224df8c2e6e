//! Per-file fact records — the uniform output of every language extractor.
//!
//! Everything here is serde-serializable because call facts and text spans
//! are persisted in the on-disk cache alongside file metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Symbol classification shared by extractors and the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Constructor,
    Class,
    Interface,
    Type,
    Enum,
    Struct,
    Trait,
    Impl,
    Variable,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Type => "type",
            SymbolKind::Enum => "enum",
            SymbolKind::Struct => "struct",
            SymbolKind::Trait => "trait",
            SymbolKind::Impl => "impl",
            SymbolKind::Variable => "variable",
        }
    }

    /// Class-like kinds can own members and win definition scoring.
    pub fn is_class_like(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Type
                | SymbolKind::Enum
                | SymbolKind::Struct
                | SymbolKind::Trait
                | SymbolKind::Impl
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Constructor
        )
    }

    pub fn parse(s: &str) -> Option<SymbolKind> {
        Some(match s {
            "function" => SymbolKind::Function,
            "method" => SymbolKind::Method,
            "constructor" => SymbolKind::Constructor,
            "class" => SymbolKind::Class,
            "interface" => SymbolKind::Interface,
            "type" => SymbolKind::Type,
            "enum" => SymbolKind::Enum,
            "struct" => SymbolKind::Struct,
            "trait" => SymbolKind::Trait,
            "impl" => SymbolKind::Impl,
            "variable" => SymbolKind::Variable,
            _ => return None,
        })
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function/method/arrow declaration found by an extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionFact {
    pub name: String,
    pub kind: SymbolKind,
    pub start_line: u32,
    pub end_line: u32,
    /// Leading-space count on the declaration line.
    pub indent: u32,
    /// Full parameter-list text, never truncated.
    pub params: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generics: Option<String>,
    /// Canonical modifier tokens: `public`, `static`, `async`, `export`, …
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    /// Raw decorator expressions (Python) / annotation names (Java), in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    pub is_method: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Go/Rust receiver type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    pub is_exported: bool,
}

/// A named member of a class-like declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFact {
    pub name: String,
    pub kind: SymbolKind,
    pub start_line: u32,
}

/// A class/struct/interface/enum/trait/impl/type-alias declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFact {
    pub name: String,
    pub kind: SymbolKind,
    pub start_line: u32,
    pub end_line: u32,
    pub indent: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generics: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    /// Parent list, raw text including generic parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    pub is_exported: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberFact>,
}

/// Import statement classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    /// Plain `import x` (Python) / `import "pkg"` (Go).
    Import,
    Esm,
    Cjs,
    CommonjsVariable,
    Dynamic,
    FromImport,
    Include,
    Mod,
    Use,
    JavaImport,
    JavaStaticImport,
}

/// One import observed in a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFact {
    /// Module specifier as written, or the variable name for dynamic forms.
    pub module: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    pub kind: ImportKind,
    pub is_dynamic: bool,
    pub line: u32,
    /// Destructuring aliases: local name → exported name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<(String, String)>,
}

/// One exported name observed in a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFact {
    pub name: String,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SymbolKind>,
    /// `const` / `let` / `var` for exported value declarations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decl_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_annotation: Option<String>,
    pub is_type_export: bool,
    pub is_default: bool,
    /// Source module for `export { x } from './other'` re-exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reexport_from: Option<String>,
}

/// A call expression (or JSX element / callback reference) observed in a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFact {
    pub name: String,
    /// 1-based.
    pub line: u32,
    /// 1-based.
    pub column: u32,
    /// The full source line, trimmed.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// For Python `self.attr.method()`: the attribute name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_attribute: Option<String>,
    /// For `new Type(...)`: the constructed type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_name: Option<String>,
    pub is_method: bool,
    pub is_function_reference: bool,
    pub is_potential_callback: bool,
    pub uncertain: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosing_function: Option<String>,
    /// Class of the enclosing method, when the call sits inside one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosing_class: Option<String>,
    pub arg_count: u32,
}

/// Usage classification for `find_usages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageType {
    Definition,
    Call,
    Import,
    Reference,
    StringRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageFact {
    /// 1-based.
    pub line: u32,
    /// 1-based.
    pub column: u32,
    pub usage_type: UsageType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    String,
    Comment,
}

/// A column-precise span covering a string literal or comment.
///
/// Template-literal `${…}` interpolations are not covered by any span, so
/// positions inside them count as code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSpan {
    pub kind: TextKind,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl TextSpan {
    /// Whether a 1-based (line, column) position falls inside this span.
    pub fn contains(&self, line: u32, col: u32) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }
        if line == self.start_line && col < self.start_col {
            return false;
        }
        if line == self.end_line && col >= self.end_col {
            return false;
        }
        true
    }
}

/// Everything one extractor pass produces for a single file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFile {
    pub functions: Vec<FunctionFact>,
    pub classes: Vec<ClassFact>,
    pub imports: Vec<ImportFact>,
    pub exports: Vec<ExportFact>,
    pub calls: Vec<CallFact>,
    /// Sorted by (start_line, start_col).
    pub spans: Vec<TextSpan>,
    /// className → (attrName → className of init value), Python `__init__`
    /// assignments and dataclass fields, JS `this.x = new T()`.
    pub attribute_types: HashMap<String, HashMap<String, String>>,
    /// Local identifier → class/type name, from typed params and
    /// `x = new T()` / `x := T{}` style initializers.
    pub type_bindings: HashMap<String, String>,
    /// Java `package com.x;` declaration, used by the import resolver.
    pub package_name: Option<String>,
}

impl ParsedFile {
    /// Position-in-code test: true when (line, col) is inside no
    /// string/comment span. `spans` must be sorted.
    pub fn position_is_code(&self, line: u32, col: u32) -> bool {
        !self.spans.iter().any(|s| s.contains(line, col))
    }
}
