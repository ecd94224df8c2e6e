//! The symbol model and per-file records owned by the project index.

use serde::{Deserialize, Serialize};

use crate::parser::facts::{CallFact, ExportFact, ImportFact, MemberFact, SymbolKind, TextSpan};
use crate::parser::languages::Language;

/// A named, locatable declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    /// Absolute path.
    pub file: String,
    pub relative_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub indent: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub params: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generics: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    pub is_method: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    pub is_exported: bool,
    pub language: Language,
    /// Members of class-like symbols.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberFact>,
}

impl Symbol {
    /// Stable cross-reference id that survives renames within a file.
    pub fn binding_id(&self) -> String {
        format!("{}:{}:{}", self.relative_path, self.kind, self.start_line)
    }

    pub fn contains_line(&self, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Per-file metadata kept by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Absolute path.
    pub path: String,
    pub relative_path: String,
    pub language: Language,
    /// SHA-256 of the text, truncated to 64 bits (16 hex chars).
    pub hash: String,
    pub mtime_ms: u64,
    pub size: u64,
    pub line_count: u32,
    /// Sorted string/comment spans for position-in-code tests.
    #[serde(default)]
    pub spans: Vec<TextSpan>,
    /// All imports as written, resolved or not; the import graph is rebuilt
    /// from these on every build.
    #[serde(default)]
    pub imports: Vec<ImportFact>,
    #[serde(default)]
    pub exports: Vec<ExportFact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    /// Local identifier → class name, from typed params and initializers.
    #[serde(default, skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub type_bindings: std::collections::HashMap<String, String>,
    /// className → (attr → className) contributed by this file.
    #[serde(default, skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub attribute_types: std::collections::HashMap<String, std::collections::HashMap<String, String>>,
}

impl FileRecord {
    pub fn position_is_code(&self, line: u32, col: u32) -> bool {
        !self.spans.iter().any(|s| s.contains(line, col))
    }
}

/// Cached calls for one file, keyed by (mtime, size, hash) for staleness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCalls {
    pub mtime_ms: u64,
    pub size: u64,
    pub hash: String,
    pub calls: Vec<CallFact>,
}

/// Reverse import edge: who imports a file, where, and which names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEdge {
    /// Importer, project-relative.
    pub file: String,
    pub import_line: u32,
    pub names: Vec<String>,
}

/// What a local identifier means inside one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BindingTarget {
    /// Import alias for a whole file/module.
    File { path: String },
    /// A value of a known class/struct type.
    Class { name: String },
    /// A specific symbol in another file (destructured/aliased import).
    Symbol { path: String, name: String },
}

/// SHA-256 content hash truncated to 64 bits, 16 hex chars.
pub fn hash_content(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_id_is_path_kind_line() {
        let symbol = Symbol {
            name: "run".into(),
            kind: SymbolKind::Function,
            file: "/p/src/a.js".into(),
            relative_path: "src/a.js".into(),
            start_line: 10,
            end_line: 20,
            indent: 0,
            params: String::new(),
            return_type: None,
            generics: None,
            modifiers: Vec::new(),
            decorators: Vec::new(),
            is_method: false,
            class_name: None,
            receiver: None,
            extends: Vec::new(),
            implements: Vec::new(),
            docstring: None,
            is_exported: false,
            language: Language::Javascript,
            members: Vec::new(),
        };
        assert_eq!(symbol.binding_id(), "src/a.js:function:10");
    }

    #[test]
    fn hashes_are_stable_and_short() {
        let h1 = hash_content("hello");
        let h2 = hash_content("hello");
        let h3 = hash_content("hello!");
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 16);
    }
}
