//! Language adapters: one tree-sitter extractor per language behind a
//! uniform trait. New languages plug in by implementing [`LanguageAdapter`]
//! and registering in [`adapter_for`].

pub mod facts;
pub mod helpers;
pub mod languages;
pub mod usages;

#[cfg(feature = "lang-javascript")]
pub mod javascript;

#[cfg(feature = "lang-typescript")]
pub mod typescript;

#[cfg(feature = "lang-python")]
pub mod python;

#[cfg(feature = "lang-go")]
pub mod go;

#[cfg(feature = "lang-rust")]
pub mod rust_lang;

#[cfg(feature = "lang-java")]
pub mod java;

use anyhow::Result;
use tree_sitter::{Parser, Tree};

use crate::parser::facts::{ParsedFile, UsageFact};
use crate::parser::languages::{Language, get_language};

/// Uniform per-language extraction surface.
///
/// `extract` fills a [`ParsedFile`] from one parsed tree in a single walk:
/// functions, classes, imports, exports, calls, text spans, attribute types
/// and local type bindings. `find_usages` classifies every occurrence of a
/// name; the generic implementation covers most grammars and languages
/// override only where node kinds diverge.
pub trait LanguageAdapter: Sync {
    fn language(&self) -> Language;

    fn extract(&self, tree: &Tree, source: &str, out: &mut ParsedFile);

    fn find_usages(&self, tree: &Tree, source: &str, name: &str, out: &mut Vec<UsageFact>) {
        usages::walk_usages(self.language(), tree, source, name, out);
    }
}

/// Adapter registry: language tag → extractor.
pub fn adapter_for(lang: Language) -> Option<&'static dyn LanguageAdapter> {
    match lang {
        #[cfg(feature = "lang-javascript")]
        Language::Javascript => Some(&javascript::JavascriptAdapter),

        #[cfg(feature = "lang-typescript")]
        Language::Typescript | Language::Tsx => Some(&typescript::TypescriptAdapter),

        #[cfg(feature = "lang-python")]
        Language::Python => Some(&python::PythonAdapter),

        #[cfg(feature = "lang-go")]
        Language::Go => Some(&go::GoAdapter),

        #[cfg(feature = "lang-rust")]
        Language::Rust => Some(&rust_lang::RustAdapter),

        #[cfg(feature = "lang-java")]
        Language::Java => Some(&java::JavaAdapter),

        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// Parse a source text with the language's grammar.
///
/// TSX files must go through the TSX grammar, `.ts` through the TypeScript
/// grammar — this is the only place grammars are instantiated.
pub fn parse_tree(lang: Language, source: &str) -> Result<Tree> {
    let grammar = get_language(lang)?;
    let mut parser = Parser::new();
    parser.set_language(&grammar)?;
    parser
        .parse(source, None)
        .ok_or_else(|| anyhow::anyhow!("tree-sitter returned no tree for {lang}"))
}

/// Parse a file into its fact records. Per-node parse errors are tolerated:
/// tree-sitter produces a best-effort tree and extraction skips what it
/// cannot read.
pub fn parse_source(lang: Language, source: &str) -> Result<ParsedFile> {
    let adapter =
        adapter_for(lang).ok_or_else(|| anyhow::anyhow!("no adapter for language {lang}"))?;
    let tree = parse_tree(lang, source)?;
    let mut out = ParsedFile::default();
    adapter.extract(&tree, source, &mut out);
    out.spans
        .sort_by_key(|s| (s.start_line, s.start_col, s.end_line, s.end_col));
    Ok(out)
}

/// Find every usage of `name` in a source text: AST occurrences classified
/// as definition/call/import/reference, plus word-boundary hits inside
/// strings and comments as `string-ref`.
pub fn find_usages_in_code(lang: Language, source: &str, name: &str) -> Result<Vec<UsageFact>> {
    let adapter =
        adapter_for(lang).ok_or_else(|| anyhow::anyhow!("no adapter for language {lang}"))?;
    let tree = parse_tree(lang, source)?;
    let mut out = Vec::new();
    adapter.find_usages(&tree, source, name, &mut out);
    usages::scan_text_refs(&tree, source, name, &mut out);
    out.sort_by_key(|u| (u.line, u.column));
    Ok(out)
}
