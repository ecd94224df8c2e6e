//! File-keyed operators: `imports`, `exporters`, `fileExports` and the
//! project `toc`.

use serde::Serialize;

use crate::index::symbol::ExportEdge;
use crate::index::{ProjectIndex, Symbol};
use crate::parser::facts::{ExportFact, ImportFact};
use crate::parser::languages::Language;
use crate::query::FileQuery;

// ---------------------------------------------------------------------------
// imports
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportsResult {
    pub file: String,
    /// Project files this file imports.
    pub resolved: Vec<String>,
    /// External / dynamic specifiers.
    pub unresolved: Vec<ImportFact>,
}

pub fn imports(index: &ProjectIndex, file: &str) -> FileQuery<ImportsResult> {
    let Some(rel) = index.normalize_file_arg(file) else {
        return FileQuery::not_found(file);
    };
    let resolved: Vec<String> = index
        .import_graph
        .get(&rel)
        .map(|set| set.iter().cloned().collect())
        .unwrap_or_default();
    let unresolved = index
        .unresolved_imports
        .get(&rel)
        .cloned()
        .unwrap_or_default();

    FileQuery::Found(ImportsResult {
        file: rel,
        resolved,
        unresolved,
    })
}

// ---------------------------------------------------------------------------
// exporters
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportersResult {
    pub file: String,
    pub importers: Vec<ExportEdge>,
}

/// Who imports this file.
pub fn exporters(index: &ProjectIndex, file: &str) -> FileQuery<ExportersResult> {
    let Some(rel) = index.normalize_file_arg(file) else {
        return FileQuery::not_found(file);
    };
    let importers = index.export_graph.get(&rel).cloned().unwrap_or_default();
    FileQuery::Found(ExportersResult {
        file: rel,
        importers,
    })
}

// ---------------------------------------------------------------------------
// fileExports
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExportsResult {
    pub file: String,
    pub exports: Vec<ExportFact>,
    /// Re-export detection covers ESM `export … from` only; CJS
    /// `module.exports.x = require(...)` chains are not inferred.
    pub reexports_detected: bool,
}

pub fn file_exports(index: &ProjectIndex, file: &str) -> FileQuery<FileExportsResult> {
    let Some(rel) = index.normalize_file_arg(file) else {
        return FileQuery::not_found(file);
    };
    let exports = index.files[&rel].exports.clone();
    let reexports_detected = exports.iter().any(|e| e.reexport_from.is_some());
    FileQuery::Found(FileExportsResult {
        file: rel,
        exports,
        reexports_detected,
    })
}

// ---------------------------------------------------------------------------
// toc
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TocOptions {
    pub detailed: bool,
    pub all: bool,
    /// File cap when `all` is unset.
    pub top: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocFile {
    pub file: String,
    pub language: Language,
    pub lines: u32,
    pub symbol_count: usize,
    /// Top-level names, or every symbol in `detailed` mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocResult {
    pub files: Vec<TocFile>,
    pub total_files: usize,
    pub total_symbols: usize,
    pub hidden_files: usize,
    pub languages: Vec<(Language, usize)>,
}

pub fn toc(index: &ProjectIndex, options: &TocOptions) -> TocResult {
    let top = if options.top == 0 { 50 } else { options.top };
    let total_symbols = index.all_symbols().count();

    let mut files: Vec<TocFile> = index
        .files
        .iter()
        .map(|(rel, record)| {
            let symbols: Vec<&Symbol> = index.symbols_in_file(rel);
            let names = symbols
                .iter()
                .filter(|s| options.detailed || !s.is_method)
                .map(|s| s.name.clone())
                .collect();
            TocFile {
                file: rel.clone(),
                language: record.language,
                lines: record.line_count,
                symbol_count: symbols.len(),
                symbols: names,
            }
        })
        .collect();
    // Biggest files first; path as tie-break keeps output stable.
    files.sort_by(|a, b| {
        b.symbol_count
            .cmp(&a.symbol_count)
            .then_with(|| a.file.cmp(&b.file))
    });

    let total_files = files.len();
    let mut languages: Vec<(Language, usize)> = Vec::new();
    for record in index.files.values() {
        match languages.iter_mut().find(|(l, _)| *l == record.language) {
            Some((_, n)) => *n += 1,
            None => languages.push((record.language, 1)),
        }
    }
    languages.sort_by(|a, b| b.1.cmp(&a.1));

    let hidden_files = if options.all {
        0
    } else if total_files > top {
        let hidden = total_files - top;
        files.truncate(top);
        hidden
    } else {
        0
    };

    TocResult {
        files,
        total_files,
        total_symbols,
        hidden_files,
        languages,
    }
}
