//! The project index: symbol, binding, import/export and call tables, with
//! full and incremental builds on top of the per-language extractors.

pub mod cache;
pub mod calls;
pub mod completeness;
pub mod symbol;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::discover::{self, DiscoveredFile};
use crate::parser::facts::{ParsedFile, SymbolKind};
use crate::parser::languages::Language;
use crate::resolve::{ResolveCtx, resolve_import};
use crate::{Result, UcnError};

pub use completeness::{Completeness, CompletenessWarning};
pub use symbol::{BindingTarget, ExportEdge, FileCalls, FileRecord, Symbol, hash_content};

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Discard all tables before walking.
    pub force_rebuild: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BuildStats {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub files_removed: usize,
    pub symbols: usize,
}

/// Query-side path filters shared by most operators.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Prefix-or-substring restriction on the relative path.
    pub in_path: Option<String>,
    /// Boundary-matched exclude patterns.
    pub exclude: Vec<String>,
    pub include_tests: bool,
}

/// Narrowing options for [`ProjectIndex::resolve_symbol`].
#[derive(Debug, Clone, Default)]
pub struct SymbolQuery {
    /// Substring filter on the relative path.
    pub file: Option<String>,
    pub kind: Option<SymbolKind>,
}

pub struct ProjectIndex {
    pub root: PathBuf,
    pub config: Config,
    /// name → discovery-ordered declarations.
    symbols: HashMap<String, Vec<Symbol>>,
    pub files: BTreeMap<String, FileRecord>,
    pub import_graph: BTreeMap<String, BTreeSet<String>>,
    pub export_graph: BTreeMap<String, Vec<ExportEdge>>,
    pub calls_cache: BTreeMap<String, FileCalls>,
    /// file → (local name → target), Go entries aggregated per package.
    pub bindings: BTreeMap<String, HashMap<String, BindingTarget>>,
    /// className → (attr → className), merged across files.
    pub attribute_types: HashMap<String, HashMap<String, String>>,
    /// file → imports that resolved to no project file (external/dynamic).
    pub unresolved_imports: BTreeMap<String, Vec<crate::parser::facts::ImportFact>>,
    completeness: Option<Completeness>,
}

impl ProjectIndex {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(UcnError::RootNotFound(root));
        }
        let root = root.canonicalize()?;
        let config = Config::load(&root);
        Ok(ProjectIndex {
            root,
            config,
            symbols: HashMap::new(),
            files: BTreeMap::new(),
            import_graph: BTreeMap::new(),
            export_graph: BTreeMap::new(),
            calls_cache: BTreeMap::new(),
            bindings: BTreeMap::new(),
            attribute_types: HashMap::new(),
            unresolved_imports: BTreeMap::new(),
            completeness: None,
        })
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    /// Walk the project and (re)build the tables. Incremental by default:
    /// files whose (mtime, size) match the cached state are skipped, files
    /// whose content hash is unchanged get a metadata refresh only.
    pub fn build(&mut self, options: BuildOptions) -> Result<BuildStats> {
        if options.force_rebuild {
            self.clear();
        }

        let discovered = discover::collect_files(&self.root, &self.config.exclude);
        let mut stats = BuildStats::default();

        // Files that disappeared since the last build.
        let current: BTreeSet<String> =
            discovered.iter().map(|f| f.relative_path.clone()).collect();
        let gone: Vec<String> = self
            .files
            .keys()
            .filter(|rel| !current.contains(*rel))
            .cloned()
            .collect();
        for rel in gone {
            self.remove_file_symbols(&rel);
            stats.files_removed += 1;
        }

        // Partition into unchanged / needs-work without reading content.
        let mut work: Vec<(DiscoveredFile, u64, u64)> = Vec::new();
        for file in discovered {
            let Ok(meta) = fs::metadata(&file.path) else {
                warn!("cannot stat {}", file.relative_path);
                continue;
            };
            let mtime_ms = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);
            let size = meta.len();

            if let Some(record) = self.files.get(&file.relative_path)
                && record.mtime_ms == mtime_ms
                && record.size == size
            {
                stats.files_skipped += 1;
                continue;
            }
            work.push((file, mtime_ms, size));
        }

        // Parallel read + hash + parse; order is preserved by collect.
        let parsed: Vec<(DiscoveredFile, u64, u64, String, Option<ParsedFile>, u32)> = work
            .into_par_iter()
            .map(|(file, mtime_ms, size)| {
                let text = match fs::read_to_string(&file.path) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!("cannot read {}: {e}", file.relative_path);
                        return (file, mtime_ms, size, String::new(), None, 0);
                    }
                };
                let hash = hash_content(&text);
                let line_count = text.lines().count() as u32;
                let parsed = match crate::parser::parse_source(file.language, &text) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        warn!("parse failed for {}: {e}", file.relative_path);
                        None
                    }
                };
                (file, mtime_ms, size, hash, parsed, line_count)
            })
            .collect();

        for (file, mtime_ms, size, hash, parsed, line_count) in parsed {
            let Some(parsed) = parsed else { continue };

            // Same content, new mtime: refresh metadata, keep the entry.
            if let Some(record) = self.files.get_mut(&file.relative_path)
                && record.hash == hash
            {
                record.mtime_ms = mtime_ms;
                record.size = size;
                if let Some(calls) = self.calls_cache.get_mut(&file.relative_path) {
                    calls.mtime_ms = mtime_ms;
                    calls.size = size;
                }
                stats.files_skipped += 1;
                continue;
            }

            self.remove_file_symbols(&file.relative_path);
            self.add_parsed_file(&file, parsed, mtime_ms, size, hash, line_count);
            stats.files_indexed += 1;
        }

        self.rebuild_graphs();
        self.completeness = Some(completeness::detect(self));
        stats.symbols = self.symbols.values().map(Vec::len).sum();

        info!(
            "indexed {} files ({} unchanged, {} removed), {} symbols",
            stats.files_indexed, stats.files_skipped, stats.files_removed, stats.symbols
        );
        Ok(stats)
    }

    /// Swap in a full table set (cache restore).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn set_tables(
        &mut self,
        symbols: HashMap<String, Vec<Symbol>>,
        files: BTreeMap<String, FileRecord>,
        import_graph: BTreeMap<String, BTreeSet<String>>,
        export_graph: BTreeMap<String, Vec<ExportEdge>>,
        bindings: BTreeMap<String, HashMap<String, BindingTarget>>,
        attribute_types: HashMap<String, HashMap<String, String>>,
        calls_cache: BTreeMap<String, FileCalls>,
    ) {
        self.symbols = symbols;
        self.files = files;
        self.import_graph = import_graph;
        self.export_graph = export_graph;
        self.bindings = bindings;
        self.attribute_types = attribute_types;
        self.calls_cache = calls_cache;
        self.unresolved_imports.clear();
        self.completeness = None;
    }

    fn clear(&mut self) {
        self.symbols.clear();
        self.files.clear();
        self.import_graph.clear();
        self.export_graph.clear();
        self.calls_cache.clear();
        self.bindings.clear();
        self.attribute_types.clear();
        self.unresolved_imports.clear();
        self.completeness = None;
    }

    /// Remove every trace of a file: symbols, graphs, bindings, calls.
    pub fn remove_file_symbols(&mut self, rel: &str) {
        for list in self.symbols.values_mut() {
            list.retain(|s| s.relative_path != rel);
        }
        self.symbols.retain(|_, list| !list.is_empty());
        self.files.remove(rel);
        self.calls_cache.remove(rel);
        self.bindings.remove(rel);
        self.import_graph.remove(rel);
        for targets in self.import_graph.values_mut() {
            targets.remove(rel);
        }
        self.export_graph.remove(rel);
        for edges in self.export_graph.values_mut() {
            edges.retain(|e| e.file != rel);
        }
        self.export_graph.retain(|_, edges| !edges.is_empty());
        self.unresolved_imports.remove(rel);
        self.completeness = None;
    }

    fn add_parsed_file(
        &mut self,
        file: &DiscoveredFile,
        parsed: ParsedFile,
        mtime_ms: u64,
        size: u64,
        hash: String,
        line_count: u32,
    ) {
        let rel = &file.relative_path;
        let abs = file.path.to_string_lossy().to_string();

        let mut push = |symbol: Symbol| {
            let list = self.symbols.entry(symbol.name.clone()).or_default();
            // Dedup invariant: one entry per (file, start line, kind).
            if list.iter().any(|s| {
                s.relative_path == symbol.relative_path
                    && s.start_line == symbol.start_line
                    && s.kind == symbol.kind
            }) {
                return;
            }
            list.push(symbol);
        };

        for f in &parsed.functions {
            push(Symbol {
                name: f.name.clone(),
                kind: f.kind,
                file: abs.clone(),
                relative_path: rel.clone(),
                start_line: f.start_line,
                end_line: f.end_line,
                indent: f.indent,
                params: f.params.clone(),
                return_type: f.return_type.clone(),
                generics: f.generics.clone(),
                modifiers: f.modifiers.clone(),
                decorators: f.decorators.clone(),
                is_method: f.is_method,
                class_name: f.class_name.clone(),
                receiver: f.receiver.clone(),
                extends: Vec::new(),
                implements: Vec::new(),
                docstring: f.docstring.clone(),
                is_exported: f.is_exported,
                language: file.language,
                members: Vec::new(),
            });
        }
        for c in &parsed.classes {
            push(Symbol {
                name: c.name.clone(),
                kind: c.kind,
                file: abs.clone(),
                relative_path: rel.clone(),
                start_line: c.start_line,
                end_line: c.end_line,
                indent: c.indent,
                params: String::new(),
                return_type: None,
                generics: c.generics.clone(),
                modifiers: c.modifiers.clone(),
                decorators: c.decorators.clone(),
                is_method: false,
                class_name: None,
                receiver: None,
                extends: c.extends.clone(),
                implements: c.implements.clone(),
                docstring: c.docstring.clone(),
                is_exported: c.is_exported,
                language: file.language,
                members: c.members.clone(),
            });
        }

        self.files.insert(
            rel.clone(),
            FileRecord {
                path: abs,
                relative_path: rel.clone(),
                language: file.language,
                hash: hash.clone(),
                mtime_ms,
                size,
                line_count,
                spans: parsed.spans,
                imports: parsed.imports,
                exports: parsed.exports,
                package_name: parsed.package_name,
                type_bindings: parsed.type_bindings,
                attribute_types: parsed.attribute_types,
            },
        );
        self.calls_cache.insert(
            rel.clone(),
            FileCalls {
                mtime_ms,
                size,
                hash,
                calls: parsed.calls,
            },
        );
    }

    /// Rebuild the import/export graphs, binding tables and merged
    /// attribute-type map from the per-file records. Runs after every merge
    /// pass so late-arriving files resolve imports recorded earlier.
    pub(crate) fn rebuild_graphs(&mut self) {
        let file_set: BTreeSet<String> = self.files.keys().cloned().collect();
        let mut java_packages: HashMap<String, Vec<String>> = HashMap::new();
        for (rel, record) in &self.files {
            if record.language == Language::Java
                && let Some(package) = &record.package_name
            {
                java_packages.entry(package.clone()).or_default().push(rel.clone());
            }
        }
        let go_module = read_go_module(&self.root);

        let ctx = ResolveCtx {
            root: &self.root,
            config: &self.config,
            files: &file_set,
            java_packages: &java_packages,
            go_module: go_module.as_deref(),
        };

        let mut import_graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut export_graph: BTreeMap<String, Vec<ExportEdge>> = BTreeMap::new();
        let mut bindings: BTreeMap<String, HashMap<String, BindingTarget>> = BTreeMap::new();
        let mut attribute_types: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut unresolved: BTreeMap<String, Vec<crate::parser::facts::ImportFact>> =
            BTreeMap::new();

        for (rel, record) in &self.files {
            let mut file_bindings: HashMap<String, BindingTarget> = HashMap::new();

            for import in &record.imports {
                let resolved = resolve_import(import, rel, record.language, &ctx);
                if resolved.is_empty() {
                    unresolved.entry(rel.clone()).or_default().push(import.clone());
                }
                for target in &resolved {
                    if target == rel {
                        continue;
                    }
                    import_graph
                        .entry(rel.clone())
                        .or_default()
                        .insert(target.clone());
                    let edges = export_graph.entry(target.clone()).or_default();
                    // Duplicate (importer, line) pairs collapse.
                    if !edges
                        .iter()
                        .any(|e| e.file == *rel && e.import_line == import.line)
                    {
                        edges.push(ExportEdge {
                            file: rel.clone(),
                            import_line: import.line,
                            names: import.names.clone(),
                        });
                    }
                }
                if let Some(first) = resolved.first() {
                    for name in &import.names {
                        if name != "*" {
                            file_bindings.insert(
                                name.clone(),
                                BindingTarget::File {
                                    path: first.clone(),
                                },
                            );
                        }
                    }
                    for (alias, original) in &import.aliases {
                        file_bindings.insert(
                            alias.clone(),
                            BindingTarget::Symbol {
                                path: first.clone(),
                                name: original.clone(),
                            },
                        );
                    }
                }
            }

            for (local, class_name) in &record.type_bindings {
                file_bindings.insert(
                    local.clone(),
                    BindingTarget::Class {
                        name: class_name.clone(),
                    },
                );
            }

            for (class, attrs) in &record.attribute_types {
                attribute_types
                    .entry(class.clone())
                    .or_default()
                    .extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
            }

            bindings.insert(rel.clone(), file_bindings);
        }

        // Go bindings are package-scoped: merge sibling files' bindings,
        // own entries winning.
        let go_dirs: BTreeSet<String> = self
            .files
            .iter()
            .filter(|(_, r)| r.language == Language::Go)
            .map(|(rel, _)| parent_of(rel).to_string())
            .collect();
        for dir in go_dirs {
            let members: Vec<String> = self
                .files
                .iter()
                .filter(|(rel, r)| r.language == Language::Go && parent_of(rel) == dir)
                .map(|(rel, _)| rel.clone())
                .collect();
            let mut merged: HashMap<String, BindingTarget> = HashMap::new();
            for member in &members {
                if let Some(b) = bindings.get(member) {
                    for (k, v) in b {
                        merged.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                }
            }
            for member in &members {
                if let Some(b) = bindings.get_mut(member) {
                    for (k, v) in &merged {
                        b.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                }
            }
        }

        self.import_graph = import_graph;
        self.export_graph = export_graph;
        self.bindings = bindings;
        self.attribute_types = attribute_types;
        self.unresolved_imports = unresolved;
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn symbols_named(&self, name: &str) -> &[Symbol] {
        self.symbols.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values().flatten()
    }

    /// Symbols of a file, ordered by start line.
    pub fn symbols_in_file(&self, rel: &str) -> Vec<&Symbol> {
        let mut found: Vec<&Symbol> = self
            .all_symbols()
            .filter(|s| s.relative_path == rel)
            .collect();
        found.sort_by_key(|s| (s.start_line, s.end_line));
        found
    }

    /// Innermost callable whose range contains the line.
    pub fn enclosing_function(&self, rel: &str, line: u32) -> Option<&Symbol> {
        self.all_symbols()
            .filter(|s| s.relative_path == rel && s.kind.is_callable() && s.contains_line(line))
            .max_by_key(|s| s.start_line)
    }

    /// Normalize a user-provided file argument to an indexed relative path.
    pub fn normalize_file_arg(&self, file: &str) -> Option<String> {
        let trimmed = file.trim_start_matches("./").replace('\\', "/");
        if self.files.contains_key(&trimmed) {
            return Some(trimmed);
        }
        // Absolute path inside the project.
        if let Ok(stripped) = Path::new(&trimmed).strip_prefix(&self.root) {
            let rel = stripped.to_string_lossy().replace('\\', "/");
            if self.files.contains_key(&rel) {
                return Some(rel);
            }
        }
        // Unique suffix match (`engine.py` → `pkg/core/engine.py`).
        let suffix_hits: Vec<&String> = self
            .files
            .keys()
            .filter(|rel| rel.ends_with(&trimmed))
            .collect();
        if suffix_hits.len() == 1 {
            return Some(suffix_hits[0].clone());
        }
        None
    }

    // -----------------------------------------------------------------------
    // Symbol resolution
    // -----------------------------------------------------------------------

    /// All matches for a name under the query filters, plus the best
    /// definition.
    pub fn resolve_symbol(&self, name: &str, query: &SymbolQuery) -> Option<(&Symbol, Vec<&Symbol>)> {
        let mut matches: Vec<&Symbol> = self
            .symbols_named(name)
            .iter()
            .filter(|s| {
                query
                    .file
                    .as_deref()
                    .is_none_or(|f| s.relative_path.contains(f))
            })
            .filter(|s| query.kind.is_none_or(|k| s.kind == k))
            .collect();
        if matches.is_empty() {
            return None;
        }
        if matches.len() == 1 {
            return Some((matches[0], matches));
        }
        let best = self.pick_best_definition(&matches);
        matches.sort_by_key(|s| s.binding_id());
        Some((best, matches))
    }

    /// Score candidates: class-like kinds, source-tree paths and substantial
    /// bodies win; examples/vendor/test paths lose. Ties break on the
    /// binding id for determinism.
    pub fn pick_best_definition<'a>(&self, candidates: &[&'a Symbol]) -> &'a Symbol {
        candidates
            .iter()
            .max_by(|a, b| {
                let sa = self.definition_score(a);
                let sb = self.definition_score(b);
                sa.cmp(&sb)
                    .then_with(|| b.binding_id().cmp(&a.binding_id()))
            })
            .expect("candidates not empty")
    }

    fn definition_score(&self, symbol: &Symbol) -> i64 {
        let mut score = 0i64;
        if symbol.kind.is_class_like() {
            score += 1000;
        }
        let first_segment = symbol
            .relative_path
            .split('/')
            .next()
            .unwrap_or("");
        if matches!(first_segment, "lib" | "src" | "core" | "internal" | "pkg" | "crates") {
            score += 200;
        }
        if matches!(
            first_segment,
            "examples" | "docs" | "vendor" | "third_party" | "benchmarks" | "samples"
        ) {
            score -= 300;
        }
        if discover::is_test_file(&symbol.relative_path) {
            score -= 150;
        }
        score += symbol.line_count().min(100) as i64;
        score
    }

    // -----------------------------------------------------------------------
    // Filters
    // -----------------------------------------------------------------------

    /// Path filters: `in` is prefix-or-substring; `exclude` patterns match
    /// only at path boundaries (`spec` must not exclude `spectrum.js`).
    pub fn matches_filters(&self, rel: &str, filters: &Filters) -> bool {
        if let Some(in_path) = &filters.in_path
            && !(rel.starts_with(in_path.as_str()) || rel.contains(in_path.as_str()))
        {
            return false;
        }
        for pattern in filters.exclude.iter().chain(self.config.exclude.iter()) {
            if exclude_matches(rel, pattern) {
                return false;
            }
        }
        if !filters.include_tests && discover::is_test_file(rel) {
            return false;
        }
        true
    }

    // -----------------------------------------------------------------------
    // Completeness
    // -----------------------------------------------------------------------

    pub fn completeness(&self) -> Completeness {
        self.completeness
            .clone()
            .unwrap_or_else(|| completeness::detect(self))
    }
}

/// Boundary-aware exclude: `pat` matches a whole path segment or a
/// dot-separated basename component, never a substring straddling
/// boundaries.
pub fn exclude_matches(rel: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    if rel == pattern
        || rel.starts_with(&format!("{pattern}/"))
        || rel.ends_with(&format!("/{pattern}"))
        || rel.contains(&format!("/{pattern}/"))
        || rel.ends_with(&format!(".{pattern}"))
    {
        return true;
    }
    // Component before the extension: pattern `test` matches `a.test.js`.
    let basename = rel.rsplit('/').next().unwrap_or(rel);
    let mut parts = basename.split('.');
    parts.next(); // the stem itself is not a boundary component
    parts.any(|component| component == pattern)
}

fn parent_of(rel: &str) -> &str {
    rel.rsplit_once('/').map(|(d, _)| d).unwrap_or("")
}

/// The `module` line of go.mod at the project root.
pub fn read_go_module(root: &Path) -> Option<String> {
    let text = fs::read_to_string(root.join("go.mod")).ok()?;
    text.lines().find_map(|line| {
        line.trim()
            .strip_prefix("module ")
            .map(|m| m.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclude_patterns_respect_boundaries() {
        for pat in ["test", "spec"] {
            assert!(!exclude_matches("src/spectrum.js", pat), "{pat}");
            assert!(!exclude_matches("src/inspector.js", pat), "{pat}");
            assert!(!exclude_matches("src/contest.js", pat), "{pat}");
        }
        assert!(exclude_matches("src/file.test.js", "test"));
        assert!(exclude_matches("test/helpers.js", "test"));
        assert!(exclude_matches("src/__tests__/x.js", "__tests__"));
        assert!(exclude_matches("a/spec/b.js", "spec"));
        assert!(exclude_matches("app.spec.ts", "spec"));
        assert!(exclude_matches("vendor", "vendor"));
    }

    #[test]
    fn go_module_line() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("go.mod"),
            "module example.com/app\n\ngo 1.22\n",
        )
        .unwrap();
        assert_eq!(
            read_go_module(tmp.path()).as_deref(),
            Some("example.com/app")
        );
    }
}
