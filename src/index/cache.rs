//! On-disk snapshot of the index tables: `.ucn-cache/index.json`,
//! versioned. Loads validate the version and fall back to a full rebuild on
//! any mismatch or parse failure; writes go through a temp file + rename.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::index::symbol::{BindingTarget, ExportEdge, FileCalls, FileRecord, Symbol};
use crate::index::ProjectIndex;

pub const CACHE_VERSION: u32 = 4;
pub const CACHE_DIR: &str = ".ucn-cache";
pub const CACHE_FILE: &str = "index.json";

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    root: String,
    files: Vec<FileRecord>,
    symbols: Vec<Symbol>,
    import_graph: Vec<(String, Vec<String>)>,
    export_graph: Vec<(String, Vec<ExportEdge>)>,
    bindings: Vec<(String, HashMap<String, BindingTarget>)>,
    attribute_types: HashMap<String, HashMap<String, String>>,
    calls: Vec<(String, FileCalls)>,
}

pub fn cache_path(root: &Path) -> PathBuf {
    root.join(CACHE_DIR).join(CACHE_FILE)
}

/// Persist the index snapshot atomically (temp file + rename).
pub fn save(index: &ProjectIndex) -> crate::Result<()> {
    let snapshot = CacheFile {
        version: CACHE_VERSION,
        root: index.root.to_string_lossy().to_string(),
        files: index.files.values().cloned().collect(),
        symbols: {
            let mut all: Vec<Symbol> = index.all_symbols().cloned().collect();
            all.sort_by(|a, b| {
                (&a.relative_path, a.start_line, a.name.as_str())
                    .cmp(&(&b.relative_path, b.start_line, b.name.as_str()))
            });
            all
        },
        import_graph: index
            .import_graph
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
            .collect(),
        export_graph: index
            .export_graph
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        bindings: index
            .bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        attribute_types: index.attribute_types.clone(),
        calls: index
            .calls_cache
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    };

    let path = cache_path(&index.root);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string(&snapshot)
        .map_err(|e| crate::UcnError::Cache(format!("serialize: {e}")))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, &path)?;
    debug!("wrote cache to {}", path.display());
    Ok(())
}

/// Restore an index from the snapshot. Returns `false` (leaving the index
/// empty) on missing file, version mismatch, or parse failure — the caller
/// rebuilds.
pub fn load(index: &mut ProjectIndex) -> bool {
    let path = cache_path(&index.root);
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(_) => return false,
    };
    let snapshot: CacheFile = match serde_json::from_str(&text) {
        Ok(s) => s,
        Err(e) => {
            warn!("cache at {} is corrupt, rebuilding: {e}", path.display());
            return false;
        }
    };
    if snapshot.version != CACHE_VERSION {
        warn!(
            "cache version {} != {}, rebuilding",
            snapshot.version, CACHE_VERSION
        );
        return false;
    }

    index.restore(
        snapshot.files,
        snapshot.symbols,
        snapshot.import_graph,
        snapshot.export_graph,
        snapshot.bindings,
        snapshot.attribute_types,
        snapshot.calls,
    );
    true
}

/// Whether the on-disk state diverged from the cached one: any indexed
/// file's (mtime, size) changed, or files appeared/disappeared.
pub fn is_stale(index: &ProjectIndex) -> bool {
    let discovered = crate::discover::collect_files(&index.root, &index.config.exclude);
    let current: BTreeSet<&str> = discovered
        .iter()
        .map(|f| f.relative_path.as_str())
        .collect();

    for rel in index.files.keys() {
        if !current.contains(rel.as_str()) {
            return true;
        }
    }
    for file in &discovered {
        let Some(record) = index.files.get(&file.relative_path) else {
            return true;
        };
        let Ok(meta) = fs::metadata(&file.path) else {
            return true;
        };
        let mtime_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        if record.mtime_ms != mtime_ms || record.size != meta.len() {
            return true;
        }
    }
    false
}

/// Delete the cache directory.
pub fn clean(root: &Path) -> crate::Result<()> {
    let dir = root.join(CACHE_DIR);
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    Ok(())
}

// Re-exported for restore(); the index owns its table layout.
pub(crate) type GraphEntries = Vec<(String, Vec<String>)>;
pub(crate) type EdgeEntries = Vec<(String, Vec<ExportEdge>)>;
pub(crate) type BindingEntries = Vec<(String, HashMap<String, BindingTarget>)>;
pub(crate) type CallEntries = Vec<(String, FileCalls)>;
pub(crate) type AttrTypes = HashMap<String, HashMap<String, String>>;

impl ProjectIndex {
    /// Replace all tables with a cache snapshot.
    pub(crate) fn restore(
        &mut self,
        files: Vec<FileRecord>,
        symbols: Vec<Symbol>,
        import_graph: GraphEntries,
        export_graph: EdgeEntries,
        bindings: BindingEntries,
        attribute_types: AttrTypes,
        calls: CallEntries,
    ) {
        let mut symbol_table: HashMap<String, Vec<Symbol>> = HashMap::new();
        for symbol in symbols {
            symbol_table.entry(symbol.name.clone()).or_default().push(symbol);
        }
        let mut file_table: BTreeMap<String, FileRecord> = BTreeMap::new();
        for record in files {
            file_table.insert(record.relative_path.clone(), record);
        }
        self.set_tables(
            symbol_table,
            file_table,
            import_graph
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            export_graph.into_iter().collect(),
            bindings.into_iter().collect(),
            attribute_types,
            calls.into_iter().collect(),
        );
        // Derived tables (unresolved imports, bindings) are recomputed so a
        // restored index answers exactly like a freshly built one.
        self.rebuild_graphs();
    }
}
