//! Index construction: symbol tables, import/export graph consistency,
//! deletion completeness, incremental rebuilds and the cache round trip.

mod common;

use common::{project, rebuild, write_files};
use ucn::index::{BuildOptions, ProjectIndex, cache};
use ucn::parser::facts::SymbolKind;

#[test]
fn indexes_symbols_across_languages() {
    let (_tmp, index) = project(&[
        (
            "src/app.js",
            "export function start() { helper(); }\nfunction helper() {}\n",
        ),
        (
            "core/engine.py",
            "class Engine:\n    def run(self):\n        pass\n",
        ),
        ("pkg/server.go", "package pkg\n\nfunc Serve() {}\n"),
        ("src/lib.rs", "pub struct Cache;\npub fn get() {}\n"),
    ]);

    assert_eq!(index.symbols_named("start").len(), 1);
    assert_eq!(index.symbols_named("helper").len(), 1);
    assert_eq!(index.symbols_named("Engine").len(), 1);
    assert_eq!(index.symbols_named("run")[0].class_name.as_deref(), Some("Engine"));
    assert_eq!(index.symbols_named("Serve").len(), 1);
    assert_eq!(index.symbols_named("Cache")[0].kind, SymbolKind::Struct);
}

#[test]
fn import_and_export_graphs_are_mutually_consistent() {
    let (_tmp, index) = project(&[
        ("src/a.js", "import { b } from './b';\nexport function a() { b(); }\n"),
        ("src/b.js", "import { c } from './c';\nexport function b() { c(); }\n"),
        ("src/c.js", "export function c() {}\n"),
    ]);

    assert!(index.import_graph["src/a.js"].contains("src/b.js"));
    assert!(index.import_graph["src/b.js"].contains("src/c.js"));

    // Every import edge f→g has a reverse export edge g←f.
    for (from, targets) in &index.import_graph {
        for to in targets {
            let edges = &index.export_graph[to];
            assert!(
                edges.iter().any(|e| &e.file == from),
                "missing reverse edge {to} ← {from}"
            );
        }
    }
}

#[test]
fn no_duplicate_symbols_per_location() {
    let (_tmp, index) = project(&[(
        "src/a.ts",
        "export function f(x: number): string { return String(x); }\n",
    )]);
    let all: Vec<_> = index.symbols_named("f").iter().collect();
    let mut keys: Vec<_> = all
        .iter()
        .map(|s| (s.relative_path.clone(), s.start_line, s.kind))
        .collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), all.len());
}

#[test]
fn removal_clears_every_table() {
    let (_tmp, mut index) = project(&[
        ("src/a.js", "import { b } from './b';\nexport function a() { b(); }\n"),
        ("src/b.js", "export function b() {}\n"),
    ]);

    index.remove_file_symbols("src/a.js");

    assert!(index.all_symbols().all(|s| s.relative_path != "src/a.js"));
    assert!(!index.import_graph.contains_key("src/a.js"));
    assert!(!index.calls_cache.contains_key("src/a.js"));
    assert!(!index.files.contains_key("src/a.js"));
    for edges in index.export_graph.values() {
        assert!(edges.iter().all(|e| e.file != "src/a.js"));
    }
}

#[test]
fn deleted_file_disappears_on_rebuild() {
    let (tmp, mut index) = project(&[
        ("src/a.js", "import { b } from './b';\nexport function a() { b(); }\n"),
        ("src/b.js", "export function b() {}\n"),
    ]);

    std::fs::remove_file(tmp.path().join("src/a.js")).unwrap();
    rebuild(&mut index);

    // Indistinguishable from a cold build on the remaining files.
    let mut cold = ProjectIndex::new(tmp.path()).unwrap();
    cold.build(BuildOptions {
        force_rebuild: true,
    })
    .unwrap();

    let mut warm_files: Vec<_> = index.files.keys().cloned().collect();
    let mut cold_files: Vec<_> = cold.files.keys().cloned().collect();
    warm_files.sort();
    cold_files.sort();
    assert_eq!(warm_files, cold_files);
    assert_eq!(index.all_symbols().count(), cold.all_symbols().count());
    assert!(index.export_graph.values().flatten().all(|e| e.file != "src/a.js"));
}

#[test]
fn incremental_rebuild_skips_unchanged_and_refreshes_touched() {
    let (tmp, mut index) = project(&[
        ("src/a.js", "export function a() {}\n"),
        ("src/b.js", "export function b() { a(); }\n"),
    ]);
    let original_hash = index.files["src/a.js"].hash.clone();

    // Nothing changed: everything skips.
    let stats = index.build(BuildOptions::default()).unwrap();
    assert_eq!(stats.files_indexed, 0);
    assert_eq!(stats.files_skipped, 2);

    // Touch mtime without changing content: metadata refresh, no reparse.
    std::thread::sleep(std::time::Duration::from_millis(20));
    write_files(tmp.path(), &[("src/a.js", "export function a() {}\n")]);
    let stats = index.build(BuildOptions::default()).unwrap();
    assert_eq!(stats.files_indexed, 0, "same content must not reindex");
    assert_eq!(index.files["src/a.js"].hash, original_hash);
    assert_eq!(index.calls_cache["src/a.js"].hash, original_hash);

    // Real content change: the entry is replaced.
    std::thread::sleep(std::time::Duration::from_millis(20));
    write_files(
        tmp.path(),
        &[("src/a.js", "export function a() { return 1; }\n")],
    );
    let stats = index.build(BuildOptions::default()).unwrap();
    assert_eq!(stats.files_indexed, 1);
    assert_ne!(index.files["src/a.js"].hash, original_hash);
}

#[test]
fn cache_round_trip_restores_the_index() {
    let (tmp, index) = project(&[
        ("src/a.js", "import { b } from './b';\nexport function a() { b(); }\n"),
        ("src/b.js", "export function b() {}\n"),
    ]);
    cache::save(&index).unwrap();

    let mut restored = ProjectIndex::new(tmp.path()).unwrap();
    assert!(cache::load(&mut restored));
    assert!(!cache::is_stale(&restored));

    assert_eq!(
        restored.files.keys().collect::<Vec<_>>(),
        index.files.keys().collect::<Vec<_>>()
    );
    assert_eq!(restored.all_symbols().count(), index.all_symbols().count());
    assert!(restored.import_graph["src/a.js"].contains("src/b.js"));

    // A touched file makes the snapshot stale.
    std::thread::sleep(std::time::Duration::from_millis(20));
    write_files(tmp.path(), &[("src/b.js", "export function b() { return 2; }\n")]);
    assert!(cache::is_stale(&restored));
}

#[test]
fn corrupt_cache_is_rejected() {
    let (tmp, index) = project(&[("src/a.js", "export function a() {}\n")]);
    cache::save(&index).unwrap();

    let path = cache::cache_path(tmp.path().canonicalize().unwrap().as_path());
    std::fs::write(&path, "{ not json").unwrap();

    let mut restored = ProjectIndex::new(tmp.path()).unwrap();
    assert!(!cache::load(&mut restored));
    assert_eq!(restored.all_symbols().count(), 0);
}
