//! Query operators end to end: usages filtering, cross-command count
//! consistency, context/graph shapes and the file-keyed sentinels.

mod common;

use common::project;
use ucn::parser::facts::UsageType;
use ucn::query;
use ucn::query::graph::{GraphDirection, GraphOptions, GraphOutput};
use ucn::query::usages::UsagesOptions;

#[test]
fn usages_code_only_drops_comment_and_string_mentions() {
    let (_tmp, index) = project(&[(
        "src/app.js",
        "function myFunc() {}\nfunction run() {\n  // myFunc mentioned here\n  const a = \"myFunc\";\n  const b = `text myFunc text`;\n  myFunc();\n}\n",
    )]);

    let hits = query::usages::usages(
        &index,
        "myFunc",
        &UsagesOptions {
            code_only: true,
            ..UsagesOptions::default()
        },
    );
    let non_def: Vec<_> = hits.iter().filter(|h| !h.is_definition).collect();
    assert_eq!(non_def.len(), 1);
    assert_eq!(non_def[0].usage_type, UsageType::Call);
    assert_eq!(non_def[0].line, 6);
}

#[test]
fn impact_verify_and_usages_agree_on_call_counts() {
    let (_tmp, index) = project(&[(
        "src/app.js",
        "function greet(name) { return 'hi ' + name; }\nfunction main() {\n  greet('world');\n  greet('again');\n}\n",
    )]);

    let impact = query::impact::impact(&index, "greet", &Default::default()).unwrap();
    let verify = query::impact::verify(&index, "greet", &Default::default()).unwrap();
    let usage_calls = query::usages::usages(&index, "greet", &UsagesOptions::default())
        .iter()
        .filter(|u| u.usage_type == UsageType::Call)
        .count();

    assert_eq!(impact.total_call_sites, 2);
    assert_eq!(impact.total_call_sites, verify.total_calls);
    assert_eq!(verify.total_calls, usage_calls);
}

#[test]
fn verify_flags_argument_mismatches() {
    let (_tmp, index) = project(&[(
        "src/app.js",
        "function add(a, b) { return a + b; }\nfunction main() {\n  add(1, 2);\n  add(1);\n}\n",
    )]);

    let verify = query::impact::verify(&index, "add", &Default::default()).unwrap();
    assert_eq!(verify.expected_args.min, 2);
    assert_eq!(verify.expected_args.max, 2);
    assert_eq!(verify.valid, 1);
    assert_eq!(verify.mismatches.len(), 1);
    assert_eq!(verify.mismatches[0].arg_count, 1);
    assert_eq!(verify.total_calls, verify.valid + verify.mismatches.len() + verify.uncertain);
}

#[test]
fn context_returns_null_for_unknown_symbols() {
    let (_tmp, index) = project(&[("src/a.js", "function a() {}\n")]);
    assert!(query::context::context(&index, "nope", &Default::default()).is_none());
    assert!(query::smart::smart(&index, "nope").is_none());
    assert!(query::about::about(&index, "nope", &Default::default()).is_none());
}

#[test]
fn context_lists_methods_for_classes() {
    let (_tmp, index) = project(&[(
        "src/service.py",
        "class Service:\n    def start(self):\n        pass\n\n    def stop(self):\n        pass\n",
    )]);

    let result = query::context::context(&index, "Service", &Default::default()).unwrap();
    let methods = result.methods.expect("class context carries methods");
    let names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["start", "stop"]);
}

#[test]
fn graph_marks_diamonds_and_cycles() {
    let (_tmp, index) = project(&[
        ("src/a.js", "import './b';\nimport './c';\n"),
        ("src/b.js", "import './d';\n"),
        ("src/c.js", "import './d';\n"),
        ("src/d.js", "import './b';\nexport const d = 1;\n"),
    ]);

    let result = query::graph::graph(
        &index,
        "src/a.js",
        &GraphOptions {
            direction: GraphDirection::Imports,
            max_depth: 10,
        },
    );
    let GraphOutput::Single(graph) = (match result {
        query::FileQuery::Found(g) => g,
        _ => panic!("file must be found"),
    }) else {
        panic!("single-direction graph expected");
    };

    use query::graph::EdgeStatus;
    let status = |from: &str, to: &str| {
        graph
            .edges
            .iter()
            .find(|e| e.from == from && e.to == to)
            .map(|e| e.status)
            .unwrap_or_else(|| panic!("edge {from} → {to} missing"))
    };

    // d → b closes a true cycle (b is an ancestor on the DFS path).
    assert_eq!(status("src/d.js", "src/b.js"), EdgeStatus::Circular);
    // c → d re-reaches an already-expanded node: diamond, not a cycle.
    assert_eq!(status("src/c.js", "src/d.js"), EdgeStatus::AlreadyShown);
}

#[test]
fn file_keyed_operators_return_sentinels() {
    let (_tmp, index) = project(&[("src/a.js", "export function a() {}\n")]);

    assert!(!query::files::imports(&index, "src/missing.js").is_found());
    assert!(!query::files::exporters(&index, "src/missing.js").is_found());
    assert!(!query::files::file_exports(&index, "src/missing.js").is_found());
    assert!(query::files::imports(&index, "src/a.js").is_found());
}

#[test]
fn toc_truncates_to_top_and_counts_hidden() {
    let files: Vec<(String, String)> = (0..8)
        .map(|i| {
            (
                format!("src/mod{i}.js"),
                format!("export function f{i}() {{}}\n"),
            )
        })
        .collect();
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_str()))
        .collect();
    let (_tmp, index) = project(&refs);

    let result = query::files::toc(
        &index,
        &query::files::TocOptions {
            detailed: false,
            all: false,
            top: 5,
        },
    );
    assert_eq!(result.files.len(), 5);
    assert_eq!(result.hidden_files, 3);
    assert_eq!(result.total_files, 8);
}

#[test]
fn search_is_literal_and_contextual() {
    let (_tmp, index) = project(&[(
        "src/math.js",
        "function calc() {\n  return a + b * (c + 1);\n}\n",
    )]);

    // Regex metacharacters in the pattern are taken literally.
    let results = query::search::search(
        &index,
        "(c + 1)",
        &query::search::SearchOptions {
            context: 1,
            ..Default::default()
        },
    );
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].matches[0].line, 2);
    assert_eq!(results[0].matches[0].before.len(), 1);
    assert_eq!(results[0].matches[0].after.len(), 1);
}

#[test]
fn stacktrace_frames_resolve_to_indexed_files() {
    let (_tmp, index) = project(&[("src/server/handler.js", "function handle() {}\n")]);

    let trace = "Error: boom\n    at handle (/app/src/server/handler.js:1:10)\n    at async run (/app/src/server/missing.js:9:1)\nhandleFx@src/server/handler.js:1:5\n";
    let result = query::stacktrace::parse_stack_trace(&index, trace);

    assert_eq!(result.frames.len(), 3);
    let first = &result.frames[0];
    assert_eq!(first.function.as_deref(), Some("handle"));
    assert_eq!(first.line, 1);
    assert!(first.found);
    assert_eq!(first.resolved_file.as_deref(), Some("src/server/handler.js"));

    // Firefox-style frame.
    let firefox = &result.frames[2];
    assert_eq!(firefox.function.as_deref(), Some("handleFx"));
    assert_eq!(firefox.column, 5);
}

#[test]
fn find_counts_usages_and_orders_deterministically() {
    let (_tmp, index) = project(&[
        ("src/lib.js", "export function fetchData() {}\n"),
        (
            "src/app.js",
            "import { fetchData } from './lib';\nfunction main() { fetchData(); }\n",
        ),
    ]);

    let results = query::find::find(&index, "fetchData", &Default::default());
    assert_eq!(results.len(), 1);
    // One call plus one importing file.
    assert_eq!(results[0].usage_count, 2);
    assert_eq!(results[0].binding_id, "src/lib.js:function:1");
}

#[test]
fn typedef_attaches_source() {
    let (_tmp, index) = project(&[(
        "src/model.ts",
        "export interface Shape {\n  area(): number;\n}\n",
    )]);

    let results = query::typedef::typedef(&index, "Shape");
    assert_eq!(results.len(), 1);
    assert!(results[0].code.contains("interface Shape"));
}

#[test]
fn trace_builds_a_bounded_tree() {
    let (_tmp, index) = project(&[(
        "src/chain.js",
        "function a() { b(); }\nfunction b() { c(); }\nfunction c() {}\n",
    )]);

    let result = query::trace::trace(
        &index,
        "a",
        &query::trace::TraceOptions {
            depth: 1,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(result.root.name, "a");
    assert_eq!(result.root.children.len(), 1);
    assert_eq!(result.root.children[0].name, "b");
    // Depth 1 stops before c.
    assert!(result.root.children[0].children.is_empty());
}
