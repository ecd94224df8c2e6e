//! Call-resolution behavior: same-class linking, cross-type uncertainty,
//! JSX attribution, local shadowing and exclude-filter boundaries.

mod common;

use common::project;
use ucn::index::SymbolQuery;
use ucn::index::calls::{CallOptions, find_callees, find_callers};
use ucn::index::Filters;

fn sym<'a>(index: &'a ucn::index::ProjectIndex, name: &str) -> &'a ucn::index::Symbol {
    index
        .resolve_symbol(name, &SymbolQuery::default())
        .unwrap_or_else(|| panic!("symbol {name} not found"))
        .0
}

#[test]
fn same_class_methods_link_both_ways_without_uncertainty() {
    let (_tmp, index) = project(&[(
        "app/service.py",
        "class Service:\n    def a(self):\n        return self.b()\n\n    def b(self):\n        return 1\n",
    )]);

    let a = sym(&index, "a");
    let b = sym(&index, "b");
    let options = CallOptions::default();

    let callees = find_callees(&index, a, &options);
    let hit = callees
        .iter()
        .find(|c| c.name == "b")
        .expect("a must call b");
    assert!(!hit.uncertain);
    assert_eq!(hit.target.as_ref().unwrap().class_name.as_deref(), Some("Service"));

    let callers = find_callers(&index, b, &options);
    let hit = callers
        .iter()
        .find(|c| c.caller_name.as_deref() == Some("a"))
        .expect("b must be called by a");
    assert!(!hit.uncertain);
}

#[test]
fn rust_impl_blocks_of_one_struct_resolve_together() {
    let (_tmp, index) = project(&[(
        "src/engine.rs",
        "pub struct Engine;\n\nimpl Engine {\n    pub fn start(&self) {\n        self.warm_up();\n    }\n}\n\nimpl Engine {\n    fn warm_up(&self) {}\n}\n",
    )]);

    let start = sym(&index, "start");
    let callees = find_callees(&index, start, &CallOptions::default());
    let hit = callees.iter().find(|c| c.name == "warm_up").unwrap();
    assert!(!hit.uncertain);
}

#[test]
fn cross_type_method_call_never_links_to_standalone_function() {
    let (_tmp, index) = project(&[
        ("src/r.js", "function get(id) { return id; }\nmodule.exports = { get };\n"),
        ("src/a.js", "function getIndex(m) { return m.get('k'); }\n"),
    ]);

    let get_index = sym(&index, "getIndex");

    let strict = find_callees(
        &index,
        get_index,
        &CallOptions {
            include_methods: Some(true),
            include_uncertain: false,
            filters: Filters::default(),
        },
    );
    assert!(
        strict.iter().all(|c| c.name != "get"),
        "cross-type call must not link silently"
    );

    let loose = find_callees(
        &index,
        get_index,
        &CallOptions {
            include_methods: Some(true),
            include_uncertain: true,
            filters: Filters::default(),
        },
    );
    let hit = loose.iter().find(|c| c.name == "get").unwrap();
    assert!(hit.uncertain);
}

#[test]
fn typed_receiver_restricts_to_the_right_class() {
    let (_tmp, index) = project(&[(
        "app/store.py",
        "class Store:\n    def save(self):\n        pass\n\nclass Cache:\n    def save(self):\n        pass\n\nclass App:\n    def __init__(self):\n        self.store = Store()\n\n    def run(self):\n        self.store.save()\n",
    )]);

    let run = sym(&index, "run");
    let callees = find_callees(&index, run, &CallOptions::default());
    let hit = callees.iter().find(|c| c.name == "save").unwrap();
    assert!(!hit.uncertain);
    assert_eq!(hit.target.as_ref().unwrap().class_name.as_deref(), Some("Store"));
}

#[test]
fn jsx_elements_are_call_sites_of_their_component() {
    let (_tmp, index) = project(&[
        (
            "src/child.jsx",
            "export function Child() { return null; }\n",
        ),
        (
            "src/app.jsx",
            "import { Child } from './child';\nfunction App() {\n  return <div><Child /></div>;\n}\n",
        ),
    ]);

    let child = sym(&index, "Child");
    let callers = find_callers(&index, child, &CallOptions::default());
    let hit = callers
        .iter()
        .find(|c| c.file == "src/app.jsx")
        .expect("JSX use must be a call site");
    // The <Child /> element, not the wrapping <div>.
    assert_eq!(hit.line, 3);
    assert_eq!(hit.caller_name.as_deref(), Some("App"));
}

#[test]
fn jsx_callback_props_are_function_references() {
    let (_tmp, index) = project(&[(
        "src/form.jsx",
        "function handleClick() {}\nfunction Form() {\n  return <button onClick={handleClick}>go</button>;\n}\n",
    )]);

    let handler = sym(&index, "handleClick");
    let callers = find_callers(&index, handler, &CallOptions::default());
    let hit = callers.iter().find(|c| c.is_callback).expect("callback ref");
    assert_eq!(hit.caller_name.as_deref(), Some("Form"));
}

#[test]
fn go_local_closure_shadows_package_function() {
    let (_tmp, index) = project(&[
        (
            "pkg/util.go",
            "package pkg\n\nfunc handler(x int) int { return x * 2 }\n",
        ),
        (
            "pkg/main.go",
            "package pkg\n\nfunc outer() int {\n\thandler := func(x int) int { return x }\n\treturn handler(1)\n}\n",
        ),
    ]);

    let outer = sym(&index, "outer");
    let callees = find_callees(&index, outer, &CallOptions::default());
    let hit = callees.iter().find(|c| c.name == "handler").unwrap();
    // Resolves to the local closure in main.go, not the package function.
    assert_eq!(hit.target.as_ref().unwrap().file, "pkg/main.go");
}

#[test]
fn exclude_filters_match_at_path_boundaries() {
    let (_tmp, index) = project(&[
        ("src/spectrum.js", "function probe() { target(); }\n"),
        ("src/inspector.js", "function inspect() { target(); }\n"),
        ("src/contest.js", "function compete() { target(); }\n"),
        ("src/file.test.js", "function t() { target(); }\n"),
        ("test/helpers.js", "function h() { target(); }\n"),
        ("src/target.js", "function target() {}\n"),
    ]);

    let target = sym(&index, "target");
    let callers = find_callers(
        &index,
        target,
        &CallOptions {
            include_methods: None,
            include_uncertain: false,
            filters: Filters {
                exclude: vec!["test".into(), "spec".into()],
                include_tests: true,
                ..Filters::default()
            },
        },
    );
    let files: Vec<&str> = callers.iter().map(|c| c.file.as_str()).collect();
    assert!(files.contains(&"src/spectrum.js"));
    assert!(files.contains(&"src/inspector.js"));
    assert!(files.contains(&"src/contest.js"));
    assert!(!files.contains(&"src/file.test.js"));
    assert!(!files.contains(&"test/helpers.js"));
}

#[test]
fn comment_and_string_mentions_are_not_callers() {
    let (_tmp, index) = project(&[(
        "src/app.js",
        "function ping() {}\nfunction run() {\n  // ping() in a comment\n  const s = 'ping()';\n  ping();\n}\n",
    )]);

    let ping = sym(&index, "ping");
    let callers = find_callers(&index, ping, &CallOptions::default());
    assert_eq!(callers.len(), 1);
    assert_eq!(callers[0].line, 5);
}
