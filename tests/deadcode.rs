//! Dead-code calibration: decorated symbols, entry points, bundled files
//! and the plain unused-function case.

mod common;

use common::project;
use ucn::query::deadcode::{DeadcodeOptions, deadcode};

#[test]
fn decorated_python_handler_is_hidden_by_default() {
    let (_tmp, index) = project(&[(
        "app/routes.py",
        "@app.route('/x')\ndef h():\n    return 'ok'\n",
    )]);

    let result = deadcode(&index, &DeadcodeOptions::default());
    assert!(result.dead.iter().all(|d| d.name != "h"));
    assert_eq!(result.excluded_decorated, 1);

    let result = deadcode(
        &index,
        &DeadcodeOptions {
            include_decorated: true,
            ..DeadcodeOptions::default()
        },
    );
    assert!(result.dead.iter().any(|d| d.name == "h"));
}

#[test]
fn java_main_is_never_dead() {
    let (_tmp, index) = project(&[(
        "src/App.java",
        "public class App {\n    public static void main(String[] args) {\n    }\n}\n",
    )]);

    for include_exported in [false, true] {
        let result = deadcode(
            &index,
            &DeadcodeOptions {
                include_exported,
                include_decorated: true,
                ..DeadcodeOptions::default()
            },
        );
        assert!(
            result.dead.iter().all(|d| d.name != "main"),
            "main must never be dead (include_exported={include_exported})"
        );
    }
}

#[test]
fn rust_tests_and_trait_impls_are_never_dead_by_default() {
    let (_tmp, index) = project(&[(
        "src/display.rs",
        "use std::fmt;\n\npub struct W;\n\nimpl fmt::Display for W {\n    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {\n        write!(f, \"w\")\n    }\n}\n\n#[test]\nfn checks() {\n    let _ = W;\n}\n",
    )]);

    let result = deadcode(&index, &DeadcodeOptions::default());
    assert!(result.dead.iter().all(|d| d.name != "checks"));
    assert!(result.dead.iter().all(|d| d.name != "fmt"));
}

#[test]
fn python_test_hooks_are_never_dead() {
    let (_tmp, index) = project(&[(
        "app/hooks.py",
        "class Base:\n    def setUp(self):\n        pass\n\n    def tearDown(self):\n        pass\n\ndef pytest_configure(config):\n    pass\n",
    )]);

    let result = deadcode(&index, &DeadcodeOptions::default());
    for hook in ["setUp", "tearDown", "pytest_configure"] {
        assert!(
            result.dead.iter().all(|d| d.name != hook),
            "{hook} must never be dead"
        );
    }
}

#[test]
fn bundled_files_are_skipped_entirely() {
    let long_line = format!("var x = [{}];", "1,".repeat(400));
    let bundle = format!(
        "function __webpack_require__(id) {{}}\nfunction a() {{}}\nfunction b() {{}}\nfunction c() {{}}\n{long_line}\n"
    );
    let (_tmp, index) = project(&[("dist2/bundle.js", bundle.as_str())]);

    let result = deadcode(&index, &DeadcodeOptions::default());
    assert!(result.dead.is_empty());
    assert!(result.skipped_files.contains(&"dist2/bundle.js".to_string()));
}

#[test]
fn unused_function_is_reported_used_one_is_not() {
    let (_tmp, index) = project(&[
        (
            "src/used.js",
            "function used() {}\nfunction unused() {}\nmodule.exports = { used };\n",
        ),
        (
            "src/entry.js",
            "const { used } = require('./used');\nfunction boot() { used(); }\nboot();\n",
        ),
    ]);

    let result = deadcode(&index, &DeadcodeOptions::default());
    let names: Vec<&str> = result.dead.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["unused"]);
}
