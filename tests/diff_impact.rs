//! Diff-impact end to end against a real git repository.

mod common;

use std::process::Command;

use common::write_files;
use tempfile::TempDir;
use ucn::index::{BuildOptions, ProjectIndex};
use ucn::query::diff_impact::{DiffImpactOptions, diff_impact};

fn git(root: &std::path::Path, args: &[&str]) -> bool {
    Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .env("GIT_AUTHOR_NAME", "test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn modified_function_reports_its_callers() {
    let tmp = TempDir::new().unwrap();
    write_files(
        tmp.path(),
        &[(
            "src/app.js",
            "function greet(n) {\n  return 'Hi ' + n;\n}\nfunction main() {\n  greet('world');\n}\nmain();\n",
        )],
    );

    if !git(tmp.path(), &["init", "-q"]) {
        eprintln!("git unavailable; skipping");
        return;
    }
    assert!(git(tmp.path(), &["add", "."]));
    assert!(git(tmp.path(), &["commit", "-q", "-m", "initial"]));

    // Modify greet's body without moving other functions.
    write_files(
        tmp.path(),
        &[(
            "src/app.js",
            "function greet(n) {\n  return 'Hello ' + n;\n}\nfunction main() {\n  greet('world');\n}\nmain();\n",
        )],
    );

    // The index reflects the post-change tree.
    let mut index = ProjectIndex::new(tmp.path()).unwrap();
    index.build(BuildOptions::default()).unwrap();

    let result = diff_impact(
        &index,
        &DiffImpactOptions {
            base: Some("HEAD".into()),
            staged: false,
        },
    )
    .unwrap();

    assert_eq!(result.summary.modified_functions, 1);
    assert_eq!(result.functions.len(), 1);
    let changed = &result.functions[0];
    assert_eq!(changed.name, "greet");
    assert_eq!(changed.file_path, "src/app.js");
    assert!(
        changed
            .callers
            .iter()
            .any(|c| c.caller_name.as_deref() == Some("main")),
        "greet's caller main must be attached"
    );
    assert!(result.new_functions.is_empty());
}

#[test]
fn brand_new_function_is_reported_separately() {
    let tmp = TempDir::new().unwrap();
    write_files(
        tmp.path(),
        &[("src/app.js", "function greet(n) {\n  return n;\n}\n")],
    );

    if !git(tmp.path(), &["init", "-q"]) {
        eprintln!("git unavailable; skipping");
        return;
    }
    assert!(git(tmp.path(), &["add", "."]));
    assert!(git(tmp.path(), &["commit", "-q", "-m", "initial"]));

    write_files(
        tmp.path(),
        &[(
            "src/app.js",
            "function greet(n) {\n  return n;\n}\nfunction farewell(n) {\n  return 'bye ' + n;\n}\n",
        )],
    );

    let mut index = ProjectIndex::new(tmp.path()).unwrap();
    index.build(BuildOptions::default()).unwrap();

    let result = diff_impact(
        &index,
        &DiffImpactOptions {
            base: Some("HEAD".into()),
            staged: false,
        },
    )
    .unwrap();

    assert!(
        result
            .new_functions
            .iter()
            .any(|f| f.name == "farewell"),
        "farewell is entirely new"
    );
    assert_eq!(result.summary.modified_functions, 0);
}
