//! `diff-impact`: map a git diff onto the indexed symbols — which
//! functions changed, which are new, and who calls the changed ones.

use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::index::calls::{CallOptions, CallerSite, find_callers};
use crate::index::{Filters, ProjectIndex};
use crate::{Result, UcnError};

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(?P<old_start>\d+)(?:,(?P<old_len>\d+))? \+(?P<new_start>\d+)(?:,(?P<new_len>\d+))? @@")
        .expect("hunk header pattern")
});

#[derive(Debug, Clone, Default)]
pub struct DiffImpactOptions {
    /// Revision to diff against; unset means the working tree diff.
    pub base: Option<String>,
    /// Use `git diff --cached`.
    pub staged: bool,
}

#[derive(Debug, Clone)]
pub struct DiffFile {
    pub relative_path: String,
    pub added_lines: Vec<u32>,
    pub deleted_lines: Vec<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFunction {
    pub name: String,
    pub file_path: String,
    pub line: u32,
    pub callers: Vec<CallerSite>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFunction {
    pub name: String,
    pub file_path: String,
    pub line: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleLevelChange {
    pub file_path: String,
    pub lines: Vec<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub changed_files: usize,
    pub modified_functions: usize,
    pub new_functions: usize,
    pub total_callers: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffImpactResult {
    pub base: String,
    pub functions: Vec<ChangedFunction>,
    pub new_functions: Vec<NewFunction>,
    pub module_level_changes: Vec<ModuleLevelChange>,
    pub summary: DiffSummary,
}

pub fn diff_impact(index: &ProjectIndex, options: &DiffImpactOptions) -> Result<DiffImpactResult> {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(&index.root).arg("diff").arg("--unified=0");
    if options.staged {
        cmd.arg("--cached");
    }
    if let Some(base) = &options.base {
        cmd.arg(base);
    }

    let output = cmd.output().map_err(|_| UcnError::NotAGitRepo)?;
    if !output.status.success() {
        return Err(UcnError::NotAGitRepo);
    }
    let diff_text = String::from_utf8_lossy(&output.stdout).to_string();
    let base_label = options
        .base
        .clone()
        .unwrap_or_else(|| if options.staged { "--cached".into() } else { "worktree".into() });

    Ok(analyze(index, &diff_text, base_label))
}

/// Parse a unified diff and attribute changed lines to post-change symbols.
pub fn analyze(index: &ProjectIndex, diff_text: &str, base: String) -> DiffImpactResult {
    let changed = parse_diff(diff_text);
    let mut functions: Vec<ChangedFunction> = Vec::new();
    let mut new_functions: Vec<NewFunction> = Vec::new();
    let mut module_level_changes: Vec<ModuleLevelChange> = Vec::new();

    let call_options = CallOptions {
        include_methods: Some(true),
        include_uncertain: false,
        filters: Filters {
            include_tests: true,
            ..Filters::default()
        },
    };

    for file in &changed {
        let callable: Vec<&crate::index::Symbol> = index
            .symbols_in_file(&file.relative_path)
            .into_iter()
            .filter(|s| s.kind.is_callable())
            .collect();
        let mut outside: Vec<u32> = Vec::new();

        // Which symbols intersect the added lines; a symbol whose range is
        // entirely new lines is a new function, not a modified one.
        let mut touched: Vec<&crate::index::Symbol> = Vec::new();
        for &symbol in &callable {
            let hits: Vec<u32> = file
                .added_lines
                .iter()
                .copied()
                .filter(|l| symbol.contains_line(*l))
                .collect();
            if hits.is_empty() {
                continue;
            }
            let whole_range_new = (symbol.start_line..=symbol.end_line)
                .all(|l| file.added_lines.contains(&l));
            if whole_range_new {
                new_functions.push(NewFunction {
                    name: symbol.name.clone(),
                    file_path: file.relative_path.clone(),
                    line: symbol.start_line,
                });
            } else {
                touched.push(symbol);
            }
        }

        // Deleted lines inside a surviving symbol count as modification too.
        for &symbol in &callable {
            if touched.iter().any(|s| s.binding_id() == symbol.binding_id()) {
                continue;
            }
            if file
                .deleted_lines
                .iter()
                .any(|l| symbol.contains_line(*l))
            {
                touched.push(symbol);
            }
        }

        for line in &file.added_lines {
            if !callable.iter().any(|s| s.contains_line(*line)) {
                outside.push(*line);
            }
        }
        if !outside.is_empty() {
            module_level_changes.push(ModuleLevelChange {
                file_path: file.relative_path.clone(),
                lines: outside,
            });
        }

        touched.sort_by_key(|s| s.start_line);
        touched.dedup_by_key(|s| s.binding_id());
        for symbol in touched {
            // Attribute to the innermost symbol only when ranges nest.
            functions.push(ChangedFunction {
                name: symbol.name.clone(),
                file_path: file.relative_path.clone(),
                line: symbol.start_line,
                callers: find_callers(index, symbol, &call_options),
            });
        }
    }

    let summary = DiffSummary {
        changed_files: changed.len(),
        modified_functions: functions.len(),
        new_functions: new_functions.len(),
        total_callers: functions.iter().map(|f| f.callers.len()).sum(),
    };

    DiffImpactResult {
        base,
        functions,
        new_functions,
        module_level_changes,
        summary,
    }
}

/// Unified-diff hunks → per-file added/deleted line numbers.
pub fn parse_diff(text: &str) -> Vec<DiffFile> {
    let mut files: Vec<DiffFile> = Vec::new();
    let mut current: Option<DiffFile> = None;
    let mut old_line = 0u32;
    let mut new_line = 0u32;

    for line in text.lines() {
        if let Some(path) = line.strip_prefix("+++ b/") {
            if let Some(done) = current.take() {
                files.push(done);
            }
            current = Some(DiffFile {
                relative_path: path.trim().to_string(),
                added_lines: Vec::new(),
                deleted_lines: Vec::new(),
            });
            continue;
        }
        if line.starts_with("+++ /dev/null") {
            // Deleted file: changes map to nothing post-change.
            if let Some(done) = current.take() {
                files.push(done);
            }
            current = None;
            continue;
        }
        if let Some(caps) = HUNK_HEADER.captures(line) {
            old_line = caps["old_start"].parse().unwrap_or(0);
            new_line = caps["new_start"].parse().unwrap_or(0);
            continue;
        }
        let Some(file) = current.as_mut() else { continue };
        if line.starts_with("+++") || line.starts_with("---") || line.starts_with("diff ") {
            continue;
        }
        if line.starts_with('+') {
            file.added_lines.push(new_line);
            new_line += 1;
        } else if line.starts_with('-') {
            file.deleted_lines.push(old_line);
            old_line += 1;
        } else if !line.starts_with('\\') {
            old_line += 1;
            new_line += 1;
        }
    }
    if let Some(done) = current.take() {
        files.push(done);
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hunks_into_line_sets() {
        let diff = "\
diff --git a/src/a.js b/src/a.js
index 111..222 100644
--- a/src/a.js
+++ b/src/a.js
@@ -2,1 +2,2 @@
-  return 'Hi ' + n;
+  const greeting = 'Hello ' + n;
+  return greeting;
";
        let files = parse_diff(diff);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "src/a.js");
        assert_eq!(files[0].deleted_lines, vec![2]);
        assert_eq!(files[0].added_lines, vec![2, 3]);
    }
}
