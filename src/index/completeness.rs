//! Completeness detection: dynamic imports, eval, and reflection hide call
//! and import edges from static analysis, so their presence downgrades the
//! index from "complete" to "partial".

use serde::{Deserialize, Serialize};

use crate::index::ProjectIndex;

const EXAMPLE_LIMIT: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessWarning {
    /// `dynamic-import` | `eval` | `reflection`
    #[serde(rename = "type")]
    pub pattern: String,
    pub count: usize,
    /// `file:line` samples, capped.
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completeness {
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CompletenessWarning>,
}

/// Scan the per-file import and call records, counting each pattern family
/// independently.
pub fn detect(index: &ProjectIndex) -> Completeness {
    let mut dynamic = Counter::default();
    let mut eval = Counter::default();
    let mut reflection = Counter::default();

    for (rel, record) in &index.files {
        for import in &record.imports {
            if import.is_dynamic {
                dynamic.hit(rel, import.line);
            }
        }
    }

    for (rel, file_calls) in &index.calls_cache {
        for call in &file_calls.calls {
            match call.name.as_str() {
                "eval" | "exec" => eval.hit(rel, call.line),
                "Function" if call.resolved_name.as_deref() == Some("Function") => {
                    eval.hit(rel, call.line)
                }
                "getattr" | "setattr" | "hasattr" | "__getattr__" | "__import__" => {
                    reflection.hit(rel, call.line)
                }
                _ => {}
            }
        }
    }

    let mut warnings = Vec::new();
    for (pattern, counter) in [
        ("dynamic-import", dynamic),
        ("eval", eval),
        ("reflection", reflection),
    ] {
        if counter.count > 0 {
            warnings.push(CompletenessWarning {
                pattern: pattern.to_string(),
                count: counter.count,
                examples: counter.examples,
            });
        }
    }

    Completeness {
        complete: warnings.is_empty(),
        warnings,
    }
}

#[derive(Default)]
struct Counter {
    count: usize,
    examples: Vec<String>,
}

impl Counter {
    fn hit(&mut self, rel: &str, line: u32) {
        self.count += 1;
        if self.examples.len() < EXAMPLE_LIMIT {
            self.examples.push(format!("{rel}:{line}"));
        }
    }
}
