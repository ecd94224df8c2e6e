//! `stacktrace`: parse runtime stack traces and pin frames onto indexed
//! files.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::index::ProjectIndex;

// One-shot matches per line; no shared matcher state survives a call.
static NODE_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*at\s+(?:async\s+)?(?P<func>[^\s(]+)\s+\((?P<path>[^()]+?):(?P<line>\d+):(?P<col>\d+)\)\s*$")
        .expect("node frame pattern")
});
static NODE_BARE_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*at\s+(?:async\s+)?(?P<path>[^()\s]+?):(?P<line>\d+):(?P<col>\d+)\s*$")
        .expect("bare frame pattern")
});
static FIREFOX_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<func>[^@\s]*)@(?P<path>.+?):(?P<line>\d+):(?P<col>\d+)\s*$")
        .expect("firefox frame pattern")
});

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    pub file_path: String,
    pub line: u32,
    pub column: u32,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_file: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceResult {
    pub frames: Vec<Frame>,
}

pub fn parse_stack_trace(index: &ProjectIndex, text: &str) -> StackTraceResult {
    let mut frames = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let parsed = NODE_FRAME
            .captures(trimmed)
            .map(|c| {
                (
                    Some(c["func"].to_string()),
                    c["path"].to_string(),
                    c["line"].to_string(),
                    c["col"].to_string(),
                )
            })
            .or_else(|| {
                NODE_BARE_FRAME.captures(trimmed).map(|c| {
                    (
                        None,
                        c["path"].to_string(),
                        c["line"].to_string(),
                        c["col"].to_string(),
                    )
                })
            })
            .or_else(|| {
                FIREFOX_FRAME.captures(trimmed).map(|c| {
                    let func = c["func"].to_string();
                    (
                        (!func.is_empty()).then_some(func),
                        c["path"].to_string(),
                        c["line"].to_string(),
                        c["col"].to_string(),
                    )
                })
            });

        let Some((function, path, line_s, col_s)) = parsed else {
            continue;
        };
        let (Ok(line_no), Ok(col_no)) = (line_s.parse::<u32>(), col_s.parse::<u32>()) else {
            continue;
        };

        let resolved_file = closest_indexed_file(index, &path);
        frames.push(Frame {
            raw: trimmed.to_string(),
            function,
            file_path: path,
            line: line_no,
            column: col_no,
            found: resolved_file.is_some(),
            resolved_file,
        });
    }

    StackTraceResult { frames }
}

/// The indexed file sharing the longest path-segment suffix with the frame
/// path.
fn closest_indexed_file(index: &ProjectIndex, path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    let frame_segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    if frame_segments.is_empty() {
        return None;
    }

    let mut best: Option<(usize, &String)> = None;
    for rel in index.files.keys() {
        let rel_segments: Vec<&str> = rel.split('/').collect();
        let common = rel_segments
            .iter()
            .rev()
            .zip(frame_segments.iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        if common == 0 {
            continue;
        }
        match best {
            Some((score, _)) if score >= common => {}
            _ => best = Some((common, rel)),
        }
    }
    best.map(|(_, rel)| rel.clone())
}
