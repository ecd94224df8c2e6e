//! `graph`: the import graph around one file. DFS distinguishes true
//! back-edges (`circular`) from repeat visits of already-expanded nodes
//! (`already-shown`).

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::index::ProjectIndex;
use crate::query::FileQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphDirection {
    Imports,
    Importers,
    Both,
}

#[derive(Debug, Clone)]
pub struct GraphOptions {
    pub direction: GraphDirection,
    pub max_depth: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        GraphOptions {
            direction: GraphDirection::Imports,
            max_depth: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeStatus {
    Normal,
    AlreadyShown,
    Circular,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub status: EdgeStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphResult {
    pub root: String,
    pub direction: GraphDirection,
    pub nodes: Vec<String>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BothGraphResult {
    pub root: String,
    pub direction: GraphDirection,
    pub imports: GraphResult,
    pub importers: GraphResult,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GraphOutput {
    Single(GraphResult),
    Both(BothGraphResult),
}

pub fn graph(
    index: &ProjectIndex,
    file: &str,
    options: &GraphOptions,
) -> FileQuery<GraphOutput> {
    let Some(rel) = index.normalize_file_arg(file) else {
        return FileQuery::not_found(file);
    };

    match options.direction {
        GraphDirection::Both => {
            let imports = walk(index, &rel, GraphDirection::Imports, options.max_depth);
            let importers = walk(index, &rel, GraphDirection::Importers, options.max_depth);
            FileQuery::Found(GraphOutput::Both(BothGraphResult {
                root: rel,
                direction: GraphDirection::Both,
                imports,
                importers,
            }))
        }
        direction => FileQuery::Found(GraphOutput::Single(walk(
            index,
            &rel,
            direction,
            options.max_depth,
        ))),
    }
}

fn neighbors(index: &ProjectIndex, rel: &str, direction: GraphDirection) -> Vec<String> {
    match direction {
        GraphDirection::Imports => index
            .import_graph
            .get(rel)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default(),
        GraphDirection::Importers => index
            .export_graph
            .get(rel)
            .map(|edges| {
                let mut files: Vec<String> = edges.iter().map(|e| e.file.clone()).collect();
                files.sort();
                files.dedup();
                files
            })
            .unwrap_or_default(),
        GraphDirection::Both => unreachable!("both is split by the caller"),
    }
}

fn walk(index: &ProjectIndex, root: &str, direction: GraphDirection, max_depth: u32) -> GraphResult {
    let mut nodes: Vec<String> = vec![root.to_string()];
    let mut node_set: BTreeSet<String> = BTreeSet::from([root.to_string()]);
    let mut edges: Vec<GraphEdge> = Vec::new();
    let mut edge_seen: HashSet<(String, String)> = HashSet::new();
    let mut expanded: HashSet<String> = HashSet::new();
    let mut stack: HashSet<String> = HashSet::new();

    dfs(
        index, root, direction, max_depth, &mut nodes, &mut node_set, &mut edges, &mut edge_seen,
        &mut expanded, &mut stack,
    );

    GraphResult {
        root: root.to_string(),
        direction,
        nodes,
        edges,
    }
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    index: &ProjectIndex,
    current: &str,
    direction: GraphDirection,
    depth: u32,
    nodes: &mut Vec<String>,
    node_set: &mut BTreeSet<String>,
    edges: &mut Vec<GraphEdge>,
    edge_seen: &mut HashSet<(String, String)>,
    expanded: &mut HashSet<String>,
    stack: &mut HashSet<String>,
) {
    if depth == 0 || !expanded.insert(current.to_string()) {
        return;
    }
    stack.insert(current.to_string());

    for next in neighbors(index, current, direction) {
        // Edges dedup on (from, to).
        let key = (current.to_string(), next.clone());
        if edge_seen.contains(&key) {
            continue;
        }

        let status = if stack.contains(&next) {
            // A true back-edge into the active DFS path.
            EdgeStatus::Circular
        } else if expanded.contains(&next) {
            // Diamond: seen before, but not an ancestor.
            EdgeStatus::AlreadyShown
        } else {
            EdgeStatus::Normal
        };
        edge_seen.insert(key);
        edges.push(GraphEdge {
            from: current.to_string(),
            to: next.clone(),
            status,
        });
        if node_set.insert(next.clone()) {
            nodes.push(next.clone());
        }
        if status == EdgeStatus::Normal {
            dfs(
                index, &next, direction, depth - 1, nodes, node_set, edges, edge_seen, expanded,
                stack,
            );
        }
    }

    stack.remove(current);
}
