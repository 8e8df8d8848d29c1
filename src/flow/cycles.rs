//! Cycle detection and pruning
//!
//! Depth-first search from every unvisited subject, in first-appearance
//! order. Reaching a node that is still on the current path closes a
//! cycle; the cycle is the slice of the current path starting at that node.
//! Every edge on every detected cycle is removed, including the closing
//! back edge. Each cycle in a directed graph contains at least one DFS back
//! edge, so the remaining edges always form a DAG.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

use super::relationship::MaterialRelationship;

/// A cycle found by the detector, as node ids and the edges closing it
#[derive(Clone, Debug, PartialEq)]
pub struct FoundCycle {
    pub node_ids: Vec<String>,
    pub edge_indices: Vec<usize>,
}

/// Search state for one detection run. Nothing outlives a run, so the
/// detector can be used from several places at once.
///
/// `frames` replaces the call stack: each entry is a node on the current
/// path and the index of the next neighbour to look at. `path_edges[i]` is
/// the edge from `path[i]` to `path[i + 1]`.
struct DfsState<'a> {
    visited: HashSet<&'a str>,
    on_stack: HashSet<&'a str>,
    frames: Vec<(&'a str, usize)>,
    path: Vec<&'a str>,
    path_edges: Vec<usize>,
    cycles: Vec<FoundCycle>,
}

impl<'a> DfsState<'a> {
    fn new() -> Self {
        Self {
            visited: HashSet::new(),
            on_stack: HashSet::new(),
            frames: Vec::new(),
            path: Vec::new(),
            path_edges: Vec::new(),
            cycles: Vec::new(),
        }
    }

    fn enter(&mut self, node: &'a str) {
        self.visited.insert(node);
        self.on_stack.insert(node);
        self.path.push(node);
        self.frames.push((node, 0));
    }

    fn visit(&mut self, root: &'a str, adjacency: &IndexMap<&'a str, Vec<(&'a str, usize)>>) {
        self.enter(root);

        while let Some(frame) = self.frames.last_mut() {
            let (node, next) = *frame;
            let neighbors = adjacency.get(node).map(Vec::as_slice).unwrap_or_default();

            match neighbors.get(next) {
                Some(&(target, edge_index)) => {
                    frame.1 += 1;
                    if !self.visited.contains(target) {
                        self.path_edges.push(edge_index);
                        self.enter(target);
                    } else if self.on_stack.contains(target) {
                        self.close_cycle(target, edge_index);
                    }
                }
                None => {
                    self.frames.pop();
                    self.path.pop();
                    self.on_stack.remove(node);
                    // the root has no incoming path edge
                    self.path_edges.pop();
                }
            }
        }
    }

    fn close_cycle(&mut self, repeated: &str, back_edge: usize) {
        if let Some(pos) = self.path.iter().position(|n| *n == repeated) {
            let mut edge_indices = self.path_edges[pos..].to_vec();
            edge_indices.push(back_edge);
            self.cycles.push(FoundCycle {
                node_ids: self.path[pos..].iter().map(|n| n.to_string()).collect(),
                edge_indices,
            });
        }
    }
}

pub struct CycleDetector<'a> {
    adjacency: IndexMap<&'a str, Vec<(&'a str, usize)>>,
}

impl<'a> CycleDetector<'a> {
    pub fn new(edges: &'a [MaterialRelationship]) -> Self {
        let mut adjacency: IndexMap<&'a str, Vec<(&'a str, usize)>> = IndexMap::new();
        for (index, edge) in edges.iter().enumerate() {
            adjacency
                .entry(edge.subject_id.as_str())
                .or_default()
                .push((edge.object_id.as_str(), index));
        }
        Self { adjacency }
    }

    pub fn detect(&self) -> Vec<FoundCycle> {
        let mut state = DfsState::new();
        for &node in self.adjacency.keys() {
            if !state.visited.contains(node) {
                state.visit(node, &self.adjacency);
            }
        }
        state.cycles
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectedCycle {
    pub node_ids: Vec<String>,
    pub labels: Vec<String>,
    /// Closed path, e.g. `Log → Beam → Log`
    pub description: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub total_cycles: usize,
    pub removed_edge_count: usize,
    pub valid_edge_count: usize,
    pub cycles: Vec<DetectedCycle>,
}

impl CycleReport {
    pub fn has_cycles(&self) -> bool {
        self.total_cycles > 0
    }

    pub fn summary(&self) -> String {
        if self.has_cycles() {
            format!(
                "Removed {} edge(s) to break {} cycle(s); {} edge(s) remain",
                self.removed_edge_count, self.total_cycles, self.valid_edge_count
            )
        } else {
            format!("No cycles; {} edge(s)", self.valid_edge_count)
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CyclePruning {
    pub valid_edges: Vec<MaterialRelationship>,
    pub removed_edges: Vec<MaterialRelationship>,
    pub report: CycleReport,
}

/// Removes every edge that lies on a detected cycle.
///
/// `label` turns a node id into the text shown in the report.
pub fn prune_cycles<F>(edges: &[MaterialRelationship], label: F) -> CyclePruning
where
    F: Fn(&str) -> String,
{
    let cycles = CycleDetector::new(edges).detect();

    let cyclic: HashSet<usize> = cycles
        .iter()
        .flat_map(|c| c.edge_indices.iter().copied())
        .collect();

    let (removed_edges, valid_edges): (Vec<_>, Vec<_>) = edges
        .iter()
        .enumerate()
        .partition(|(index, _)| cyclic.contains(index));
    let removed_edges: Vec<MaterialRelationship> =
        removed_edges.into_iter().map(|(_, e)| e.clone()).collect();
    let valid_edges: Vec<MaterialRelationship> =
        valid_edges.into_iter().map(|(_, e)| e.clone()).collect();

    let detected: Vec<DetectedCycle> = cycles
        .iter()
        .map(|cycle| {
            let labels: Vec<String> = cycle.node_ids.iter().map(|id| label(id)).collect();
            let mut closed = labels.clone();
            if let Some(first) = labels.first() {
                closed.push(first.clone());
            }
            DetectedCycle {
                node_ids: cycle.node_ids.clone(),
                labels,
                description: closed.join(" → "),
            }
        })
        .collect();

    for cycle in &detected {
        debug!("Cycle detected: {}", cycle.description);
    }

    let report = CycleReport {
        total_cycles: detected.len(),
        removed_edge_count: removed_edges.len(),
        valid_edge_count: valid_edges.len(),
        cycles: detected,
    };
    if report.has_cycles() {
        info!("{}", report.summary());
    }

    CyclePruning {
        valid_edges,
        removed_edges,
        report,
    }
}

/// Kahn topological sort over the edge endpoints.
///
/// Returns the ids in a topological order, or the ids left on cycles.
pub fn topological_order(edges: &[MaterialRelationship]) -> Result<Vec<String>, Vec<String>> {
    let mut in_degree: IndexMap<&str, usize> = IndexMap::new();
    let mut adjacency: IndexMap<&str, Vec<&str>> = IndexMap::new();

    for edge in edges {
        in_degree.entry(edge.subject_id.as_str()).or_insert(0);
        *in_degree.entry(edge.object_id.as_str()).or_insert(0) += 1;
        adjacency
            .entry(edge.subject_id.as_str())
            .or_default()
            .push(edge.object_id.as_str());
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut sorted = Vec::with_capacity(in_degree.len());

    while let Some(node) = queue.pop_front() {
        sorted.push(node.to_string());
        if let Some(neighbors) = adjacency.get(node) {
            for neighbor in neighbors {
                if let Some(deg) = in_degree.get_mut(neighbor) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(*neighbor);
                    }
                }
            }
        }
    }

    if sorted.len() == in_degree.len() {
        Ok(sorted)
    } else {
        let placed: HashSet<&str> = sorted.iter().map(String::as_str).collect();
        Err(in_degree
            .keys()
            .filter(|id| !placed.contains(*id))
            .map(|id| id.to_string())
            .collect())
    }
}

pub fn is_acyclic(edges: &[MaterialRelationship]) -> bool {
    topological_order(edges).is_ok()
}
