use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A directed connection between two entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Read-only view of the graph at a point in time.
///
/// A fresh snapshot replaces, never mutates, the previous one; traversal
/// functions treat their input as immutable for the duration of a call.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    pub nodes: HashSet<String>,
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new(nodes: HashSet<String>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.nodes.contains(entity_id)
    }
}
