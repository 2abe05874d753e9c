use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::snapshot::{Edge, GraphSnapshot};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("edge already exists: {from} -> {to}")]
    DuplicateEdge { from: String, to: String },
}

/// What a node is for. Only the text content participates in the sync core;
/// the kind is carried for the surrounding editor surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Text,
    Provider,
    Media,
    Folder,
}

/// A content-bearing workflow node, as seen by the synchronization core.
/// Visual and positional attributes live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityNode {
    pub id: String,
    pub kind: NodeKind,
    pub content: String,
}

impl EntityNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            content: content.into(),
        }
    }
}

/// One node record in a remote graph payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePayload {
    pub id: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub content: String,
}

/// A full entity graph as delivered by the remote snapshot collaborator
/// (fresh load, or another session's save).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: Vec<NodePayload>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// The mutable address space of nodes and edges.
///
/// Mutation entry points are called by the commit layer to reflect
/// confirmed writes; readers take a [`GraphSnapshot`] for traversal.
#[derive(Debug, Default)]
pub struct EntityGraphStore {
    nodes: HashMap<String, EntityNode>,
    edges: Vec<Edge>,
}

impl EntityGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, node: EntityNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Remove a node and every edge incident to it. Returns false if the
    /// node was not present.
    pub fn remove_node(&mut self, entity_id: &str) -> bool {
        if self.nodes.remove(entity_id).is_none() {
            return false;
        }
        self.edges
            .retain(|edge| edge.from != entity_id && edge.to != entity_id);
        true
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.nodes.contains_key(entity_id)
    }

    pub fn node(&self, entity_id: &str) -> Option<&EntityNode> {
        self.nodes.get(entity_id)
    }

    pub fn node_content(&self, entity_id: &str) -> Option<&str> {
        self.nodes.get(entity_id).map(|node| node.content.as_str())
    }

    /// Reflect a confirmed write. Returns false if the node has since been
    /// removed locally.
    pub fn set_node_content(&mut self, entity_id: &str, content: &str) -> bool {
        match self.nodes.get_mut(entity_id) {
            Some(node) => {
                node.content = content.to_string();
                true
            }
            None => false,
        }
    }

    /// Connect `from` to `to`. Both endpoints must exist and the edge must
    /// not already be present. Cycles are legal: the data model does not
    /// forbid them, and the reachability queries stay correct on them.
    pub fn connect(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        if !self.nodes.contains_key(from) {
            return Err(GraphError::UnknownEntity(from.to_string()));
        }
        if !self.nodes.contains_key(to) {
            return Err(GraphError::UnknownEntity(to.to_string()));
        }
        if self.edges.iter().any(|e| e.from == from && e.to == to) {
            return Err(GraphError::DuplicateEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.edges.push(Edge::new(from, to));
        Ok(())
    }

    /// Remove an edge. Returns false if it was not present.
    pub fn disconnect(&mut self, from: &str, to: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| !(e.from == from && e.to == to));
        self.edges.len() != before
    }

    /// Replace the whole graph with a remote payload. Edges referencing
    /// nodes absent from the payload are dropped and returned to the caller
    /// so the rejection is visible, not silent.
    pub fn replace_all(&mut self, payload: GraphPayload) -> Vec<Edge> {
        self.nodes = payload
            .nodes
            .into_iter()
            .map(|n| (n.id.clone(), EntityNode::new(n.id, n.kind, n.content)))
            .collect();

        let (kept, dropped) = payload
            .edges
            .into_iter()
            .partition(|e| self.nodes.contains_key(&e.from) && self.nodes.contains_key(&e.to));
        self.edges = kept;
        dropped
    }

    /// Point-in-time view for reachability queries.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::new(self.nodes.keys().cloned().collect(), self.edges.clone())
    }
}
