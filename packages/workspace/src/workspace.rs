//! Editing-session management over the shared entity graph.
//!
//! An [`EditorWorkspace`] owns the graph store, the remote persistence
//! handle, and at most one [`CommitController`] per entity. Feeding a fresh
//! remote snapshot into each open editor is this layer's responsibility,
//! not the controllers'.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use flowcanvas_graph::{
    ancestors_of, direct_descendants_of, EntityGraphStore, EntityNode, GraphError, GraphPayload,
    GraphSnapshot,
};
use flowcanvas_sync::{CommitController, CommitOutcome, RemoteContentStore, DEFAULT_DEBOUNCE};

#[derive(Debug, Error, PartialEq)]
pub enum WorkspaceError {
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("editor already open for entity: {0}")]
    EditorAlreadyOpen(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// The surrounding store of the synchronization core: node/edge address
/// space plus the per-entity editing sessions.
pub struct EditorWorkspace {
    graph: Arc<Mutex<EntityGraphStore>>,
    remote: Arc<dyn RemoteContentStore>,
    editors: HashMap<String, CommitController>,
    debounce: Duration,
}

impl EditorWorkspace {
    pub fn new(remote: Arc<dyn RemoteContentStore>) -> Self {
        Self::with_debounce(remote, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(remote: Arc<dyn RemoteContentStore>, debounce: Duration) -> Self {
        Self {
            graph: Arc::new(Mutex::new(EntityGraphStore::new())),
            remote,
            editors: HashMap::new(),
            debounce,
        }
    }

    // ---- graph access -----------------------------------------------------

    pub fn insert_node(&self, node: EntityNode) {
        self.graph.lock().unwrap().insert_node(node);
    }

    /// Remove a node locally. Any open editor for it is discarded with it.
    pub fn remove_node(&mut self, entity_id: &str) -> bool {
        self.editors.remove(entity_id);
        self.graph.lock().unwrap().remove_node(entity_id)
    }

    pub fn connect(&self, from: &str, to: &str) -> Result<(), WorkspaceError> {
        self.graph.lock().unwrap().connect(from, to)?;
        Ok(())
    }

    pub fn disconnect(&self, from: &str, to: &str) -> bool {
        self.graph.lock().unwrap().disconnect(from, to)
    }

    pub fn node_content(&self, entity_id: &str) -> Option<String> {
        self.graph
            .lock()
            .unwrap()
            .node_content(entity_id)
            .map(str::to_string)
    }

    /// Point-in-time view for traversal; never a live reference.
    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.lock().unwrap().snapshot()
    }

    /// Everything transitively feeding into `entity_id`.
    pub fn ancestors_of(&self, entity_id: &str) -> HashSet<String> {
        ancestors_of(&self.snapshot(), entity_id)
    }

    /// Direct children of `entity_id`, in edge order.
    pub fn direct_descendants_of(&self, entity_id: &str) -> Vec<String> {
        direct_descendants_of(&self.snapshot(), entity_id)
    }

    // ---- editing sessions -------------------------------------------------

    /// Start an editing session for an entity. The controller's baseline is
    /// the entity's currently stored content. No entity has more than one
    /// active editor at a time.
    pub fn open_editor(&mut self, entity_id: &str) -> Result<CommitController, WorkspaceError> {
        if self.editors.contains_key(entity_id) {
            return Err(WorkspaceError::EditorAlreadyOpen(entity_id.to_string()));
        }
        let initial = self
            .node_content(entity_id)
            .ok_or_else(|| WorkspaceError::UnknownEntity(entity_id.to_string()))?;

        debug!("opening editor for entity {}", entity_id);
        let controller = CommitController::with_debounce(
            entity_id,
            &initial,
            self.remote.clone(),
            self.graph.clone(),
            self.debounce,
        );
        self.editors.insert(entity_id.to_string(), controller.clone());
        Ok(controller)
    }

    pub fn editor(&self, entity_id: &str) -> Option<&CommitController> {
        self.editors.get(entity_id)
    }

    pub fn open_editor_count(&self) -> usize {
        self.editors.len()
    }

    /// End an editing session, flushing any pending edit first.
    pub async fn close_editor(&mut self, entity_id: &str) -> Option<CommitOutcome> {
        let controller = self.editors.remove(entity_id)?;
        debug!("closing editor for entity {}", entity_id);
        Some(controller.teardown().await)
    }

    /// Replace the graph with a freshly loaded remote snapshot and
    /// reconcile every open editor against it. Editors for entities absent
    /// from the snapshot are discarded; their target no longer exists.
    pub fn apply_remote_graph(&mut self, payload: GraphPayload) {
        let contents: HashMap<String, String> = payload
            .nodes
            .iter()
            .map(|node| (node.id.clone(), node.content.clone()))
            .collect();

        let dropped = self.graph.lock().unwrap().replace_all(payload);
        for edge in &dropped {
            warn!(
                "remote snapshot edge {} -> {} references a missing node; dropped",
                edge.from, edge.to
            );
        }

        let mut gone = Vec::new();
        for (entity_id, editor) in &self.editors {
            match contents.get(entity_id) {
                Some(content) => editor.on_remote_snapshot_arrived(content),
                None => gone.push(entity_id.clone()),
            }
        }
        for entity_id in gone {
            warn!(
                "entity {} absent from remote snapshot; closing its editor",
                entity_id
            );
            self.editors.remove(&entity_id);
        }
    }

    /// Flush and drop every open editor. Called when the surrounding graph
    /// is torn down.
    pub async fn teardown(&mut self) {
        for (entity_id, editor) in self.editors.drain() {
            if let CommitOutcome::Failed { error } = editor.teardown().await {
                warn!("entity {} left unsynced at teardown: {}", entity_id, error);
            }
        }
    }
}
