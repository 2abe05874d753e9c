//! # Flowcanvas Workspace
//!
//! The editing-session surface over the entity graph.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ workspace: graph store + open editors       │
//! │  - one CommitController per edited entity   │
//! │  - remote snapshot intake + reconciliation  │
//! │  - edge legality + reachability queries     │
//! └─────────────────────────────────────────────┘
//!          ↓ commits                ↑ snapshots
//! ┌─────────────────────────────────────────────┐
//! │ remote persistence / snapshot collaborators │
//! └─────────────────────────────────────────────┘
//! ```

mod workspace;

pub use workspace::{EditorWorkspace, WorkspaceError};

// Re-export the pieces callers wire together
pub use flowcanvas_graph::{
    ancestors_of, direct_descendants_of, EntityGraphStore, EntityNode, GraphError, GraphPayload,
    GraphSnapshot, NodeKind,
};
pub use flowcanvas_sync::{CommitController, CommitOutcome, RemoteContentStore};
