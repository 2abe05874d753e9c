//! # Flowcanvas Graph
//!
//! The address space of workflow nodes and edges.
//!
//! [`EntityGraphStore`] holds the nodes and the directed edge list; the
//! synchronization layer calls its mutation entry points to reflect
//! confirmed writes. Reachability queries ([`ancestors_of`],
//! [`direct_descendants_of`]) run over an immutable [`GraphSnapshot`] taken
//! from the store, never over a live reference, so a traversal cannot
//! observe a half-updated graph.

mod reachability;
mod snapshot;
mod store;

pub use reachability::{ancestors_of, direct_descendants_of};
pub use snapshot::{Edge, GraphSnapshot};
pub use store::{EntityGraphStore, EntityNode, GraphError, GraphPayload, NodeKind, NodePayload};
