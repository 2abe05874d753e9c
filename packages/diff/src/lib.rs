//! # Flowcanvas Diff
//!
//! Deterministic text-diff engine for node content synchronization.
//!
//! [`diff`] reduces two versions of a string to a minimal edit script of
//! retain/insert/delete operations; [`apply`] replays such a script against
//! a base string. The pair is used to minimize commit payloads and to let
//! the remote store apply incremental patches instead of full overwrites.
//!
//! No state, no I/O. Operation counts are in characters (Unicode scalar
//! values), not bytes, so multi-byte text diffs cleanly.

mod engine;
mod ops;

pub use engine::{apply, diff, ApplyError};
pub use ops::{Operation, OperationList};
