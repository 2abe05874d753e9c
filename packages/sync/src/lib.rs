//! # Flowcanvas Sync
//!
//! Versioned, debounced content commits for one editable entity at a time.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ user input: on_local_change (never blocks)  │
//! └─────────────────────────────────────────────┘
//!                     ↓ debounce
//! ┌─────────────────────────────────────────────┐
//! │ CommitController: version ledger + commit   │
//! │  - at most one write in flight per entity   │
//! │  - stale acks never clear newer edits       │
//! │  - remote snapshots never clobber typing    │
//! └─────────────────────────────────────────────┘
//!                     ↓ diff(baseline, value)
//! ┌─────────────────────────────────────────────┐
//! │ RemoteContentStore: full value + edit script│
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Full value is authoritative**: the operation list is an advisory
//!    patch the store may apply or ignore.
//! 2. **The baseline is what the store holds**: every diff is computed
//!    against the last acknowledged value, including acknowledged values
//!    that were superseded while in flight.
//! 3. **Typing never waits on the network**: commit failures surface as
//!    state, not as errors thrown into the input path.

mod controller;
mod remote;
mod state;

pub use controller::{CommitController, CommitOutcome, DEFAULT_DEBOUNCE};
pub use remote::{CommitError, RemoteContentStore};
pub use state::ContentState;

// Re-export the edit-script types for convenience
pub use flowcanvas_diff::{apply, diff, ApplyError, Operation, OperationList};
