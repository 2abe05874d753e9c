//! Per-entity synchronization state and its transition rules.
//!
//! The transitions here are pure so the ordering rules (stale
//! acknowledgements, focus protection) are testable without timers or a
//! network collaborator; [`crate::CommitController`] wires them to both.

/// Mutable synchronization state for one editable entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentState {
    /// What the user currently sees/edits.
    pub visible_value: String,
    /// Last value known to be acknowledged by the remote store; the
    /// reference point for the next diff.
    pub baseline: String,
    /// True iff `visible_value` diverges from `baseline` and no commit for
    /// the current value has succeeded yet.
    pub dirty: bool,
    /// Monotonically incremented on every local edit.
    pub local_version: u64,
    /// Version captured by the commit currently being sent, if any.
    pub in_flight_version: Option<u64>,
    pub committing: bool,
    pub last_error: Option<String>,
    /// While true, externally-arriving snapshots must not overwrite
    /// `visible_value`.
    pub editing_focused: bool,
    /// Set once the store reports the entity gone; commits stop.
    pub removed: bool,
}

impl ContentState {
    pub fn new(initial_value: &str) -> Self {
        Self {
            visible_value: initial_value.to_string(),
            baseline: initial_value.to_string(),
            dirty: false,
            local_version: 0,
            in_flight_version: None,
            committing: false,
            last_error: None,
            editing_focused: false,
            removed: false,
        }
    }

    /// Record a keystroke. Returns the new local version.
    pub fn record_local_edit(&mut self, new_value: String) -> u64 {
        self.visible_value = new_value;
        self.dirty = true;
        self.local_version += 1;
        self.local_version
    }

    /// Reconcile a value learned from an external source (fresh load,
    /// another session). An in-progress local edit wins visually; it will
    /// be re-diffed against the new baseline on the next commit.
    pub fn apply_remote_snapshot(&mut self, remote_value: &str) {
        if self.editing_focused || self.dirty {
            self.baseline = remote_value.to_string();
        } else {
            self.visible_value = remote_value.to_string();
            self.baseline = remote_value.to_string();
        }
    }

    /// Fold in a successful acknowledgement for a commit captured at
    /// `target_version`. The store now holds `target_value`, so the
    /// baseline always advances; `dirty` clears only if no newer edit
    /// arrived while the commit was in flight.
    pub fn acknowledge(&mut self, target_value: String, target_version: u64) {
        self.baseline = target_value;
        self.last_error = None;
        if self.local_version == target_version {
            self.dirty = false;
        }
    }

    pub fn note_failure(&mut self, message: String) {
        self.last_error = Some(message);
    }

    pub fn mark_removed(&mut self) {
        self.removed = true;
    }
}
