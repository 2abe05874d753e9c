//! Commit lifecycle for exactly one entity's content.
//!
//! A [`CommitController`] owns the debounce timer, the in-flight commit
//! de-duplication, and the version/acknowledgement ledger for a single
//! editable entity. It guarantees:
//!
//! - at most one network write in flight per entity at any time;
//! - local keystrokes are never blocked waiting on the network;
//! - a late success response for a superseded edit never resurrects stale
//!   content;
//! - the baseline used for diffing is always the last value the controller
//!   believes the remote store holds.
//!
//! All methods must be called from within a Tokio runtime: edits arm timer
//! tasks and commits run as spawned tasks so an in-flight write makes
//! progress even if every caller awaiting it goes away.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use flowcanvas_diff::diff;
use flowcanvas_graph::EntityGraphStore;

use crate::remote::RemoteContentStore;
use crate::state::ContentState;

/// Default pause after the last keystroke before a commit is attempted.
/// A tuning knob, not a correctness requirement.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Result of driving a commit attempt to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing to send; visible content matches the acknowledged baseline.
    Clean,
    /// The store acknowledged the captured value and it is still current.
    Committed { version: u64 },
    /// The store acknowledged a value that was superseded while in flight.
    /// The baseline advanced but the entity remains dirty.
    Superseded { version: u64 },
    /// Recoverable failure; the entity stays dirty for a future attempt.
    Failed { error: String },
    /// The store no longer knows the entity; commits have stopped.
    EntityGone,
}

type SharedCommit = Shared<BoxFuture<'static, CommitOutcome>>;

struct ControllerShared {
    state: ContentState,
    in_flight: Option<SharedCommit>,
    debounce_timer: Option<JoinHandle<()>>,
}

struct Inner {
    entity_id: String,
    remote: Arc<dyn RemoteContentStore>,
    graph: Arc<Mutex<EntityGraphStore>>,
    debounce: Duration,
    shared: Mutex<ControllerShared>,
}

/// Owns the commit lifecycle for one entity. Cheap to clone; all clones
/// drive the same ledger. Never share one controller across entities.
#[derive(Clone)]
pub struct CommitController {
    inner: Arc<Inner>,
}

impl CommitController {
    pub fn new(
        entity_id: impl Into<String>,
        initial_value: &str,
        remote: Arc<dyn RemoteContentStore>,
        graph: Arc<Mutex<EntityGraphStore>>,
    ) -> Self {
        Self::with_debounce(entity_id, initial_value, remote, graph, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(
        entity_id: impl Into<String>,
        initial_value: &str,
        remote: Arc<dyn RemoteContentStore>,
        graph: Arc<Mutex<EntityGraphStore>>,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                entity_id: entity_id.into(),
                remote,
                graph,
                debounce,
                shared: Mutex::new(ControllerShared {
                    state: ContentState::new(initial_value),
                    in_flight: None,
                    debounce_timer: None,
                }),
            }),
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.inner.entity_id
    }

    /// Snapshot of the observable synchronization state (for the UI).
    pub fn state(&self) -> ContentState {
        self.inner.shared.lock().unwrap().state.clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.shared.lock().unwrap().state.dirty
    }

    /// Called on every keystroke. Synchronous: records the edit, bumps the
    /// version, and restarts the debounce timer. Never touches the network.
    pub fn on_local_change(&self, new_value: impl Into<String>) {
        let mut shared = self.inner.shared.lock().unwrap();
        if shared.state.removed {
            warn!(
                "ignoring edit on removed entity {}",
                self.inner.entity_id
            );
            return;
        }

        let version = shared.state.record_local_edit(new_value.into());
        debug!("entity {} local edit v{}", self.inner.entity_id, version);

        // Further edits reset the timer rather than queuing commits.
        if let Some(timer) = shared.debounce_timer.take() {
            timer.abort();
        }
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.debounce;
        shared.debounce_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                Inner::drive_commits(inner).await;
            }
        }));
    }

    /// Cancel any pending debounce and drive commits until the entity is
    /// clean, a failure occurs, or the entity is removed. A write already
    /// in flight is awaited, never raced with a second one.
    pub async fn flush(&self) -> CommitOutcome {
        self.cancel_debounce();
        Inner::drive_commits(self.inner.clone()).await
    }

    /// Reconcile a value learned from an external source. While the entity
    /// is focused (or dirty) the user's in-progress edit wins visually and
    /// only the baseline advances.
    pub fn on_remote_snapshot_arrived(&self, remote_value: &str) {
        let mut shared = self.inner.shared.lock().unwrap();
        shared.state.apply_remote_snapshot(remote_value);
        debug!(
            "entity {} remote snapshot reconciled (focused: {}, dirty: {})",
            self.inner.entity_id, shared.state.editing_focused, shared.state.dirty
        );
    }

    pub fn on_focus_gained(&self) {
        self.inner.shared.lock().unwrap().state.editing_focused = true;
    }

    /// Losing focus triggers an implicit flush, off the input path.
    pub fn on_focus_lost(&self) {
        self.inner.shared.lock().unwrap().state.editing_focused = false;
        let controller = self.clone();
        tokio::spawn(async move {
            controller.flush().await;
        });
    }

    /// Cancel timers and, if dirty, perform a best-effort flush before the
    /// entity is discarded. Discarding unflushed edits is a latent defect,
    /// not an accepted behavior.
    pub async fn teardown(&self) -> CommitOutcome {
        debug!("entity {} teardown", self.inner.entity_id);
        self.flush().await
    }

    fn cancel_debounce(&self) {
        let mut shared = self.inner.shared.lock().unwrap();
        if let Some(timer) = shared.debounce_timer.take() {
            timer.abort();
        }
    }
}

/// Next action decided under the state lock.
enum Step {
    /// Await the shared commit attempt, whether it was already in flight
    /// or installed by this caller.
    Pending(SharedCommit),
    Done(CommitOutcome),
}

impl Inner {
    /// Serialize commits for this entity. Loops so that an acknowledgement
    /// superseded by newer typing is followed up by a commit of the newer
    /// value; plain failures are returned without an automatic retry.
    async fn drive_commits(inner: Arc<Inner>) -> CommitOutcome {
        loop {
            let step = {
                let mut shared = inner.shared.lock().unwrap();
                if let Some(pending) = shared.in_flight.clone() {
                    Step::Pending(pending)
                } else if shared.state.removed {
                    Step::Done(CommitOutcome::EntityGone)
                } else if !shared.state.dirty {
                    Step::Done(CommitOutcome::Clean)
                } else {
                    let baseline = shared.state.baseline.clone();
                    let target_value = shared.state.visible_value.clone();
                    let target_version = shared.state.local_version;
                    shared.state.committing = true;
                    shared.state.in_flight_version = Some(target_version);

                    // Spawned so the write makes progress even if every
                    // awaiter is cancelled mid-flight.
                    let task = tokio::spawn(Inner::commit(
                        inner.clone(),
                        baseline,
                        target_value,
                        target_version,
                    ));
                    let pending: SharedCommit = async move {
                        match task.await {
                            Ok(outcome) => outcome,
                            Err(err) => CommitOutcome::Failed {
                                error: format!("commit task aborted: {err}"),
                            },
                        }
                    }
                    .boxed()
                    .shared();
                    shared.in_flight = Some(pending.clone());
                    Step::Pending(pending)
                }
            };

            match step {
                Step::Pending(pending) => {
                    match pending.await {
                        // The acked value is already stale; the newer one
                        // gets its own commit on the next pass.
                        CommitOutcome::Superseded { .. } => continue,
                        outcome => return outcome,
                    }
                }
                Step::Done(outcome) => return outcome,
            }
        }
    }

    /// One network write: diff against the baseline, ship the full value
    /// plus the edit script, fold the acknowledgement back into the ledger.
    async fn commit(
        inner: Arc<Inner>,
        baseline: String,
        target_value: String,
        target_version: u64,
    ) -> CommitOutcome {
        let operations = diff(&baseline, &target_value);
        debug!(
            "entity {} committing v{} ({} ops)",
            inner.entity_id,
            target_version,
            operations.len()
        );

        let result = inner
            .remote
            .commit_entity_content(&inner.entity_id, &target_value, &operations)
            .await;

        let mut shared = inner.shared.lock().unwrap();
        shared.in_flight = None;
        shared.state.committing = false;
        shared.state.in_flight_version = None;

        match result {
            Ok(()) => {
                shared.state.acknowledge(target_value.clone(), target_version);
                let superseded = shared.state.dirty;
                drop(shared);

                // Reflect the confirmed write into the shared graph store.
                if !inner
                    .graph
                    .lock()
                    .unwrap()
                    .set_node_content(&inner.entity_id, &target_value)
                {
                    debug!(
                        "entity {} no longer in local graph; ack not mirrored",
                        inner.entity_id
                    );
                }

                if superseded {
                    debug!(
                        "entity {} ack for v{} superseded by newer edit",
                        inner.entity_id, target_version
                    );
                    CommitOutcome::Superseded {
                        version: target_version,
                    }
                } else {
                    CommitOutcome::Committed {
                        version: target_version,
                    }
                }
            }
            Err(err) if err.is_entity_gone() => {
                warn!("entity {} removed by store: {}", inner.entity_id, err);
                shared.state.mark_removed();
                drop(shared);
                inner.graph.lock().unwrap().remove_node(&inner.entity_id);
                CommitOutcome::EntityGone
            }
            Err(err) => {
                warn!(
                    "entity {} commit v{} failed: {}",
                    inner.entity_id, target_version, err
                );
                shared.state.note_failure(err.to_string());
                CommitOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // The timer task holds only a weak reference back here, so it can
        // never keep the controller alive; still stop the sleep early.
        if let Ok(shared) = self.shared.get_mut() {
            if let Some(timer) = shared.debounce_timer.take() {
                timer.abort();
            }
        }
    }
}
