//! Integration tests for the commit controller: debounce coalescing,
//! in-flight de-duplication, stale acknowledgements, focus protection,
//! and entity removal.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Semaphore};

use flowcanvas_graph::{EntityGraphStore, EntityNode, NodeKind};
use flowcanvas_sync::{
    CommitController, CommitError, CommitOutcome, Operation, RemoteContentStore,
};

const DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
struct CommitRecord {
    entity_id: String,
    full_value: String,
    operations: Vec<Operation>,
}

/// Acknowledges immediately; optionally fails the next commit.
#[derive(Default)]
struct RecordingStore {
    commits: Mutex<Vec<CommitRecord>>,
    fail_next: Mutex<Option<CommitError>>,
}

impl RecordingStore {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn commits(&self) -> Vec<CommitRecord> {
        self.commits.lock().unwrap().clone()
    }

    fn fail_next(&self, err: CommitError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl RemoteContentStore for RecordingStore {
    async fn commit_entity_content(
        &self,
        entity_id: &str,
        full_value: &str,
        operations: &[Operation],
    ) -> Result<(), CommitError> {
        self.commits.lock().unwrap().push(CommitRecord {
            entity_id: entity_id.to_string(),
            full_value: full_value.to_string(),
            operations: operations.to_vec(),
        });
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Holds each commit in flight until the test releases it, and reports how
/// many commits have started.
struct GatedStore {
    started: watch::Sender<usize>,
    gate: Semaphore,
    commits: Mutex<Vec<CommitRecord>>,
}

impl GatedStore {
    fn new() -> Arc<Self> {
        let (started, _) = watch::channel(0);
        Arc::new(Self {
            started,
            gate: Semaphore::new(0),
            commits: Mutex::new(Vec::new()),
        })
    }

    async fn wait_for_started(&self, n: usize) {
        let mut rx = self.started.subscribe();
        while *rx.borrow_and_update() < n {
            rx.changed().await.unwrap();
        }
    }

    fn release_one(&self) {
        self.gate.add_permits(1);
    }

    fn commits(&self) -> Vec<CommitRecord> {
        self.commits.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteContentStore for GatedStore {
    async fn commit_entity_content(
        &self,
        entity_id: &str,
        full_value: &str,
        operations: &[Operation],
    ) -> Result<(), CommitError> {
        self.started.send_modify(|n| *n += 1);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| CommitError::Transport("gate closed".to_string()))?;
        permit.forget();
        self.commits.lock().unwrap().push(CommitRecord {
            entity_id: entity_id.to_string(),
            full_value: full_value.to_string(),
            operations: operations.to_vec(),
        });
        Ok(())
    }
}

/// The entity was deleted out from under the editor.
#[derive(Default)]
struct NotFoundStore {
    attempts: AtomicUsize,
}

#[async_trait]
impl RemoteContentStore for NotFoundStore {
    async fn commit_entity_content(
        &self,
        entity_id: &str,
        _full_value: &str,
        _operations: &[Operation],
    ) -> Result<(), CommitError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CommitError::EntityNotFound(entity_id.to_string()))
    }
}

fn graph_with(entries: &[(&str, &str)]) -> Arc<Mutex<EntityGraphStore>> {
    let mut store = EntityGraphStore::new();
    for (id, content) in entries {
        store.insert_node(EntityNode::new(*id, NodeKind::Text, *content));
    }
    Arc::new(Mutex::new(store))
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_coalesce_into_single_commit() {
    let store = RecordingStore::new();
    let graph = graph_with(&[("n1", "")]);
    let controller =
        CommitController::with_debounce("n1", "", store.clone(), graph.clone(), DEBOUNCE);

    controller.on_local_change("h");
    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.on_local_change("he");
    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.on_local_change("hello");
    tokio::time::sleep(Duration::from_millis(400)).await;

    let commits = store.commits();
    assert_eq!(commits.len(), 1, "burst of edits must yield one commit");
    assert_eq!(commits[0].full_value, "hello");
    assert_eq!(
        commits[0].operations,
        vec![Operation::Insert {
            text: "hello".to_string()
        }]
    );

    let state = controller.state();
    assert!(!state.dirty);
    assert_eq!(state.baseline, "hello");
    assert_eq!(graph.lock().unwrap().node_content("n1"), Some("hello"));
}

#[tokio::test(start_paused = true)]
async fn debounce_resets_on_each_edit() {
    let store = RecordingStore::new();
    let graph = graph_with(&[("n1", "")]);
    let controller =
        CommitController::with_debounce("n1", "", store.clone(), graph, DEBOUNCE);

    controller.on_local_change("a");
    tokio::time::sleep(Duration::from_millis(200)).await;
    controller.on_local_change("ab");
    tokio::time::sleep(Duration::from_millis(200)).await;
    controller.on_local_change("abc");

    // 250ms after the last edit: still inside the debounce window.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(store.commits().is_empty());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let commits = store.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].full_value, "abc");
}

#[tokio::test(start_paused = true)]
async fn flush_commits_immediately_and_cancels_debounce() {
    let store = RecordingStore::new();
    let graph = graph_with(&[("n1", "")]);
    let controller =
        CommitController::with_debounce("n1", "", store.clone(), graph, DEBOUNCE);

    controller.on_local_change("draft");
    let outcome = controller.flush().await;
    assert_eq!(outcome, CommitOutcome::Committed { version: 1 });
    assert_eq!(store.commits().len(), 1);

    // The cancelled timer must not fire a second commit.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(store.commits().len(), 1);
}

#[tokio::test]
async fn flush_on_clean_entity_is_a_noop() {
    let store = RecordingStore::new();
    let graph = graph_with(&[("n1", "hello")]);
    let controller = CommitController::new("n1", "hello", store.clone(), graph);

    assert_eq!(controller.flush().await, CommitOutcome::Clean);
    assert!(store.commits().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stale_acknowledgement_never_clears_newer_edit() {
    let store = GatedStore::new();
    let graph = graph_with(&[("n1", "a")]);
    let controller =
        CommitController::with_debounce("n1", "a", store.clone(), graph.clone(), DEBOUNCE);

    // Version 1 goes in flight via the debounce.
    controller.on_local_change("ab");
    tokio::time::sleep(Duration::from_millis(350)).await;
    store.wait_for_started(1).await;

    // Version 2 arrives while version 1 is still on the wire.
    controller.on_local_change("abc");
    store.release_one();

    // The superseded ack advances the baseline but must not clear dirty;
    // the follow-up commit for version 2 starts on its own.
    store.wait_for_started(2).await;
    let state = controller.state();
    assert_eq!(state.baseline, "ab");
    assert!(state.dirty, "version 2 is newer than the acked version 1");
    assert_eq!(state.visible_value, "abc");
    assert!(state.committing);
    assert_eq!(state.in_flight_version, Some(2));
    assert_eq!(graph.lock().unwrap().node_content("n1"), Some("ab"));

    store.release_one();
    assert_eq!(
        controller.flush().await,
        CommitOutcome::Committed { version: 2 }
    );

    let state = controller.state();
    assert!(!state.dirty);
    assert_eq!(state.baseline, "abc");
    let commits = store.commits();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].full_value, "ab");
    assert_eq!(commits[1].full_value, "abc");
}

#[tokio::test(start_paused = true)]
async fn concurrent_flushes_share_one_in_flight_commit() -> anyhow::Result<()> {
    let store = GatedStore::new();
    let graph = graph_with(&[("n1", "")]);
    let controller =
        CommitController::with_debounce("n1", "", store.clone(), graph, DEBOUNCE);

    controller.on_local_change("once");

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.flush().await }
    });
    store.wait_for_started(1).await;

    let second = tokio::spawn({
        let controller = controller.clone();
        async move { controller.flush().await }
    });
    tokio::task::yield_now().await;

    store.release_one();
    assert_eq!(first.await?, CommitOutcome::Committed { version: 1 });
    assert_eq!(second.await?, CommitOutcome::Committed { version: 1 });
    assert_eq!(store.commits().len(), 1, "writes must never race");
    Ok(())
}

#[tokio::test]
async fn focused_entity_survives_remote_snapshot() {
    let store = RecordingStore::new();
    let graph = graph_with(&[("n1", "old")]);
    let controller = CommitController::new("n1", "old", store.clone(), graph);

    controller.on_focus_gained();
    controller.on_local_change("typing...");
    controller.on_remote_snapshot_arrived("external edit");

    let state = controller.state();
    assert_eq!(state.visible_value, "typing...");
    assert_eq!(state.baseline, "external edit");

    // The next commit diffs against the snapshot value, not the stale one.
    assert_eq!(
        controller.flush().await,
        CommitOutcome::Committed { version: 1 }
    );
    let commits = store.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].entity_id, "n1");
    assert_eq!(commits[0].full_value, "typing...");
}

#[tokio::test(start_paused = true)]
async fn losing_focus_flushes_pending_content() {
    let store = RecordingStore::new();
    let graph = graph_with(&[("n1", "")]);
    let controller =
        CommitController::with_debounce("n1", "", store.clone(), graph, DEBOUNCE);

    controller.on_focus_gained();
    controller.on_local_change("note");
    controller.on_focus_lost();

    tokio::time::sleep(Duration::from_millis(1)).await;
    let commits = store.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].full_value, "note");
    assert!(!controller.state().editing_focused);
}

#[tokio::test]
async fn teardown_flushes_dirty_content() {
    let store = RecordingStore::new();
    let graph = graph_with(&[("n1", "")]);
    let controller =
        CommitController::with_debounce("n1", "", store.clone(), graph, DEBOUNCE);

    controller.on_local_change("unsaved");
    assert_eq!(
        controller.teardown().await,
        CommitOutcome::Committed { version: 1 }
    );
    assert_eq!(store.commits().len(), 1);
}

#[tokio::test]
async fn commit_failure_keeps_entity_dirty_for_retry() {
    let store = RecordingStore::new();
    let graph = graph_with(&[("n1", "")]);
    let controller =
        CommitController::with_debounce("n1", "", store.clone(), graph, DEBOUNCE);

    store.fail_next(CommitError::Transport("connection reset".to_string()));
    controller.on_local_change("x");

    match controller.flush().await {
        CommitOutcome::Failed { error } => assert!(error.contains("connection reset")),
        other => panic!("expected failure, got {:?}", other),
    }
    let state = controller.state();
    assert!(state.dirty);
    assert!(state.last_error.is_some());

    // No automatic retry loop: the next explicit flush tries again.
    assert_eq!(
        controller.flush().await,
        CommitOutcome::Committed { version: 1 }
    );
    assert!(!controller.state().dirty);
    assert_eq!(store.commits().len(), 2);
}

#[tokio::test]
async fn not_found_stops_commits_and_removes_node() {
    let store = Arc::new(NotFoundStore::default());
    let graph = graph_with(&[("n1", ""), ("n2", "")]);
    let controller =
        CommitController::with_debounce("n1", "", store.clone(), graph.clone(), DEBOUNCE);

    controller.on_local_change("orphaned edit");
    assert_eq!(controller.flush().await, CommitOutcome::EntityGone);

    let state = controller.state();
    assert!(state.removed);
    assert!(!graph.lock().unwrap().contains("n1"));
    assert!(graph.lock().unwrap().contains("n2"));

    // Further edits are ignored and no more writes go out.
    controller.on_local_change("still typing");
    assert_eq!(controller.flush().await, CommitOutcome::EntityGone);
    assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
}
