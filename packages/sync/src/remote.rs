//! Collaborator contract for the remote persistence service.

use async_trait::async_trait;
use thiserror::Error;

use flowcanvas_diff::Operation;

/// Failure modes of a content commit.
///
/// `EntityNotFound` is authoritative: the entity was deleted concurrently
/// and the controller must stop committing and signal removal. Everything
/// else is recoverable; the entity stays dirty for a future attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommitError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("commit rejected by store: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

impl CommitError {
    pub fn is_entity_gone(&self) -> bool {
        matches!(self, CommitError::EntityNotFound(_))
    }
}

/// Remote persistence collaborator.
///
/// `full_value` alone must be accepted as authoritative; `operations` is an
/// advisory incremental patch a conforming store may apply or ignore.
#[async_trait]
pub trait RemoteContentStore: Send + Sync {
    async fn commit_entity_content(
        &self,
        entity_id: &str,
        full_value: &str,
        operations: &[Operation],
    ) -> Result<(), CommitError>;
}
