//! Scheduler job identity.

use crate::value_objects::ids::{KnowledgeBaseId, KnowledgeItemId};

/// A unit of scheduled work: ingesting one item into one base.
///
/// `created_at` is the job token: a caller-supplied millisecond timestamp used both to
/// identify this particular submission (distinct from a later re-submission of the same
/// item) and, by the orchestrator, to suppress stale callbacks from a superseded run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// The base the item is being ingested into.
    pub base_id: KnowledgeBaseId,
    /// The item being ingested.
    pub item_id: KnowledgeItemId,
    /// Job token: uniquely identifies this submission.
    pub created_at: u64,
}

impl Job {
    /// Build a job for a given base, item, and caller-supplied token.
    #[must_use]
    pub fn new(base_id: KnowledgeBaseId, item_id: KnowledgeItemId, created_at: u64) -> Self {
        Self {
            base_id,
            item_id,
            created_at,
        }
    }
}
