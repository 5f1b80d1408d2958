//! Migration target selection.
//!
//! Selection sits behind [`NodeSelector`] so a load-aware policy can replace
//! the default without touching workflow sequencing.

use crate::error::NoCandidateError;
use hyperprov_core::NodeUuid;

/// Picks a node to migrate an entity to.
pub trait NodeSelector: Send + Sync {
    /// Chooses a target from `candidates` other than `current`.
    ///
    /// # Errors
    ///
    /// Returns [`NoCandidateError`] if no other node is available.
    fn select(&self, candidates: &[NodeUuid], current: &NodeUuid)
    -> Result<NodeUuid, NoCandidateError>;
}

/// Picks the first node, in listing order, that is not the current one.
///
/// Deterministic and not load-aware.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstAvailable;

impl NodeSelector for FirstAvailable {
    fn select(
        &self,
        candidates: &[NodeUuid],
        current: &NodeUuid,
    ) -> Result<NodeUuid, NoCandidateError> {
        select_migration_target(candidates, current)
    }
}

/// Returns the first candidate that is not `current`.
///
/// # Errors
///
/// Returns [`NoCandidateError`] if every candidate is `current` or the list is
/// empty.
pub fn select_migration_target(
    candidates: &[NodeUuid],
    current: &NodeUuid,
) -> Result<NodeUuid, NoCandidateError> {
    candidates
        .iter()
        .find(|node| *node != current)
        .cloned()
        .ok_or_else(|| NoCandidateError {
            current: current.clone(),
            candidates: candidates.len(),
        })
}
