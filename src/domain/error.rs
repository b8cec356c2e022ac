//! Domain-level errors (no external dependencies)

use thiserror::Error;

use super::entities::NodeId;

/// Domain errors represent logic faults in how a tree is being edited.
///
/// A missing node id is never one of them: id-addressed edits on a stale
/// reference return the tree unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("evaluation index {index} out of range for node {id} ({len} evaluations)")]
    EvaluationIndexOutOfRange { id: NodeId, index: usize, len: usize },

    #[error("node id already present in tree: {0}")]
    DuplicateId(NodeId),

    #[error("depth mismatch at node {id}: expected {expected}, found {actual}")]
    DepthMismatch {
        id: NodeId,
        expected: usize,
        actual: usize,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
