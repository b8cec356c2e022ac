use itertools::Itertools;
use tracing::instrument;

use super::error::{DomainError, DomainResult};
use super::node::Node;
use super::tree::list_ids;

/// Verify that ids are unique and every depth equals the distance from `tree`.
///
/// The edit operations keep both by construction; this is for tests and for
/// debug-build checks in the session.
#[instrument(level = "trace", skip(tree))]
pub fn check_invariants(tree: &Node) -> DomainResult<()> {
    if let Some(dup) = list_ids(tree).into_iter().duplicates().next() {
        return Err(DomainError::DuplicateId(dup));
    }

    let mut stack = vec![(tree, 0usize)];
    while let Some((node, expected)) = stack.pop() {
        if node.depth() != expected {
            return Err(DomainError::DepthMismatch {
                id: *node.id(),
                expected,
                actual: node.depth(),
            });
        }
        for child in node.children() {
            stack.push((child.as_ref(), expected + 1));
        }
    }
    Ok(())
}
