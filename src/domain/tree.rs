//! Queries and path-copying edits over immutable [`Tree`] values.
//!
//! Every edit locates its target as a child-index path from the root, rebuilds
//! the target and each of its ancestors, and reuses the `Arc` of every other
//! subtree. An id that is not in the tree makes the edit a no-op that returns
//! the input `Arc` itself.

use std::convert::Infallible;
use std::sync::Arc;

use tracing::{debug, instrument};

use super::entities::{Evaluation, NodeId, Properties};
use super::error::{DomainError, DomainResult};
use super::node::{Node, Tree};

/// First node with `id` in pre-order, if any.
pub fn search<'a>(tree: &'a Node, id: &NodeId) -> Option<&'a Node> {
    tree.iter().find(|node| node.id() == id)
}

/// All ids reachable from `tree`, each exactly once.
pub fn list_ids(tree: &Node) -> Vec<NodeId> {
    tree.iter().map(|node| *node.id()).collect()
}

/// Whether the node `id` exists and has at least one child.
pub fn has_child(tree: &Node, id: &NodeId) -> bool {
    search(tree, id).is_some_and(|node| !node.is_leaf())
}

/// The node whose children contain `id`. The root has no parent.
pub fn parent_of<'a>(tree: &'a Node, id: &NodeId) -> Option<&'a Node> {
    tree.iter()
        .find(|node| node.children().iter().any(|child| child.id() == id))
}

/// Child-index path from the root to `id`; empty for the root itself.
pub fn path_to(tree: &Node, id: &NodeId) -> Option<Vec<usize>> {
    if tree.id() == id {
        return Some(Vec::new());
    }
    // Each frame holds a node and the position of its next unvisited child
    let mut frames: Vec<(&Node, usize)> = vec![(tree, 0)];
    while let Some(frame) = frames.last_mut() {
        let (node, next) = *frame;
        let Some(child) = node.children().get(next) else {
            frames.pop();
            continue;
        };
        frame.1 += 1;
        if child.id() == id {
            return Some(frames.iter().map(|&(_, next)| next - 1).collect());
        }
        frames.push((child.as_ref(), 0));
    }
    None
}

/// Follow a child-index path down from the root.
pub fn node_at_path<'a>(tree: &'a Node, path: &[usize]) -> Option<&'a Node> {
    path.iter()
        .try_fold(tree, |node, &pos| node.children().get(pos).map(Arc::as_ref))
}

/// Append a new leaf under `parent_id` with a freshly minted random id.
#[instrument(level = "debug", skip(tree, properties))]
pub fn add_child(tree: &Tree, parent_id: &NodeId, properties: Properties) -> Tree {
    graft(tree, parent_id, NodeId::random(), properties)
}

/// Append a new leaf under `parent_id` using a caller-minted id.
///
/// A missing parent is a no-op; otherwise fails when `child_id` is already
/// in the tree.
#[instrument(level = "debug", skip(tree, properties))]
pub fn add_child_with_id(
    tree: &Tree,
    parent_id: &NodeId,
    child_id: NodeId,
    properties: Properties,
) -> DomainResult<Tree> {
    let Some(path) = path_to(tree, parent_id) else {
        debug!(%parent_id, "add_child: no such parent");
        return Ok(Arc::clone(tree));
    };
    if search(tree, &child_id).is_some() {
        return Err(DomainError::DuplicateId(child_id));
    }
    Ok(append_leaf(tree, &path, child_id, properties))
}

fn graft(tree: &Tree, parent_id: &NodeId, child_id: NodeId, properties: Properties) -> Tree {
    match path_to(tree, parent_id) {
        Some(path) => append_leaf(tree, &path, child_id, properties),
        None => {
            debug!(%parent_id, "add_child: no such parent");
            Arc::clone(tree)
        }
    }
}

fn append_leaf(tree: &Tree, path: &[usize], child_id: NodeId, properties: Properties) -> Tree {
    rebuild_infallible(tree, path, |parent| {
        let child = Node::leaf(child_id, parent.depth() + 1, properties);
        let mut parent = parent.clone();
        parent.children_mut().push(Arc::new(child));
        parent
    })
}

/// Detach the subtree rooted at `child_id` from its parent.
///
/// The root cannot be removed this way; it and unknown ids are no-ops.
#[instrument(level = "debug", skip(tree))]
pub fn remove_child(tree: &Tree, child_id: &NodeId) -> Tree {
    let Some(mut path) = path_to(tree, child_id) else {
        debug!(%child_id, "remove_child: no such node");
        return Arc::clone(tree);
    };
    let Some(pos) = path.pop() else {
        debug!(%child_id, "remove_child: node is the root");
        return Arc::clone(tree);
    };
    rebuild_infallible(tree, &path, |parent| {
        let mut parent = parent.clone();
        parent.children_mut().remove(pos);
        parent
    })
}

/// Insert or overwrite one property of a node.
#[instrument(level = "debug", skip(tree, key, value))]
pub fn set_property(
    tree: &Tree,
    node_id: &NodeId,
    key: impl Into<String>,
    value: impl Into<String>,
) -> Tree {
    let (key, value) = (key.into(), value.into());
    edit_node(tree, node_id, |node| {
        let mut node = node.clone();
        node.properties_mut().insert(key, value);
        node
    })
}

/// Append a copy of `template` as the node's last evaluation.
#[instrument(level = "debug", skip(tree, template))]
pub fn add_evaluation(tree: &Tree, node_id: &NodeId, template: &Evaluation) -> Tree {
    edit_node(tree, node_id, |node| {
        let mut node = node.clone();
        node.evaluations_mut().push(template.clone());
        node
    })
}

/// Remove the evaluation at `index`; later records shift left.
///
/// An out-of-range index is an error, a missing node is a no-op.
#[instrument(level = "debug", skip(tree))]
pub fn remove_evaluation(tree: &Tree, node_id: &NodeId, index: usize) -> DomainResult<Tree> {
    try_edit_node(tree, node_id, |node| {
        check_evaluation_index(node, index)?;
        let mut node = node.clone();
        node.evaluations_mut().remove(index);
        Ok(node)
    })
}

/// Insert or overwrite one field of the evaluation at `index`.
#[instrument(level = "debug", skip(tree, key, value))]
pub fn set_evaluation_field(
    tree: &Tree,
    node_id: &NodeId,
    index: usize,
    key: impl Into<String>,
    value: impl Into<String>,
) -> DomainResult<Tree> {
    let (key, value) = (key.into(), value.into());
    try_edit_node(tree, node_id, |node| {
        check_evaluation_index(node, index)?;
        let mut node = node.clone();
        node.evaluations_mut()[index].insert(key, value);
        Ok(node)
    })
}

fn check_evaluation_index(node: &Node, index: usize) -> DomainResult<()> {
    let len = node.evaluations().len();
    if index >= len {
        return Err(DomainError::EvaluationIndexOutOfRange {
            id: *node.id(),
            index,
            len,
        });
    }
    Ok(())
}

/// Replace the node `id` with `edit(node)` and path-copy its ancestors.
fn edit_node<F>(tree: &Tree, id: &NodeId, edit: F) -> Tree
where
    F: FnOnce(&Node) -> Node,
{
    match path_to(tree, id) {
        Some(path) => rebuild_infallible(tree, &path, edit),
        None => {
            debug!(%id, "edit: stale node reference, tree unchanged");
            Arc::clone(tree)
        }
    }
}

fn try_edit_node<F>(tree: &Tree, id: &NodeId, edit: F) -> DomainResult<Tree>
where
    F: FnOnce(&Node) -> DomainResult<Node>,
{
    match path_to(tree, id) {
        Some(path) => rebuild(tree, &path, edit).map(Arc::new),
        None => {
            debug!(%id, "edit: stale node reference, tree unchanged");
            Ok(Arc::clone(tree))
        }
    }
}

fn rebuild_infallible<F>(tree: &Tree, path: &[usize], edit: F) -> Tree
where
    F: FnOnce(&Node) -> Node,
{
    match rebuild(tree, path, |node| Ok::<_, Infallible>(edit(node))) {
        Ok(node) => Arc::new(node),
        Err(never) => match never {},
    }
}

/// Rebuild the nodes along `path`, applying `edit` at its end.
///
/// `path` must come from [`path_to`] on this same tree, so every index is in
/// bounds. Siblings are carried over as `Arc` clones.
fn rebuild<F, E>(node: &Node, path: &[usize], edit: F) -> Result<Node, E>
where
    F: FnOnce(&Node) -> Result<Node, E>,
{
    let mut ancestors = Vec::with_capacity(path.len());
    let mut target = node;
    for &pos in path {
        ancestors.push(target);
        target = target.children()[pos].as_ref();
    }

    let edited = edit(target)?;
    Ok(ancestors
        .into_iter()
        .zip(path)
        .rev()
        .fold(edited, |replaced, (ancestor, &pos)| {
            let mut copy = ancestor.clone();
            copy.children_mut()[pos] = Arc::new(replaced);
            copy
        }))
}
