use std::sync::Arc;

use tracing::instrument;

use super::entities::{Evaluation, NodeId, Properties};

/// A tree value: a shared handle to its root node.
///
/// Edits never mutate a `Tree`; they return a new one that shares every
/// untouched subtree with the old.
pub type Tree = Arc<Node>;

/// One process step in the tree.
///
/// Fields are private so a node can only be built through [`Node::root`] and
/// the edit operations, which keep ids unique and depths consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    depth: usize,
    properties: Properties,
    evaluations: Vec<Evaluation>,
    children: Vec<Tree>,
}

impl Node {
    /// Create the initial tree of an editing session.
    pub fn root(id: NodeId, properties: Properties, evaluations: Vec<Evaluation>) -> Tree {
        Arc::new(Self {
            id,
            depth: 0,
            properties,
            evaluations,
            children: Vec::new(),
        })
    }

    pub(crate) fn leaf(id: NodeId, depth: usize, properties: Properties) -> Self {
        Self {
            id,
            depth,
            properties,
            evaluations: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Number of ancestors between this node and the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn children(&self) -> &[Tree] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Longest downward distance to a leaf; 0 for a leaf.
    #[instrument(level = "trace", skip(self))]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, level)) = stack.pop() {
            height = height.max(level);
            stack.extend(node.children.iter().map(|child| (child.as_ref(), level + 1)));
        }
        height
    }

    /// Number of nodes in this subtree, this node included.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Pre-order traversal: a node before its descendants, siblings in
    /// child order.
    pub fn iter(&self) -> Preorder<'_> {
        Preorder::new(self)
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Tree> {
        &mut self.children
    }

    pub(crate) fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub(crate) fn evaluations_mut(&mut self) -> &mut Vec<Evaluation> {
        &mut self.evaluations
    }
}

impl Drop for Node {
    // Unlink uniquely owned descendants iteratively; deep chains must not
    // recurse once per level.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let Some(mut node) = Arc::into_inner(child) {
                pending.append(&mut node.children);
            }
        }
    }
}

impl<'a> IntoIterator for &'a Node {
    type Item = &'a Node;
    type IntoIter = Preorder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Preorder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Preorder<'a> {
    fn new(root: &'a Node) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for child in current.children.iter().rev() {
            self.stack.push(child);
        }
        Some(current)
    }
}
