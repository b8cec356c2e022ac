//! Edit session service
//!
//! Holds the current tree of one editing session and serializes edits on it.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Templates;
use crate::domain::{self, IdGenerator, Node, NodeId, Properties, Tree};

/// The single piece of mutable state around an immutable tree.
///
/// Every edit replaces `tree` with the value returned by the domain
/// operation; `revision` counts the edits that produced a different value.
pub struct EditSession {
    tree: Tree,
    templates: Templates,
    ids: Box<dyn IdGenerator>,
    revision: u64,
}

impl fmt::Debug for EditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("root", self.tree.id())
            .field("nodes", &self.tree.node_count())
            .field("revision", &self.revision)
            .finish()
    }
}

impl EditSession {
    /// Start a session with a root built from the root templates.
    pub fn new(templates: Templates, mut ids: Box<dyn IdGenerator>) -> Self {
        let root = Node::root(
            ids.next_id(),
            templates.root_properties.clone(),
            templates.root_evaluations.clone(),
        );
        Self::from_tree(root, templates, ids)
    }

    /// Start a session on an existing tree value.
    pub fn from_tree(tree: Tree, templates: Templates, ids: Box<dyn IdGenerator>) -> Self {
        debug!(root = %tree.id(), "session started");
        Self {
            tree,
            templates,
            ids,
            revision: 0,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root_id(&self) -> NodeId {
        *self.tree.id()
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// Number of edits that changed the tree.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn commit(&mut self, next: Tree) -> bool {
        if Arc::ptr_eq(&self.tree, &next) {
            return false;
        }
        debug_assert!(domain::check_invariants(&next).is_ok());
        self.tree = next;
        self.revision += 1;
        debug!(revision = self.revision, "tree updated");
        true
    }

    /// Add a child seeded with the child-properties template.
    ///
    /// Returns the new node's id, or `None` when `parent` is not in the tree.
    pub fn add_child(&mut self, parent: &NodeId) -> ApplicationResult<Option<NodeId>> {
        let properties = self.templates.child_properties.clone();
        self.add_child_with_properties(parent, properties)
    }

    #[instrument(level = "debug", skip(self, properties))]
    pub fn add_child_with_properties(
        &mut self,
        parent: &NodeId,
        properties: Properties,
    ) -> ApplicationResult<Option<NodeId>> {
        let child = self.ids.next_id();
        let next = domain::add_child_with_id(&self.tree, parent, child, properties)?;
        Ok(self.commit(next).then_some(child))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, child: &NodeId) -> bool {
        let next = domain::remove_child(&self.tree, child);
        self.commit(next)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn set_property(&mut self, node: &NodeId, key: &str, value: &str) -> bool {
        let next = domain::set_property(&self.tree, node, key, value);
        self.commit(next)
    }

    /// Append a copy of the evaluation template.
    #[instrument(level = "debug", skip(self))]
    pub fn add_evaluation(&mut self, node: &NodeId) -> bool {
        let next = domain::add_evaluation(&self.tree, node, &self.templates.evaluation);
        self.commit(next)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn remove_evaluation(&mut self, node: &NodeId, index: usize) -> ApplicationResult<bool> {
        let next = domain::remove_evaluation(&self.tree, node, index)?;
        Ok(self.commit(next))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn set_evaluation_field(
        &mut self,
        node: &NodeId,
        index: usize,
        key: &str,
        value: &str,
    ) -> ApplicationResult<bool> {
        let next = domain::set_evaluation_field(&self.tree, node, index, key, value)?;
        Ok(self.commit(next))
    }

    /// Resolve a textual node reference against the current tree.
    ///
    /// - `/` is the root, `/0/2` a child-index path
    /// - `#a1b2` the unique node whose id ends in those hex digits
    /// - anything else must be a full UUID of a node in the tree
    pub fn resolve(&self, reference: &str) -> ApplicationResult<NodeId> {
        let unknown = || ApplicationError::UnknownNode(reference.to_string());

        if let Some(path) = reference.strip_prefix('/') {
            let path = path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::parse::<usize>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| unknown())?;
            return domain::node_at_path(&self.tree, &path)
                .map(|node| *node.id())
                .ok_or_else(unknown);
        }

        if let Some(suffix) = reference.strip_prefix('#') {
            let suffix = suffix.to_ascii_lowercase();
            if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(unknown());
            }
            let matches: Vec<NodeId> = domain::list_ids(&self.tree)
                .into_iter()
                .filter(|id| id.hex().ends_with(&suffix))
                .collect();
            return match matches.as_slice() {
                [] => Err(unknown()),
                [id] => Ok(*id),
                _ => Err(ApplicationError::AmbiguousNode {
                    reference: reference.to_string(),
                    matches: matches.len(),
                }),
            };
        }

        let id: NodeId = reference.parse().map_err(|_| unknown())?;
        domain::search(&self.tree, &id)
            .map(|node| *node.id())
            .ok_or_else(unknown)
    }
}
