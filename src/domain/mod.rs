//! Domain layer: the tree model and its edit engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod invariants;
pub mod node;
pub mod tree;

pub use entities::{fields, Evaluation, IdGenerator, NodeId, Properties, SequentialIds, UuidIds};
pub use error::{DomainError, DomainResult};
pub use invariants::check_invariants;
pub use node::{Node, Preorder, Tree};
pub use tree::{
    add_child, add_child_with_id, add_evaluation, has_child, list_ids, node_at_path, parent_of,
    path_to, remove_child, remove_evaluation, search, set_evaluation_field, set_property,
};
