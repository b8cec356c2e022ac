//! proctree: persistent process-tree edit engine
//!
//! A process tree is an immutable [`domain::Tree`]: every node carries
//! key-value properties and an ordered list of evaluation records. Edits are
//! pure functions that path-copy from the edited node up to the root and share
//! every other subtree with the previous value.
//!
//! Layers:
//! - `domain`: node model, queries and edit operations
//! - `application`: edit session holding the current tree
//! - `config`: layered settings and field templates
//! - `cli`: terminal front end and edit scripts

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod tree_traits;
pub mod util;

pub use application::{ApplicationError, EditSession};
pub use domain::{DomainError, Node, NodeId, Tree};
