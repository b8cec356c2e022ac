//! Application layer: services and use cases
//!
//! This layer owns the session state that drives the domain's pure edit operations.

pub mod error;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use services::session::EditSession;
