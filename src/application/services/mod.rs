//! Application services

pub mod session;
