//! Core domain types
//!
//! These types describe what the user submits and what the remote execution
//! service reports back. They are shared between the HTTP client (which moves
//! them over the wire) and the controller (which reconciles them into run state).

pub mod diagnostic;
pub mod execution;
