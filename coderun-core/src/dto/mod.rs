//! Data Transfer Objects for the execution service API
//!
//! DTOs mirror the JSON bodies of the remote service exactly. Domain types are
//! converted into them right before a request is sent.

pub mod execute;
