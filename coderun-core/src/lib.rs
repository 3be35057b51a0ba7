//! Coderun Core
//!
//! Core types shared by the coderun client, controller and CLI.
//!
//! This crate contains:
//! - Domain types: execution requests, task handles, poll results, diagnostics
//! - DTOs: wire bodies exchanged with the remote execution service

pub mod domain;
pub mod dto;
