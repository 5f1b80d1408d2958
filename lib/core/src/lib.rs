//! Core types shared across the hyperprov workspace.
//!
//! This crate provides the identifiers and error-handling foundation used by
//! the transport, workflow engine, provisioning catalog and command-line host.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{EntityUuid, NodeUuid, RunId, TaskTag};
