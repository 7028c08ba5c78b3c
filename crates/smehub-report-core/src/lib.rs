//! # SmeHub Report Core
//!
//! Shared, I/O-free logic for the SmeHub report service: data models, the
//! document store abstraction, collaborator traits for search and
//! completion, prompt composition, and the fallback report template.
//!
//! This crate contains no tokio, reqwest, or other runtime-specific
//! dependencies.

pub mod fallback;
pub mod models;
pub mod prompt;
pub mod provider;
pub mod store;
