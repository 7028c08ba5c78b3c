//! Document store abstraction for report documents.
//!
//! The [`DocumentStore`] trait is the minimal key-value-document interface
//! the report handler needs: read by id, merge-update by id, and a
//! connectivity probe. Backends (Firestore, in-memory) plug in behind it.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ReportDocument, ReportUpdate};

/// Abstract storage backend for report documents.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_report`](DocumentStore::get_report) | Read a report document by id |
/// | [`merge_update`](DocumentStore::merge_update) | Write a subset of fields, keeping the rest |
/// | [`ping`](DocumentStore::ping) | Check the backend is reachable |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend label used in logs and `check` output.
    fn name(&self) -> &str;

    /// Read a report document. Returns `Ok(None)` when no document exists.
    async fn get_report(&self, id: &str) -> Result<Option<ReportDocument>>;

    /// Merge the fields present in `update` into an existing document.
    ///
    /// Fails if the document does not exist; never creates or overwrites
    /// a whole document.
    async fn merge_update(&self, id: &str, update: &ReportUpdate) -> Result<()>;

    /// Probe backend connectivity.
    async fn ping(&self) -> Result<()>;
}
