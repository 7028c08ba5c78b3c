//! In-memory [`DocumentStore`] implementation for tests and demo mode.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Every successful merge is
//! also appended to a per-document history so callers can assert on the
//! exact sequence of writes.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::{ReportDocument, ReportUpdate};

use super::DocumentStore;

/// In-memory store for tests and running without Firestore.
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, ReportDocument>>,
    history: RwLock<Vec<(String, ReportUpdate)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Insert or replace a document directly, as the frontend would when
    /// creating a report. Not recorded in the write history.
    pub fn insert(&self, doc: ReportDocument) -> Result<()> {
        let mut docs = self.docs.write().map_err(|_| anyhow!("store lock poisoned"))?;
        docs.insert(doc.id.clone(), doc);
        Ok(())
    }

    /// All merge updates applied to `id`, oldest first.
    pub fn updates_for(&self, id: &str) -> Vec<ReportUpdate> {
        self.history
            .read()
            .map(|h| {
                h.iter()
                    .filter(|(doc_id, _)| doc_id == id)
                    .map(|(_, u)| u.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of merge updates applied across all documents.
    pub fn write_count(&self) -> usize {
        self.history.read().map(|h| h.len()).unwrap_or(0)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply(doc: &mut ReportDocument, update: &ReportUpdate) {
    if let Some(status) = update.status {
        doc.status = Some(status);
    }
    if let Some(report) = &update.generated_report {
        doc.generated_report = report.clone();
    }
    if let Some(error) = &update.error {
        doc.error = Some(error.clone());
    }
    if let Some(ts) = update.updated_at {
        doc.updated_at = Some(ts);
    }
    if let Some(ts) = update.completed_at {
        doc.completed_at = Some(ts);
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_report(&self, id: &str) -> Result<Option<ReportDocument>> {
        let docs = self.docs.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(docs.get(id).cloned())
    }

    async fn merge_update(&self, id: &str, update: &ReportUpdate) -> Result<()> {
        {
            let mut docs = self.docs.write().map_err(|_| anyhow!("store lock poisoned"))?;
            let Some(doc) = docs.get_mut(id) else {
                bail!("report document not found: {}", id);
            };
            apply(doc, update);
        }
        let mut history = self
            .history
            .write()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        history.push((id.to_string(), update.clone()));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
