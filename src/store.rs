//! Document store selection.
//!
//! Builds the [`DocumentStore`] named in `[store].provider`:
//!
//! | Config Value | Store |
//! |-------------|-------|
//! | `"memory"` | [`InMemoryStore`] (demo mode, nothing persists) |
//! | `"firestore"` | [`FirestoreStore`] |

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::warn;

use smehub_report_core::store::memory::InMemoryStore;
use smehub_report_core::store::DocumentStore;

use crate::config::StoreConfig;
use crate::firestore::FirestoreStore;

pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.provider.as_str() {
        "memory" => {
            warn!("using in-memory document store; reports are not persisted");
            Ok(Arc::new(InMemoryStore::new()))
        }
        "firestore" => Ok(Arc::new(FirestoreStore::from_env(config)?)),
        other => bail!("Unknown store provider: {}", other),
    }
}
