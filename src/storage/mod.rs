//! Persisted prediction history and marked locations.

mod history;
mod kv;
mod locations;

pub use history::{HistoryEvent, HistoryStore};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use locations::{LocationEvent, LocationStore};

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Decode a persisted collection.
///
/// A missing key is an empty collection. Unreadable or undecodable data is
/// logged and also treated as empty.
fn load_collection<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let bytes = match kv.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            debug!("No stored '{key}', starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!("Could not read stored '{key}', starting empty: {e}");
            return Vec::new();
        }
    };

    match decode_collection(key, &bytes) {
        Ok(items) => items,
        Err(e) => {
            warn!("{e}; starting with an empty collection");
            Vec::new()
        }
    }
}

fn decode_collection<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<Vec<T>> {
    serde_json::from_slice(bytes).map_err(|e| Error::PersistenceDecode {
        key: key.to_string(),
        source: e,
    })
}

/// Serialize and store a whole collection.
fn persist_collection<T: Serialize>(kv: &dyn KeyValueStore, key: &str, items: &[T]) -> Result<()> {
    let bytes = serde_json::to_vec(items).map_err(|e| Error::StorageEncode {
        key: key.to_string(),
        source: e,
    })?;
    kv.set(key, &bytes)
}
