//! Newest-first prediction history.

use super::{KeyValueStore, load_collection, persist_collection};
use crate::constants::{NOTIFY_CHANNEL_CAPACITY, storage_keys};
use crate::error::Result;
use crate::record::Prediction;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Change notification emitted by [`HistoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    /// A record was inserted at the front.
    Prepended(Prediction),
    /// The whole history was replaced; carries the new length.
    Replaced(usize),
}

/// Ordered prediction history persisted under a single key.
///
/// The store has exactly one owner that mutates it; observers follow
/// changes through [`HistoryStore::subscribe`].
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
    items: Vec<Prediction>,
    events: broadcast::Sender<HistoryEvent>,
}

impl HistoryStore {
    /// Load the persisted history. Unreadable data yields an empty history.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Self {
        let items: Vec<Prediction> = load_collection(kv.as_ref(), storage_keys::PREDICTIONS);
        debug!("Loaded {} prediction(s) from history", items.len());
        let (events, _) = broadcast::channel(NOTIFY_CHANNEL_CAPACITY);
        Self { kv, items, events }
    }

    /// Insert a record at the front and persist the whole history.
    ///
    /// The in-memory history is updated even if persisting fails.
    pub fn prepend(&mut self, record: Prediction) -> Result<()> {
        self.items.insert(0, record.clone());
        let _ = self.events.send(HistoryEvent::Prepended(record));
        self.persist()
    }

    /// Replace the whole history.
    pub fn replace_all(&mut self, records: Vec<Prediction>) -> Result<()> {
        self.items = records;
        let _ = self.events.send(HistoryEvent::Replaced(self.items.len()));
        self.persist()
    }

    /// Remove every record.
    pub fn clear(&mut self) -> Result<()> {
        self.replace_all(Vec::new())
    }

    /// Records, newest first.
    pub fn all(&self) -> &[Prediction] {
        &self.items
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no prediction has been recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Follow changes to the history.
    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    fn persist(&self) -> Result<()> {
        persist_collection(self.kv.as_ref(), storage_keys::PREDICTIONS, &self.items)
    }
}
