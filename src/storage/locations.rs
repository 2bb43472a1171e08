//! Marked location list.

use super::{KeyValueStore, load_collection, persist_collection};
use crate::constants::{NOTIFY_CHANNEL_CAPACITY, storage_keys};
use crate::error::Result;
use crate::record::MarkedLocation;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Change notification emitted by [`LocationStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationEvent {
    /// A location was added at the end.
    Appended(MarkedLocation),
}

/// Marked locations in confirmation order.
///
/// Session-only unless created with [`LocationStore::persistent`].
pub struct LocationStore {
    kv: Option<Arc<dyn KeyValueStore>>,
    items: Vec<MarkedLocation>,
    events: broadcast::Sender<LocationEvent>,
}

impl LocationStore {
    /// Empty store that lives for the current session only.
    pub fn in_memory() -> Self {
        Self::with_items(None, Vec::new())
    }

    /// Store that reloads and saves its list under the marked-locations key.
    pub fn persistent(kv: Arc<dyn KeyValueStore>) -> Self {
        let items = load_collection(kv.as_ref(), storage_keys::MARKED_LOCATIONS);
        Self::with_items(Some(kv), items)
    }

    fn with_items(kv: Option<Arc<dyn KeyValueStore>>, items: Vec<MarkedLocation>) -> Self {
        let (events, _) = broadcast::channel(NOTIFY_CHANNEL_CAPACITY);
        Self { kv, items, events }
    }

    /// Add a location at the end of the list.
    pub fn append(&mut self, location: MarkedLocation) -> Result<()> {
        self.items.push(location.clone());
        let _ = self.events.send(LocationEvent::Appended(location));
        match &self.kv {
            Some(kv) => {
                persist_collection(kv.as_ref(), storage_keys::MARKED_LOCATIONS, &self.items)
            }
            None => Ok(()),
        }
    }

    /// Locations in insertion order.
    pub fn all(&self) -> &[MarkedLocation] {
        &self.items
    }

    /// Number of marked locations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing has been marked.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Follow changes to the list.
    pub fn subscribe(&self) -> broadcast::Receiver<LocationEvent> {
        self.events.subscribe()
    }
}
