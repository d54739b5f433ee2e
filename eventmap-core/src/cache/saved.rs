//! User's saved (favorite) events. Persisted without expiry.

use std::rc::Rc;

use indexmap::IndexSet;
use tracing::warn;

use crate::cache::storage::KeyValueStore;
use crate::constants::SAVED_EVENTS_KEY;
use crate::error::{EventMapError, EventMapResult};
use crate::event::EventId;

pub struct SavedEvents {
    storage: Rc<dyn KeyValueStore>,
    ids: IndexSet<EventId>,
}

impl SavedEvents {
    /// Load the saved set. Unreadable or corrupt storage yields an empty set.
    pub fn load(storage: Rc<dyn KeyValueStore>) -> Self {
        let ids = match Self::read(storage.as_ref()) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Could not read saved events: {}", e);
                IndexSet::new()
            }
        };
        SavedEvents { storage, ids }
    }

    fn read(storage: &dyn KeyValueStore) -> EventMapResult<IndexSet<EventId>> {
        match storage.get(SAVED_EVENTS_KEY)? {
            Some(raw) => {
                let ids: Vec<EventId> = serde_json::from_str(&raw)?;
                Ok(ids.into_iter().collect())
            }
            None => Ok(IndexSet::new()),
        }
    }

    fn persist(&self) {
        let ids: Vec<&EventId> = self.ids.iter().collect();
        let result = serde_json::to_string(&ids)
            .map_err(EventMapError::from)
            .and_then(|raw| self.storage.set(SAVED_EVENTS_KEY, &raw));
        if let Err(e) = result {
            warn!("Could not persist saved events: {}", e);
        }
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &IndexSet<EventId> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns true if the id was newly saved.
    pub fn save(&mut self, id: EventId) -> bool {
        let added = self.ids.insert(id);
        if added {
            self.persist();
        }
        added
    }

    /// Returns true if the id was saved before.
    pub fn unsave(&mut self, id: &EventId) -> bool {
        let removed = self.ids.shift_remove(id);
        if removed {
            self.persist();
        }
        removed
    }

    /// Flip the saved state; returns the new state.
    pub fn toggle(&mut self, id: &EventId) -> bool {
        if self.unsave(id) {
            false
        } else {
            self.save(id.clone())
        }
    }
}
