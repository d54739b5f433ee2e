//! In-memory canonical set of loaded events.

use indexmap::IndexMap;

use crate::event::{Event, EventId};

/// Counts from a single merge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl MergeStats {
    pub fn changed(&self) -> bool {
        self.inserted > 0 || self.updated > 0
    }
}

/// Events keyed by id, iterated in first-arrival order.
///
/// A later record with a known id replaces every field of the earlier one but
/// keeps its position.
#[derive(Debug, Default, Clone)]
pub struct EventStore {
    events: IndexMap<EventId, Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list that may contain duplicate ids (last wins).
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut store = EventStore::new();
        store.merge(events);
        store
    }

    pub fn merge(&mut self, incoming: impl IntoIterator<Item = Event>) -> MergeStats {
        let mut stats = MergeStats::default();

        for event in incoming {
            match self.events.get_mut(&event.id) {
                Some(existing) if *existing == event => stats.unchanged += 1,
                Some(existing) => {
                    *existing = event;
                    stats.updated += 1;
                }
                None => {
                    self.events.insert(event.id.clone(), event);
                    stats.inserted += 1;
                }
            }
        }

        stats
    }

    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.get(id)
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.events.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    /// Owned copy of all events in store order.
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
