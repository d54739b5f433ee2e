//! Persisted event snapshot with an absolute expiry.

use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::cache::storage::KeyValueStore;
use crate::constants::{CACHE_EXPIRY_KEY, CACHE_KEY, DEFAULT_CACHE_TTL};
use crate::error::{EventMapError, EventMapResult};
use crate::event::Event;
use crate::store::EventStore;

/// Event snapshot cache. Every operation fails soft: storage problems are
/// logged and treated as an empty cache.
pub struct EventCache {
    storage: Rc<dyn KeyValueStore>,
    ttl: Duration,
}

impl EventCache {
    pub fn new(storage: Rc<dyn KeyValueStore>) -> Self {
        Self::with_ttl(storage, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(storage: Rc<dyn KeyValueStore>, ttl: Duration) -> Self {
        EventCache { storage, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn save(&self, events: &[Event]) {
        self.save_at(events, Utc::now());
    }

    /// Dedup by id (last wins) and persist with expiry `now + ttl`.
    pub fn save_at(&self, events: &[Event], now: DateTime<Utc>) {
        if let Err(e) = self.try_save(events, now) {
            warn!("Cache storage failed: {}", e);
        }
    }

    fn try_save(&self, events: &[Event], now: DateTime<Utc>) -> EventMapResult<()> {
        let unique = EventStore::from_events(events.iter().cloned()).snapshot();
        let payload = serde_json::to_string(&unique)?;
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let expiry = now.timestamp_millis().saturating_add(ttl_ms);

        self.storage.set(CACHE_KEY, &payload)?;
        self.storage.set(CACHE_EXPIRY_KEY, &expiry.to_string())?;

        debug!(count = unique.len(), expiry, "Saved event cache");
        Ok(())
    }

    pub fn load(&self) -> Vec<Event> {
        self.load_at(Utc::now())
    }

    /// Cached events, or empty if expired, missing, unreadable or corrupt.
    /// An expired or corrupt record is purged.
    pub fn load_at(&self, now: DateTime<Utc>) -> Vec<Event> {
        match self.try_load(now) {
            Ok(events) => events,
            Err(e) => {
                warn!("Cache read failed, ignoring cached events: {}", e);
                self.invalidate();
                Vec::new()
            }
        }
    }

    fn try_load(&self, now: DateTime<Utc>) -> EventMapResult<Vec<Event>> {
        if let Some(raw) = self.storage.get(CACHE_EXPIRY_KEY)? {
            let expiry: i64 = raw.trim().parse().map_err(|_| {
                EventMapError::Serialization(format!(
                    "Invalid cache expiry '{}'",
                    raw.trim()
                ))
            })?;

            if now.timestamp_millis() > expiry {
                debug!(expiry, "Event cache expired");
                self.invalidate();
                return Ok(Vec::new());
            }
        }

        match self.storage.get(CACHE_KEY)? {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Ok(Vec::new()),
        }
    }

    /// Drop both the snapshot and its expiry.
    pub fn invalidate(&self) {
        for key in [CACHE_KEY, CACHE_EXPIRY_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Could not remove cache key {}: {}", key, e);
            }
        }
    }
}
