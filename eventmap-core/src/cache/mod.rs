//! Persisted local state: the event snapshot and the saved-event set.

mod events;
mod saved;
mod storage;

pub use events::EventCache;
pub use saved::SavedEvents;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
