//! Core library for eventmap.
//!
//! Viewport-driven loading and caching of geo-tagged events, client-side
//! filtering, and reconciliation of the filtered set onto a clustering map.

pub mod bounds;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod filter;
pub mod ledger;
pub mod loader;
pub mod marker;
pub mod query;
pub mod session;
pub mod store;
pub mod viewport;
pub mod zone;

#[cfg(test)]
pub(crate) mod testing;

pub use bounds::{Bounds, LatLng};
pub use cache::{EventCache, FileStore, KeyValueStore, MemoryStore, SavedEvents};
pub use config::{CityPreset, EventMapConfig};
pub use error::{EventMapError, EventMapResult};
pub use event::{DeliveryMode, Event, EventId, TicketType};
pub use filter::{FilterContext, FilterCriteria, QuickFilter};
pub use ledger::RegionLedger;
pub use loader::{LoadOutcome, Loader, QueryFilters};
pub use query::{EventQuery, EventSource, HttpEventSource, QueryResponse, QueryStatus};
pub use session::Session;
pub use store::{EventStore, MergeStats};
pub use viewport::ViewportDebouncer;
pub use zone::CalendarZone;
