//! Shared defaults.

use std::time::Duration;

/// Fraction of the viewport span added on each side before fetching.
pub const DEFAULT_EXPAND_RATIO: f64 = 0.3;

/// How long a persisted event snapshot stays valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Quiet period before a burst of viewport changes triggers a load.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Wait for the view transition after centering on a focused event.
pub const DEFAULT_CENTER_DELAY: Duration = Duration::from_millis(500);

/// Wait for a spiderfied cluster to decompose before opening a popup.
pub const DEFAULT_DECLUSTER_DELAY: Duration = Duration::from_millis(300);

/// Zoom level used when focusing a single event.
pub const DEFAULT_FOCUS_ZOOM: u8 = 18;

/// Zoom level used when jumping to a city preset.
pub const DEFAULT_CITY_ZOOM: u8 = 13;

/// Pixel radius within which markers are merged into one cluster.
pub const DEFAULT_CLUSTER_RADIUS_PX: f64 = 60.0;

/// Deepest zoom a map surface supports; clusters here can only be spiderfied.
pub const MAX_ZOOM: u8 = 18;

/// Storage key of the persisted event array.
pub const CACHE_KEY: &str = "eventmap_events";

/// Storage key of the persisted expiry instant (epoch milliseconds).
pub const CACHE_EXPIRY_KEY: &str = "eventmap_cache_expiry";

/// Storage key of the saved event id array.
pub const SAVED_EVENTS_KEY: &str = "eventmap_saved_events";
