//! Viewport-driven incremental loading.
//!
//! The loader owns the event store and the region ledger. Each call to
//! [`Loader::load`] hydrates from the persisted cache on a cold start, widens
//! the viewport, skips regions that were already fetched, and merges whatever
//! the endpoint returns. At most one fetch is outstanding at a time; extra
//! calls made meanwhile are dropped, not queued.
//!
//! All state lives in `Cell`/`RefCell` and is only touched from the task that
//! drives the loader. No borrow is held across the fetch await.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::bounds::Bounds;
use crate::cache::EventCache;
use crate::constants::DEFAULT_EXPAND_RATIO;
use crate::event::Event;
use crate::ledger::RegionLedger;
use crate::query::{EventQuery, EventSource, QueryStatus};
use crate::store::EventStore;

/// What a call to [`Loader::load`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Another fetch was outstanding; this call was dropped.
    InFlight,
    /// The widened viewport is inside an already fetched region.
    Covered,
    /// The endpoint answered and the results were merged.
    Fetched { received: usize, total: usize },
    /// The endpoint failed; store and ledger are unchanged.
    Failed,
}

/// Search and status forwarded to the endpoint with every fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilters {
    pub search: Option<String>,
    pub status: QueryStatus,
}

#[derive(Default)]
struct LoaderState {
    store: EventStore,
    ledger: RegionLedger,
    revision: u64,
}

/// Clears the in-flight flag however the fetch ends, including when the load
/// future is dropped mid-await.
struct InFlightGuard<'a>(&'a Cell<bool>);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        InFlightGuard(flag)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct Loader {
    source: Rc<dyn EventSource>,
    cache: EventCache,
    expand_ratio: f64,
    filters: RefCell<QueryFilters>,
    state: RefCell<LoaderState>,
    in_flight: Cell<bool>,
}

impl Loader {
    pub fn new(source: Rc<dyn EventSource>, cache: EventCache) -> Self {
        Loader {
            source,
            cache,
            expand_ratio: DEFAULT_EXPAND_RATIO,
            filters: RefCell::new(QueryFilters::default()),
            state: RefCell::new(LoaderState::default()),
            in_flight: Cell::new(false),
        }
    }

    pub fn with_expand_ratio(mut self, ratio: f64) -> Self {
        self.expand_ratio = ratio;
        self
    }

    pub fn expand_ratio(&self) -> f64 {
        self.expand_ratio
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.get()
    }

    /// Incremented whenever the store contents change.
    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    pub fn store(&self) -> Ref<'_, EventStore> {
        Ref::map(self.state.borrow(), |s| &s.store)
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.state.borrow().store.snapshot()
    }

    pub fn ledger(&self) -> Ref<'_, RegionLedger> {
        Ref::map(self.state.borrow(), |s| &s.ledger)
    }

    pub fn filters(&self) -> QueryFilters {
        self.filters.borrow().clone()
    }

    /// Replace the endpoint filters. Returns true if the search text or the
    /// status changed, which means previously fetched regions no longer
    /// describe what the endpoint would send.
    pub fn set_filters(&self, filters: QueryFilters) -> bool {
        let mut current = self.filters.borrow_mut();
        let changed = *current != filters;
        *current = filters;
        changed
    }

    /// [`Loader::set_filters`] from loose parts; empty search means none.
    pub fn set_query(&self, search: &str, status: QueryStatus) -> bool {
        let search = search.trim();
        self.set_filters(QueryFilters {
            search: (!search.is_empty()).then(|| search.to_string()),
            status,
        })
    }

    /// Forget fetched regions without touching the store.
    pub fn reset_ledger(&self) {
        self.state.borrow_mut().ledger.reset();
    }

    /// Drop store and ledger (manual refresh).
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.store.clear();
        state.ledger.reset();
        state.revision += 1;
    }

    /// Drop persisted cache, store and ledger.
    pub fn invalidate(&self) {
        self.cache.invalidate();
        self.reset();
        info!("Event cache invalidated");
    }

    fn hydrate_from_cache(&self) {
        if !self.state.borrow().store.is_empty() {
            return;
        }

        let cached = self.cache.load();
        if cached.is_empty() {
            return;
        }

        let mut state = self.state.borrow_mut();
        let stats = state.store.merge(cached);
        if stats.changed() {
            state.revision += 1;
        }
        debug!(count = state.store.len(), "Hydrated events from cache");
    }

    /// Load events for `viewport`.
    ///
    /// With `viewport = None` the containment check is skipped and the
    /// endpoint is always queried without bounds. `force` skips the check for
    /// a concrete viewport too.
    pub async fn load(&self, viewport: Option<Bounds>, force: bool) -> LoadOutcome {
        if self.in_flight.get() {
            debug!("Fetch already in flight, dropping load request");
            return LoadOutcome::InFlight;
        }

        self.hydrate_from_cache();

        let region = viewport.map(|v| v.expand(self.expand_ratio));

        if let Some(region) = &region {
            if !force && !self.state.borrow().ledger.needs_fetch(region) {
                debug!(%region, "Region already loaded");
                return LoadOutcome::Covered;
            }
        }

        let _guard = InFlightGuard::acquire(&self.in_flight);

        let filters = self.filters();
        let query = EventQuery {
            bounds: region,
            search: filters.search,
            status: filters.status,
        };

        match self.source.fetch(&query).await {
            Ok(events) => {
                let received = events.len();
                let (total, snapshot) = {
                    let mut state = self.state.borrow_mut();
                    let stats = state.store.merge(events);
                    if let Some(region) = region {
                        state.ledger.record(region);
                    }
                    if stats.changed() {
                        state.revision += 1;
                    }
                    (state.store.len(), state.store.snapshot())
                };

                self.cache.save(&snapshot);
                info!(received, total, "Loaded events");
                LoadOutcome::Fetched { received, total }
            }
            Err(e) => {
                warn!("Error loading events: {}", e);
                LoadOutcome::Failed
            }
        }
    }
}
