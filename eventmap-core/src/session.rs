//! Host-side wiring of loader, filters, saved set and map.
//!
//! A [`Session`] owns everything one map page needs and applies the rules
//! that tie them together: a new search text clears the fetched regions and
//! forces a fetch, a saved-set change rebuilds every marker, and a manual
//! refresh drops the cache before fetching again.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::bounds::Bounds;
use crate::cache::SavedEvents;
use crate::config::CityPreset;
use crate::error::{EventMapError, EventMapResult};
use crate::event::{Event, EventId};
use crate::filter::{self, FilterContext, FilterCriteria};
use crate::loader::{LoadOutcome, Loader};
use crate::marker::{FocusOutcome, Legend, MapActions, MapSurface, ReconcileStats, SharedMap};
use crate::zone::CalendarZone;

pub type Clock = Rc<dyn Fn() -> DateTime<Utc>>;

pub struct Session<S: MapSurface> {
    loader: Loader,
    criteria: RefCell<FilterCriteria>,
    saved: RefCell<SavedEvents>,
    map: SharedMap<S>,
    zone: CalendarZone,
    clock: Clock,
    cities: IndexMap<String, CityPreset>,
    viewport: Cell<Option<Bounds>>,
}

impl<S: MapSurface> Session<S> {
    pub fn new(loader: Loader, saved: SavedEvents, map: SharedMap<S>, zone: CalendarZone) -> Self {
        Session {
            loader,
            criteria: RefCell::new(FilterCriteria::default()),
            saved: RefCell::new(saved),
            map,
            zone,
            clock: Rc::new(Utc::now),
            cities: IndexMap::new(),
            viewport: Cell::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cities(mut self, cities: IndexMap<String, CityPreset>) -> Self {
        self.cities = cities;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn zone(&self) -> CalendarZone {
        self.zone
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn map(&self) -> &SharedMap<S> {
        &self.map
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.criteria.borrow().clone()
    }

    pub fn saved(&self) -> Ref<'_, SavedEvents> {
        self.saved.borrow()
    }

    pub fn viewport(&self) -> Option<Bounds> {
        self.viewport.get()
    }

    pub fn cities(&self) -> &IndexMap<String, CityPreset> {
        &self.cities
    }

    /// The map settled on `bounds`.
    pub async fn on_viewport(&self, bounds: Bounds) -> LoadOutcome {
        self.viewport.set(Some(bounds));
        let outcome = self.loader.load(Some(bounds), false).await;
        self.refresh_markers();
        outcome
    }

    /// Replace the filter criteria. Returns the fetch outcome when the search
    /// text or status changed and a new fetch was issued.
    pub async fn set_criteria(&self, criteria: FilterCriteria) -> Option<LoadOutcome> {
        let query_changed = self.loader.set_query(&criteria.search, criteria.status);
        *self.criteria.borrow_mut() = criteria;

        let outcome = if query_changed {
            debug!("Endpoint query changed, clearing fetched regions");
            self.loader.reset_ledger();
            Some(self.loader.load(self.viewport.get(), true).await)
        } else {
            None
        };

        self.refresh_markers();
        outcome
    }

    /// Drop cache, store and fetched regions, then fetch the current view.
    pub async fn refresh(&self) -> LoadOutcome {
        info!("Refreshing events");
        self.loader.invalidate();
        let outcome = self.loader.load(self.viewport.get(), true).await;
        self.refresh_markers();
        outcome
    }

    /// Flip an event's saved state; returns the new state.
    pub fn toggle_saved(&self, id: &EventId) -> bool {
        let saved = self.saved.borrow_mut().toggle(id);
        self.refresh_markers();
        saved
    }

    /// Store events that pass the current criteria, in store order.
    pub fn displayed(&self) -> Vec<Event> {
        let saved = self.saved.borrow();
        let criteria = self.criteria.borrow();
        let ctx = FilterContext::new(self.now(), self.zone, saved.ids());
        let store = self.loader.store();
        filter::apply(store.iter(), &criteria, &ctx)
    }

    /// Bring the map in line with the displayed events and saved set.
    pub fn refresh_markers(&self) -> ReconcileStats {
        let displayed = self.displayed();
        let now = self.now();
        let saved: HashSet<EventId> = self.saved.borrow().ids().iter().cloned().collect();

        let mut map = self.map.borrow_mut();
        let rebuilt = map.set_saved(saved, &displayed, now, self.zone);
        let stats = map.reconcile(&displayed, now, self.zone);

        ReconcileStats {
            added: rebuilt.added + stats.added,
            removed: rebuilt.removed + stats.removed,
        }
    }

    pub fn legend(&self) -> Legend {
        self.map.borrow().legend()
    }

    /// A marker was clicked.
    pub fn click(&self, id: &EventId) -> bool {
        self.map.borrow().marker_clicked(id)
    }

    /// Jump to a configured city.
    pub fn set_city(&self, key: &str) -> EventMapResult<()> {
        let city = self
            .cities
            .get(key)
            .ok_or_else(|| EventMapError::UnknownCity(key.to_string()))?;
        self.map.set_view_to_city(city.center(), city.zoom);
        Ok(())
    }

    pub async fn focus(&self, id: &EventId) -> FocusOutcome {
        self.map.focus_on_event(id).await
    }
}
