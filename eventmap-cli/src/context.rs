//! Wiring shared by every command: config, storage, loader and map.

use std::rc::Rc;

use anyhow::Result;
use eventmap_core::marker::{GridClusterSurface, MarkerReconciler, MarkerSignal, SharedMap};
use eventmap_core::{
    Bounds, CalendarZone, CityPreset, EventCache, EventMapConfig, FileStore, HttpEventSource,
    KeyValueStore, Loader, SavedEvents, Session,
};
use tokio::sync::mpsc;

/// Viewport size the CLI pretends to have, in pixels.
pub const VIEW_WIDTH: u32 = 1280;
pub const VIEW_HEIGHT: u32 = 800;

pub struct Context {
    pub config: EventMapConfig,
    pub zone: CalendarZone,
    storage: Rc<dyn KeyValueStore>,
}

impl Context {
    pub fn load() -> Result<Self> {
        let config = EventMapConfig::load()?;
        let zone = config.zone()?;
        let storage: Rc<dyn KeyValueStore> = Rc::new(FileStore::new(config.cache_path()));
        Ok(Context {
            config,
            zone,
            storage,
        })
    }

    pub fn cache(&self) -> Result<EventCache> {
        Ok(EventCache::with_ttl(
            self.storage.clone(),
            self.config.cache_ttl()?,
        ))
    }

    pub fn saved(&self) -> SavedEvents {
        SavedEvents::load(self.storage.clone())
    }

    pub fn city(&self, key: Option<&str>) -> Result<&CityPreset> {
        let city = match key {
            Some(key) => self.config.city(key),
            None => self.config.start_city(),
        };
        city.map_err(|e| {
            let available: Vec<&str> = self.config.cities.keys().map(String::as_str).collect();
            anyhow::anyhow!("{}. Available: {}", e, available.join(", "))
        })
    }

    /// A session whose map starts on `city` (or the configured default).
    pub fn session(
        &self,
        city: Option<&str>,
    ) -> Result<(Session<GridClusterSurface>, mpsc::UnboundedReceiver<MarkerSignal>)> {
        let city = self.city(city)?;
        tracing::debug!(city = %city.name, endpoint = %self.config.endpoint, "Starting session");

        let source = Rc::new(HttpEventSource::new(self.config.endpoint.clone())?);
        let loader = Loader::new(source, self.cache()?).with_expand_ratio(self.config.expand_ratio);

        let surface = GridClusterSurface::new(city.center(), city.zoom)
            .with_radius(self.config.cluster_radius_px);
        let (tx, rx) = mpsc::unbounded_channel();
        let reconciler = MarkerReconciler::new(surface, tx).with_timing(self.config.focus_timing()?);

        let session = Session::new(loader, self.saved(), SharedMap::new(reconciler), self.zone)
            .with_cities(self.config.cities.clone());

        Ok((session, rx))
    }
}

/// Area currently shown by the session's map.
pub fn visible_bounds(session: &Session<GridClusterSurface>) -> Bounds {
    session
        .map()
        .borrow()
        .surface()
        .visible_bounds(VIEW_WIDTH, VIEW_HEIGHT)
}
