//! The map the reconciler draws on.

use chrono::{DateTime, Utc};

use crate::bounds::LatLng;
use crate::event::{Event, EventId};
use crate::marker::style::MarkerStyle;

/// Identifies a cluster in the surface's current clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(pub u64);

/// Content shown when a marker's popup opens.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub title: String,
    pub address: String,
    pub starts_at: DateTime<Utc>,
    pub banner_url: Option<String>,
    pub is_past: bool,
}

/// Everything a surface needs to draw one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub event_id: EventId,
    pub position: LatLng,
    pub style: MarkerStyle,
    /// Draw the saved badge.
    pub saved: bool,
    pub popup: PopupContent,
}

impl MarkerSpec {
    pub fn for_event(
        event: &Event,
        position: LatLng,
        style: MarkerStyle,
        saved: bool,
        now: DateTime<Utc>,
    ) -> Self {
        MarkerSpec {
            event_id: event.id.clone(),
            position,
            style,
            saved,
            popup: PopupContent {
                title: event.title.clone(),
                address: event.address.clone(),
                starts_at: event.start_time,
                banner_url: event.banner_url.clone(),
                is_past: event.is_past(now),
            },
        }
    }
}

/// A clustering map layer.
///
/// Markers are owned by the surface; the reconciler keeps the handles it gets
/// back from [`MapSurface::add_marker`].
pub trait MapSurface {
    type Marker;

    fn add_marker(&mut self, spec: MarkerSpec) -> Self::Marker;

    fn remove_marker(&mut self, marker: Self::Marker);

    /// Recompute clusters after a batch of additions/removals.
    fn refresh_clusters(&mut self);

    /// Center the view. Clusters are recomputed for the new zoom.
    fn set_view(&mut self, center: LatLng, zoom: u8);

    /// The cluster currently hiding `marker`, or `None` if the marker is
    /// drawn on its own.
    fn visible_parent(&self, marker: &Self::Marker) -> Option<ClusterId>;

    /// Fan a cluster out so each member can be clicked.
    fn spiderfy(&mut self, cluster: ClusterId);

    fn open_popup(&mut self, marker: &Self::Marker);
}
