//! Keeps map markers in step with the displayed event set.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::bounds::LatLng;
use crate::constants::{DEFAULT_CENTER_DELAY, DEFAULT_DECLUSTER_DELAY, DEFAULT_FOCUS_ZOOM};
use crate::event::{Event, EventId};
use crate::marker::style::{Legend, MarkerStyle, Recency};
use crate::marker::surface::{MapSurface, MarkerSpec};
use crate::zone::CalendarZone;

/// Signals emitted from inside the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerSignal {
    /// The user asked for the detail view of an event.
    OpenDetail(EventId),
}

/// Delays and zoom used by the focus sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusTiming {
    pub zoom: u8,
    /// Wait for the view transition after centering.
    pub center_delay: Duration,
    /// Wait for a spiderfied cluster to decompose.
    pub decluster_delay: Duration,
}

impl Default for FocusTiming {
    fn default() -> Self {
        FocusTiming {
            zoom: DEFAULT_FOCUS_ZOOM,
            center_delay: DEFAULT_CENTER_DELAY,
            decluster_delay: DEFAULT_DECLUSTER_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPhase {
    Centering,
    Declustering,
    PopupOpen,
}

/// Handle for one focus sequence. Starting another sequence invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTicket(u64);

/// What the focus driver should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusStep {
    Wait(Duration),
    Opened,
    /// A newer focus started, or the marker went away.
    Cancelled,
}

struct FocusState {
    ticket: FocusTicket,
    event: EventId,
    phase: FocusPhase,
}

struct Placed<M> {
    marker: M,
    position: LatLng,
    recency: Recency,
    saved: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub added: usize,
    pub removed: usize,
}

pub struct MarkerReconciler<S: MapSurface> {
    surface: S,
    markers: HashMap<EventId, Placed<S::Marker>>,
    saved: HashSet<EventId>,
    signals: mpsc::UnboundedSender<MarkerSignal>,
    timing: FocusTiming,
    focus: Option<FocusState>,
    next_ticket: u64,
}

impl<S: MapSurface> MarkerReconciler<S> {
    pub fn new(surface: S, signals: mpsc::UnboundedSender<MarkerSignal>) -> Self {
        MarkerReconciler {
            surface,
            markers: HashMap::new(),
            saved: HashSet::new(),
            signals,
            timing: FocusTiming::default(),
            focus: None,
            next_ticket: 0,
        }
    }

    pub fn with_timing(mut self, timing: FocusTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> FocusTiming {
        self.timing
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_present(&self, id: &EventId) -> bool {
        self.markers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn position_of(&self, id: &EventId) -> Option<LatLng> {
        self.markers.get(id).map(|p| p.position)
    }

    /// Bring markers in line with `displayed`.
    ///
    /// Events without a usable coordinate never get a marker. A present event
    /// whose coordinate changed is re-placed; otherwise existing markers are
    /// left untouched.
    pub fn reconcile(
        &mut self,
        displayed: &[Event],
        now: DateTime<Utc>,
        zone: CalendarZone,
    ) -> ReconcileStats {
        let wanted: HashMap<&EventId, (&Event, LatLng)> = displayed
            .iter()
            .filter_map(|e| e.coordinate().map(|pos| (&e.id, (e, pos))))
            .collect();

        let stale: Vec<EventId> = self
            .markers
            .iter()
            .filter(|(id, placed)| match wanted.get(id) {
                Some((_, pos)) => *pos != placed.position,
                None => true,
            })
            .map(|(id, _)| id.clone())
            .collect();

        let mut stats = ReconcileStats::default();

        for id in stale {
            if let Some(placed) = self.markers.remove(&id) {
                self.surface.remove_marker(placed.marker);
                stats.removed += 1;
                trace!(event = %id, "Removed marker");
            }
        }

        for event in displayed {
            let Some((_, position)) = wanted.get(&event.id) else {
                continue;
            };
            if self.markers.contains_key(&event.id) {
                continue;
            }
            self.place(event, *position, now, zone);
            stats.added += 1;
        }

        if stats.added > 0 || stats.removed > 0 {
            self.surface.refresh_clusters();
            debug!(
                added = stats.added,
                removed = stats.removed,
                present = self.markers.len(),
                "Reconciled markers"
            );
        }

        stats
    }

    fn place(&mut self, event: &Event, position: LatLng, now: DateTime<Utc>, zone: CalendarZone) {
        let recency = Recency::classify(event.start_time, now, zone);
        let saved = self.saved.contains(&event.id);
        let spec = MarkerSpec::for_event(
            event,
            position,
            MarkerStyle::for_recency(recency),
            saved,
            now,
        );
        let marker = self.surface.add_marker(spec);
        self.markers.insert(
            event.id.clone(),
            Placed {
                marker,
                position,
                recency,
                saved,
            },
        );
    }

    /// Replace the saved set. Any change tears down every marker and rebuilds
    /// from `displayed` so badges are correct.
    pub fn set_saved(
        &mut self,
        saved: HashSet<EventId>,
        displayed: &[Event],
        now: DateTime<Utc>,
        zone: CalendarZone,
    ) -> ReconcileStats {
        if saved == self.saved {
            return ReconcileStats::default();
        }
        self.saved = saved;

        let removed = self.clear_markers();
        let mut stats = self.reconcile(displayed, now, zone);
        stats.removed += removed;
        if stats.added == 0 && removed > 0 {
            self.surface.refresh_clusters();
        }
        stats
    }

    /// Remove every marker; returns how many were present.
    pub fn clear_markers(&mut self) -> usize {
        let count = self.markers.len();
        for (_, placed) in self.markers.drain() {
            self.surface.remove_marker(placed.marker);
        }
        count
    }

    /// Forward a marker click as an open-detail signal.
    pub fn marker_clicked(&self, id: &EventId) -> bool {
        if !self.markers.contains_key(id) {
            return false;
        }
        self.signals
            .send(MarkerSignal::OpenDetail(id.clone()))
            .is_ok()
    }

    pub fn legend(&self) -> Legend {
        let mut legend = Legend::default();
        for placed in self.markers.values() {
            legend.count(placed.recency, placed.saved);
        }
        legend
    }

    pub fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.surface.set_view(center, zoom);
    }

    /// Start focusing `id`: center and zoom on it. Cancels any focus in
    /// progress. `None` if the event has no marker.
    pub fn begin_focus(&mut self, id: &EventId) -> Option<FocusTicket> {
        let position = self.markers.get(id)?.position;

        self.next_ticket += 1;
        let ticket = FocusTicket(self.next_ticket);
        self.surface.set_view(position, self.timing.zoom);
        self.focus = Some(FocusState {
            ticket,
            event: id.clone(),
            phase: FocusPhase::Centering,
        });
        Some(ticket)
    }

    pub fn focus_phase(&self) -> Option<FocusPhase> {
        self.focus.as_ref().map(|f| f.phase)
    }

    /// Advance the focus sequence after its wait elapsed.
    pub fn advance_focus(&mut self, ticket: FocusTicket) -> FocusStep {
        let Some(state) = self.focus.as_mut() else {
            return FocusStep::Cancelled;
        };
        if state.ticket != ticket {
            return FocusStep::Cancelled;
        }
        let Some(placed) = self.markers.get(&state.event) else {
            self.focus = None;
            return FocusStep::Cancelled;
        };

        match state.phase {
            FocusPhase::Centering => match self.surface.visible_parent(&placed.marker) {
                Some(cluster) => {
                    self.surface.spiderfy(cluster);
                    state.phase = FocusPhase::Declustering;
                    FocusStep::Wait(self.timing.decluster_delay)
                }
                None => {
                    self.surface.open_popup(&placed.marker);
                    state.phase = FocusPhase::PopupOpen;
                    FocusStep::Opened
                }
            },
            FocusPhase::Declustering => {
                self.surface.open_popup(&placed.marker);
                state.phase = FocusPhase::PopupOpen;
                FocusStep::Opened
            }
            FocusPhase::PopupOpen => FocusStep::Opened,
        }
    }
}
