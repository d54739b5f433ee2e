//! Imperative map actions exposed to the rest of the page.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use async_trait::async_trait;
use tracing::debug;

use crate::bounds::LatLng;
use crate::event::EventId;
use crate::marker::reconciler::{FocusStep, MarkerReconciler};
use crate::marker::surface::MapSurface;

/// How a focus request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    Opened,
    /// The event has no marker on the map.
    NotFound,
    /// Superseded by a newer focus, or the marker was removed mid-sequence.
    Cancelled,
}

#[async_trait(?Send)]
pub trait MapActions {
    /// Center on an event's marker, decluster it if needed and open its popup.
    async fn focus_on_event(&self, id: &EventId) -> FocusOutcome;

    fn set_view_to_city(&self, center: LatLng, zoom: u8);
}

/// A reconciler shared between the page and the focus driver.
pub struct SharedMap<S: MapSurface> {
    inner: Rc<RefCell<MarkerReconciler<S>>>,
}

impl<S: MapSurface> Clone for SharedMap<S> {
    fn clone(&self) -> Self {
        SharedMap {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: MapSurface> SharedMap<S> {
    pub fn new(reconciler: MarkerReconciler<S>) -> Self {
        SharedMap {
            inner: Rc::new(RefCell::new(reconciler)),
        }
    }

    pub fn borrow(&self) -> Ref<'_, MarkerReconciler<S>> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, MarkerReconciler<S>> {
        self.inner.borrow_mut()
    }
}

#[async_trait(?Send)]
impl<S: MapSurface> MapActions for SharedMap<S> {
    async fn focus_on_event(&self, id: &EventId) -> FocusOutcome {
        let (ticket, timing) = {
            let mut map = self.inner.borrow_mut();
            match map.begin_focus(id) {
                Some(ticket) => (ticket, map.timing()),
                None => {
                    debug!(event = %id, "No marker to focus");
                    return FocusOutcome::NotFound;
                }
            }
        };

        tokio::time::sleep(timing.center_delay).await;

        loop {
            let step = self.inner.borrow_mut().advance_focus(ticket);
            match step {
                FocusStep::Wait(delay) => tokio::time::sleep(delay).await,
                FocusStep::Opened => return FocusOutcome::Opened,
                FocusStep::Cancelled => {
                    debug!(event = %id, "Focus cancelled");
                    return FocusOutcome::Cancelled;
                }
            }
        }
    }

    fn set_view_to_city(&self, center: LatLng, zoom: u8) {
        self.inner.borrow_mut().set_view(center, zoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::{DateTime, Utc};
    use tokio::sync::mpsc;

    use crate::constants::{DEFAULT_CENTER_DELAY, DEFAULT_DECLUSTER_DELAY};
    use crate::marker::reconciler::tests::RecordingSurface;
    use crate::marker::surface::ClusterId;
    use crate::testing::{at, placed};
    use crate::zone::CalendarZone;

    fn now() -> DateTime<Utc> {
        at(2025, 4, 10, 8, 0)
    }

    fn map() -> SharedMap<RecordingSurface> {
        let (tx, _rx) = mpsc::unbounded_channel();
        let map = SharedMap::new(MarkerReconciler::new(RecordingSurface::default(), tx));
        let events = vec![
            placed("1", "Jazz Night", at(2025, 4, 12, 19, 0), 10.77, 106.70),
            placed("2", "Pottery", at(2025, 4, 13, 9, 0), 10.78, 106.71),
        ];
        map.borrow_mut()
            .reconcile(&events, now(), CalendarZone::Named(chrono_tz::UTC));
        map
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_waits_for_centering_before_popup() {
        let map = map();
        let started = tokio::time::Instant::now();

        let outcome = map.focus_on_event(&EventId::from("1")).await;

        assert_eq!(outcome, FocusOutcome::Opened);
        assert_eq!(started.elapsed(), DEFAULT_CENTER_DELAY);
        let view = *map.borrow().surface().views.last().unwrap();
        assert_eq!(view.0, LatLng::new(10.77, 106.70));
        assert_eq!(map.borrow().surface().popups, vec![EventId::from("1")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clustered_focus_adds_decluster_delay() {
        let map = map();
        map.borrow_mut()
            .surface_mut()
            .clustered
            .insert(EventId::from("2"), ClusterId(3));
        let started = tokio::time::Instant::now();

        let outcome = map.focus_on_event(&EventId::from("2")).await;

        assert_eq!(outcome, FocusOutcome::Opened);
        assert_eq!(
            started.elapsed(),
            DEFAULT_CENTER_DELAY + DEFAULT_DECLUSTER_DELAY
        );
        assert_eq!(map.borrow().surface().spiderfied, vec![ClusterId(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_event_is_not_found() {
        let map = map();
        let outcome = map.focus_on_event(&EventId::from("nope")).await;
        assert_eq!(outcome, FocusOutcome::NotFound);
        assert!(map.borrow().surface().views.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_focus_cancels_first() {
        let map = map();
        let later = map.clone();
        let (one, two) = (EventId::from("1"), EventId::from("2"));

        let (first, second) = tokio::join!(map.focus_on_event(&one), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            later.focus_on_event(&two).await
        });

        assert_eq!(first, FocusOutcome::Cancelled);
        assert_eq!(second, FocusOutcome::Opened);
        assert_eq!(map.borrow().surface().popups, vec![EventId::from("2")]);
    }

    #[test]
    fn test_set_view_to_city() {
        let map = map();
        map.set_view_to_city(LatLng::new(21.028, 105.834), 13);
        assert_eq!(
            map.borrow().surface().views,
            vec![(LatLng::new(21.028, 105.834), 13)]
        );
    }
}
