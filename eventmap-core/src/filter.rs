//! Client-side filtering of the loaded event set.
//!
//! [`apply`] is pure: everything time- or user-dependent arrives through
//! [`FilterContext`], so the same inputs always give the same output, in
//! store order.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::event::{DeliveryMode, Event, EventId, TicketType};
use crate::query::QueryStatus;
use crate::zone::CalendarZone;

/// Shortcut filters offered next to the detailed criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickFilter {
    #[default]
    All,
    /// Only events in the saved set.
    Saved,
    /// Only events starting on today's calendar day.
    Today,
}

/// Recognized filter options. Empty strings and `None` mean "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Case-insensitive substring of title or address.
    pub search: String,
    /// Single category.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Category allow-list.
    pub types: Vec<String>,
    /// Calendar day of the start time.
    pub date: Option<NaiveDate>,
    pub status: QueryStatus,
    pub mode: Option<DeliveryMode>,
    /// Popularity flag.
    pub hot: Option<bool>,
    pub ticket_type: Option<TicketType>,
    pub quick: QuickFilter,
}

/// Inputs that are not part of the criteria but affect the result.
pub struct FilterContext<'a> {
    pub now: DateTime<Utc>,
    pub zone: CalendarZone,
    pub saved: &'a IndexSet<EventId>,
}

impl<'a> FilterContext<'a> {
    pub fn new(now: DateTime<Utc>, zone: CalendarZone, saved: &'a IndexSet<EventId>) -> Self {
        FilterContext { now, zone, saved }
    }
}

/// True if `event` passes every criterion.
pub fn matches(event: &Event, criteria: &FilterCriteria, ctx: &FilterContext) -> bool {
    if !criteria.search.is_empty() {
        let needle = criteria.search.to_lowercase();
        if !event.title.to_lowercase().contains(&needle)
            && !event.address.to_lowercase().contains(&needle)
        {
            return false;
        }
    }

    let category = event.event_type.as_deref();

    if !criteria.event_type.is_empty() && category != Some(criteria.event_type.as_str()) {
        return false;
    }

    if !criteria.types.is_empty()
        && !category.is_some_and(|c| criteria.types.iter().any(|t| t == c))
    {
        return false;
    }

    if let Some(date) = criteria.date {
        if ctx.zone.date_of(event.start_time) != date {
            return false;
        }
    }

    if !criteria.status.admits(event.start_time, ctx.now) {
        return false;
    }

    if criteria.mode.is_some() && event.mode != criteria.mode {
        return false;
    }

    if let Some(hot) = criteria.hot {
        if event.is_hot != hot {
            return false;
        }
    }

    if criteria.ticket_type.is_some() && event.ticket_type != criteria.ticket_type {
        return false;
    }

    match criteria.quick {
        QuickFilter::All => true,
        QuickFilter::Saved => ctx.saved.contains(&event.id),
        QuickFilter::Today => ctx.zone.date_of(event.start_time) == ctx.zone.date_of(ctx.now),
    }
}

/// Events passing `criteria`, in input order.
pub fn apply<'e>(
    events: impl IntoIterator<Item = &'e Event>,
    criteria: &FilterCriteria,
    ctx: &FilterContext,
) -> Vec<Event> {
    events
        .into_iter()
        .filter(|e| matches(e, criteria, ctx))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, placed};
    use chrono::Duration;

    fn utc() -> CalendarZone {
        CalendarZone::Named(chrono_tz::UTC)
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    fn sample() -> Vec<Event> {
        let mut concert = placed("1", "Jazz Night", at(2025, 4, 12, 19, 0), 10.77, 106.70);
        concert.address = "Opera House, District 1".into();
        concert.event_type = Some("music".into());
        concert.mode = Some(DeliveryMode::Offline);
        concert.ticket_type = Some(TicketType::Paid);
        concert.is_hot = true;

        let mut workshop = placed("2", "Pottery Workshop", at(2025, 4, 10, 15, 0), 10.80, 106.65);
        workshop.address = "Thao Dien".into();
        workshop.event_type = Some("workshop".into());
        workshop.mode = Some(DeliveryMode::Offline);
        workshop.ticket_type = Some(TicketType::Free);

        let mut webinar = Event::new("3", "Jazz History Webinar", at(2025, 4, 20, 12, 0));
        webinar.event_type = Some("talk".into());
        webinar.mode = Some(DeliveryMode::Online);
        webinar.ticket_type = Some(TicketType::Free);

        let mut past = placed("4", "Spring Fair", at(2025, 4, 1, 9, 0), 10.75, 106.68);
        past.event_type = Some("music".into());

        vec![concert, workshop, webinar, past]
    }

    fn now() -> DateTime<Utc> {
        at(2025, 4, 10, 8, 0)
    }

    #[test]
    fn test_default_criteria_keep_upcoming_in_order() {
        let saved = IndexSet::new();
        let ctx = FilterContext::new(now(), utc(), &saved);

        let result = apply(&sample(), &FilterCriteria::default(), &ctx);

        assert_eq!(ids(&result), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_search_matches_title_or_address_only() {
        let saved = IndexSet::new();
        let ctx = FilterContext::new(now(), utc(), &saved);

        let by_title = FilterCriteria {
            search: "JAZZ".into(),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &by_title, &ctx)), vec!["1", "3"]);

        let by_address = FilterCriteria {
            search: "thao".into(),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &by_address, &ctx)), vec!["2"]);
    }

    #[test]
    fn test_type_and_types_allow_list() {
        let saved = IndexSet::new();
        let ctx = FilterContext::new(now(), utc(), &saved);

        let single = FilterCriteria {
            event_type: "music".into(),
            status: QueryStatus::All,
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &single, &ctx)), vec!["1", "4"]);

        let many = FilterCriteria {
            types: vec!["talk".into(), "workshop".into()],
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &many, &ctx)), vec!["2", "3"]);
    }

    #[test]
    fn test_date_matches_calendar_day_in_zone() {
        let saved = IndexSet::new();
        let criteria = FilterCriteria {
            date: NaiveDate::from_ymd_opt(2025, 4, 13),
            status: QueryStatus::All,
            ..Default::default()
        };

        // 19:00 UTC on the 12th is the 13th in Ho Chi Minh City
        let hcm = CalendarZone::Named(chrono_tz::Asia::Ho_Chi_Minh);
        let ctx = FilterContext::new(now(), hcm, &saved);
        assert_eq!(ids(&apply(&sample(), &criteria, &ctx)), vec!["1"]);

        let ctx = FilterContext::new(now(), utc(), &saved);
        assert!(apply(&sample(), &criteria, &ctx).is_empty());
    }

    #[test]
    fn test_mode_hot_and_ticket() {
        let saved = IndexSet::new();
        let ctx = FilterContext::new(now(), utc(), &saved);

        let online = FilterCriteria {
            mode: Some(DeliveryMode::Online),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &online, &ctx)), vec!["3"]);

        let hot = FilterCriteria {
            hot: Some(true),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &hot, &ctx)), vec!["1"]);

        let free = FilterCriteria {
            ticket_type: Some(TicketType::Free),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &free, &ctx)), vec!["2", "3"]);
    }

    #[test]
    fn test_quick_filters() {
        let mut saved = IndexSet::new();
        saved.insert(EventId::from("3"));
        saved.insert(EventId::from("4"));
        let ctx = FilterContext::new(now(), utc(), &saved);

        let saved_only = FilterCriteria {
            quick: QuickFilter::Saved,
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &saved_only, &ctx)), vec!["3"]);

        let today = FilterCriteria {
            quick: QuickFilter::Today,
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &today, &ctx)), vec!["2"]);
    }

    #[test]
    fn test_today_event_flips_from_upcoming_to_past() {
        let saved = IndexSet::new();
        let event = placed("9", "Lunch Talk", at(2025, 4, 10, 12, 0), 10.7, 106.7);
        let upcoming = FilterCriteria::default();

        let before = FilterContext::new(at(2025, 4, 10, 11, 0), utc(), &saved);
        assert_eq!(apply([&event], &upcoming, &before).len(), 1);

        let after = FilterContext::new(at(2025, 4, 10, 12, 0) + Duration::minutes(1), utc(), &saved);
        assert!(apply([&event], &upcoming, &after).is_empty());
    }

    #[test]
    fn test_apply_is_deterministic() {
        let saved = IndexSet::new();
        let ctx = FilterContext::new(now(), utc(), &saved);
        let criteria = FilterCriteria {
            search: "a".into(),
            status: QueryStatus::All,
            ..Default::default()
        };
        let events = sample();

        assert_eq!(apply(&events, &criteria, &ctx), apply(&events, &criteria, &ctx));
    }

    #[test]
    fn test_status_change_does_not_readmit_excluded_events() {
        let saved = IndexSet::new();
        let ctx = FilterContext::new(now(), utc(), &saved);
        let events = sample();

        for status in [QueryStatus::Upcoming, QueryStatus::Past, QueryStatus::All] {
            let criteria = FilterCriteria {
                mode: Some(DeliveryMode::Online),
                status,
                ..Default::default()
            };
            let result = apply(&events, &criteria, &ctx);
            assert!(result.iter().all(|e| e.mode == Some(DeliveryMode::Online)));
        }
    }

    #[test]
    fn test_criteria_deserialize_from_json() {
        let criteria: FilterCriteria = serde_json::from_str(
            r#"{"search":"jazz","type":"music","date":"2025-04-12","status":"all","ticketType":"paid","quick":"saved"}"#,
        )
        .unwrap();

        assert_eq!(criteria.event_type, "music");
        assert_eq!(criteria.status, QueryStatus::All);
        assert_eq!(criteria.ticket_type, Some(TicketType::Paid));
        assert_eq!(criteria.quick, QuickFilter::Saved);
    }
}
