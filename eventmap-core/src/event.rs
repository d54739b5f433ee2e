//! Event types as served by the event endpoint.
//!
//! The wire format is camelCase JSON. Only `id`, `title` and `startTime` are
//! required; everything else is optional so partially filled records from the
//! endpoint still deserialize.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::bounds::LatLng;

/// Opaque event identity, stable across fetches.
///
/// The endpoint may send ids as JSON numbers or strings; both normalize to the
/// same string form so `42` and `"42"` are the same event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        EventId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Uint(u64),
            Str(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => EventId(n.to_string()),
            RawId::Uint(n) => EventId(n.to_string()),
            RawId::Str(s) => EventId(s),
        })
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

impl From<u64> for EventId {
    fn from(n: u64) -> Self {
        EventId(n.to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an event happens at a venue or online.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    #[serde(alias = "in-person", alias = "in_person")]
    Offline,
    Online,
}

/// Ticket cost class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    Free,
    Paid,
}

/// A geolocated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub address: String,
    /// Rich text (HTML) body.
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, rename = "bannerURL", skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
    #[serde(default, rename = "orgLogoURL", skip_serializing_if = "Option::is_none")]
    pub org_logo_url: Option<String>,
    /// Category, e.g. "music" or "workshop".
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeliveryMode>,
    #[serde(default)]
    pub is_hot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<TicketType>,
}

impl Event {
    pub fn new(id: impl Into<EventId>, title: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Event {
            id: id.into(),
            title: title.into(),
            address: String::new(),
            description: String::new(),
            start_time,
            latitude: None,
            longitude: None,
            banner_url: None,
            org_name: None,
            org_logo_url: None,
            event_type: None,
            mode: None,
            is_hot: false,
            ticket_type: None,
        }
    }

    pub fn with_coordinate(mut self, lat: f64, lng: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lng);
        self
    }

    /// Map position, if the event can be placed on a map.
    ///
    /// Zero on either axis counts as missing: the endpoint uses 0 for
    /// "not geocoded".
    pub fn coordinate(&self) -> Option<LatLng> {
        let lat = self.latitude?;
        let lng = self.longitude?;
        if !lat.is_finite() || !lng.is_finite() || lat == 0.0 || lng == 0.0 {
            return None;
        }
        Some(LatLng { lat, lng })
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.start_time < now
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
