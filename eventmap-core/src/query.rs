//! Query contract with the event endpoint.
//!
//! The endpoint accepts `GET /events?bounds=<json>&search=<text>&status=<status>`
//! and answers `{"success": true, "total": N, "events": [...]}`. The same
//! filtering rules are implemented here so the server and tests share them.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bounds::Bounds;
use crate::error::{EventMapError, EventMapResult};
use crate::event::Event;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Time-based status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    /// Start time at or after now.
    #[default]
    Upcoming,
    /// Start time before now.
    Past,
    All,
}

impl QueryStatus {
    /// Parse a query parameter. Unrecognized values disable status filtering.
    pub fn from_param(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => QueryStatus::Upcoming,
            "past" => QueryStatus::Past,
            _ => QueryStatus::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Upcoming => "upcoming",
            QueryStatus::Past => "past",
            QueryStatus::All => "all",
        }
    }

    pub fn admits(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            QueryStatus::Upcoming => start >= now,
            QueryStatus::Past => start < now,
            QueryStatus::All => true,
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request to the event endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub bounds: Option<Bounds>,
    pub search: Option<String>,
    pub status: QueryStatus,
}

impl EventQuery {
    /// Build from raw query parameters. `bounds` is a JSON object.
    pub fn from_params(
        bounds: Option<&str>,
        search: Option<&str>,
        status: Option<&str>,
    ) -> EventMapResult<Self> {
        let bounds = match bounds {
            Some(raw) => Some(
                serde_json::from_str::<Bounds>(raw)
                    .map_err(|e| EventMapError::InvalidBounds(e.to_string()))?,
            ),
            None => None,
        };

        Ok(EventQuery {
            bounds,
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            status: status.map(QueryStatus::from_param).unwrap_or_default(),
        })
    }

    /// Encode as query parameters for the HTTP endpoint.
    pub fn to_params(&self) -> EventMapResult<Vec<(&'static str, String)>> {
        let mut params = Vec::new();
        if let Some(bounds) = &self.bounds {
            params.push(("bounds", serde_json::to_string(bounds)?));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        params.push(("status", self.status.as_str().to_string()));
        Ok(params)
    }

    /// Endpoint-side predicate.
    ///
    /// Bounds require both coordinates, edges inclusive. Search is a
    /// case-insensitive substring match on title, address and description.
    pub fn matches(&self, event: &Event, now: DateTime<Utc>) -> bool {
        if !self.status.admits(event.start_time, now) {
            return false;
        }

        if let Some(bounds) = &self.bounds {
            match event.coordinate() {
                Some(point) if bounds.contains_point(point) => {}
                _ => return false,
            }
        }

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = [&event.title, &event.address, &event.description]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        true
    }

    /// Filter a collection, keeping its order.
    pub fn apply<'a>(
        &self,
        events: impl IntoIterator<Item = &'a Event>,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        events
            .into_iter()
            .filter(|e| self.matches(e, now))
            .cloned()
            .collect()
    }
}

/// Response body of the event endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    pub fn ok(events: Vec<Event>) -> Self {
        QueryResponse {
            success: true,
            total: events.len(),
            events,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        QueryResponse {
            success: false,
            total: 0,
            events: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Anything the loader can ask for events.
#[async_trait(?Send)]
pub trait EventSource {
    async fn fetch(&self, query: &EventQuery) -> EventMapResult<Vec<Event>>;
}

/// Event endpoint reached over HTTP.
pub struct HttpEventSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEventSource {
    pub fn new(endpoint: impl Into<String>) -> EventMapResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| EventMapError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpEventSource {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl EventSource for HttpEventSource {
    async fn fetch(&self, query: &EventQuery) -> EventMapResult<Vec<Event>> {
        let params = query.to_params()?;
        debug!(endpoint = %self.endpoint, ?params, "Fetching events");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EventMapError::FetchTimeout(FETCH_TIMEOUT.as_secs())
                } else {
                    EventMapError::Fetch(e.to_string())
                }
            })?;

        let status = response.status();
        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| EventMapError::Fetch(format!("Failed to parse response: {}", e)))?;

        if !status.is_success() || !body.success {
            return Err(EventMapError::Fetch(body.error.unwrap_or_else(|| {
                format!("Endpoint answered with status {}", status.as_u16())
            })));
        }

        Ok(body.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap()
    }

    fn sample() -> Vec<Event> {
        let mut market = Event::new("1", "Night Market", now() + ChronoDuration::days(1))
            .with_coordinate(10.77, 106.70);
        market.address = "Ben Thanh, District 1".into();

        let mut talk = Event::new("2", "Rust Meetup", now() + ChronoDuration::days(3))
            .with_coordinate(21.02, 105.83);
        talk.description = "<p>Talks about async MARKET design</p>".into();

        let old = Event::new("3", "Old Fair", now() - ChronoDuration::days(2))
            .with_coordinate(10.78, 106.71);

        let online = Event::new("4", "Online Market Webinar", now() + ChronoDuration::hours(2));

        vec![market, talk, old, online]
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_default_status_is_upcoming() {
        let query = EventQuery::from_params(None, None, None).unwrap();
        assert_eq!(query.status, QueryStatus::Upcoming);
        assert_eq!(ids(&query.apply(&sample(), now())), vec!["1", "2", "4"]);
    }

    #[test]
    fn test_bounds_require_coordinates() {
        let query = EventQuery::from_params(
            Some(r#"{"north":11,"south":10,"east":107,"west":106}"#),
            None,
            Some("all"),
        )
        .unwrap();

        assert_eq!(ids(&query.apply(&sample(), now())), vec!["1", "3"]);
    }

    #[test]
    fn test_search_covers_description_case_insensitively() {
        let query = EventQuery::from_params(None, Some("market"), Some("upcoming")).unwrap();
        assert_eq!(ids(&query.apply(&sample(), now())), vec!["1", "2", "4"]);
    }

    #[test]
    fn test_past_status() {
        let query = EventQuery::from_params(None, None, Some("past")).unwrap();
        assert_eq!(ids(&query.apply(&sample(), now())), vec!["3"]);
    }

    #[test]
    fn test_unknown_status_disables_filter() {
        let query = EventQuery::from_params(None, None, Some("whenever")).unwrap();
        assert_eq!(query.status, QueryStatus::All);
    }

    #[test]
    fn test_malformed_bounds_is_rejected() {
        assert!(EventQuery::from_params(Some("{north:1}"), None, None).is_err());
    }

    #[test]
    fn test_params_encoding() {
        let query = EventQuery {
            bounds: Some(Bounds::new(11.0, 10.0, 107.0, 106.0).unwrap()),
            search: Some("jazz".into()),
            status: QueryStatus::Past,
        };

        let params = query.to_params().unwrap();
        assert_eq!(params[0].0, "bounds");
        let bounds: Bounds = serde_json::from_str(&params[0].1).unwrap();
        assert_eq!(bounds, query.bounds.unwrap());
        assert_eq!(params[1], ("search", "jazz".to_string()));
        assert_eq!(params[2], ("status", "past".to_string()));
    }

    #[test]
    fn test_failed_response_shape() {
        let body = serde_json::to_value(QueryResponse::failed("Failed to load events")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Failed to load events");
    }

    // --- HttpEventSource ---

    type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

    /// Serve a fixed answer on a random local port and record every query string.
    async fn serve(status: StatusCode, body: serde_json::Value) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let recorded = seen.clone();
        let app = Router::new().route(
            "/events",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let recorded = recorded.clone();
                let body = body.clone();
                async move {
                    recorded.lock().unwrap().push(params);
                    (status, Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        (format!("http://{}/events", addr), seen)
    }

    #[tokio::test]
    async fn test_http_source_returns_events_and_sends_params() {
        let body = serde_json::to_value(QueryResponse::ok(sample())).unwrap();
        let (endpoint, seen) = serve(StatusCode::OK, body).await;
        let source = HttpEventSource::new(endpoint).unwrap();

        let query = EventQuery {
            bounds: Some(Bounds::new(11.0, 10.0, 107.0, 106.0).unwrap()),
            search: Some("night market".into()),
            status: QueryStatus::Past,
        };
        let events = source.fetch(&query).await.unwrap();

        assert_eq!(ids(&events), vec!["1", "2", "3", "4"]);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["search"], "night market");
        assert_eq!(seen[0]["status"], "past");
        let bounds: Bounds = serde_json::from_str(&seen[0]["bounds"]).unwrap();
        assert_eq!(bounds, query.bounds.unwrap());
    }

    #[tokio::test]
    async fn test_http_source_failure_body_is_fetch_error() {
        let body = serde_json::json!({"success": false, "error": "Failed to load events"});
        let (endpoint, _seen) = serve(StatusCode::INTERNAL_SERVER_ERROR, body).await;
        let source = HttpEventSource::new(endpoint).unwrap();

        let err = source.fetch(&EventQuery::default()).await.unwrap_err();
        assert!(matches!(err, EventMapError::Fetch(ref msg) if msg == "Failed to load events"));
    }

    #[tokio::test]
    async fn test_http_source_unsuccessful_ok_is_fetch_error() {
        let body = serde_json::json!({"success": false});
        let (endpoint, _seen) = serve(StatusCode::OK, body).await;
        let source = HttpEventSource::new(endpoint).unwrap();

        let err = source.fetch(&EventQuery::default()).await.unwrap_err();
        assert!(matches!(err, EventMapError::Fetch(_)));
    }
}
