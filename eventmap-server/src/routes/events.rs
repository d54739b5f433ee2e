//! Event query endpoint

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use eventmap_core::{EventQuery, QueryResponse};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(list_events))
}

/// Raw query string; `bounds` is a JSON object.
#[derive(Deserialize)]
pub struct EventsParams {
    pub bounds: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
}

/// GET /events - Events matching bounds, search text and status
async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventsParams>,
) -> Result<Json<QueryResponse>, AppError> {
    let query = EventQuery::from_params(
        params.bounds.as_deref(),
        params.search.as_deref(),
        params.status.as_deref(),
    )?;

    let events = state.events()?;
    let matched = query.apply(&events, Utc::now());

    debug!(
        available = events.len(),
        matched = matched.len(),
        status = %query.status,
        "Answered event query"
    );

    Ok(Json(QueryResponse::ok(matched)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const DATA: &str = r#"{
        "events": [
            {"id": 1, "title": "Jazz Night", "address": "Opera House", "startTime": "2099-04-12T19:00:00Z", "latitude": 10.5, "longitude": 106.5},
            {"id": "b2", "title": "Pottery Workshop", "description": "Bring your jazz records", "startTime": "2099-05-01T09:00:00Z", "latitude": 21.0, "longitude": 105.8},
            {"id": 3, "title": "Spring Fair", "startTime": "2000-01-01T09:00:00Z", "latitude": 10.6, "longitude": 106.6},
            {"id": 4, "title": "Webinar", "startTime": "2099-06-01T12:00:00Z", "mode": "online"}
        ]
    }"#;

    // {"north":11,"south":10,"east":107,"west":106}
    const SAIGON_BOUNDS: &str =
        "%7B%22north%22%3A11%2C%22south%22%3A10%2C%22east%22%3A107%2C%22west%22%3A106%7D";

    fn app(dir: &TempDir, contents: Option<&str>) -> Router {
        let path = dir.path().join("events.json");
        if let Some(contents) = contents {
            std::fs::write(&path, contents).unwrap();
        }
        router().with_state(AppState::new(path))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn ids(body: &Value) -> Vec<&str> {
        body["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_defaults_to_upcoming() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get(app(&dir, Some(DATA)), "/events").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["total"], 3);
        assert_eq!(ids(&body), vec!["1", "b2", "4"]);
    }

    #[tokio::test]
    async fn test_bounds_require_coordinates_inside() {
        let dir = TempDir::new().unwrap();
        let uri = format!("/events?status=all&bounds={SAIGON_BOUNDS}");
        let (_, body) = get(app(&dir, Some(DATA)), &uri).await;

        assert_eq!(ids(&body), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_search_covers_description() {
        let dir = TempDir::new().unwrap();
        let (_, body) = get(app(&dir, Some(DATA)), "/events?search=JAZZ").await;

        assert_eq!(ids(&body), vec!["1", "b2"]);
    }

    #[tokio::test]
    async fn test_past_status() {
        let dir = TempDir::new().unwrap();
        let (_, body) = get(app(&dir, Some(DATA)), "/events?status=past").await;

        assert_eq!(ids(&body), vec!["3"]);
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn test_missing_data_file_is_generic_failure() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get(app(&dir, None), "/events").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            serde_json::json!({"success": false, "error": "Failed to load events"})
        );
    }

    #[tokio::test]
    async fn test_malformed_bounds_is_generic_failure() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get(app(&dir, Some(DATA)), "/events?bounds=nope").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }
}
