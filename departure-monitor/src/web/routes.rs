//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::dvb::Upstream;
use crate::error::DepartureError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<U>(state: AppState<U>) -> Router
where
    U: Upstream + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/departures", get(departures::<U>))
        .route("/stops", get(stops::<U>))
        .route("/stops/:stop/departures", get(stop_departures::<U>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Merged departures for all configured stops, soonest first.
async fn departures<U: Upstream + 'static>(
    State(state): State<AppState<U>>,
) -> Result<Json<DeparturesResponse>, AppError> {
    let departures = state.monitor.departures().await?;

    Ok(Json(DeparturesResponse {
        departures: departures.iter().map(DepartureResult::from).collect(),
    }))
}

/// Names of the configured stops.
async fn stops<U: Upstream + 'static>(State(state): State<AppState<U>>) -> Json<StopsResponse> {
    Json(StopsResponse {
        stops: state
            .monitor
            .stops()
            .iter()
            .map(|s| s.name().to_string())
            .collect(),
    })
}

/// Departures for one configured stop.
async fn stop_departures<U: Upstream + 'static>(
    State(state): State<AppState<U>>,
    Path(name): Path<String>,
) -> Result<Json<StopDeparturesResponse>, AppError> {
    let stop = state
        .monitor
        .stop(&name)
        .ok_or_else(|| AppError::NotFound {
            message: format!("Unknown stop: {name}"),
        })?;

    let result = state.monitor.stop_departures(stop, Utc::now()).await?;

    Ok(Json(StopDeparturesResponse::new(stop.name(), &result)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    BadGateway { message: String },
    Unavailable { message: String },
}

impl From<DepartureError> for AppError {
    fn from(e: DepartureError) -> Self {
        match e {
            DepartureError::MalformedResponse(_) => AppError::BadGateway {
                message: e.to_string(),
            },
            DepartureError::ServiceUnavailable(_) => AppError::Unavailable {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), %message, "request failed");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::Utc;
    use tower::ServiceExt;

    use crate::domain::Stop;
    use crate::dvb::{FetchError, ScriptedUpstream};
    use crate::filter::RouteFilter;
    use crate::monitor::{DepartureMonitor, MonitorConfig};

    fn app(upstream: ScriptedUpstream) -> Router {
        let stops = vec![
            Stop::new("Hauptbahnhof", RouteFilter::new(|route| route != "11")),
            Stop::unfiltered("Postplatz"),
        ];
        let monitor = DepartureMonitor::new(upstream, stops, MonitorConfig::default());
        create_router(AppState::new(monitor))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_ok() {
        let response = app(ScriptedUpstream::new("VVO"))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn merged_departures() {
        let upstream = ScriptedUpstream::new("VVO");
        upstream.respond(
            "Hauptbahnhof",
            "[('76','Pillnitz','5'),('11','Bühlau','2')]",
            Utc::now(),
        );
        upstream.respond("Postplatz", "[('1','Prohlis','3')]", Utc::now());

        let (status, json) = get_json(app(upstream), "/departures").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({"departures": [
                {"route": "1", "destination": "Prohlis", "minutes": 3},
                {"route": "76", "destination": "Pillnitz", "minutes": 5},
            ]})
        );
    }

    #[tokio::test]
    async fn unavailable_is_503() {
        let upstream = ScriptedUpstream::new("VVO");
        upstream.respond("Hauptbahnhof", "[]", Utc::now());
        upstream.fail("Postplatz", FetchError::Timeout);

        let (status, json) = get_json(app(upstream), "/departures").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "service not available: VVO");
    }

    #[tokio::test]
    async fn malformed_is_502() {
        let upstream = ScriptedUpstream::new("VVO");
        upstream.respond("Postplatz", "<html>", Utc::now());

        let (status, _) = get_json(app(upstream), "/stops/Postplatz/departures").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn single_stop() {
        let upstream = ScriptedUpstream::new("VVO");
        upstream.respond("Postplatz", "[('1','Prohlis','3')]", Utc::now());

        let (status, json) = get_json(app(upstream), "/stops/Postplatz/departures").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stop"], "Postplatz");
        assert_eq!(json["served"], "fetched");
        assert_eq!(json["departures"][0]["destination"], "Prohlis");
    }

    #[tokio::test]
    async fn unknown_stop_is_404() {
        let (status, json) =
            get_json(app(ScriptedUpstream::new("VVO")), "/stops/Nirgendwo/departures").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Unknown stop: Nirgendwo");
    }

    #[tokio::test]
    async fn lists_stops() {
        let (status, json) = get_json(app(ScriptedUpstream::new("VVO")), "/stops").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"stops": ["Hauptbahnhof", "Postplatz"]}));
    }
}
