// HTTP request handlers
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::application::error::MonitorError;
use crate::application::series_generator::{SeriesGenerator, MIN_POINT_COUNT};
use crate::application::session::{SessionSnapshot, LIVE_INTERVAL};
use crate::domain::sensor::Channel;
use crate::domain::series::TimeRange;
use crate::infrastructure::export;
use crate::presentation::app_state::AppState;
use crate::presentation::views;

/// Upper bound on caller-supplied point counts; the dashboard itself never
/// asks for more than 100.
const MAX_POINT_COUNT: usize = 1_000;

#[derive(Deserialize)]
pub struct SeriesQuery {
    pub range: Option<String>,
    pub points: Option<usize>,
    pub seed: Option<u64>,
    pub channels: Option<String>,
}

#[derive(Deserialize)]
pub struct ChannelsQuery {
    pub channels: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub machine_id: String,
    pub range: Option<String>,
    pub points: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    pub machine_id: Option<String>,
    pub range: Option<String>,
    pub points: Option<usize>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = match &self {
            MonitorError::UnknownMachine(_) | MonitorError::UnknownSession(_) => {
                StatusCode::NOT_FOUND
            }
            MonitorError::Catalog(e) => {
                tracing::error!("catalog failure: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all machines
pub async fn list_machines(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<views::MachineSummary>>, MonitorError> {
    let machines = state.machine_service.list_machines().await?;
    Ok(Json(machines.iter().map(views::machine_summary).collect()))
}

/// Current reading cards for one machine
pub async fn machine_readings(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<views::ReadingView>>, MonitorError> {
    let machine = state.machine_service.machine(&id).await?;
    Ok(Json(views::reading_views(&machine)))
}

/// One-shot series for a machine, without opening a session
pub async fn machine_series(
    Path(id): Path<String>,
    Query(query): Query<SeriesQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, MonitorError> {
    let machine = state.machine_service.machine(&id).await?;
    let range = TimeRange::parse_or_default(query.range.as_deref());
    let point_count = query
        .points
        .unwrap_or_else(|| range.default_point_count())
        .clamp(MIN_POINT_COUNT, MAX_POINT_COUNT);

    let mut generator = SeriesGenerator::from_seed(query.seed);
    let buffer = generator.generate_series(&machine.sensors, range, point_count);

    match parse_channels(query.channels.as_deref()) {
        Some(selected) => Ok(Json(buffer.filtered(&selected)).into_response()),
        None => Ok(Json(buffer.to_vec()).into_response()),
    }
}

/// Open a monitor session and generate its initial series
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionSnapshot>), MonitorError> {
    let points = request.points.map(|p| p.clamp(MIN_POINT_COUNT, MAX_POINT_COUNT));
    let snapshot = state
        .monitor_service
        .create_session(&request.machine_id, request.range.as_deref(), points, request.seed)
        .await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Current state and buffer of a session
pub async fn get_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionSnapshot>, MonitorError> {
    Ok(Json(state.monitor_service.snapshot(&id)?))
}

/// Change a session's machine, range, or point count
pub async fn update_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateSessionRequest>,
) -> Result<Json<SessionSnapshot>, MonitorError> {
    let points = request.points.map(|p| p.clamp(MIN_POINT_COUNT, MAX_POINT_COUNT));
    let snapshot = state
        .monitor_service
        .reconfigure(&id, request.machine_id.as_deref(), request.range.as_deref(), points)
        .await?;
    Ok(Json(snapshot))
}

/// Close a session and stop its live updates
pub async fn delete_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, MonitorError> {
    state.monitor_service.remove_session(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Session series projected onto the selected channels
pub async fn session_series(
    Path(id): Path<String>,
    Query(query): Query<ChannelsQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, MonitorError> {
    let selected = parse_channels(query.channels.as_deref())
        .unwrap_or_else(|| Channel::ALL.into_iter().collect());
    let points = state.monitor_service.filtered_series(&id, &selected)?;
    Ok(Json(points).into_response())
}

/// Regenerate the session series for the current selection
pub async fn refresh_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionSnapshot>, MonitorError> {
    Ok(Json(state.monitor_service.refresh(&id)?))
}

/// Start the 5-second live ticker for a session
pub async fn start_live(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<views::LiveState>, MonitorError> {
    state.monitor_service.start_live(&id, LIVE_INTERVAL)?;
    Ok(Json(views::LiveState { live: true }))
}

/// Stop the live ticker for a session
pub async fn stop_live(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<views::LiveState>, MonitorError> {
    state.monitor_service.stop_live(&id)?;
    Ok(Json(views::LiveState { live: false }))
}

/// Stream a session's live readings as Server-Sent Events
pub async fn stream_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, MonitorError> {
    let (snapshot, mut rx) = state.monitor_service.snapshot_and_subscribe(&id)?;

    let stream = async_stream::stream! {
        // Current buffer first, so a client can render before the next tick.
        if let Ok(event) = Event::default().event("snapshot").json_data(&snapshot) {
            yield Ok(event);
        }
        loop {
            match rx.recv().await {
                Ok(point) => {
                    if let Ok(event) = Event::default().event("reading").json_data(&point) {
                        yield Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("stream for session {} lagged by {} points", id, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Download the session buffer as CSV
pub async fn export_session_csv(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, MonitorError> {
    let snapshot = state.monitor_service.snapshot(&id)?;
    let csv = export::series_csv(&snapshot.points, &snapshot.machine_name);
    let filename = export::csv_filename(&snapshot.machine_name);

    let compress = accepts_brotli(&headers);
    match export::download_response(csv.into_bytes(), "text/csv; charset=utf-8", &filename, compress)
        .await
    {
        Ok(response) => Ok(response),
        Err(status) => Ok(status.into_response()),
    }
}

/// Download the session buffer as a JSON document
pub async fn export_session_json(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, MonitorError> {
    let snapshot = state.monitor_service.snapshot(&id)?;
    let document = export::SessionExport {
        timestamp: Utc::now(),
        machine: &snapshot.machine_name,
        range: snapshot.range,
        point_count: snapshot.point_count,
        readings: &snapshot.points,
    };
    let json = match export::session_json(&document) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("export serialization error: {}", e);
            return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
    };
    let filename = export::json_filename(&snapshot.machine_id);

    let compress = accepts_brotli(&headers);
    match export::download_response(json.into_bytes(), "application/json", &filename, compress).await
    {
        Ok(response) => Ok(response),
        Err(status) => Ok(status.into_response()),
    }
}

/// Check if the client accepts Brotli compression
fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get("accept-encoding")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

/// `channels=temp,rpm` style selection. `None` means no filter was requested;
/// unknown tokens are dropped.
fn parse_channels(raw: Option<&str>) -> Option<HashSet<Channel>> {
    raw.map(|list| list.split(',').filter_map(Channel::parse).collect())
}
