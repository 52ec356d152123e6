// Export encoding for series downloads (CSV and JSON, optional Brotli)
use async_compression::tokio::bufread::BrotliEncoder;
use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::domain::series::{SeriesPoint, TimeRange};

/// Column layout of the CSV download, matching the dashboard's raw-data table.
pub const CSV_HEADER: &str =
    "Timestamp,Temperature (°C),Vibration (mm/s),Pressure (PSI),RPM,Voltage (V),Current (A),Machine";

/// Render a series as CSV, one row per sample, oldest first.
///
/// Timestamps are RFC 3339 with millisecond precision; readings keep their
/// minimal decimal form (whole numbers carry no trailing `.0`).
pub fn series_csv(points: &[SeriesPoint], machine_name: &str) -> String {
    let mut lines = Vec::with_capacity(points.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for point in points {
        lines.push(format!(
            "{},{},{},{},{},{},{},{}",
            point.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            point.temperature,
            point.vibration,
            point.pressure,
            point.rpm,
            point.voltage,
            point.current,
            machine_name,
        ));
    }
    lines.join("\n")
}

/// Pretty-printed JSON export document for one session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExport<'a> {
    pub timestamp: DateTime<Utc>,
    pub machine: &'a str,
    pub range: TimeRange,
    pub point_count: usize,
    pub readings: &'a [SeriesPoint],
}

pub fn session_json(export: &SessionExport<'_>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(export)
}

/// Download name for the CSV export: `sensor_data_<machine>_<date>.csv`.
/// The date is the UTC calendar day, like the exported timestamps.
pub fn csv_filename(machine_name: &str) -> String {
    format!(
        "sensor_data_{}_{}.csv",
        sanitize(machine_name),
        Utc::now().format("%Y-%m-%d")
    )
}

/// Download name for the JSON export: `machine_<id>_export_<date>.json`.
pub fn json_filename(machine_id: &str) -> String {
    format!(
        "machine_{}_export_{}.json",
        machine_id,
        Utc::now().format("%Y-%m-%d")
    )
}

/// Whitespace runs become underscores so the machine name survives as a
/// filename.
fn sanitize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Build an attachment response around an export, compressing with Brotli
/// when the client accepts it.
pub async fn download_response(
    content: Vec<u8>,
    content_type: &'static str,
    filename: &str,
    compress: bool,
) -> Result<Response<Body>, StatusCode> {
    let raw_len = content.len();

    let (body_bytes, content_encoding) = if compress {
        let cursor = std::io::Cursor::new(content);
        let mut encoder = BrotliEncoder::new(cursor);
        let mut compressed = Vec::new();
        encoder.read_to_end(&mut compressed).await.map_err(|e| {
            eprintln!("Brotli compression error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        tracing::debug!("compressed {} from {} to {} bytes", filename, raw_len, compressed.len());
        (compressed, Some("br"))
    } else {
        (content, None)
    };

    let mut response_builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .header(
            header::CONTENT_LENGTH,
            HeaderValue::from_str(&body_bytes.len().to_string()).unwrap(),
        );

    if let Some(encoding) = content_encoding {
        response_builder = response_builder.header(header::CONTENT_ENCODING, encoding);
    }

    response_builder.body(Body::from(body_bytes)).map_err(|e| {
        eprintln!("Response build error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
