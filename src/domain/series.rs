// Time series domain models
use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::sensor::Channel;

/// Selectable history window for the sensor charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl TimeRange {
    /// Parse a range token from the dashboard. Unknown or missing tokens
    /// degrade to the 24h default rather than failing the request.
    pub fn parse_or_default(token: Option<&str>) -> TimeRange {
        match token {
            Some("1h") => TimeRange::Hour,
            Some("6h") => TimeRange::SixHours,
            Some("24h") => TimeRange::Day,
            Some("7d") => TimeRange::Week,
            Some("30d") => TimeRange::Month,
            _ => TimeRange::Day,
        }
    }

    /// Span of history the range covers.
    pub fn window(&self) -> Duration {
        match self {
            TimeRange::Hour => Duration::hours(1),
            TimeRange::SixHours => Duration::hours(6),
            TimeRange::Day => Duration::hours(24),
            TimeRange::Week => Duration::days(7),
            TimeRange::Month => Duration::days(30),
        }
    }

    /// Native sample spacing for the range.
    pub fn interval_minutes(&self) -> i64 {
        match self {
            TimeRange::Hour => 5,
            TimeRange::SixHours => 10,
            TimeRange::Day => 30,
            TimeRange::Week => 120,
            TimeRange::Month => 1440,
        }
    }

    /// Samples that tile the window at the native interval.
    pub fn default_point_count(&self) -> usize {
        (self.window().num_minutes() / self.interval_minutes()) as usize
    }

    /// Longer ranges sample on day granularity, so their noise is halved to
    /// keep the curve readable.
    pub fn noise_factor(&self) -> f64 {
        match self {
            TimeRange::Week | TimeRange::Month => 0.5,
            _ => 1.0,
        }
    }

    /// Axis label for a sample taken at the given local time.
    pub fn format_label(&self, at: DateTime<Local>) -> String {
        match self {
            TimeRange::Month => at.format("%b %-d").to_string(),
            TimeRange::Week => at.format("%a %H").to_string(),
            _ => at.format("%H:%M").to_string(),
        }
    }
}

/// One synthetic sample across all six channels.
///
/// `time` is the preformatted chart label in server-local time; `timestamp`
/// is the exact UTC instant the sample represents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub vibration: f64,
    pub pressure: f64,
    pub rpm: f64,
    pub voltage: f64,
    pub current: f64,
}

impl SeriesPoint {
    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Vibration => self.vibration,
            Channel::Pressure => self.pressure,
            Channel::Rpm => self.rpm,
            Channel::Voltage => self.voltage,
            Channel::Current => self.current,
        }
    }
}

/// Chart-facing projection of a point: the label plus only the selected
/// channels. Deselected channels are absent, not zeroed.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredPoint {
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
}

impl FilteredPoint {
    fn project(point: &SeriesPoint, selected: &HashSet<Channel>) -> FilteredPoint {
        let pick = |channel: Channel| selected.contains(&channel).then(|| point.value(channel));
        FilteredPoint {
            time: point.time.clone(),
            temperature: pick(Channel::Temperature),
            vibration: pick(Channel::Vibration),
            pressure: pick(Channel::Pressure),
            rpm: pick(Channel::Rpm),
            voltage: pick(Channel::Voltage),
            current: pick(Channel::Current),
        }
    }
}

/// Ordered series held for one machine/range selection.
///
/// Regeneration replaces the whole buffer. Live appends go through
/// [`SeriesBuffer::push_live`], which evicts from the front once the buffer
/// holds `LIVE_CAPACITY` points.
#[derive(Debug, Clone, Default)]
pub struct SeriesBuffer {
    points: VecDeque<SeriesPoint>,
}

impl SeriesBuffer {
    /// Hard cap on buffer growth while live updates run.
    pub const LIVE_CAPACITY: usize = 100;

    pub fn from_points(points: Vec<SeriesPoint>) -> SeriesBuffer {
        SeriesBuffer {
            points: points.into(),
        }
    }

    /// Append a live point, evicting the oldest entries beyond the cap.
    pub fn push_live(&mut self, point: SeriesPoint) {
        self.points.push_back(point);
        while self.points.len() > Self::LIVE_CAPACITY {
            self.points.pop_front();
        }
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn to_vec(&self) -> Vec<SeriesPoint> {
        self.points.iter().cloned().collect()
    }

    /// Project the buffer onto the selected channels without touching the
    /// stored points.
    pub fn filtered(&self, selected: &HashSet<Channel>) -> Vec<FilteredPoint> {
        self.points
            .iter()
            .map(|point| FilteredPoint::project(point, selected))
            .collect()
    }
}
