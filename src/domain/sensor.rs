// Sensor channel domain models
use serde::{Deserialize, Serialize};

/// The six measured channels every machine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Temperature,
    Vibration,
    Pressure,
    Rpm,
    Voltage,
    Current,
}

impl Channel {
    /// Canonical channel order, used for tables and wire layouts.
    pub const ALL: [Channel; 6] = [
        Channel::Temperature,
        Channel::Vibration,
        Channel::Pressure,
        Channel::Rpm,
        Channel::Voltage,
        Channel::Current,
    ];

    /// Parse a channel token as sent by the dashboard, e.g. `temp` or `rpm`.
    pub fn parse(token: &str) -> Option<Channel> {
        match token.trim().to_ascii_lowercase().as_str() {
            "temp" | "temperature" => Some(Channel::Temperature),
            "vibration" => Some(Channel::Vibration),
            "pressure" => Some(Channel::Pressure),
            "rpm" => Some(Channel::Rpm),
            "voltage" => Some(Channel::Voltage),
            "current" => Some(Channel::Current),
            _ => None,
        }
    }

    /// Display label for the reading card.
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Temperature => "Temperature",
            Channel::Vibration => "Vibration",
            Channel::Pressure => "Pressure",
            Channel::Rpm => "RPM",
            Channel::Voltage => "Voltage",
            Channel::Current => "Current",
        }
    }

    /// Measured quantity shown under the reading value.
    pub fn quantity(&self) -> &'static str {
        match self {
            Channel::Temperature => "Celsius",
            Channel::Vibration => "Velocity",
            Channel::Pressure => "Pressure",
            Channel::Rpm => "Revolutions",
            Channel::Voltage => "Electrical",
            Channel::Current => "Amperage",
        }
    }

    /// Fraction of the alert threshold at which a reading is flagged as a warning.
    pub fn warning_ratio(&self) -> f64 {
        match self {
            Channel::Temperature | Channel::Vibration | Channel::Pressure => 0.9,
            Channel::Rpm | Channel::Voltage | Channel::Current => 0.95,
        }
    }

    /// Round a raw sample to the channel's reported precision. Vibration is
    /// additionally floored at 0.5 mm/s.
    pub fn round_reading(&self, value: f64) -> f64 {
        match self {
            Channel::Temperature | Channel::Voltage | Channel::Current => round1(value),
            Channel::Vibration => round1(value).max(0.5),
            Channel::Pressure | Channel::Rpm => value.round(),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Drift direction shown next to a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Health of a single reading relative to its alert threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    Healthy,
    Warning,
}

/// Static reference data for one channel of one machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub current: f64,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    pub threshold: f64,
    pub trend: Trend,
}

impl ChannelSpec {
    /// A reading turns into a warning once the baseline crosses the
    /// channel's share of the alert threshold.
    pub fn status(&self, channel: Channel) -> ReadingStatus {
        if self.current > self.threshold * channel.warning_ratio() {
            ReadingStatus::Warning
        } else {
            ReadingStatus::Healthy
        }
    }
}

/// Per-channel reference data for one machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorProfile {
    pub temperature: ChannelSpec,
    pub vibration: ChannelSpec,
    pub pressure: ChannelSpec,
    pub rpm: ChannelSpec,
    pub voltage: ChannelSpec,
    pub current: ChannelSpec,
}

impl SensorProfile {
    pub fn channel(&self, channel: Channel) -> &ChannelSpec {
        match channel {
            Channel::Temperature => &self.temperature,
            Channel::Vibration => &self.vibration,
            Channel::Pressure => &self.pressure,
            Channel::Rpm => &self.rpm,
            Channel::Voltage => &self.voltage,
            Channel::Current => &self.current,
        }
    }
}
