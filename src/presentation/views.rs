// Mappers from domain models to the dashboard's JSON shapes
use serde::Serialize;

use crate::domain::machine::{Machine, MachineStatus};
use crate::domain::sensor::{Channel, ReadingStatus, Trend};

/// Machine selector entry.
#[derive(Debug, Clone, Serialize)]
pub struct MachineSummary {
    pub id: String,
    pub name: String,
    pub status: MachineStatus,
    pub online: bool,
}

pub fn machine_summary(machine: &Machine) -> MachineSummary {
    MachineSummary {
        id: machine.id.clone(),
        name: machine.name.clone(),
        status: machine.status,
        online: machine.online,
    }
}

/// One reading card: the formatted value plus the bounds the dashboard shows
/// under it.
#[derive(Debug, Clone, Serialize)]
pub struct ReadingView {
    pub sensor: &'static str,
    pub value: String,
    pub quantity: &'static str,
    pub status: ReadingStatus,
    pub threshold: String,
    pub min: String,
    pub max: String,
    pub trend: Trend,
}

pub fn reading_views(machine: &Machine) -> Vec<ReadingView> {
    Channel::ALL
        .iter()
        .map(|&channel| {
            let spec = machine.sensors.channel(channel);
            ReadingView {
                sensor: channel.label(),
                value: format_reading(spec.current, &spec.unit),
                quantity: channel.quantity(),
                status: spec.status(channel),
                threshold: format_reading(spec.threshold, &spec.unit),
                min: format_reading(spec.min, &spec.unit),
                max: format_reading(spec.max, &spec.unit),
                trend: spec.trend,
            }
        })
        .collect()
}

/// Live-update state after a start/stop request.
#[derive(Debug, Clone, Serialize)]
pub struct LiveState {
    pub live: bool,
}

/// `58°C`, `3.2mm/s` - value and unit concatenated the way the cards render
/// them.
fn format_reading(value: f64, unit: &str) -> String {
    format!("{}{}", value, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sensor::{ChannelSpec, SensorProfile};

    fn channel(current: f64, unit: &str, threshold: f64) -> ChannelSpec {
        ChannelSpec {
            current,
            unit: unit.to_string(),
            min: 0.0,
            max: 10_000.0,
            threshold,
            trend: Trend::Increasing,
        }
    }

    fn press() -> Machine {
        Machine {
            id: "press2".to_string(),
            name: "Hydraulic Press".to_string(),
            status: MachineStatus::Warning,
            online: true,
            sensors: SensorProfile {
                temperature: channel(67.0, "°C", 75.0),
                vibration: channel(4.1, "mm/s", 4.5),
                pressure: channel(180.0, "PSI", 190.0),
                rpm: channel(1200.0, "RPM", 1300.0),
                voltage: channel(415.0, "V", 430.0),
                current: channel(62.0, "A", 65.0),
            },
        }
    }

    #[test]
    fn test_reading_views_cover_all_channels_in_order() {
        let views = reading_views(&press());
        let sensors: Vec<&str> = views.iter().map(|v| v.sensor).collect();
        assert_eq!(
            sensors,
            ["Temperature", "Vibration", "Pressure", "RPM", "Voltage", "Current"]
        );
    }

    #[test]
    fn test_reading_value_concatenates_unit() {
        let views = reading_views(&press());
        assert_eq!(views[0].value, "67°C");
        assert_eq!(views[1].value, "4.1mm/s");
        assert_eq!(views[1].threshold, "4.5mm/s");
        assert_eq!(views[0].quantity, "Celsius");
    }

    #[test]
    fn test_reading_status_against_thresholds() {
        let views = reading_views(&press());
        // 67 < 75 * 0.9 stays healthy; 4.1 > 4.5 * 0.9 warns.
        assert_eq!(views[0].status, ReadingStatus::Healthy);
        assert_eq!(views[1].status, ReadingStatus::Warning);
        // 62 > 65 * 0.95 warns on the tighter electrical ratio.
        assert_eq!(views[5].status, ReadingStatus::Warning);
    }

    #[test]
    fn test_machine_summary_drops_the_profile() {
        let summary = machine_summary(&press());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 4);
        assert_eq!(json.get("status").unwrap(), "warning");
    }
}
