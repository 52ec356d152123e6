// Monitor session - one dashboard view's selection, buffer, and live state
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::application::series_generator::SeriesGenerator;
use crate::domain::machine::Machine;
use crate::domain::series::{SeriesBuffer, SeriesPoint, TimeRange};

/// Fixed period between live appends.
pub const LIVE_INTERVAL: Duration = Duration::from_secs(5);

/// Point count used when a new session does not ask for one.
pub const DEFAULT_POINT_COUNT: usize = 50;

/// Capacity of the per-session broadcast channel feeding live streams.
const LIVE_CHANNEL_CAPACITY: usize = 100;

/// One dashboard view: the selected machine and range, the generated buffer,
/// and the live-update state.
///
/// Sessions are driven through `MonitorService`, which serializes access with
/// a mutex; concurrent reconfigurations therefore resolve last-writer-wins.
pub struct MonitorSession {
    pub id: String,
    pub machine: Machine,
    pub range: TimeRange,
    pub point_count: usize,
    pub buffer: SeriesBuffer,
    generator: SeriesGenerator,
    live: bool,
    live_task: Option<JoinHandle<()>>,
    live_tx: broadcast::Sender<SeriesPoint>,
}

impl MonitorSession {
    pub fn new(
        id: String,
        machine: Machine,
        range: TimeRange,
        point_count: usize,
        mut generator: SeriesGenerator,
    ) -> MonitorSession {
        let buffer = generator.generate_series(&machine.sensors, range, point_count);
        let (live_tx, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        MonitorSession {
            id,
            machine,
            range,
            point_count,
            buffer,
            generator,
            live: false,
            live_task: None,
            live_tx,
        }
    }

    /// Replace the buffer wholesale for the current selection.
    pub fn regenerate(&mut self) {
        self.buffer = self
            .generator
            .generate_series(&self.machine.sensors, self.range, self.point_count);
        tracing::debug!(
            "regenerated {} points for machine {}",
            self.buffer.len(),
            self.machine.id
        );
    }

    /// Append one live reading and fan it out to stream subscribers.
    pub fn append_live(&mut self) -> SeriesPoint {
        let point = self.generator.next_live_point(self.buffer.last());
        self.buffer.push_live(point.clone());
        let _ = self.live_tx.send(point.clone());
        point
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SeriesPoint> {
        self.live_tx.subscribe()
    }

    pub(crate) fn mark_live(&mut self, task: JoinHandle<()>) {
        self.live = true;
        self.live_task = Some(task);
    }

    /// Clear the live flag and hand back the ticker task, if one was running.
    pub(crate) fn clear_live(&mut self) -> Option<JoinHandle<()>> {
        self.live = false;
        self.live_task.take()
    }
}

/// Immutable copy of a session's state, safe to hand to the view layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub machine_id: String,
    pub machine_name: String,
    pub range: TimeRange,
    pub point_count: usize,
    pub live: bool,
    pub points: Vec<SeriesPoint>,
}

impl SessionSnapshot {
    pub fn of(session: &MonitorSession) -> SessionSnapshot {
        SessionSnapshot {
            session_id: session.id.clone(),
            machine_id: session.machine.id.clone(),
            machine_name: session.machine.name.clone(),
            range: session.range,
            point_count: session.point_count,
            live: session.live,
            points: session.buffer.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::machine::MachineStatus;
    use crate::domain::sensor::{ChannelSpec, SensorProfile, Trend};

    fn channel(current: f64, unit: &str) -> ChannelSpec {
        ChannelSpec {
            current,
            unit: unit.to_string(),
            min: 0.0,
            max: 10_000.0,
            threshold: 10_000.0,
            trend: Trend::Stable,
        }
    }

    fn machine() -> Machine {
        Machine {
            id: "cnc1".to_string(),
            name: "CNC Machine #1".to_string(),
            status: MachineStatus::Healthy,
            online: true,
            sensors: SensorProfile {
                temperature: channel(58.0, "°C"),
                vibration: channel(3.2, "mm/s"),
                pressure: channel(130.0, "PSI"),
                rpm: channel(2950.0, "RPM"),
                voltage: channel(422.0, "V"),
                current: channel(45.0, "A"),
            },
        }
    }

    fn session() -> MonitorSession {
        MonitorSession::new(
            "s-1".to_string(),
            machine(),
            TimeRange::Day,
            DEFAULT_POINT_COUNT,
            SeriesGenerator::with_seed(42),
        )
    }

    #[test]
    fn test_new_session_fills_buffer() {
        let session = session();
        assert_eq!(session.buffer.len(), DEFAULT_POINT_COUNT + 1);
        assert!(!session.is_live());
    }

    #[test]
    fn test_regenerate_follows_selection() {
        let mut session = session();
        session.range = TimeRange::Hour;
        session.point_count = 12;
        session.regenerate();
        assert_eq!(session.buffer.len(), 13);
    }

    #[test]
    fn test_append_live_fans_out_to_subscribers() {
        let mut session = session();
        let mut rx = session.subscribe();

        let appended = session.append_live();
        assert_eq!(session.buffer.len(), DEFAULT_POINT_COUNT + 2);
        assert_eq!(session.buffer.last(), Some(&appended));
        assert_eq!(rx.try_recv().unwrap(), appended);
    }

    #[tokio::test]
    async fn test_clear_live_hands_back_the_task_once() {
        let mut session = session();
        session.mark_live(tokio::spawn(async {}));
        assert!(session.is_live());

        assert!(session.clear_live().is_some());
        assert!(!session.is_live());
        assert!(session.clear_live().is_none());
    }

    #[test]
    fn test_snapshot_uses_dashboard_field_names() {
        let snapshot = SessionSnapshot::of(&session());
        let json = serde_json::to_value(&snapshot).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("sessionId"));
        assert!(object.contains_key("machineId"));
        assert!(object.contains_key("machineName"));
        assert!(object.contains_key("pointCount"));
        assert_eq!(object.get("range").unwrap(), "24h");
        assert_eq!(
            object.get("points").unwrap().as_array().unwrap().len(),
            DEFAULT_POINT_COUNT + 1
        );
    }
}
