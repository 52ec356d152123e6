// Monitor service - Session registry and live-update control
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::error::MonitorError;
use crate::application::machine_catalog::MachineCatalog;
use crate::application::series_generator::{SeriesGenerator, MIN_POINT_COUNT};
use crate::application::session::{MonitorSession, SessionSnapshot, DEFAULT_POINT_COUNT};
use crate::domain::machine::Machine;
use crate::domain::sensor::Channel;
use crate::domain::series::{FilteredPoint, SeriesPoint, TimeRange};

type SessionHandle = Arc<Mutex<MonitorSession>>;

/// Owns every monitor session and the ticker tasks that drive live updates.
///
/// Lock order is registry read/write first, then the session mutex. Ticker
/// tasks only ever take the session mutex.
#[derive(Clone)]
pub struct MonitorService {
    catalog: Arc<dyn MachineCatalog>,
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl MonitorService {
    pub fn new(catalog: Arc<dyn MachineCatalog>) -> MonitorService {
        MonitorService {
            catalog,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn machine(&self, machine_id: &str) -> Result<Machine, MonitorError> {
        self.catalog
            .get_machine(machine_id)
            .await?
            .ok_or_else(|| MonitorError::UnknownMachine(machine_id.to_string()))
    }

    fn session(&self, session_id: &str) -> Result<SessionHandle, MonitorError> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| MonitorError::UnknownSession(session_id.to_string()))
    }

    /// Open a session for a machine and generate its initial series.
    pub async fn create_session(
        &self,
        machine_id: &str,
        range: Option<&str>,
        point_count: Option<usize>,
        seed: Option<u64>,
    ) -> Result<SessionSnapshot, MonitorError> {
        let machine = self.machine(machine_id).await?;
        let range = TimeRange::parse_or_default(range);
        let point_count = point_count.unwrap_or(DEFAULT_POINT_COUNT).max(MIN_POINT_COUNT);
        let session_id = Uuid::new_v4().to_string();

        let session = MonitorSession::new(
            session_id.clone(),
            machine,
            range,
            point_count,
            SeriesGenerator::from_seed(seed),
        );
        let snapshot = SessionSnapshot::of(&session);

        self.sessions
            .write()
            .insert(session_id.clone(), Arc::new(Mutex::new(session)));
        tracing::debug!("opened session {} for machine {}", session_id, machine_id);
        Ok(snapshot)
    }

    pub fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot, MonitorError> {
        let session = self.session(session_id)?;
        let session = session.lock();
        Ok(SessionSnapshot::of(&session))
    }

    /// Change machine, range, or point count, then regenerate the buffer.
    ///
    /// A range change re-derives the point count from the range's native
    /// interval unless the caller pins one in the same request.
    pub async fn reconfigure(
        &self,
        session_id: &str,
        machine_id: Option<&str>,
        range: Option<&str>,
        point_count: Option<usize>,
    ) -> Result<SessionSnapshot, MonitorError> {
        let machine = match machine_id {
            Some(id) => Some(self.machine(id).await?),
            None => None,
        };

        let session = self.session(session_id)?;
        let mut session = session.lock();
        if let Some(machine) = machine {
            session.machine = machine;
        }
        if let Some(token) = range {
            session.range = TimeRange::parse_or_default(Some(token));
            let derived = session.range.default_point_count();
            session.point_count = point_count.unwrap_or(derived);
        } else if let Some(count) = point_count {
            session.point_count = count;
        }
        session.point_count = session.point_count.max(MIN_POINT_COUNT);
        session.regenerate();
        Ok(SessionSnapshot::of(&session))
    }

    /// Throw the buffer away and generate a fresh series for the current
    /// selection.
    pub fn refresh(&self, session_id: &str) -> Result<SessionSnapshot, MonitorError> {
        let session = self.session(session_id)?;
        let mut session = session.lock();
        session.regenerate();
        Ok(SessionSnapshot::of(&session))
    }

    /// Project the session buffer onto the selected channels.
    pub fn filtered_series(
        &self,
        session_id: &str,
        selected: &HashSet<Channel>,
    ) -> Result<Vec<FilteredPoint>, MonitorError> {
        let session = self.session(session_id)?;
        let session = session.lock();
        Ok(session.buffer.filtered(selected))
    }

    /// Start the live ticker for a session. Returns `false` if it was already
    /// running.
    pub fn start_live(&self, session_id: &str, period: Duration) -> Result<bool, MonitorError> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        if session.is_live() {
            return Ok(false);
        }

        let ticker_handle = handle.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately; the period starts after it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut session = ticker_handle.lock();
                if !session.is_live() {
                    break;
                }
                session.append_live();
            }
        });

        session.mark_live(task);
        tracing::debug!("live updates started for session {}", session_id);
        Ok(true)
    }

    /// Stop the live ticker. Safe to call when none is running; returns
    /// whether one was.
    pub fn stop_live(&self, session_id: &str) -> Result<bool, MonitorError> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        match session.clear_live() {
            Some(task) => {
                task.abort();
                tracing::debug!("live updates stopped for session {}", session_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Take a snapshot and subscribe to the session's live points in one
    /// step. Both happen under the same session lock, so every point is
    /// either in the snapshot or delivered to the receiver, never neither.
    pub fn snapshot_and_subscribe(
        &self,
        session_id: &str,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SeriesPoint>), MonitorError> {
        let session = self.session(session_id)?;
        let session = session.lock();
        Ok((SessionSnapshot::of(&session), session.subscribe()))
    }

    /// Drop a session, stopping its ticker first.
    pub fn remove_session(&self, session_id: &str) -> Result<(), MonitorError> {
        let removed = self
            .sessions
            .write()
            .remove(session_id)
            .ok_or_else(|| MonitorError::UnknownSession(session_id.to_string()))?;
        let mut session = removed.lock();
        if let Some(task) = session.clear_live() {
            task.abort();
        }
        tracing::debug!("closed session {}", session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::default_catalog;
    use crate::infrastructure::static_catalog::StaticCatalog;

    fn service() -> MonitorService {
        let catalog = StaticCatalog::new(default_catalog().unwrap());
        MonitorService::new(Arc::new(catalog))
    }

    #[tokio::test]
    async fn test_create_session_with_defaults() {
        let service = service();
        let snapshot = service.create_session("cnc1", None, None, None).await.unwrap();
        assert_eq!(snapshot.machine_id, "cnc1");
        assert_eq!(snapshot.range, TimeRange::Day);
        assert_eq!(snapshot.point_count, DEFAULT_POINT_COUNT);
        assert_eq!(snapshot.points.len(), DEFAULT_POINT_COUNT + 1);
        assert!(!snapshot.live);

        let fetched = service.snapshot(&snapshot.session_id).unwrap();
        assert_eq!(fetched.points, snapshot.points);
    }

    #[tokio::test]
    async fn test_create_session_for_unknown_machine_fails() {
        let err = service().create_session("reactor9", None, None, None).await.unwrap_err();
        assert!(matches!(err, MonitorError::UnknownMachine(_)));
    }

    #[tokio::test]
    async fn test_range_change_rederives_point_count() {
        let service = service();
        let created = service.create_session("cnc1", None, None, None).await.unwrap();

        let snapshot = service
            .reconfigure(&created.session_id, None, Some("1h"), None)
            .await
            .unwrap();
        assert_eq!(snapshot.range, TimeRange::Hour);
        assert_eq!(snapshot.point_count, 12);
        assert_eq!(snapshot.points.len(), 13);

        // Pinning a count alongside the range wins over the derived default.
        let snapshot = service
            .reconfigure(&created.session_id, None, Some("7d"), Some(24))
            .await
            .unwrap();
        assert_eq!(snapshot.range, TimeRange::Week);
        assert_eq!(snapshot.point_count, 24);

        // A count alone leaves the range as it was.
        let snapshot = service
            .reconfigure(&created.session_id, None, None, Some(30))
            .await
            .unwrap();
        assert_eq!(snapshot.range, TimeRange::Week);
        assert_eq!(snapshot.point_count, 30);
    }

    #[tokio::test]
    async fn test_reconfigure_to_unknown_machine_leaves_session_intact() {
        let service = service();
        let created = service.create_session("cnc1", None, None, None).await.unwrap();

        let err = service
            .reconfigure(&created.session_id, Some("reactor9"), Some("1h"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::UnknownMachine(_)));

        let snapshot = service.snapshot(&created.session_id).unwrap();
        assert_eq!(snapshot.machine_id, "cnc1");
        assert_eq!(snapshot.range, TimeRange::Day);
    }

    #[tokio::test]
    async fn test_refresh_replaces_the_buffer() {
        let service = service();
        let created = service.create_session("press2", Some("6h"), None, Some(7)).await.unwrap();
        let refreshed = service.refresh(&created.session_id).unwrap();
        assert_eq!(refreshed.points.len(), created.points.len());
        assert_ne!(refreshed.points, created.points);
    }

    #[tokio::test]
    async fn test_unknown_session_operations_fail() {
        let service = service();
        assert!(matches!(
            service.snapshot("nope"),
            Err(MonitorError::UnknownSession(_))
        ));
        assert!(matches!(
            service.refresh("nope"),
            Err(MonitorError::UnknownSession(_))
        ));
        assert!(matches!(
            service.start_live("nope", Duration::from_secs(5)),
            Err(MonitorError::UnknownSession(_))
        ));
        assert!(matches!(
            service.remove_session("nope"),
            Err(MonitorError::UnknownSession(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_ticker_appends_on_each_period() {
        let service = service();
        let created = service.create_session("cnc1", None, None, None).await.unwrap();
        let (_, mut rx) = service.snapshot_and_subscribe(&created.session_id).unwrap();

        assert!(service.start_live(&created.session_id, Duration::from_millis(50)).unwrap());
        assert!(!service.start_live(&created.session_id, Duration::from_millis(50)).unwrap());

        tokio::time::sleep(Duration::from_millis(60)).await;
        let snapshot = service.snapshot(&created.session_id).unwrap();
        assert_eq!(snapshot.points.len(), DEFAULT_POINT_COUNT + 2);
        assert!(snapshot.live);

        let streamed = rx.recv().await.unwrap();
        assert_eq!(&streamed, snapshot.points.last().unwrap());

        tokio::time::sleep(Duration::from_millis(100)).await;
        let snapshot = service.snapshot(&created.session_id).unwrap();
        assert_eq!(snapshot.points.len(), DEFAULT_POINT_COUNT + 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_and_subscribe_hands_off_without_a_gap() {
        let service = service();
        let created = service.create_session("cnc1", None, None, None).await.unwrap();
        service.start_live(&created.session_id, Duration::from_millis(50)).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        // The point appended before the handoff is in the snapshot; the next
        // one arrives on the receiver. Nothing falls in between.
        let (snapshot, mut rx) = service.snapshot_and_subscribe(&created.session_id).unwrap();
        assert_eq!(snapshot.points.len(), DEFAULT_POINT_COUNT + 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let streamed = rx.recv().await.unwrap();
        let after = service.snapshot(&created.session_id).unwrap();
        assert_eq!(after.points.len(), DEFAULT_POINT_COUNT + 3);
        assert_eq!(&streamed, after.points.last().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_live_halts_appends() {
        let service = service();
        let created = service.create_session("cnc1", None, None, None).await.unwrap();

        service.start_live(&created.session_id, Duration::from_millis(50)).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(service.stop_live(&created.session_id).unwrap());
        assert!(!service.stop_live(&created.session_id).unwrap());

        let before = service.snapshot(&created.session_id).unwrap();
        assert!(!before.live);
        tokio::time::sleep(Duration::from_millis(300)).await;
        let after = service.snapshot(&created.session_id).unwrap();
        assert_eq!(after.points.len(), before.points.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_session_stops_the_ticker() {
        let service = service();
        let created = service.create_session("cnc1", None, None, None).await.unwrap();
        service.start_live(&created.session_id, Duration::from_millis(50)).unwrap();

        service.remove_session(&created.session_id).unwrap();
        assert!(matches!(
            service.snapshot(&created.session_id),
            Err(MonitorError::UnknownSession(_))
        ));

        // The aborted ticker must not wake up again.
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let service = service();
        let first = service.create_session("cnc1", None, None, None).await.unwrap();
        let second = service.create_session("press2", Some("1h"), None, None).await.unwrap();

        service
            .reconfigure(&first.session_id, Some("cooling4"), None, None)
            .await
            .unwrap();

        let second_again = service.snapshot(&second.session_id).unwrap();
        assert_eq!(second_again.machine_id, "press2");
        assert_eq!(second_again.range, TimeRange::Hour);
    }
}
