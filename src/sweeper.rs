//! Inactivity timeout enforcement.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::service::SessionService;
use crate::session::{CloseReason, Millis, Session};

/// Default inactivity timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default period between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Closes open sessions that have been idle longer than the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSweeper {
    timeout: Duration,
    interval: Duration,
}

impl TimeoutSweeper {
    /// A zero interval is bumped to one millisecond.
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Close every expired session in the snapshot.
    ///
    /// Returns the identities closed by this pass, in storage order.
    /// Sessions that are already ended are never touched again.
    pub fn close_expired(&self, sessions: &mut [Session], now: Millis) -> Vec<String> {
        sessions
            .iter_mut()
            .filter(|s| s.is_expired(now, self.timeout))
            .map(|s| {
                s.close(CloseReason::Timeout);
                s.identity.clone()
            })
            .collect()
    }

    /// Run sweeps against `service` every interval until the task is aborted.
    pub fn spawn(self, service: Arc<SessionService>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                timeout_secs = self.timeout.as_secs(),
                interval_secs = self.interval.as_secs(),
                "timeout sweeper started"
            );

            loop {
                ticker.tick().await;
                match service.sweep().await {
                    Ok(report) if !report.closed.is_empty() => {
                        tracing::info!(
                            closed = report.closed.len(),
                            failed_notices = report.failed_notices,
                            "sweep closed inactive sessions"
                        );
                    }
                    Ok(_) => tracing::trace!("sweep found nothing to close"),
                    Err(e) => tracing::error!(error = %e, "sweep aborted; retrying next tick"),
                }
            }
        })
    }
}

impl Default for TimeoutSweeper {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_SWEEP_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SupportDeskError;
    use crate::session::{SessionStorage, SessionStore};
    use crate::transport::{BroadcastTransport, InboundEvent};
    use crate::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MINUTE: Millis = 60_000;

    #[test]
    fn test_defaults() {
        let sweeper = TimeoutSweeper::default();
        assert_eq!(sweeper.timeout(), Duration::from_secs(300));
        assert_eq!(sweeper.interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_closes_only_expired_open_sessions() {
        let sweeper = TimeoutSweeper::default();
        let mut closed = Session::new("closed", 0);
        closed.close(CloseReason::Exit);

        let mut sessions = vec![
            Session::new("stale", 0),
            Session::new("fresh", 6 * MINUTE),
            closed,
            Session::new("boundary", 4 * MINUTE),
            Session::new("just_over", 4 * MINUTE - 1),
        ];

        let now = 9 * MINUTE;
        let ids = sweeper.close_expired(&mut sessions, now);

        assert_eq!(ids, vec!["stale".to_string(), "just_over".to_string()]);
        assert_eq!(sessions[0].close_reason, Some(CloseReason::Timeout));
        assert!(!sessions[1].ended);
        assert_eq!(sessions[2].close_reason, Some(CloseReason::Exit));
        assert!(!sessions[3].ended);
        assert!(sessions[4].ended);
    }

    #[test]
    fn test_exactly_timeout_is_not_expired() {
        let sweeper = TimeoutSweeper::default();
        let mut sessions = vec![Session::new("A", 0)];
        assert!(sweeper.close_expired(&mut sessions, 5 * MINUTE).is_empty());
        assert!(!sessions[0].ended);
    }

    #[test]
    fn test_second_pass_closes_nothing() {
        let sweeper = TimeoutSweeper::default();
        let mut sessions = vec![Session::new("B", 0)];

        assert_eq!(sweeper.close_expired(&mut sessions, 301_000).len(), 1);
        assert!(sweeper.close_expired(&mut sessions, 361_000).is_empty());
        assert!(sweeper.close_expired(&mut sessions, 421_000).is_empty());
    }

    #[test]
    fn test_custom_timeout() {
        let sweeper = TimeoutSweeper::new(Duration::from_secs(10), Duration::from_secs(1));
        let mut sessions = vec![Session::new("A", 0)];
        assert_eq!(sweeper.close_expired(&mut sessions, 10_001).len(), 1);
    }

    /// Storage holding one long-idle session that rejects every write.
    struct RejectingStorage {
        writes: Arc<AtomicUsize>,
    }

    impl SessionStorage for RejectingStorage {
        fn read(&self) -> Result<Vec<Session>> {
            Ok(vec![Session::new("A", 0)])
        }

        fn write(&self, _sessions: &[Session]) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(SupportDeskError::StorageUnavailable("read-only".into()))
        }

        fn describe(&self) -> String {
            "read-only".into()
        }
    }

    #[tokio::test]
    async fn test_spawned_sweeper_notifies_once() {
        let transport = BroadcastTransport::default();
        let mut rx = transport.subscribe();
        let sweeper = TimeoutSweeper::new(Duration::from_millis(100), Duration::from_millis(30));
        let service = Arc::new(
            SessionService::new(SessionStore::in_memory(), Arc::new(transport))
                .with_sweeper(sweeper),
        );

        service
            .handle_inbound(&InboundEvent::new("A", "hi"))
            .await
            .unwrap();
        rx.recv().await.unwrap();

        let handle = sweeper.spawn(Arc::clone(&service));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!handle.is_finished());
        handle.abort();

        let mut notices = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            notices.push(msg);
        }
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].identity, "A");
        assert!(notices[0].text.contains("100 milliseconds"));

        let session = service.session("A").unwrap();
        assert_eq!(session.close_reason, Some(CloseReason::Timeout));
    }

    #[tokio::test]
    async fn test_spawned_sweeper_survives_write_failures() {
        let writes = Arc::new(AtomicUsize::new(0));
        let transport = BroadcastTransport::default();
        let mut rx = transport.subscribe();
        let store = SessionStore::new(RejectingStorage {
            writes: Arc::clone(&writes),
        });
        let sweeper = TimeoutSweeper::new(Duration::from_millis(50), Duration::from_millis(30));
        let service =
            Arc::new(SessionService::new(store, Arc::new(transport)).with_sweeper(sweeper));

        let handle = sweeper.spawn(Arc::clone(&service));
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(!handle.is_finished());
        assert!(writes.load(Ordering::SeqCst) >= 3);
        // Nothing was persisted, so no notice went out.
        assert!(rx.try_recv().is_err());

        handle.abort();
    }
}
