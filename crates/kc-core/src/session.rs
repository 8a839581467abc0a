use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

#[derive(Debug)]
struct SessionState {
    active: bool,
    last_activity: Instant,
    started_at: Option<DateTime<Utc>>,

    received: u64,
    delivered: u64,
    failed: u64,
    errors: Vec<String>,
}

/// The one piece of state shared between the update handlers and the idle
/// watchdog. Every mutation goes through the inner mutex; none of the
/// methods hold it across I/O.
///
/// Counters and the error log live for exactly one session: they are zeroed
/// on `activate` and on the (manual or idle) `deactivate` that closes the
/// session, never in between.
pub struct RelaySession {
    state: Mutex<SessionState>,
}

/// Counters captured atomically when a session is closed, before the reset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub received: u64,
    pub delivered: u64,
    pub failed: u64,
    pub errors: Vec<String>,
    pub duration_seconds: i64,
}

/// Point-in-time view for `/status`. Reads only, no reset.
#[derive(Clone, Debug)]
pub struct SessionStats {
    pub active: bool,
    pub received: u64,
    pub delivered: u64,
    pub failed: u64,
    pub error_count: usize,
    pub idle_for: Duration,
}

impl RelaySession {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState {
                active: false,
                last_activity: Instant::now(),
                started_at: None,
                received: 0,
                delivered: 0,
                failed: 0,
                errors: Vec::new(),
            }),
        }
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.active
    }

    /// Start a session. Re-issuing the activation command deliberately
    /// starts a fresh one: counters and errors are zeroed even if a session
    /// was already running.
    pub async fn activate(&self) {
        let mut st = self.state.lock().await;
        st.active = true;
        st.started_at = Some(Utc::now());
        reset_counters(&mut st);
    }

    /// Close the session and return its counters, or `None` if there was no
    /// session to close (no mutation in that case).
    ///
    /// Snapshot-then-reset happens under one lock acquisition, so no
    /// concurrent caller can observe reset counters with `active` still set.
    pub async fn deactivate(&self) -> Option<SessionSummary> {
        let mut st = self.state.lock().await;
        close_session(&mut st)
    }

    /// Watchdog entry point: close the session only if it has been idle for
    /// at least `threshold`. The idle check and the snapshot share the same
    /// critical section, so an interaction landing in between either moves
    /// `last_activity` before the check or finds the session already closed.
    pub async fn deactivate_if_idle(&self, threshold: Duration) -> Option<SessionSummary> {
        let mut st = self.state.lock().await;
        if !st.active {
            return None;
        }
        if st.last_activity.elapsed() < threshold {
            return None;
        }
        close_session(&mut st)
    }

    pub async fn record_received(&self) {
        self.state.lock().await.received += 1;
    }

    pub async fn record_delivered(&self) {
        self.state.lock().await.delivered += 1;
    }

    pub async fn record_failure(&self, reason: String) {
        let mut st = self.state.lock().await;
        st.failed += 1;
        st.errors.push(reason);
    }

    /// Mark an authorized interaction. Only command/upload handlers call
    /// this; the watchdog never does.
    pub async fn touch(&self) {
        self.state.lock().await.last_activity = Instant::now();
    }

    pub async fn idle_for(&self) -> Duration {
        self.state.lock().await.last_activity.elapsed()
    }

    pub async fn stats(&self) -> SessionStats {
        let st = self.state.lock().await;
        SessionStats {
            active: st.active,
            received: st.received,
            delivered: st.delivered,
            failed: st.failed,
            error_count: st.errors.len(),
            idle_for: st.last_activity.elapsed(),
        }
    }
}

impl Default for RelaySession {
    fn default() -> Self {
        Self::new()
    }
}

fn close_session(st: &mut SessionState) -> Option<SessionSummary> {
    if !st.active {
        return None;
    }
    st.active = false;

    let duration_seconds = st
        .started_at
        .take()
        .map(|t| (Utc::now() - t).num_seconds().max(0))
        .unwrap_or(0);

    let summary = SessionSummary {
        received: st.received,
        delivered: st.delivered,
        failed: st.failed,
        errors: std::mem::take(&mut st.errors),
        duration_seconds,
    };
    reset_counters(st);
    Some(summary)
}

fn reset_counters(st: &mut SessionState) {
    st.received = 0;
    st.delivered = 0;
    st.failed = 0;
    st.errors.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_inactive_with_zero_counters() {
        let s = RelaySession::new();
        assert!(!s.is_active().await);
        let st = s.stats().await;
        assert_eq!((st.received, st.delivered, st.failed), (0, 0, 0));
    }

    #[tokio::test]
    async fn activate_zeroes_counters_even_mid_session() {
        let s = RelaySession::new();
        s.activate().await;
        s.record_received().await;
        s.record_failure("x: broke".to_string()).await;

        // Re-activation is a deliberate fresh start.
        s.activate().await;
        let st = s.stats().await;
        assert!(st.active);
        assert_eq!((st.received, st.delivered, st.failed), (0, 0, 0));
        assert_eq!(st.error_count, 0);
    }

    #[tokio::test]
    async fn deactivate_snapshots_then_resets() {
        let s = RelaySession::new();
        s.activate().await;
        s.record_received().await;
        s.record_received().await;
        s.record_delivered().await;
        s.record_failure("a.epub: download failed (timeout)".to_string())
            .await;

        let summary = s.deactivate().await.expect("session was active");
        assert_eq!(summary.received, 2);
        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors, vec!["a.epub: download failed (timeout)"]);

        assert!(!s.is_active().await);
        let st = s.stats().await;
        assert_eq!((st.received, st.delivered, st.failed), (0, 0, 0));
        assert_eq!(st.error_count, 0);
    }

    #[tokio::test]
    async fn deactivate_while_inactive_is_a_sentinel() {
        let s = RelaySession::new();
        assert!(s.deactivate().await.is_none());

        s.activate().await;
        s.record_received().await;
        assert!(s.deactivate().await.is_some());
        // Second deactivation right after: nothing left to close.
        assert!(s.deactivate().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_deactivation_respects_threshold_and_touch() {
        let threshold = Duration::from_secs(2 * 60 * 60);
        let s = RelaySession::new();
        s.activate().await;
        s.record_received().await;

        // Not idle long enough yet.
        tokio::time::advance(threshold - Duration::from_secs(1)).await;
        assert!(s.deactivate_if_idle(threshold).await.is_none());
        assert!(s.is_active().await);

        // An authorized interaction pushes the deadline out again.
        s.touch().await;
        tokio::time::advance(threshold - Duration::from_secs(1)).await;
        assert!(s.deactivate_if_idle(threshold).await.is_none());

        tokio::time::advance(Duration::from_secs(2)).await;
        let summary = s
            .deactivate_if_idle(threshold)
            .await
            .expect("idle past threshold");
        assert_eq!(summary.received, 1);
        assert!(!s.is_active().await);

        // Exactly once: the session is closed now.
        assert!(s.deactivate_if_idle(threshold).await.is_none());
    }

    #[tokio::test]
    async fn inactive_session_is_never_idle_closed() {
        let s = RelaySession::new();
        assert!(s.deactivate_if_idle(Duration::from_secs(0)).await.is_none());
    }
}
