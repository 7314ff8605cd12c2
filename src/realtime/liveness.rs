//! # Liveness Monitor
//!
//! Fixed-period probe-and-evict sweep.
//!
//! Each cycle first removes connections still marked suspect from the
//! previous cycle, then marks the survivors suspect and queues a ping for
//! each. A pong arriving before the next cycle flips the flag back.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::broadcaster::Broadcaster;
use super::connection::{ConnectionId, ConnectionSet, Outbound};
use super::errors::RealtimeError;
use crate::observability::{Event, Logger};

/// Default probe period
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Result of one probe cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Connections removed for missing the previous probe
    pub terminated: Vec<ConnectionId>,
    /// Connections a probe was attempted for
    pub probed: usize,
    /// Probes that could not be queued
    pub probe_failures: Vec<(ConnectionId, RealtimeError)>,
}

impl SweepReport {
    /// Write the cycle's events. Called with the hub lock released.
    pub(crate) fn log(&self) {
        for id in &self.terminated {
            Logger::event(Event::ConnectionTerminated, &[("connection", id.as_str())]);
        }

        for (id, e) in &self.probe_failures {
            let reason = e.to_string();
            Logger::event(
                Event::ProbeFailed,
                &[("connection", id.as_str()), ("reason", reason.as_str())],
            );
        }

        let probed = self.probed.to_string();
        let terminated = self.terminated.len().to_string();
        Logger::event(
            Event::SweepComplete,
            &[("probed", probed.as_str()), ("terminated", terminated.as_str())],
        );
    }
}

/// Run one probe cycle against `connections`
pub(crate) fn probe_cycle(connections: &mut ConnectionSet) -> SweepReport {
    let mut report = SweepReport::default();

    connections.for_each(|conn| {
        if !conn.is_alive() {
            report.terminated.push(conn.id().to_string());
        }
    });

    for id in &report.terminated {
        if let Some(conn) = connections.remove(id) {
            conn.terminate();
        }
    }

    connections.for_each(|conn| {
        conn.set_alive(false);
        report.probed += 1;
        // A failed probe leaves the connection suspect; the next cycle evicts it.
        if let Err(e) = conn.send(Outbound::Ping) {
            report.probe_failures.push((conn.id().to_string(), e));
        }
    });

    report
}

/// Periodic liveness sweep over a broadcaster's connections
pub struct LivenessMonitor {
    broadcaster: Arc<Broadcaster>,
    period: Duration,
}

impl LivenessMonitor {
    /// Create a monitor with a custom period
    pub fn with_period(broadcaster: Arc<Broadcaster>, period: Duration) -> Self {
        Self {
            broadcaster,
            period,
        }
    }

    /// Start sweeping on a background task
    pub fn spawn(self) -> LivenessHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(self.run(shutdown_rx));
        LivenessHandle { shutdown_tx, task }
    }

    async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        // First cycle one period after start, not immediately.
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.broadcaster.sweep();
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    }
}

/// Handle to a running monitor
pub struct LivenessHandle {
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl LivenessHandle {
    /// Stop sweeping and wait for the task to exit
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::connection::{outbound_queue, Connection, OutboundReceiver};
    use crate::realtime::revision::Revision;

    fn connect(b: &Broadcaster, id: &str) -> OutboundReceiver {
        let (tx, mut rx) = outbound_queue(8);
        b.join(Connection::with_id(id, tx)).unwrap();
        rx.try_recv().unwrap();
        rx
    }

    #[test]
    fn test_first_cycle_marks_suspect_and_pings() {
        let b = Broadcaster::new(Revision::new(1));
        let mut rx = connect(&b, "a");

        let report = b.sweep();

        assert_eq!(report.probed, 1);
        assert!(report.terminated.is_empty());
        assert_eq!(b.is_alive("a"), Some(false));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Ping);
    }

    #[test]
    fn test_unresponsive_connection_evicted_on_second_cycle() {
        let b = Broadcaster::new(Revision::new(1));
        let mut rx = connect(&b, "a");

        b.sweep();
        let report = b.sweep();

        assert_eq!(report.terminated, vec!["a".to_string()]);
        assert!(!b.contains("a"));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Ping);
        assert_eq!(rx.try_recv().unwrap(), Outbound::Terminate);
    }

    #[test]
    fn test_responsive_connection_survives() {
        let b = Broadcaster::new(Revision::new(1));
        let _rx = connect(&b, "a");

        for _ in 0..5 {
            b.sweep();
            assert!(b.mark_alive("a"));
        }

        assert!(b.contains("a"));
        assert_eq!(b.is_alive("a"), Some(true));
    }

    #[test]
    fn test_probe_failure_does_not_abort_cycle() {
        let b = Broadcaster::new(Revision::new(1));
        let broken = connect(&b, "broken");
        drop(broken);
        let mut ok = connect(&b, "ok");

        let report = b.sweep();

        assert_eq!(report.probed, 2);
        assert_eq!(report.probe_failures.len(), 1);
        assert_eq!(report.probe_failures[0].0, "broken");
        assert!(b.contains("broken"));
        assert_eq!(ok.try_recv().unwrap(), Outbound::Ping);

        let report = b.sweep();
        assert_eq!(report.terminated, vec!["broken".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_evicts_after_two_periods() {
        let b = Arc::new(Broadcaster::new(Revision::new(1)));
        let _silent = connect(&b, "silent");

        let handle = LivenessMonitor::with_period(Arc::clone(&b), Duration::from_secs(30)).spawn();

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(b.contains("silent"));
        assert_eq!(b.is_alive("silent"), Some(false));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!b.contains("silent"));

        handle.stop().await;
    }
}
