//! # Broadcaster
//!
//! Single owner of the revision register and the connection set.
//!
//! Every mutation (join, leave, publish, pong, sweep) takes the same lock,
//! so a joining connection either receives the hello with the old value and
//! then the broadcast, or only a hello with the new value. Nothing awaits
//! while the lock is held: all sends are `try_send` onto per-connection
//! queues, so one slow client never stalls the others. Log lines are
//! written after the lock is released.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::connection::{Connection, ConnectionId, ConnectionSet, Outbound};
use super::errors::{RealtimeError, RealtimeResult};
use super::liveness::{probe_cycle, SweepReport};
use super::revision::{Revision, RevisionRegister};
use crate::observability::{Event, Logger};

/// Result of a publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Whether the register moved
    pub advanced: bool,
    /// Register value after the call
    pub revision: Revision,
    /// Connections the revision was queued for
    pub delivered: usize,
    /// Connections removed because the revision could not be queued
    pub removed: Vec<ConnectionId>,
}

impl PublishOutcome {
    fn unchanged(revision: Revision) -> Self {
        Self {
            advanced: false,
            revision,
            delivered: 0,
            removed: Vec::new(),
        }
    }
}

/// Sends that failed during one fan-out
type SendFailures = Vec<(ConnectionId, RealtimeError)>;

#[derive(Debug)]
struct Hub {
    register: RevisionRegister,
    connections: ConnectionSet,
}

impl Hub {
    /// Queue the register's value for every connection if it just moved.
    ///
    /// A connection whose queue is closed or full is removed and terminated;
    /// the others still receive the value.
    fn fan_out(&mut self, advanced: bool) -> (PublishOutcome, SendFailures) {
        let revision = self.register.get();
        if !advanced {
            return (PublishOutcome::unchanged(revision), Vec::new());
        }

        let mut outcome = PublishOutcome {
            advanced: true,
            revision,
            delivered: 0,
            removed: Vec::new(),
        };
        let mut failures = SendFailures::new();

        self.connections.for_each(|conn| {
            match conn.send(Outbound::Revision(revision)) {
                Ok(()) => outcome.delivered += 1,
                Err(e) => failures.push((conn.id().to_string(), e)),
            }
        });

        for (id, _) in &failures {
            if let Some(conn) = self.connections.remove(id) {
                conn.terminate();
            }
            outcome.removed.push(id.clone());
        }

        (outcome, failures)
    }
}

/// Revision fan-out to every open connection
#[derive(Debug)]
pub struct Broadcaster {
    hub: Mutex<Hub>,
}

impl Broadcaster {
    /// Create a broadcaster seeded with the bootstrap revision
    pub fn new(initial: Revision) -> Self {
        Self {
            hub: Mutex::new(Hub {
                register: RevisionRegister::new(initial),
                connections: ConnectionSet::new(),
            }),
        }
    }

    // Every operation leaves the hub consistent before it can panic,
    // so a poisoned lock is safe to reuse.
    fn hub(&self) -> MutexGuard<'_, Hub> {
        self.hub.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current revision
    pub fn current(&self) -> Revision {
        self.hub().register.get()
    }

    /// Number of open connections
    pub fn connection_count(&self) -> usize {
        self.hub().connections.size_hint()
    }

    /// Register a connection and queue the current revision for it.
    ///
    /// Returns the revision sent as hello.
    pub fn join(&self, conn: Connection) -> RealtimeResult<Revision> {
        let id = conn.id().to_string();
        let (current, count) = {
            let mut hub = self.hub();
            let current = hub.register.get();
            hub.connections.add(conn, current)?;
            (current, hub.connections.size_hint())
        };

        let revision = current.to_string();
        let count = count.to_string();
        Logger::event(
            Event::ConnectionOpened,
            &[
                ("connection", id.as_str()),
                ("revision", revision.as_str()),
                ("connections", count.as_str()),
            ],
        );
        Ok(current)
    }

    /// Forget a connection after its socket closed. Idempotent.
    pub fn leave(&self, id: &str) -> bool {
        let removed = self.hub().connections.remove(id).is_some();
        if removed {
            Logger::event(Event::ConnectionClosed, &[("connection", id)]);
        }
        removed
    }

    /// Record a probe response
    pub fn mark_alive(&self, id: &str) -> bool {
        self.hub().connections.mark_alive(id)
    }

    /// Advance the register and fan the new value out.
    ///
    /// A candidate that does not advance the register is a no-op.
    pub fn publish(&self, candidate: Revision) -> PublishOutcome {
        let (outcome, failures) = {
            let mut hub = self.hub();
            let advanced = hub.register.try_advance(candidate);
            hub.fan_out(advanced)
        };

        log_publish(&candidate.to_string(), &outcome, &failures);
        outcome
    }

    /// Publish a raw candidate.
    ///
    /// A malformed candidate is rejected before the register is touched.
    pub fn publish_str(&self, candidate: &str) -> RealtimeResult<PublishOutcome> {
        let fanned = {
            let mut hub = self.hub();
            hub.register
                .try_advance_str(candidate)
                .map(|advanced| hub.fan_out(advanced))
        };

        match fanned {
            Ok((outcome, failures)) => {
                log_publish(candidate, &outcome, &failures);
                Ok(outcome)
            }
            Err(e) => {
                Logger::event(Event::RevisionMalformed, &[("candidate", candidate)]);
                Err(e)
            }
        }
    }

    /// Run one liveness probe cycle
    pub fn sweep(&self) -> SweepReport {
        let report = probe_cycle(&mut self.hub().connections);
        report.log();
        report
    }

    /// Liveness flag of a connection, if present
    pub fn is_alive(&self, id: &str) -> Option<bool> {
        self.hub().connections.is_alive(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.hub().connections.contains(id)
    }
}

fn log_publish(candidate: &str, outcome: &PublishOutcome, failures: &SendFailures) {
    for (id, e) in failures {
        let reason = e.to_string();
        Logger::event(
            Event::SendFailed,
            &[("connection", id.as_str()), ("reason", reason.as_str())],
        );
    }

    let revision = outcome.revision.to_string();
    if outcome.advanced {
        let delivered = outcome.delivered.to_string();
        let removed = outcome.removed.len().to_string();
        Logger::event(
            Event::RevisionAdvanced,
            &[
                ("revision", revision.as_str()),
                ("delivered", delivered.as_str()),
                ("removed", removed.as_str()),
            ],
        );
    } else {
        Logger::event(
            Event::RevisionStale,
            &[("candidate", candidate), ("revision", revision.as_str())],
        );
    }
}
