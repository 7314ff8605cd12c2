//! # Connection Set
//!
//! Tracks every open real-time connection together with its liveness flag.
//!
//! Connections are addressed by id. The socket task owns the receiving half
//! of a bounded outbound queue; the set owns the sending half. Dropping a
//! connection from the set closes its queue, which ends the socket task.

use std::collections::HashMap;

use tokio::sync::mpsc;
use uuid::Uuid;

use super::errors::{RealtimeError, RealtimeResult};
use super::revision::Revision;

/// Connection identifier
pub type ConnectionId = String;

/// Frames queued for a socket task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    /// Text frame carrying a revision
    Revision(Revision),
    /// Empty transport-level ping
    Ping,
    /// Drop the socket without a close handshake
    Terminate,
}

/// Sending half of a connection's outbound queue
pub type OutboundSender = mpsc::Sender<Outbound>;

/// Receiving half of a connection's outbound queue
pub type OutboundReceiver = mpsc::Receiver<Outbound>;

/// Create an outbound queue for a new connection
pub fn outbound_queue(capacity: usize) -> (OutboundSender, OutboundReceiver) {
    mpsc::channel(capacity.max(1))
}

/// One subscriber connection
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    sender: OutboundSender,
    /// Responded since the last probe
    alive: bool,
}

impl Connection {
    /// Wrap the sending half of a socket's queue under a fresh id
    pub fn new(sender: OutboundSender) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), sender)
    }

    /// Wrap a queue under an explicit id
    pub fn with_id(id: impl Into<ConnectionId>, sender: OutboundSender) -> Self {
        Self {
            id: id.into(),
            sender,
            alive: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn set_alive(&mut self, alive: bool) {
        self.alive = alive;
    }

    /// Queue a frame without waiting
    pub fn send(&self, frame: Outbound) -> RealtimeResult<()> {
        self.sender.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => RealtimeError::QueueFull(self.id.clone()),
            mpsc::error::TrySendError::Closed(_) => {
                RealtimeError::ConnectionClosed(self.id.clone())
            }
        })
    }

    /// Hard-close the connection.
    ///
    /// Best effort: if the queue is full or closed the socket task still
    /// exits once the queue is dropped here.
    pub fn terminate(self) {
        let _ = self.sender.try_send(Outbound::Terminate);
    }
}

/// Set of open connections
#[derive(Debug, Default)]
pub struct ConnectionSet {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a connection and send it the current revision.
    ///
    /// The connection starts alive. If the hello cannot be queued the
    /// connection is not inserted.
    pub fn add(&mut self, mut conn: Connection, current: Revision) -> RealtimeResult<()> {
        conn.set_alive(true);
        conn.send(Outbound::Revision(current))?;
        self.connections.insert(conn.id.clone(), conn);
        Ok(())
    }

    /// Remove a connection. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Connection> {
        self.connections.remove(id)
    }

    /// Visit every connection
    pub fn for_each<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Connection),
    {
        for conn in self.connections.values_mut() {
            f(conn);
        }
    }

    /// Number of connections currently in the set
    pub fn size_hint(&self) -> usize {
        self.connections.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    /// Mark a connection as having answered a probe
    pub fn mark_alive(&mut self, id: &str) -> bool {
        match self.connections.get_mut(id) {
            Some(conn) => {
                conn.set_alive(true);
                true
            }
            None => false,
        }
    }

    pub fn is_alive(&self, id: &str) -> Option<bool> {
        self.connections.get(id).map(Connection::is_alive)
    }
}
