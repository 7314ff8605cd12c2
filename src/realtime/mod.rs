//! # Real-Time Revision Broadcast
//!
//! Pushes the latest known revision to every connected client.
//!
//! ## Architecture
//!
//! - **Revision**: monotonic register, only moves forward
//! - **Connection**: open client connections with a liveness flag
//! - **Broadcaster**: single lock around register + connections; join, publish, leave
//! - **Liveness**: fixed-period ping sweep that evicts silent connections

pub mod broadcaster;
pub mod connection;
pub mod errors;
pub mod liveness;
pub mod revision;

pub use broadcaster::{Broadcaster, PublishOutcome};
pub use connection::{outbound_queue, Connection, ConnectionId, ConnectionSet, Outbound};
pub use errors::{RealtimeError, RealtimeResult};
pub use liveness::{LivenessHandle, LivenessMonitor, SweepReport, DEFAULT_PROBE_INTERVAL};
pub use revision::{Revision, RevisionRegister};
