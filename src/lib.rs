//! revcast - pushes revision updates to connected WebSocket clients
//!
//! A monotonic revision register is seeded from a remote authority at
//! startup. An authorized webhook advances it; every advance is fanned out
//! to all open WebSocket connections, and a periodic ping sweep evicts
//! connections that stop answering.

pub mod bootstrap;
pub mod cli;
pub mod http_server;
pub mod observability;
pub mod realtime;
