//! # Bootstrap
//!
//! Fetches the initial revision from the remote authority.

mod authority;
mod errors;

pub use authority::{fetch_logged, HttpRevisionAuthority, RevisionAuthority, DEFAULT_AUTHORITY_URL};
pub use errors::{BootstrapError, BootstrapResult};
