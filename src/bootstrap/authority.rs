//! # Revision Authority
//!
//! Remote source of truth for the current revision. Queried once at
//! startup to seed the register, and on demand by the status endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::errors::{BootstrapError, BootstrapResult};
use crate::observability::{Event, Logger};
use crate::realtime::Revision;

/// Default authority base URL
pub const DEFAULT_AUTHORITY_URL: &str = "https://sso.runetek.io/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can report the latest revision
#[async_trait]
pub trait RevisionAuthority: Send + Sync {
    /// Fetch the latest revision
    async fn fetch_revision(&self) -> BootstrapResult<Revision>;
}

/// Authority reached over HTTP at `{base_url}/revision`
#[derive(Debug, Clone)]
pub struct HttpRevisionAuthority {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct RevisionBody {
    revision: Value,
}

impl HttpRevisionAuthority {
    pub fn new(base_url: &str) -> BootstrapResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BootstrapError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/revision", base_url.trim_end_matches('/')),
        })
    }

    /// Full URL that is queried
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RevisionAuthority for HttpRevisionAuthority {
    async fn fetch_revision(&self) -> BootstrapResult<Revision> {
        let request_error = |e: reqwest::Error| BootstrapError::Request {
            url: self.endpoint.clone(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BootstrapError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body: RevisionBody = response
            .json()
            .await
            .map_err(|e| BootstrapError::InvalidBody(e.to_string()))?;

        parse_revision_value(&body.revision)
    }
}

/// Accepts a JSON number or a numeric string
pub(crate) fn parse_revision_value(value: &Value) -> BootstrapResult<Revision> {
    match value {
        Value::Number(n) => n.as_u64().map(Revision::new).ok_or_else(|| {
            BootstrapError::InvalidBody(format!("revision {} is not a non-negative integer", n))
        }),
        Value::String(s) => s
            .parse::<Revision>()
            .map_err(|e| BootstrapError::InvalidBody(e.to_string())),
        other => Err(BootstrapError::InvalidBody(format!(
            "revision has unexpected type: {}",
            other
        ))),
    }
}

/// Fetch the revision, logging the outcome
pub async fn fetch_logged(authority: &dyn RevisionAuthority) -> BootstrapResult<Revision> {
    match authority.fetch_revision().await {
        Ok(revision) => {
            let value = revision.to_string();
            Logger::event(Event::AuthorityFetched, &[("revision", value.as_str())]);
            Ok(revision)
        }
        Err(e) => {
            let error = e.to_string();
            Logger::event(Event::AuthorityFetchFailed, &[("error", error.as_str())]);
            Err(e)
        }
    }
}
