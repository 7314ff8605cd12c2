//! Revision Status Route
//!
//! Asks the authority for its latest revision on every call. The cached
//! register is not consulted.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use super::ErrorResponse;
use crate::bootstrap::{fetch_logged, RevisionAuthority};

/// Revision status state
pub struct RevisionState {
    pub authority: Arc<dyn RevisionAuthority>,
}

#[derive(Debug, Serialize)]
pub struct RevisionResponse {
    pub revision: u64,
}

/// Create revision status routes
pub fn revision_routes(state: Arc<RevisionState>) -> Router {
    Router::new()
        .route("/revision", get(revision_handler))
        .with_state(state)
}

async fn revision_handler(
    State(state): State<Arc<RevisionState>>,
) -> Result<Json<RevisionResponse>, (StatusCode, Json<ErrorResponse>)> {
    match fetch_logged(state.authority.as_ref()).await {
        Ok(revision) => Ok(Json(RevisionResponse {
            revision: revision.value(),
        })),
        Err(e) => Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
                code: 502,
            }),
        )),
    }
}
