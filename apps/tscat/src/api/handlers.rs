//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        ExportResponse, HashResponse, HealthResponse, LintResponse, LookupRequest, LookupResponse,
        ReloadResponse, StatusResponse,
    },
};
use crate::cli::load_session;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Catalog statistics.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    (StatusCode::OK, Json(StatusResponse::from_session(&session)))
}

// =============================================================================
// LOOKUP HANDLER
// =============================================================================

/// Translate one string, falling back to the source.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Json(request): Json<LookupRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(LookupResponse::error(format!("Invalid lookup: {}", e))),
        );
    }

    let session = state.session.read().await;
    let lookup = session.lookup(
        &request.context,
        &request.source,
        request.comment.as_deref(),
        request.n,
    );

    (
        StatusCode::OK,
        Json(LookupResponse::new(lookup.text, lookup.found)),
    )
}

// =============================================================================
// LINT HANDLER
// =============================================================================

/// Lint the served catalog with the configured checks.
pub async fn lint_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let report = session.lint(&state.lint);
    (StatusCode::OK, Json(LintResponse::from(report)))
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Export the compiled catalog, base64 encoded.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;

    match session.compile() {
        Ok(data) => (
            StatusCode::OK,
            Json(ExportResponse::success(&data, session.checksum())),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ExportResponse::error(format!("Export failed: {}", e))),
        ),
    }
}

// =============================================================================
// HASH HANDLER
// =============================================================================

/// BLAKE3 hash of the compiled catalog.
pub async fn hash_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;

    match session.crypto_hash() {
        Ok(hash) => (
            StatusCode::OK,
            Json(HashResponse::success(hash, session.checksum())),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HashResponse::error(format!("Hash failed: {}", e))),
        ),
    }
}

// =============================================================================
// RELOAD HANDLER
// =============================================================================

/// Re-read the catalog file and swap it in.
///
/// The old catalog keeps serving until the new one has loaded; a failed
/// load leaves it in place.
pub async fn reload_handler(State(state): State<AppState>) -> impl IntoResponse {
    let Some(source) = state.source.clone() else {
        return (
            StatusCode::CONFLICT,
            Json(ReloadResponse::error("No catalog file to reload from")),
        );
    };

    let loaded = tokio::task::spawn_blocking(move || load_session(&source)).await;

    match loaded {
        Ok(Ok(fresh)) => {
            let response = ReloadResponse::success(&fresh);
            *state.session.write().await = fresh;
            tracing::info!(
                entries = response.entries,
                checksum = response.checksum,
                "Catalog reloaded"
            );
            (StatusCode::OK, Json(response))
        }
        Ok(Err(e)) => {
            tracing::warn!("Catalog reload failed: {}", e);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ReloadResponse::error(format!("Reload failed: {}", e))),
            )
        }
        Err(e) => {
            tracing::error!("Catalog reload task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ReloadResponse::error("Reload task failed")),
            )
        }
    }
}
