//! Generate route - builds and downloads the PDF.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::helpers::{CoreResultExt, OptionExt, ResultExt, RouteResult};
use crate::state::AppState;

/// Generate the session's PDF from a snapshot of the current order.
///
/// Edits made while the document is being built do not affect it. A second
/// request during generation gets 409 Conflict; an undecodable image gets
/// 400 and leaves the list untouched.
pub async fn generate_pdf(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    // Take the snapshot inside the lock (fast), build outside it
    let (snapshot, assembler) = session
        .with_session(|s| (s.images.snapshot(), Arc::clone(&s.assembler)))
        .await
        .or_not_found("Session not found")?;

    let generated = assembler
        .generate_async(snapshot, None)
        .await
        .or_status()
        .inspect_err(|(status, msg)| {
            warn!("Generation for session {} failed ({}): {}", session_id, status, msg);
        })?
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "No images to convert".to_string()))?;

    info!(
        "Session {}: generated {} pages ({} bytes)",
        session_id,
        generated.page_count(),
        generated.bytes.len()
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", generated.filename),
        )
        .body(Body::from(generated.bytes))
        .or_internal_error()
}
