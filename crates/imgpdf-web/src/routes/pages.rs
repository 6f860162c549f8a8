//! Page routes - full HTML page renders.

use axum::extract::{Path, State};
use std::sync::Arc;

use crate::helpers::{OptionExt, RouteResult};
use crate::state::AppState;
use crate::templates::{IndexTemplate, SessionTemplate};

/// Landing page with upload form.
pub async fn index() -> IndexTemplate {
    IndexTemplate
}

/// Ordered image list for a session.
pub async fn view_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<SessionTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let sheet = state.config.sheet.to_string();
    let filename = state.config.output_filename.clone();

    session
        .with_session(|s| SessionTemplate::new(session_id.clone(), &s.images, sheet, filename))
        .await
        .or_not_found("Session not found")
}
