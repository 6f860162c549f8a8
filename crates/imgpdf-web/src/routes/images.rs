//! Image list routes - reorder, remove and serve uploaded images.
//!
//! Every edit returns the re-rendered list fragment.

use axum::{
    Form,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use super::MoveForm;
use crate::helpers::{CoreResultExt, OptionExt, ResultExt, RouteResult};
use crate::state::{AppState, Session};
use crate::templates::ImageListTemplate;

fn parse_image_id(image_id: &str) -> RouteResult<Uuid> {
    Uuid::parse_str(image_id).ok().or_not_found("Image not found")
}

/// Apply an edit to a session's list and render the result.
async fn edit_list<F>(
    state: &AppState,
    session_id: String,
    edit: F,
) -> RouteResult<ImageListTemplate>
where
    F: FnOnce(&mut Session) -> imgpdf_core::Result<()>,
{
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    session
        .with_session_mut(|s| {
            edit(s).or_status()?;
            Ok(ImageListTemplate::new(session_id.clone(), &s.images))
        })
        .await
        .or_not_found("Session not found")?
}

/// Move an image to a 1-based page number.
pub async fn move_image(
    State(state): State<Arc<AppState>>,
    Path((session_id, image_id)): Path<(String, String)>,
    Form(form): Form<MoveForm>,
) -> RouteResult<ImageListTemplate> {
    let id = parse_image_id(&image_id)?;
    if form.to == 0 {
        return Err((StatusCode::BAD_REQUEST, "Pages start at 1".to_string()));
    }
    edit_list(&state, session_id, |s| s.images.move_to(id, form.to - 1)).await
}

pub async fn move_image_up(
    State(state): State<Arc<AppState>>,
    Path((session_id, image_id)): Path<(String, String)>,
) -> RouteResult<ImageListTemplate> {
    let id = parse_image_id(&image_id)?;
    edit_list(&state, session_id, |s| s.images.move_up(id)).await
}

pub async fn move_image_down(
    State(state): State<Arc<AppState>>,
    Path((session_id, image_id)): Path<(String, String)>,
) -> RouteResult<ImageListTemplate> {
    let id = parse_image_id(&image_id)?;
    edit_list(&state, session_id, |s| s.images.move_down(id)).await
}

pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    Path((session_id, image_id)): Path<(String, String)>,
) -> RouteResult<ImageListTemplate> {
    let id = parse_image_id(&image_id)?;
    edit_list(&state, session_id, |s| s.images.remove(id).map(|_| ())).await
}

/// Serve the original bytes of an uploaded image (thumbnails).
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path((session_id, image_id)): Path<(String, String)>,
) -> RouteResult<Response> {
    let id = parse_image_id(&image_id)?;
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    // Bytes are shared, so this clone is cheap
    let (bytes, mime) = session
        .with_session(|s| {
            s.images
                .get(id)
                .map(|r| (r.bytes_shared(), r.mime_type()))
        })
        .await
        .flatten()
        .or_not_found("Image not found")?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime)
        // Records never change once uploaded
        .header(header::CACHE_CONTROL, "private, max-age=3600, immutable")
        .body(Body::from(bytes))
        .or_internal_error()
}
