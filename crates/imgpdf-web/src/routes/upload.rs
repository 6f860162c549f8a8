//! Upload routes - image file upload handling.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use axum_extra::extract::Multipart;
use imgpdf_core::util::has_image_extension;
use imgpdf_core::{ImageRecord, ImageSequence};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::helpers::{OptionExt, ResultExt, RouteResult};
use crate::state::AppState;
use crate::templates::ImageListTemplate;

/// Whether an uploaded file looks like a JPEG or PNG by name or declared type.
fn is_accepted_upload(filename: &str, content_type: Option<&str>) -> bool {
    let declared = content_type
        .is_some_and(|ct| matches!(ct, "image/jpeg" | "image/jpg" | "image/png"));
    let guessed = mime_guess::from_path(filename)
        .first()
        .is_some_and(|m| matches!(m.essence_str(), "image/jpeg" | "image/png"));

    declared || guessed || has_image_extension(filename)
}

/// Read every `file` field into an image record, in upload order.
///
/// Files that are not JPEG or PNG are skipped with a warning.
async fn read_images(multipart: &mut Multipart) -> RouteResult<Vec<ImageRecord>> {
    let mut records = Vec::new();

    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().map(str::to_string);
        if !is_accepted_upload(&filename, content_type.as_deref()) {
            warn!("Skipping upload {}: not a JPEG or PNG file", filename);
            continue;
        }

        let data = field.bytes().await.or_bad_request()?;
        if data.is_empty() {
            continue;
        }

        match ImageRecord::new(filename.clone(), data) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping upload {}: {}", filename, e),
        }
    }

    // Resolve sizes up front so the list can show them; failures surface at generation
    for (position, record) in records.iter().enumerate() {
        if let Err(e) = record.resolve_dimensions_async(position).await {
            debug!("Could not read size of {}: {}", record.name(), e);
        }
    }

    Ok(records)
}

/// Upload images - creates a session and redirects to it (POST-Redirect-GET pattern).
///
/// Supports both HTMX requests (HX-Redirect header) and standard form submissions
/// (HTTP 303 See Other redirect) for graceful degradation without JavaScript.
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let records = read_images(&mut multipart).await?;
    if records.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No JPEG or PNG images uploaded".to_string(),
        ));
    }

    let count = records.len();
    let session_id = state
        .create_session(records.into_iter().collect::<ImageSequence>())
        .await;
    info!("Created session {} with {} images", session_id, count);

    let redirect_url = format!("/session/{session_id}");

    // Check if this is an HTMX request
    if headers.get("HX-Request").is_some() {
        // HX-Redirect tells HTMX to do a full page navigation
        Response::builder()
            .status(StatusCode::OK)
            .header("HX-Redirect", redirect_url)
            .body(Body::empty())
            .or_internal_error()
    } else {
        // Standard HTTP redirect for non-JS clients (303 See Other for POST-Redirect-GET)
        Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header(header::LOCATION, redirect_url)
            .body(Body::empty())
            .or_internal_error()
    }
}

/// Append more images to an existing session, returning the updated list.
pub async fn add_images(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> RouteResult<ImageListTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    // Read the body before taking the session lock
    let records = read_images(&mut multipart).await?;
    let count = records.len();

    let template = session
        .with_session_mut(|s| {
            for record in records {
                s.images.push(record);
            }
            ImageListTemplate::new(session_id.clone(), &s.images)
        })
        .await
        .or_not_found("Session not found")?;

    info!("Added {} images to session {}", count, session_id);
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_uploads() {
        assert!(is_accepted_upload("scan.PNG", None));
        assert!(is_accepted_upload("photo", Some("image/jpeg")));
        assert!(is_accepted_upload("a.jpeg", Some("application/octet-stream")));
        assert!(!is_accepted_upload("notes.txt", Some("text/plain")));
        assert!(!is_accepted_upload("anim.gif", None));
    }
}
