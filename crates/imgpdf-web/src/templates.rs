//! Askama templates for HTMX responses.
//!
//! ## HTMX Patterns Used
//!
//! - **Fragment swaps**: every list edit returns `partials/image_list.html`,
//!   swapped into `#image-list` with `hx-swap="outerHTML"`
//!
//! - **Disabled Elements**: `hx-disabled-elt` prevents double-clicks during requests
//!
//! ## Template Structure
//!
//! - `base.html` - Common layout with CSS/JS
//! - `index.html` - Landing page with upload form
//! - `session.html` - Ordered image list with add and generate controls
//! - `partials/` - Reusable components (image list)

use askama::Template;
use askama_web::WebTemplate;
use imgpdf_core::{ImageRecord, ImageSequence, Orientation};

// =============================================================================
// View Models
// =============================================================================

/// One row of the image list.
pub struct ImageItem {
    pub id: String,
    pub name: String,
    /// 1-based page number this image will land on
    pub page: usize,
    /// `"800x600"` once dimensions are known, empty before
    pub size: String,
    /// `"landscape"` or `"portrait"` once dimensions are known
    pub orientation: &'static str,
    pub is_first: bool,
    pub is_last: bool,
}

impl ImageItem {
    fn from_record(record: &ImageRecord, index: usize, len: usize) -> Self {
        let dims = record.cached_dimensions();
        Self {
            id: record.id().to_string(),
            name: record.name().to_string(),
            page: index + 1,
            size: dims.map(|d| d.to_string()).unwrap_or_default(),
            orientation: dims.map_or("", |d| match Orientation::for_image(d) {
                Orientation::Landscape => "landscape",
                Orientation::Portrait => "portrait",
            }),
            is_first: index == 0,
            is_last: index + 1 == len,
        }
    }
}

fn items(images: &ImageSequence) -> Vec<ImageItem> {
    let len = images.len();
    images
        .iter()
        .enumerate()
        .map(|(i, record)| ImageItem::from_record(record, i, len))
        .collect()
}

// =============================================================================
// Full Page Templates
// =============================================================================

/// Landing page with upload form.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate;

/// Session page: ordered list plus controls.
#[derive(Template, WebTemplate)]
#[template(path = "session.html")]
pub struct SessionTemplate {
    pub session_id: String,
    pub images: Vec<ImageItem>,
    pub sheet: String,
    pub filename: String,
}

impl SessionTemplate {
    pub fn new(session_id: String, images: &ImageSequence, sheet: String, filename: String) -> Self {
        Self {
            session_id,
            images: items(images),
            sheet,
            filename,
        }
    }
}

// =============================================================================
// Fragment Templates (HTMX partial responses)
// =============================================================================

/// Image list fragment returned after every edit.
#[derive(Template, WebTemplate)]
#[template(path = "partials/image_list.html")]
pub struct ImageListTemplate {
    pub session_id: String,
    pub images: Vec<ImageItem>,
}

impl ImageListTemplate {
    pub fn new(session_id: String, images: &ImageSequence) -> Self {
        Self {
            session_id,
            images: items(images),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use askama::Template;

    #[test]
    fn test_list_renders_in_order_with_move_controls() {
        let mut images = ImageSequence::new();
        // Minimal PNG header is enough: only the list is rendered
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        images.add("first.png", png.to_vec()).unwrap();
        images.add("second.png", png.to_vec()).unwrap();

        let html = ImageListTemplate::new("abc".to_string(), &images)
            .render()
            .unwrap();
        let first = html.find("first.png").unwrap();
        let second = html.find("second.png").unwrap();
        assert!(first < second);
        assert!(html.contains("/api/images/abc/"));
    }

    #[test]
    fn test_empty_list_renders_placeholder() {
        let html = ImageListTemplate::new("abc".to_string(), &ImageSequence::new())
            .render()
            .unwrap();
        assert!(html.contains("No images yet"));
    }
}
