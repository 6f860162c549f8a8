//! HTTP route handlers for the imgpdf web application.
//!
//! All routes return either HTML (for HTMX consumption) or binary data (images, PDFs).
//! HTML routes use Askama templates from the `templates` module.

mod generate;
mod images;
mod pages;
mod upload;

pub use generate::generate_pdf;
pub use images::{delete_image, get_image, move_image, move_image_down, move_image_up};
pub use pages::{index, view_session};
pub use upload::{add_images, upload_images};

use serde::Deserialize as SerdeDeserialize;

/// Form data for moving an image.
#[derive(SerdeDeserialize)]
pub struct MoveForm {
    /// 1-based target page number from the input field
    pub to: usize,
}
