//! imgpdf Core Library
//!
//! This library turns an ordered list of raster images into one PDF:
//! - Image records with lazily resolved pixel dimensions
//! - An editable image sequence with snapshots for generation
//! - Per-image page orientation and fit-to-page layout
//! - Single-flight document assembly on top of lopdf

pub mod assembler;
pub mod config;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod record;
pub mod sequence;
pub mod util;

pub use assembler::{
    AssemblyOptions, DocumentAssembler, GeneratedDocument, GenerationState, ProgressCallback,
};
pub use config::{AppConfig, DEFAULT_OUTPUT_FILENAME};
pub use error::{Error, Result};
pub use layout::{Orientation, PageLayout, PageSize, Placement, SheetFormat, fit_image};
pub use record::{Dimensions, ImageRecord};
pub use sequence::ImageSequence;

use std::path::Path;

/// Convenience function to build a PDF from image files with default options.
///
/// Returns `Ok(None)` when `paths` is empty.
pub fn images_to_pdf<P: AsRef<Path>>(paths: &[P]) -> Result<Option<GeneratedDocument>> {
    let images = paths
        .iter()
        .map(ImageRecord::from_file)
        .collect::<Result<Vec<_>>>()?;
    DocumentAssembler::default().generate(&images)
}
