//! Document assembly: ordered images in, one multi-page PDF out.
//!
//! # Generation
//!
//! 1. The first image's orientation decides the first page, created together
//!    with the document.
//! 2. Every image gets its own page at its own orientation, in input order.
//!    The first image reuses the initial page.
//! 3. Each page's size is read back from the builder before fitting, so
//!    orientation swaps are always honoured.
//!
//! Any decode or embed failure aborts the whole generation. There is no
//! partial output.
//!
//! # Concurrency
//!
//! One [`DocumentAssembler`] runs at most one generation at a time. A call
//! made while another is in flight fails with
//! [`Error::GenerationInProgress`] instead of waiting.
//!
//! The slot is released only when page placement ends. If the future
//! returned by [`DocumentAssembler::generate_async`] is dropped after
//! placement has started on the blocking pool, the state stays
//! [`GenerationState::Generating`] until that work finishes and then
//! records its outcome.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::layout::{Orientation, PageLayout, SheetFormat, fit_image};
use crate::pdf::{DocumentBuilder, image_xobject};
use crate::record::ImageRecord;

const IDLE: u8 = 0;
const GENERATING: u8 = 1;
const SUCCEEDED: u8 = 2;
const FAILED: u8 = 3;

/// Progress callback: `(pages_done, total_pages)`.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send>;

/// Lifecycle of the most recent generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Generating,
    Succeeded,
    Failed,
}

impl GenerationState {
    const fn from_u8(value: u8) -> Self {
        match value {
            GENERATING => Self::Generating,
            SUCCEEDED => Self::Succeeded,
            FAILED => Self::Failed,
            _ => Self::Idle,
        }
    }
}

/// Settings that shape every generated document.
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    pub sheet: SheetFormat,
    pub title: Option<String>,
    pub filename: String,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for AssemblyOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            sheet: config.sheet,
            title: config.title.clone(),
            filename: config.output_filename.clone(),
        }
    }
}

/// A finished document. Never modified after creation.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    /// Serialized PDF
    pub bytes: Vec<u8>,
    /// Page layouts in document order, one per input image
    pub pages: Vec<PageLayout>,
    /// Suggested file name
    pub filename: String,
}

impl GeneratedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Write the PDF to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), &self.bytes)?;
        Ok(())
    }
}

/// Builds PDFs from ordered image snapshots, one generation at a time.
#[derive(Debug)]
pub struct DocumentAssembler {
    options: AssemblyOptions,
    state: Arc<AtomicU8>,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new(AssemblyOptions::default())
    }
}

impl DocumentAssembler {
    pub fn new(options: AssemblyOptions) -> Self {
        Self {
            options,
            state: Arc::new(AtomicU8::new(IDLE)),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(AssemblyOptions::from(config))
    }

    pub const fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    pub fn state(&self) -> GenerationState {
        GenerationState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_generating(&self) -> bool {
        self.state() == GenerationState::Generating
    }

    /// Generate a document, resolving dimensions one image at a time.
    ///
    /// Returns `Ok(None)` for an empty input without touching the state.
    pub fn generate(&self, images: &[ImageRecord]) -> Result<Option<GeneratedDocument>> {
        self.generate_with_progress(images, None)
    }

    /// Like [`generate`](Self::generate), reporting each placed page.
    pub fn generate_with_progress(
        &self,
        images: &[ImageRecord],
        progress: Option<&dyn Fn(usize, usize)>,
    ) -> Result<Option<GeneratedDocument>> {
        if images.is_empty() {
            debug!("No images to assemble");
            return Ok(None);
        }

        let guard = self.begin()?;
        let result = assemble(&self.options, images, &|done, total| {
            if let Some(callback) = progress {
                callback(done, total);
            }
        });
        guard.finish(result.is_ok());
        result
    }

    /// Generate a document on the tokio runtime.
    ///
    /// All dimensions are resolved concurrently on the blocking pool, then
    /// pages are placed in a second pass in strict input order.
    pub async fn generate_async(
        &self,
        images: Vec<ImageRecord>,
        progress: Option<ProgressCallback>,
    ) -> Result<Option<GeneratedDocument>> {
        if images.is_empty() {
            debug!("No images to assemble");
            return Ok(None);
        }

        let guard = self.begin()?;

        let resolved = try_join_all(
            images
                .iter()
                .enumerate()
                .map(|(position, record)| record.resolve_dimensions_async(position)),
        )
        .await;
        if let Err(e) = resolved {
            guard.finish(false);
            return Err(e);
        }

        // The guard moves with the blocking work and outlives this future
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || {
            let result = assemble(&options, &images, &|done, total| {
                if let Some(callback) = &progress {
                    callback(done, total);
                }
            });
            guard.finish(result.is_ok());
            result
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))?
    }

    /// Claim the single generation slot.
    fn begin(&self) -> Result<GenerationGuard> {
        let mut current = self.state.load(Ordering::SeqCst);
        loop {
            if current == GENERATING {
                warn!("Rejected generation request: another generation is running");
                return Err(Error::GenerationInProgress);
            }
            match self.state.compare_exchange(
                current,
                GENERATING,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    return Ok(GenerationGuard {
                        state: Arc::clone(&self.state),
                        finished: false,
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }
}

/// Holds the generation slot. Dropping it unfinished marks the run failed.
struct GenerationGuard {
    state: Arc<AtomicU8>,
    finished: bool,
}

impl GenerationGuard {
    fn finish(mut self, succeeded: bool) {
        let next = if succeeded { SUCCEEDED } else { FAILED };
        self.state.store(next, Ordering::SeqCst);
        self.finished = true;
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.state.store(FAILED, Ordering::SeqCst);
        }
    }
}

/// Place every image on its own page, in order, and serialize.
fn assemble(
    options: &AssemblyOptions,
    images: &[ImageRecord],
    progress: &dyn Fn(usize, usize),
) -> Result<Option<GeneratedDocument>> {
    let Some(first) = images.first() else {
        return Ok(None);
    };
    let total = images.len();

    let first_orientation = Orientation::for_image(first.dimensions(0)?);
    let mut builder =
        DocumentBuilder::new(options.sheet, first_orientation).with_title(options.title.clone());

    info!("Assembling {} images on {} sheets", total, options.sheet);

    let mut pages = Vec::with_capacity(total);
    for (position, record) in images.iter().enumerate() {
        let dims = record.dimensions(position)?;
        let orientation = Orientation::for_image(dims);

        let page_id = if position == 0 {
            builder.first_page()
        } else {
            builder.add_page(orientation)
        };

        let page = builder.page_size(page_id)?;
        let placement = fit_image(dims, page);
        if !(placement.width > 0.0 && placement.height > 0.0) || !placement.fits_within(page) {
            return Err(Error::Embed {
                position,
                name: record.name().to_string(),
                reason: format!("degenerate placement {placement:?} on {page:?}"),
            });
        }

        let xobject = image_xobject(record, dims).map_err(|reason| Error::Embed {
            position,
            name: record.name().to_string(),
            reason,
        })?;
        builder.draw_image(page_id, xobject, placement)?;

        debug!(
            "Page {}: {} ({}) on {} page",
            position + 1,
            record.name(),
            dims,
            orientation
        );

        pages.push(PageLayout {
            orientation,
            page,
            placement,
        });
        progress(position + 1, total);
    }

    let bytes = builder.finish()?;
    info!("Generated {} page PDF ({} bytes)", pages.len(), bytes.len());

    Ok(Some(GeneratedDocument {
        bytes,
        pages,
        filename: options.filename.clone(),
    }))
}
