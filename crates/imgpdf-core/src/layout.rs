//! Page layout: sheet formats, orientation choice and image fitting.
//!
//! # Coordinate System
//!
//! All sizes are PDF points (1/72 inch). A [`Placement`] is expressed with a
//! **top-left origin**, the way a page is read:
//! - (0, 0) is the top-left corner of the page
//! - X increases to the right
//! - Y increases downward
//!
//! The document builder converts to PDF's bottom-left origin when it writes
//! the content stream. Since images are always centered on the non-fitted
//! axis, both origins yield the same offsets.

use serde::{Deserialize, Serialize};

use crate::record::Dimensions;

/// Points per millimetre.
const PT_PER_MM: f32 = 72.0 / 25.4;

/// Tolerance used when checking that a placement stays inside its page.
pub const LAYOUT_EPSILON: f32 = 1e-3;

/// Physical page format before orientation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl SheetFormat {
    /// Portrait dimensions in millimetres.
    pub const fn dimensions_mm(self) -> (f32, f32) {
        match self {
            Self::A3 => (297.0, 420.0),
            Self::A4 => (210.0, 297.0),
            Self::A5 => (148.0, 210.0),
            Self::Letter => (215.9, 279.4),
            Self::Legal => (215.9, 355.6),
        }
    }

    /// Portrait sheet size in points.
    pub fn portrait(self) -> PageSize {
        let (w_mm, h_mm) = self.dimensions_mm();
        PageSize::new(w_mm * PT_PER_MM, h_mm * PT_PER_MM)
    }

    /// Sheet size in points at the given orientation.
    ///
    /// Landscape swaps width and height.
    pub fn page_size(self, orientation: Orientation) -> PageSize {
        let portrait = self.portrait();
        match orientation {
            Orientation::Portrait => portrait,
            Orientation::Landscape => PageSize::new(portrait.height, portrait.width),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "a3" => Some(Self::A3),
            "a4" => Some(Self::A4),
            "a5" => Some(Self::A5),
            "letter" | "us-letter" => Some(Self::Letter),
            "legal" | "us-legal" => Some(Self::Legal),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::A3 => "A3",
            Self::A4 => "A4",
            Self::A5 => "A5",
            Self::Letter => "Letter",
            Self::Legal => "Legal",
        }
    }
}

impl std::fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Natural orientation of an image: landscape iff it is wider than tall.
    ///
    /// Square images are portrait.
    pub const fn for_image(dims: Dimensions) -> Self {
        if dims.width > dims.height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }

    pub const fn is_landscape(self) -> bool {
        matches!(self, Self::Landscape)
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Portrait => f.write_str("portrait"),
            Self::Landscape => f.write_str("landscape"),
        }
    }
}

/// Usable page area in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn ratio(self) -> f32 {
        self.width / self.height
    }

    pub fn orientation(self) -> Orientation {
        if self.width > self.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Where an image is drawn on its page, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// Whether the box lies inside `page`, within [`LAYOUT_EPSILON`].
    pub fn fits_within(&self, page: PageSize) -> bool {
        self.x >= -LAYOUT_EPSILON
            && self.y >= -LAYOUT_EPSILON
            && self.x + self.width <= page.width + LAYOUT_EPSILON
            && self.y + self.height <= page.height + LAYOUT_EPSILON
    }
}

/// Layout of one page of the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub orientation: Orientation,
    pub page: PageSize,
    pub placement: Placement,
}

/// Fit an image into a page, preserving its aspect ratio.
///
/// The image is scaled until its limiting dimension matches the page and is
/// centered along the other axis. Equal ratios take the fit-to-height branch,
/// which fills the page exactly.
#[allow(clippy::cast_precision_loss)]
pub fn fit_image(dims: Dimensions, page: PageSize) -> Placement {
    let img_ratio = dims.width as f32 / dims.height as f32;
    let page_ratio = page.ratio();

    if img_ratio > page_ratio {
        let height = page.width / img_ratio;
        Placement {
            x: 0.0,
            y: (page.height - height) / 2.0,
            width: page.width,
            height,
        }
    } else {
        let width = page.height * img_ratio;
        Placement {
            x: (page.width - width) / 2.0,
            y: 0.0,
            width,
            height: page.height,
        }
    }
}
