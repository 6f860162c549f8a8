//! Image records and pixel dimension resolution.

use std::io::Cursor;
use std::path::Path;
use std::sync::OnceLock;

use bytes::Bytes;
use image::{ImageFormat, ImageReader};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Natural pixel size of an image. Both sides are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Returns `None` when either side is zero.
    pub const fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Read the natural pixel dimensions from encoded image bytes.
///
/// Only the image header is decoded. The error carries the decoder's reason;
/// callers attach position and name.
pub fn resolve_dimensions(bytes: &[u8]) -> std::result::Result<Dimensions, String> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?;

    if reader.format().is_none() {
        return Err("unrecognized image format".to_string());
    }

    let (width, height) = reader.into_dimensions().map_err(|e| e.to_string())?;
    Dimensions::new(width, height).ok_or_else(|| format!("degenerate image size {width}x{height}"))
}

/// Sniff the raster format of `bytes` from its magic number.
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// One user-supplied image.
///
/// Immutable once created. Cloning is cheap: the encoded bytes are shared.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    id: Uuid,
    name: String,
    format: ImageFormat,
    bytes: Bytes,
    dimensions: OnceLock<Dimensions>,
}

impl ImageRecord {
    /// Create a record from encoded bytes, sniffing the format.
    ///
    /// Fails with [`Error::UnsupportedFormat`] when the bytes are not JPEG or
    /// PNG. Pixel data is not validated here; a corrupt body surfaces as
    /// [`Error::Decode`] when the document is generated.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self> {
        let name = name.into();
        let bytes = bytes.into();

        let format = match sniff_format(&bytes) {
            Some(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => format,
            Some(other) => {
                return Err(Error::UnsupportedFormat(format!(
                    "{name}: {}",
                    other.to_mime_type()
                )));
            }
            None => return Err(Error::UnsupportedFormat(format!("{name}: unknown content"))),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            format,
            bytes,
            dimensions: OnceLock::new(),
        })
    }

    /// Read an image file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self::new(name, bytes)
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the encoded bytes. O(1).
    pub fn bytes_shared(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Dimensions if they were already resolved.
    pub fn cached_dimensions(&self) -> Option<Dimensions> {
        self.dimensions.get().copied()
    }

    /// Resolve and memoize this image's pixel dimensions.
    ///
    /// `position` is the record's index in the sequence being generated and
    /// is only used for error reporting.
    pub fn dimensions(&self, position: usize) -> Result<Dimensions> {
        if let Some(dims) = self.dimensions.get() {
            return Ok(*dims);
        }

        let dims = resolve_dimensions(&self.bytes).map_err(|reason| Error::Decode {
            position,
            name: self.name.clone(),
            reason,
        })?;
        debug!("Resolved {} as {}", self.name, dims);

        Ok(*self.dimensions.get_or_init(|| dims))
    }

    /// Resolve dimensions on the blocking pool, suspending the calling task.
    pub async fn resolve_dimensions_async(&self, position: usize) -> Result<Dimensions> {
        if let Some(dims) = self.cached_dimensions() {
            return Ok(dims);
        }

        let bytes = self.bytes_shared();
        let dims = tokio::task::spawn_blocking(move || resolve_dimensions(&bytes))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
            .map_err(|reason| Error::Decode {
                position,
                name: self.name.clone(),
                reason,
            })?;

        Ok(*self.dimensions.get_or_init(|| dims))
    }
}
