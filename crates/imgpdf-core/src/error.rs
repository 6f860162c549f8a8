use thiserror::Error;
use uuid::Uuid;

/// Unified error type for imgpdf-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Image operations (format sniffing, dimension decoding, embedding)
/// - Image sequence edits (unknown ids, out-of-range positions)
/// - Document generation (single-flight violations, PDF serialization)
/// - Configuration operations (loading, validation)
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Image Errors
    // ==========================================================================
    /// Image bytes could not be decoded to obtain pixel dimensions
    #[error("failed to decode image {position} ({name}): {reason}")]
    Decode {
        position: usize,
        name: String,
        reason: String,
    },

    /// The document builder refused an otherwise decodable image
    #[error("failed to embed image {position} ({name}): {reason}")]
    Embed {
        position: usize,
        name: String,
        reason: String,
    },

    /// Input is not one of the accepted raster encodings (JPEG, PNG)
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    // ==========================================================================
    // Sequence Errors
    // ==========================================================================
    /// No image with this id exists in the sequence
    #[error("image {0} not found")]
    ImageNotFound(Uuid),

    /// Target position is outside the sequence
    #[error("invalid position {index} (sequence has {len} images)")]
    InvalidPosition { index: usize, len: usize },

    // ==========================================================================
    // Generation Errors
    // ==========================================================================
    /// Another generation is already running on this assembler
    #[error("a document generation is already in progress")]
    GenerationInProgress,

    /// A blocking worker panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(String),

    /// Error from the lopdf library
    #[error("lopdf error: {0}")]
    Lopdf(String),

    /// Failed to serialize the finished PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error was caused by the content of one input image.
    ///
    /// Web and CLI callers use this to tell a bad upload apart from a server
    /// side failure.
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Embed { .. } | Self::UnsupportedFormat(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
