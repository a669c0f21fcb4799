use thiserror::Error;

#[derive(Error, Debug)]
pub enum InvoiceSplitterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid marker rule: {reason}")]
    InvalidRule { reason: String },

    #[error("Invalid invoice boundary: {reason}")]
    InvalidBoundary { reason: String },

    #[error("Failed to extract page {page}: {reason}")]
    PageExtraction { page: usize, reason: String },

    #[error("Document has no pages")]
    NoPages,

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Failed to load PDF '{source_name}': {reason}")]
    PdfLoad { source_name: String, reason: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Not a PDF file: {path}")]
    NotPdf { path: String },

    #[error("Output directory error: {reason}")]
    OutputDirectory { reason: String },

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl InvoiceSplitterError {
    /// Errors caused by the input or the rule rather than by the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRule { .. }
                | Self::NoPages
                | Self::Config { .. }
                | Self::PdfLoad { .. }
                | Self::NotPdf { .. }
                | Self::FileNotFound { .. }
                | Self::PageExtraction { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, InvoiceSplitterError>;
