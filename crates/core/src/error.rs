//! Error types for donation receipt generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a ledger into receipts.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The uploaded table lacks one or more required columns.
    #[error("Uploaded sheet must contain the following columns: {required:?} (missing: {missing:?})")]
    SchemaError {
        required: Vec<String>,
        missing: Vec<String>,
    },

    /// The filter or range selection left nothing to generate.
    #[error("No data to generate: {0}")]
    EmptyResultError(String),

    /// A donation amount could not be coerced to whole currency units.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A row's fields could not be normalized or rendered.
    #[error("Render error: {0}")]
    RenderError(String),

    /// The workbook structure could not be understood.
    #[error("XLSX parsing error: {0}")]
    XlsxParseError(String),

    /// ZIP archive error (XLSX input or receipt archive output).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for XLSX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// PDF document assembly error.
    #[error("PDF error: {0}")]
    PdfError(String),

    /// The organization profile could not be loaded.
    #[error("Invalid organization profile: {0}")]
    ProfileError(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::ZipError(e.to_string())
    }
}
