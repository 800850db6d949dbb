use std::fmt::{Display, Error, Formatter};

// Validation error
//------------------------------------------------------------------------------

/// Rejected user input. Raised at the point of input; previously rendered artifacts are
/// left untouched.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ValidationError {
    MalformedColor(String),
    NotAnImage(String),
    LogoTooLarge(usize),
    UndecodableLogo(String),
    SizePercentOutOfRange(u8),
    PositionPercentOutOfRange(u8),
    UnreadableFile(String),
    MarginOutOfRange(u32),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Self::MalformedColor(c) => write!(f, "Malformed color: {c:?}"),
            Self::NotAnImage(mime) => write!(f, "Not an image: {mime}"),
            Self::LogoTooLarge(sz) => {
                write!(f, "Logo too large: {sz} bytes (max {} bytes)", crate::logo::MAX_LOGO_BYTES)
            }
            Self::UndecodableLogo(e) => write!(f, "Logo could not be decoded: {e}"),
            Self::SizePercentOutOfRange(p) => write!(f, "Logo size {p}% outside 10..=40"),
            Self::PositionPercentOutOfRange(p) => write!(f, "Logo position {p}% outside 0..=100"),
            Self::UnreadableFile(e) => write!(f, "File could not be read: {e}"),
            Self::MarginOutOfRange(m) => {
                write!(f, "Margin {m} outside 0..={}", crate::metadata::MAX_MARGIN)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

// Encoding error
//------------------------------------------------------------------------------

/// Failure inside the render path. Never escapes the pipeline: it degrades to an empty
/// preview.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum EncodingError {
    DataTooLong,
    InvalidInput(String),
    Markup(String),
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Self::DataTooLong => f.write_str("Data too long for the chosen error correction level"),
            Self::InvalidInput(e) => write!(f, "Encoder rejected input: {e}"),
            Self::Markup(e) => write!(f, "Malformed vector markup: {e}"),
        }
    }
}

impl std::error::Error for EncodingError {}

pub type EncodingResult<T> = Result<T, EncodingError>;

// Export error
//------------------------------------------------------------------------------

/// Failed export. History is not updated when one of these is returned.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ExportError {
    NothingToExport,
    Serialize(String),
    Save(String),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Self::NothingToExport => f.write_str("Nothing to export"),
            Self::Serialize(e) => write!(f, "Export serialization failed: {e}"),
            Self::Save(e) => write!(f, "Export could not be saved: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

pub type ExportResult<T> = Result<T, ExportError>;

// Store error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StoreError {
    Io(String),
    Corrupted(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Self::Io(e) => write!(f, "Store I/O failed: {e}"),
            Self::Corrupted(e) => write!(f, "Store contents corrupted: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Corrupted(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
