use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use image::DynamicImage;

use crate::error::{ValidationError, ValidationResult};

pub const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;

/// Padding, in artifact units, between the logo edge and its backing plate.
pub const PLATE_PADDING: f64 = 4.0;

// Logo
//------------------------------------------------------------------------------

/// A validated logo overlay. Construction goes through [`LogoSpec::from_bytes`], so a
/// `LogoSpec` always holds a decodable image of at most [`MAX_LOGO_BYTES`].
#[derive(Debug, Clone)]
pub struct LogoSpec {
    bytes: Vec<u8>,
    mime: &'static str,
    image: DynamicImage,
    size_percent: u8,
    x_percent: u8,
    y_percent: u8,
}

impl PartialEq for LogoSpec {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
            && self.size_percent == other.size_percent
            && self.x_percent == other.x_percent
            && self.y_percent == other.y_percent
    }
}

impl LogoSpec {
    /// Image-pick capability: sniffs the format, enforces the size cap and decodes.
    pub fn from_bytes(bytes: Vec<u8>) -> ValidationResult<Self> {
        let format = image::guess_format(&bytes)
            .map_err(|_| ValidationError::NotAnImage("application/octet-stream".to_string()))?;
        let mime = format.to_mime_type();
        if !mime.starts_with("image/") {
            return Err(ValidationError::NotAnImage(mime.to_string()));
        }
        if bytes.len() > MAX_LOGO_BYTES {
            return Err(ValidationError::LogoTooLarge(bytes.len()));
        }
        let image = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| ValidationError::UndecodableLogo(e.to_string()))?;

        tracing::debug!(mime, bytes = bytes.len(), w = image.width(), h = image.height(), "Logo loaded");
        Ok(Self { bytes, mime, image, size_percent: 20, x_percent: 50, y_percent: 50 })
    }

    pub fn from_file(path: impl AsRef<Path>) -> ValidationResult<Self> {
        let path = path.as_ref();
        let len = std::fs::metadata(path)
            .map_err(|e| ValidationError::UnreadableFile(format!("{}: {e}", path.display())))?
            .len();
        // Reject before reading oversized files into memory
        if len > MAX_LOGO_BYTES as u64 {
            return Err(ValidationError::LogoTooLarge(len as usize));
        }
        let bytes = std::fs::read(path)
            .map_err(|e| ValidationError::UnreadableFile(format!("{}: {e}", path.display())))?;
        Self::from_bytes(bytes)
    }

    pub fn with_size(mut self, percent: u8) -> ValidationResult<Self> {
        if !(10..=40).contains(&percent) {
            return Err(ValidationError::SizePercentOutOfRange(percent));
        }
        self.size_percent = percent;
        Ok(self)
    }

    pub fn with_position(mut self, x_percent: u8, y_percent: u8) -> ValidationResult<Self> {
        for p in [x_percent, y_percent] {
            if p > 100 {
                return Err(ValidationError::PositionPercentOutOfRange(p));
            }
        }
        self.x_percent = x_percent;
        self.y_percent = y_percent;
        Ok(self)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn size_percent(&self) -> u8 {
        self.size_percent
    }

    pub fn position_percent(&self) -> (u8, u8) {
        (self.x_percent, self.y_percent)
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, general_purpose::STANDARD.encode(&self.bytes))
    }

    pub fn placement(&self, width: f64, height: f64) -> Placement {
        Placement::compute(self.size_percent, self.x_percent, self.y_percent, width, height)
    }
}

// Placement
//------------------------------------------------------------------------------

/// Logo box on an artifact of a given size. The logo is centered on the target point.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl Placement {
    pub fn compute(size_percent: u8, x_percent: u8, y_percent: u8, width: f64, height: f64) -> Self {
        let size = width * size_percent as f64 / 100.0;
        let cx = width * x_percent as f64 / 100.0;
        let cy = height * y_percent as f64 / 100.0;
        Self { x: cx - size / 2.0, y: cy - size / 2.0, size }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    pub fn plate_radius(&self) -> f64 {
        self.size / 2.0 + PLATE_PADDING
    }
}
