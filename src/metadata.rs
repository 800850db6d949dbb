use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{ValidationError, ValidationResult};

/// Longest text that is ever handed to the encoder. Longer input is truncated.
pub const MAX_CHARACTERS: usize = 2000;

/// Side of the export artifacts, independent of the preview size.
pub const EXPORT_SIZE: u32 = 512;

/// Widest accepted quiet zone, in modules.
pub const MAX_MARGIN: u32 = 64;

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl From<ECLevel> for qrcode::EcLevel {
    fn from(ecl: ECLevel) -> Self {
        match ecl {
            ECLevel::L => qrcode::EcLevel::L,
            ECLevel::M => qrcode::EcLevel::M,
            ECLevel::Q => qrcode::EcLevel::Q,
            ECLevel::H => qrcode::EcLevel::H,
        }
    }
}

impl FromStr for ECLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            _ => Err(format!("unknown error correction level {s:?}")),
        }
    }
}

// Pixel size
//------------------------------------------------------------------------------

/// Preview side length in pixels.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PixelSize {
    Px200,
    Px256,
    Px320,
    Px400,
}

impl PixelSize {
    pub const ALL: [Self; 4] = [Self::Px200, Self::Px256, Self::Px320, Self::Px400];

    pub const fn px(self) -> u32 {
        match self {
            Self::Px200 => 200,
            Self::Px256 => 256,
            Self::Px320 => 320,
            Self::Px400 => 400,
        }
    }
}

impl TryFrom<u32> for PixelSize {
    type Error = String;

    fn try_from(px: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|s| s.px() == px)
            .ok_or_else(|| format!("unsupported pixel size {px}, expected one of 200/256/320/400"))
    }
}

impl From<PixelSize> for u32 {
    fn from(s: PixelSize) -> Self {
        s.px()
    }
}

// Module style
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleKind {
    #[default]
    Square,
    Rounded,
    ExtraRounded,
    Dots,
}

impl StyleKind {
    /// Corner radius as a fraction of module width, for the rounded variants.
    pub fn corner_ratio(self) -> Option<f64> {
        match self {
            Self::Rounded => Some(0.15),
            Self::ExtraRounded => Some(0.4),
            Self::Square | Self::Dots => None,
        }
    }
}

impl Display for StyleKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Square => "square",
            Self::Rounded => "rounded",
            Self::ExtraRounded => "extra-rounded",
            Self::Dots => "dots",
        })
    }
}

impl FromStr for StyleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "square" => Ok(Self::Square),
            "rounded" => Ok(Self::Rounded),
            "extra-rounded" => Ok(Self::ExtraRounded),
            "dots" => Ok(Self::Dots),
            _ => Err(format!("unknown style {s:?}")),
        }
    }
}

// Render config
//------------------------------------------------------------------------------

/// Every render setting except the text and the logo. This is the snapshot stored with
/// each history entry and half of its dedup key.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub dark: Color,
    pub light: Color,
    pub pixel_size: PixelSize,
    pub margin: u32,
    pub ec_level: ECLevel,
    #[serde(default)]
    pub style: StyleKind,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dark: Color::CHARCOAL,
            light: Color::WHITE,
            pixel_size: PixelSize::Px256,
            margin: 2,
            ec_level: ECLevel::M,
            style: StyleKind::Square,
        }
    }
}

pub fn check_margin(margin: u32) -> ValidationResult<u32> {
    if margin > MAX_MARGIN {
        return Err(ValidationError::MarginOutOfRange(margin));
    }
    Ok(margin)
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct RenderRequest {
    pub text: String,
    pub config: RenderConfig,
}

impl RenderRequest {
    pub fn new(text: impl Into<String>, config: RenderConfig) -> Self {
        Self { text: text.into(), config }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The text that is actually encoded: at most [`MAX_CHARACTERS`] characters.
    pub fn effective_text(&self) -> &str {
        truncate_chars(&self.text, MAX_CHARACTERS)
    }
}

// Text status
//------------------------------------------------------------------------------

/// Counter, truncation notice and URL hint shown next to the input.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct TextStatus {
    pub chars: usize,
    pub over_limit: bool,
    pub looks_like_url: bool,
}

impl TextStatus {
    pub fn of(text: &str) -> Self {
        let chars = text.chars().count();
        Self { chars, over_limit: chars > MAX_CHARACTERS, looks_like_url: looks_like_url(text) }
    }

    pub fn notice(&self) -> Option<String> {
        self.over_limit.then(|| format!("Text will be truncated to {MAX_CHARACTERS} characters"))
    }
}

impl Display for TextStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.chars, MAX_CHARACTERS)?;
        if self.looks_like_url {
            f.write_str(" (URL)")?;
        }
        Ok(())
    }
}

pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

pub fn looks_like_url(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    url::Url::parse(text).is_ok()
        || text.starts_with("http://")
        || text.starts_with("https://")
        || text.contains('.')
}
