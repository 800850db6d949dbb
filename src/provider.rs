//! Encoding provider seam.
//!
//! QR symbol encoding is not done in this crate. [`EncodingProvider`] is the contract the
//! render pipeline consumes; [`QrCodeProvider`] fulfils it with the `qrcode` crate and
//! draws the resulting module grid as a raster and as SVG markup.

use image::{Rgba, RgbaImage};

use crate::color::Color;
use crate::error::{EncodingError, EncodingResult};
use crate::metadata::ECLevel;
use crate::svg::{fmt_num, Document, Element};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct EncodeOptions {
    pub width: u32,
    pub margin: u32,
    pub dark: Color,
    pub light: Color,
    pub ec_level: ECLevel,
}

pub trait EncodingProvider {
    /// Raster of exactly `opts.width` × `opts.width` pixels.
    fn encode(&self, text: &str, opts: &EncodeOptions) -> EncodingResult<RgbaImage>;

    /// SVG markup sized `opts.width` user units, one primitive per dark module.
    fn encode_vector(&self, text: &str, opts: &EncodeOptions) -> EncodingResult<String>;
}

impl<P: EncodingProvider + ?Sized> EncodingProvider for &P {
    fn encode(&self, text: &str, opts: &EncodeOptions) -> EncodingResult<RgbaImage> {
        (**self).encode(text, opts)
    }

    fn encode_vector(&self, text: &str, opts: &EncodeOptions) -> EncodingResult<String> {
        (**self).encode_vector(text, opts)
    }
}

// Module matrix
//------------------------------------------------------------------------------

/// Dark/light grid of a symbol, quiet zone excluded.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Matrix {
    w: usize,
    grid: Vec<bool>,
}

impl Matrix {
    pub fn encode(text: &str, ecl: ECLevel) -> EncodingResult<Self> {
        let code = qrcode::QrCode::with_error_correction_level(text.as_bytes(), ecl.into())
            .map_err(|e| match e {
                qrcode::types::QrError::DataTooLong => EncodingError::DataTooLong,
                e => EncodingError::InvalidInput(e.to_string()),
            })?;
        let w = code.width();
        let grid = code.to_colors().into_iter().map(|c| c == qrcode::Color::Dark).collect();
        Ok(Self { w, grid })
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn is_dark(&self, r: usize, c: usize) -> bool {
        debug_assert!(r < self.w && c < self.w, "Module out of bounds: {r} {c}");
        self.grid[r * self.w + c]
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|&&d| d).count()
    }

    /// Side length in modules including a quiet zone of `margin` modules on each side.
    /// Saturates rather than overflowing on absurd margins.
    fn extent(&self, margin: u32) -> u32 {
        (self.w as u32).saturating_add(margin.saturating_mul(2))
    }

    fn module_at(&self, margin: u32, r: u32, c: u32) -> bool {
        let (r, c) = (r.wrapping_sub(margin), c.wrapping_sub(margin));
        (r as usize) < self.w && (c as usize) < self.w && self.is_dark(r as usize, c as usize)
    }

    pub fn render(&self, width: u32, margin: u32, dark: Color, light: Color) -> RgbaImage {
        let extent = self.extent(margin) as u64;
        let (dark, light): (Rgba<u8>, Rgba<u8>) = (dark.to_rgba(), light.to_rgba());

        let mut canvas = RgbaImage::new(width, width);
        for i in 0..width {
            for j in 0..width {
                let r = (i as u64 * extent / width as u64) as u32;
                let c = (j as u64 * extent / width as u64) as u32;
                let pixel = if self.module_at(margin, r, c) { dark } else { light };
                canvas.put_pixel(j, i, pixel);
            }
        }

        canvas
    }

    pub fn to_svg(&self, width: u32, margin: u32, dark: Color, light: Color) -> Document {
        let side = fmt_num(width as f64);
        let cell = width as f64 / self.extent(margin) as f64;

        let mut root = Element::new("svg")
            .with_attr("xmlns", "http://www.w3.org/2000/svg")
            .with_attr("xmlns:xlink", "http://www.w3.org/1999/xlink")
            .with_attr("width", side.clone())
            .with_attr("height", side.clone())
            .with_attr("viewBox", format!("0 0 {side} {side}"))
            .with_attr("shape-rendering", "crispEdges");
        root.push(
            Element::new("rect")
                .with_attr("width", side.clone())
                .with_attr("height", side)
                .with_attr("fill", light.to_hex()),
        );

        let fill = dark.to_hex();
        let cell_str = fmt_num(cell);
        for r in 0..self.w {
            for c in 0..self.w {
                if !self.is_dark(r, c) {
                    continue;
                }
                root.push(
                    Element::new("rect")
                        .with_attr("x", fmt_num((c as f64 + margin as f64) * cell))
                        .with_attr("y", fmt_num((r as f64 + margin as f64) * cell))
                        .with_attr("width", cell_str.clone())
                        .with_attr("height", cell_str.clone())
                        .with_attr("fill", fill.clone()),
                );
            }
        }

        Document { root }
    }

    /// Text rendering for terminals; light modules are drawn as full blocks.
    pub fn to_str(&self, margin: usize) -> String {
        let total = self.w + 2 * margin;

        let mut canvas = String::new();
        for i in 0..total {
            for j in 0..total {
                let dark = self.module_at(margin as u32, i as u32, j as u32);
                canvas.push_str(if dark { "  " } else { "██" });
            }
            canvas.push('\n');
        }

        canvas
    }
}

// qrcode-backed provider
//------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct QrCodeProvider;

impl EncodingProvider for QrCodeProvider {
    fn encode(&self, text: &str, opts: &EncodeOptions) -> EncodingResult<RgbaImage> {
        let matrix = Matrix::encode(text, opts.ec_level)?;
        Ok(matrix.render(opts.width, opts.margin, opts.dark, opts.light))
    }

    fn encode_vector(&self, text: &str, opts: &EncodeOptions) -> EncodingResult<String> {
        let matrix = Matrix::encode(text, opts.ec_level)?;
        matrix.to_svg(opts.width, opts.margin, opts.dark, opts.light).to_markup()
    }
}

#[cfg(test)]
mod provider_tests {
    use test_case::test_case;

    use super::{EncodeOptions, EncodingProvider, Matrix, QrCodeProvider};
    use crate::color::Color;
    use crate::error::EncodingError;
    use crate::metadata::ECLevel;
    use crate::svg::Document;

    fn opts(width: u32, margin: u32, ec_level: ECLevel) -> EncodeOptions {
        EncodeOptions { width, margin, dark: Color::CHARCOAL, light: Color::WHITE, ec_level }
    }

    #[test_case("Hello, world!", ECLevel::L)]
    #[test_case("https://example.com/some/path?q=1", ECLevel::M)]
    #[test_case("12345", ECLevel::Q)]
    #[test_case("OK", ECLevel::H)]
    fn test_matrix_is_square_qr(text: &str, ecl: ECLevel) {
        let m = Matrix::encode(text, ecl).unwrap();
        assert!(m.width() >= 21 && (m.width() - 17) % 4 == 0);
        // Top-left finder corner is always dark
        assert!(m.is_dark(0, 0));
        assert!(m.count_dark_modules() > 0);
    }

    #[test]
    fn test_data_too_long() {
        let text = "a".repeat(2000);
        assert_eq!(Matrix::encode(&text, ECLevel::H), Err(EncodingError::DataTooLong));
        assert!(Matrix::encode(&text, ECLevel::M).is_ok());
    }

    #[test_case(200)]
    #[test_case(256)]
    #[test_case(512)]
    fn test_raster_has_requested_size(width: u32) {
        let img = QrCodeProvider.encode("hello", &opts(width, 2, ECLevel::M)).unwrap();
        assert_eq!(img.dimensions(), (width, width));
        // Quiet zone corner is light, first finder module is dark
        assert_eq!(*img.get_pixel(0, 0), Color::WHITE.to_rgba());
        let m = Matrix::encode("hello", ECLevel::M).unwrap();
        let cell = width as f64 / (m.width() + 4) as f64;
        let probe = (2.5 * cell) as u32;
        assert_eq!(*img.get_pixel(probe, probe), Color::CHARCOAL.to_rgba());
    }

    #[test]
    fn test_vector_has_one_rect_per_dark_module() {
        let markup = QrCodeProvider.encode_vector("hello", &opts(256, 2, ECLevel::M)).unwrap();
        let doc = Document::parse(&markup).unwrap();
        let m = Matrix::encode("hello", ECLevel::M).unwrap();
        let dark = Color::CHARCOAL.to_hex();
        let modules = doc.root.count(|e| e.name == "rect" && e.attr("fill") == Some(&dark));
        assert_eq!(modules, m.count_dark_modules());
        assert_eq!(doc.root.attr("viewBox"), Some("0 0 256 256"));
    }

    #[test_case(1 << 31)]
    #[test_case(u32::MAX)]
    fn test_huge_margin_does_not_overflow(margin: u32) {
        let img = QrCodeProvider.encode("hello", &opts(64, margin, ECLevel::M)).unwrap();
        assert_eq!(img.dimensions(), (64, 64));
        let markup = QrCodeProvider.encode_vector("hello", &opts(64, margin, ECLevel::M)).unwrap();
        assert!(Document::parse(&markup).is_ok());
    }

    #[test]
    fn test_to_str_dimensions() {
        let m = Matrix::encode("hi", ECLevel::L).unwrap();
        let s = m.to_str(1);
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), m.width() + 2);
        assert!(lines.iter().all(|l| l.chars().count() == 2 * (m.width() + 2)));
    }
}
