//! Style post-processor: module shapes and logo composition.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use imageproc::drawing::draw_filled_circle_mut;

use crate::color::Color;
use crate::error::EncodingResult;
use crate::logo::LogoSpec;
use crate::metadata::StyleKind;
use crate::raster::doc_extent;
use crate::svg::{fmt_num, Document, Element};

// Module shapes
//------------------------------------------------------------------------------

/// Rewrites every module primitive of `markup` to `style`. Square returns the markup as is.
pub fn apply_style(markup: &str, style: StyleKind, dark: Color) -> EncodingResult<String> {
    if style == StyleKind::Square {
        return Ok(markup.to_string());
    }
    let mut doc = Document::parse(markup)?;
    style_document(&mut doc, style, dark);
    doc.to_markup()
}

/// In-place variant of [`apply_style`] on an already parsed document.
pub fn style_document(doc: &mut Document, style: StyleKind, dark: Color) {
    let extent = doc_extent(&doc.root);
    doc.root.map_descendants(&mut |el| {
        if !is_module(el, dark, extent) {
            return;
        }
        let Some(w) = el.num_attr("width") else {
            return;
        };
        match style {
            StyleKind::Square => {}
            StyleKind::Rounded | StyleKind::ExtraRounded => {
                let r = fmt_num(w * style.corner_ratio().unwrap_or_default());
                el.set_attr("rx", r.clone());
                el.set_attr("ry", r);
            }
            StyleKind::Dots => *el = to_dot(el, w),
        }
    });
}

/// A module is a `rect` painted in the dark color that does not cover the whole symbol.
pub fn is_module(el: &Element, dark: Color, extent: Option<f64>) -> bool {
    if el.name != "rect" {
        return false;
    }
    let painted_dark = el.attr("fill").and_then(|f| Color::parse(f).ok()) == Some(dark);
    let background = matches!((el.num_attr("width"), extent), (Some(w), Some(e)) if w >= e);
    painted_dark && !background
}

fn to_dot(rect: &Element, w: f64) -> Element {
    let x = rect.num_attr("x").unwrap_or(0.0);
    let y = rect.num_attr("y").unwrap_or(0.0);
    let h = rect.num_attr("height").unwrap_or(w);

    let mut dot = Element::new("circle")
        .with_attr("cx", fmt_num(x + w / 2.0))
        .with_attr("cy", fmt_num(y + h / 2.0))
        .with_attr("r", fmt_num(w * 0.4));
    for (k, v) in &rect.attrs {
        if !matches!(k.as_str(), "x" | "y" | "width" | "height" | "rx" | "ry") {
            dot.set_attr(k, v.clone());
        }
    }
    dot
}

#[cfg(test)]
mod style_tests {
    use test_case::test_case;

    use super::{apply_style, is_module};
    use crate::color::Color;
    use crate::metadata::StyleKind;
    use crate::svg::{Document, Element};

    const DARK: Color = Color::rgb(0x26, 0x26, 0x26);

    // Mixed paired/self-closing modules as different producers emit them
    const MARKUP: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
        <rect width="10" height="10" fill="#ffffff"/>
        <rect x="1" y="1" width="2" height="2" fill="#262626"/>
        <rect x="3" y="1" width="2" height="2" fill="#262626"></rect>
        <rect x="5" y="1" width="2" height="2" fill="#262626" />
        <g><rect x="1" y="3" width="2" height="2" fill="#262626"></rect></g>
    </svg>"##;

    fn modules(doc: &Document) -> usize {
        doc.root.count(|e| is_module(e, DARK, Some(10.0)))
    }

    #[test]
    fn test_square_is_identity() {
        let once = apply_style(MARKUP, StyleKind::Square, DARK).unwrap();
        assert_eq!(once, MARKUP);
        assert_eq!(apply_style(&once, StyleKind::Square, DARK).unwrap(), once);
    }

    #[test_case(StyleKind::Rounded, "0.3")]
    #[test_case(StyleKind::ExtraRounded, "0.8")]
    fn test_rounded_sets_radius_on_every_module(style: StyleKind, r: &str) {
        let out = apply_style(MARKUP, style, DARK).unwrap();
        let doc = Document::parse(&out).unwrap();
        assert_eq!(modules(&doc), 4);
        doc.root.for_each_descendant(&mut |e| {
            if is_module(e, DARK, Some(10.0)) {
                assert_eq!(e.attr("rx"), Some(r));
                assert_eq!(e.attr("ry"), Some(r));
            }
        });
        // Background untouched
        let bg = doc.root.elements().next().unwrap();
        assert_eq!(bg.attr("rx"), None);
    }

    #[test]
    fn test_dots_replace_every_module() {
        let out = apply_style(MARKUP, StyleKind::Dots, DARK).unwrap();
        let doc = Document::parse(&out).unwrap();
        assert_eq!(modules(&doc), 0);
        assert_eq!(doc.root.count(|e| e.name == "circle"), 4);
        assert_eq!(doc.root.count(|e| e.name == "rect"), 1);

        let mut first = None;
        doc.root.for_each_descendant(&mut |e| {
            if e.name == "circle" && first.is_none() {
                first = Some(e.clone());
            }
        });
        let dot = first.unwrap();
        assert_eq!(dot.attr("cx"), Some("2"));
        assert_eq!(dot.attr("cy"), Some("2"));
        assert_eq!(dot.attr("r"), Some("0.8"));
        assert_eq!(dot.attr("fill"), Some("#262626"));
    }

    #[test]
    fn test_fill_match_is_by_color_value() {
        let markup = r##"<svg viewBox="0 0 4 4"><rect x="0" y="0" width="1" height="1" fill="#262626FF"/></svg>"##;
        let out = apply_style(markup, StyleKind::Dots, DARK).unwrap();
        assert!(out.contains("<circle"));
    }

    #[test]
    fn test_other_colors_untouched() {
        let markup = r##"<svg viewBox="0 0 4 4"><rect x="0" y="0" width="1" height="1" fill="#ff0000"/></svg>"##;
        let out = apply_style(markup, StyleKind::Dots, DARK).unwrap();
        assert!(!out.contains("<circle"));
    }

    #[test]
    fn test_malformed_markup_is_error() {
        assert!(apply_style("<svg><rect></svg>", StyleKind::Dots, DARK).is_err());
    }

    #[test]
    fn test_is_module() {
        let rect = Element::new("rect").with_attr("width", "1").with_attr("fill", "#262626");
        assert!(is_module(&rect, DARK, Some(10.0)));
        assert!(!is_module(&rect, DARK, Some(1.0)));
        assert!(!is_module(&Element::new("circle").with_attr("fill", "#262626"), DARK, None));
    }
}

// Logo composition
//------------------------------------------------------------------------------

/// Appends the backing plate and the logo image to the root of the vector document.
pub fn apply_logo_vector(markup: &str, logo: &LogoSpec, light: Color) -> EncodingResult<String> {
    let mut doc = Document::parse(markup)?;
    logo_document(&mut doc, logo, light);
    doc.to_markup()
}

pub fn logo_document(doc: &mut Document, logo: &LogoSpec, light: Color) {
    let w = doc_extent(&doc.root).unwrap_or(0.0);
    let h = doc.root.num_attr("height").filter(|_| doc.root.attr("viewBox").is_none()).unwrap_or(w);
    let p = logo.placement(w, h);
    let (cx, cy) = p.center();

    doc.root.push(
        Element::new("circle")
            .with_attr("cx", fmt_num(cx))
            .with_attr("cy", fmt_num(cy))
            .with_attr("r", fmt_num(p.plate_radius()))
            .with_attr("fill", light.to_hex()),
    );
    doc.root.push(
        Element::new("image")
            .with_attr("x", fmt_num(p.x))
            .with_attr("y", fmt_num(p.y))
            .with_attr("width", fmt_num(p.size))
            .with_attr("height", fmt_num(p.size))
            .with_attr("preserveAspectRatio", "none")
            .with_attr("href", logo.data_uri())
            .with_attr("xlink:href", logo.data_uri()),
    );
}

/// Draws the backing plate then the logo, resized to its placement box, onto `canvas`.
pub fn apply_logo_raster(canvas: &mut RgbaImage, logo: &LogoSpec, light: Color) {
    let (w, h) = canvas.dimensions();
    let p = logo.placement(w as f64, h as f64);
    let (cx, cy) = p.center();

    let center = (cx.round() as i32, cy.round() as i32);
    draw_filled_circle_mut(canvas, center, p.plate_radius().round() as i32, light.to_rgba());

    let side = p.size.round().max(1.0) as u32;
    let resized = imageops::resize(&logo.image().to_rgba8(), side, side, FilterType::Lanczos3);
    imageops::overlay(canvas, &resized, p.x.round() as i64, p.y.round() as i64);
}

#[cfg(test)]
mod logo_composition_tests {
    use image::{Rgba, RgbaImage};

    use super::{apply_logo_raster, apply_logo_vector};
    use crate::color::Color;
    use crate::logo::{logo_tests::png_bytes, LogoSpec};
    use crate::svg::Document;

    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn logo() -> LogoSpec {
        LogoSpec::from_bytes(png_bytes(16, 16, BLUE)).unwrap()
    }

    #[test]
    fn test_vector_logo_box() {
        let markup = r##"<svg viewBox="0 0 256 256" width="256" height="256"><rect width="256" height="256" fill="#ffffff"/></svg>"##;
        let out = apply_logo_vector(markup, &logo(), Color::WHITE).unwrap();
        let doc = Document::parse(&out).unwrap();

        let children: Vec<_> = doc.root.elements().collect();
        assert_eq!(children.len(), 3);
        let (plate, image) = (children[1], children[2]);
        assert_eq!(plate.name, "circle");
        assert_eq!(plate.attr("cx"), Some("128"));
        assert_eq!(plate.attr("r"), Some("29.6"));
        assert_eq!(plate.attr("fill"), Some("#ffffff"));
        assert_eq!(image.name, "image");
        assert_eq!(image.attr("x"), Some("102.4"));
        assert_eq!(image.attr("y"), Some("102.4"));
        assert_eq!(image.attr("width"), Some("51.2"));
        assert!(image.attr("href").unwrap().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_raster_logo_and_plate() {
        let mut canvas = RgbaImage::from_pixel(256, 256, Rgba([0, 0, 0, 255]));
        let logo = logo().with_size(20).unwrap();
        apply_logo_raster(&mut canvas, &logo, Color::WHITE);

        // Logo center
        assert_eq!(*canvas.get_pixel(128, 128), Rgba(BLUE));
        // Inside the plate ring but outside the logo square
        assert_eq!(*canvas.get_pixel(128, 100), Rgba([255, 255, 255, 255]));
        // Far from the logo
        assert_eq!(*canvas.get_pixel(10, 10), Rgba([0, 0, 0, 255]));
    }
}
