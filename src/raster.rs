//! Rasterization of the primitives the style post-processor emits: plain and rounded
//! `rect`s and `circle`s. Anything else in a document (e.g. `image`) is skipped; logos are
//! composed onto rasters directly.

use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

use crate::color::Color;
use crate::svg::{Document, Element};

/// Renders `doc` onto a `size` × `size` canvas, scaling from the document's viewBox.
pub fn rasterize(doc: &Document, size: u32) -> RgbaImage {
    let scale = size as f64 / doc_extent(&doc.root).unwrap_or(size as f64);

    let mut canvas = RgbaImage::new(size, size);
    doc.root.for_each_descendant(&mut |el| {
        let Some(fill) = el.attr("fill").and_then(|f| Color::parse(f).ok()) else {
            return;
        };
        match el.name.as_str() {
            "rect" => draw_rect(&mut canvas, el, scale, fill.to_rgba()),
            "circle" => draw_circle(&mut canvas, el, scale, fill.to_rgba()),
            _ => {}
        }
    });
    canvas
}

/// Width of the user coordinate system: viewBox width, else the `width` attribute.
pub fn doc_extent(root: &Element) -> Option<f64> {
    root.attr("viewBox")
        .and_then(|vb| vb.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty()).nth(2))
        .and_then(|w| w.parse().ok())
        .or_else(|| root.num_attr("width"))
        .filter(|w: &f64| *w > 0.0)
}

fn draw_rect(canvas: &mut RgbaImage, el: &Element, scale: f64, color: Rgba<u8>) {
    let x = el.num_attr("x").unwrap_or(0.0);
    let y = el.num_attr("y").unwrap_or(0.0);
    let (Some(w), Some(h)) = (el.num_attr("width"), el.num_attr("height")) else {
        return;
    };
    let rx = el.num_attr("rx").or_else(|| el.num_attr("ry")).unwrap_or(0.0).min(w / 2.0).min(h / 2.0);

    // Round edges, not sizes, so adjacent modules never leave gaps
    let x0 = (x * scale).round() as i32;
    let y0 = (y * scale).round() as i32;
    let x1 = ((x + w) * scale).round() as i32;
    let y1 = ((y + h) * scale).round() as i32;
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    if rx <= 0.0 {
        let rect = Rect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32);
        draw_filled_rect_mut(canvas, rect, color);
        return;
    }

    for py in y0.max(0)..y1.min(canvas.height() as i32) {
        for px in x0.max(0)..x1.min(canvas.width() as i32) {
            let ux = (px as f64 + 0.5) / scale;
            let uy = (py as f64 + 0.5) / scale;
            if in_rounded_rect(ux, uy, x, y, w, h, rx) {
                canvas.get_pixel_mut(px as u32, py as u32).blend(&color);
            }
        }
    }
}

fn in_rounded_rect(px: f64, py: f64, x: f64, y: f64, w: f64, h: f64, r: f64) -> bool {
    let cx = px.clamp(x + r, x + w - r);
    let cy = py.clamp(y + r, y + h - r);
    let (dx, dy) = (px - cx, py - cy);
    dx * dx + dy * dy <= r * r
}

fn draw_circle(canvas: &mut RgbaImage, el: &Element, scale: f64, color: Rgba<u8>) {
    let (Some(cx), Some(cy), Some(r)) = (el.num_attr("cx"), el.num_attr("cy"), el.num_attr("r")) else {
        return;
    };
    let radius = (r * scale).round() as i32;
    if radius <= 0 {
        return;
    }
    let center = ((cx * scale).round() as i32, (cy * scale).round() as i32);
    draw_filled_circle_mut(canvas, center, radius, color);
}
