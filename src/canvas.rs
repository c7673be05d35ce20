//! In-memory drawing surfaces.
//!
//! A [`Canvas`] is an owned RGBA8 bitmap with just enough of the 2D context
//! model for compositing: a global alpha, source-over `draw_image` and
//! `fill_rect`. Canvases handed to draw functions come from
//! [`map_to_canvas`], one per loaded image and in input order.

use crate::loader::LoadedImage;
use crate::position::Size;
use image::{Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use std::fmt;

/// Anything that can be painted onto a canvas.
pub trait ImageSource {
    fn rgba(&self) -> &RgbaImage;

    fn size(&self) -> Size {
        let img = self.rgba();
        Size::new(img.width(), img.height())
    }
}

/// A drawable bitmap surface
#[derive(Clone, PartialEq)]
pub struct Canvas {
    pixels: RgbaImage,
    global_alpha: f32,
}

impl Canvas {
    /// Transparent canvas of the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            global_alpha: 1.0,
        }
    }

    /// Canvas sized to `image` with the image painted at the origin
    pub fn from_image(image: &LoadedImage) -> Self {
        Canvas::from_rgba(image.rgba().clone())
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            global_alpha: 1.0,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn global_alpha(&self) -> f32 {
        self.global_alpha
    }

    /// Alpha multiplied into every subsequent draw. Values are clamped to
    /// `0.0..=1.0`; NaN is ignored like the 2D context does.
    pub fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_nan() {
            return;
        }
        self.global_alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.pixels.get_pixel(x, y).0)
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }

    /// Paint `source` with its top-left corner at `(x, y)`. Parts falling
    /// outside the canvas are clipped.
    pub fn draw_image<S: ImageSource + ?Sized>(&mut self, source: &S, x: i64, y: i64) {
        let src = source.rgba();
        let alpha = self.global_alpha;
        if alpha <= 0.0 {
            return;
        }
        for (sx, sy, px) in src.enumerate_pixels() {
            let tx = x + sx as i64;
            let ty = y + sy as i64;
            if tx < 0 || ty < 0 || tx >= self.width() as i64 || ty >= self.height() as i64 {
                continue;
            }
            let dst = self.pixels.get_pixel_mut(tx as u32, ty as u32);
            *dst = source_over(*dst, *px, alpha);
        }
    }

    /// Fill a rectangle with a solid RGBA colour (source-over)
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: [u8; 4]) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width as i64).min(self.width() as i64);
        let y1 = (y + height as i64).min(self.height() as i64);
        let alpha = self.global_alpha;
        for ty in y0..y1 {
            for tx in x0..x1 {
                let dst = self.pixels.get_pixel_mut(tx as u32, ty as u32);
                *dst = source_over(*dst, Rgba(color), alpha);
            }
        }
    }

    /// Hex SHA-256 over the dimensions and raw pixels
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width().to_be_bytes());
        hasher.update(self.height().to_be_bytes());
        hasher.update(self.pixels.as_raw());
        hex::encode(hasher.finalize())
    }
}

impl ImageSource for Canvas {
    fn rgba(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("global_alpha", &self.global_alpha)
            .finish()
    }
}

// Non-premultiplied source-over.
fn source_over(dst: Rgba<u8>, src: Rgba<u8>, global_alpha: f32) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0 * global_alpha;
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        out[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Turn each loaded image into an equally sized canvas pre-painted with it.
/// Output order matches input order.
pub fn map_to_canvas(images: &[LoadedImage]) -> Vec<Canvas> {
    images.iter().map(Canvas::from_image).collect()
}
