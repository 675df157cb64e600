//! Saturation enhancement in hue-saturation-value space.
//!
//! Each pixel is converted RGB -> HSV, the saturation channel is
//! multiplied by `saturation_factor` and clamped, and the pixel is
//! converted back. Hue and value pass through unchanged, so a factor
//! of 1.0 is a no-op within rounding.
//!
//! The intermediate HSV values stay in f32 (S and V scaled to
//! [0, 255], H in degrees) rather than being quantized to bytes, which
//! keeps the round trip exact to within one least significant bit.

use crate::types::{CartoonConfig, RgbImage};

/// Boost the color saturation of an image by `config.saturation_factor`.
///
/// Purely per-pixel; the output has the same dimensions as the input
/// and the input is never mutated.
#[must_use = "returns the saturated image"]
pub fn enhance_saturation(image: &RgbImage, config: &CartoonConfig) -> RgbImage {
    scale_saturation(image, config.saturation_factor)
}

/// Multiply every pixel's saturation by `factor`, clamping to [0, 255].
#[must_use = "returns the saturated image"]
pub fn scale_saturation(image: &RgbImage, factor: f32) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let s = (s * factor).clamp(0.0, 255.0);
        image::Rgb(hsv_to_rgb(h, s, v))
    })
}

/// Convert an 8-bit RGB triple to (hue in degrees [0, 360), saturation
/// [0, 255], value [0, 255]) as f32.
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = f32::from(r);
    let g = f32::from(g);
    let b = f32::from(b);

    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v == 0.0 { 0.0 } else { delta / v * 255.0 };

    let h = if delta == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / delta
    } else if v == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    (h, s, v)
}

/// Convert (hue in degrees, saturation [0, 255], value [0, 255]) back
/// to an 8-bit RGB triple.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let to_u8 = |value: f32| value.round().clamp(0.0, 255.0) as u8;

    let s = s / 255.0;
    if s <= 0.0 {
        let gray = to_u8(v);
        return [gray, gray, gray];
    }

    let sector = (h / 60.0).rem_euclid(6.0);
    let i = sector.floor();
    let f = sector - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match i as u32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [to_u8(r), to_u8(g), to_u8(b)]
}
