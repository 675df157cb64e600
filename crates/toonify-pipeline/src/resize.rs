//! Aspect-ratio-preserving downscale to ingestion bounds.
//!
//! Large photographs are resized before the first pipeline invocation
//! so the expensive stages (bilateral smoothing, k-means) operate on a
//! bounded pixel grid. Not part of the stylization pipeline proper;
//! callers invoke it once at ingestion.

use image::imageops::FilterType;

use crate::types::RgbImage;

/// Downscale an image so neither dimension exceeds the given bounds,
/// preserving aspect ratio. Images already within bounds are returned
/// unchanged; this never upscales. Bounds of 0 are treated as 1.
#[must_use = "returns the resized image"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn resize_to_bounds(image: &RgbImage, max_width: u32, max_height: u32) -> RgbImage {
    let max_width = max_width.max(1);
    let max_height = max_height.max(1);
    let (w, h) = image.dimensions();
    if w <= max_width && h <= max_height {
        return image.clone();
    }

    let ratio = (f64::from(max_width) / f64::from(w)).min(f64::from(max_height) / f64::from(h));
    let new_w = ((f64::from(w) * ratio).round() as u32).max(1);
    let new_h = ((f64::from(h) * ratio).round() as u32).max(1);

    image::imageops::resize(image, new_w, new_h, FilterType::Triangle)
}
