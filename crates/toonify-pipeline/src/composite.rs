//! Edge-overlay compositing.
//!
//! The final pipeline step: the edge mask is inverted (edges become 0,
//! background 255), broadcast across the three color channels, and
//! combined with the color image by a per-pixel bitwise AND. Pixels on
//! a detected edge are forced to black, drawing hard line-art over the
//! flattened color regions.
//!
//! Bitwise AND with the inverted mask is deliberate: it produces crisp
//! black outlines rather than the softer result of alpha blending.

use image::GrayImage;

use crate::types::RgbImage;

/// Merge a color image with a binary edge mask.
///
/// Where the mask is 255 (an edge), output pixels are black; where it
/// is 0, the color pixel passes through untouched. Intermediate mask
/// values darken proportionally via the AND. Both inputs must share
/// dimensions; the smaller extent wins if they do not (callers inside
/// the pipeline always pass matching sizes).
#[must_use = "returns the composited image"]
pub fn composite(color: &RgbImage, edges: &GrayImage) -> RgbImage {
    let width = color.width().min(edges.width());
    let height = color.height().min(edges.height());
    RgbImage::from_fn(width, height, |x, y| {
        let keep = !edges.get_pixel(x, y).0[0];
        let p = color.get_pixel(x, y).0;
        image::Rgb([p[0] & keep, p[1] & keep, p[2] & keep])
    })
}
