//! Edge mask extraction.
//!
//! Converts the color input to luminance, optionally applies a Gaussian
//! pre-blur to suppress noise, runs one of three detectors (Canny via
//! the patched [`crate::canny`] module, hand-rolled Sobel gradients, or
//! a 3x3 Laplacian), and finally thickens the detected lines by
//! dilating with a square structuring element.
//!
//! Output convention: edge pixels are 255, background is 0.

use image::GrayImage;

use crate::types::{CartoonConfig, EdgeMethod, RgbImage};

/// Minimum effective Canny threshold.
///
/// A threshold of zero would mark every pixel with any gradient as a
/// potential edge, producing a degenerate all-edge mask that composites
/// to a black image. Both thresholds are floored here before the Canny
/// call.
pub const MIN_CANNY_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_CANNY_THRESHOLD > 0.0);

/// Extract a binary edge mask from a color image.
///
/// The mask has the same width and height as the input. The sobel and
/// laplacian methods reuse `canny_threshold1` as a plain binarization
/// cutoff rather than a hysteresis pair -- this asymmetry keeps the
/// parameter surface small and is preserved deliberately.
///
/// For the canny method both thresholds are floored at
/// [`MIN_CANNY_THRESHOLD`] and `canny_threshold1` is clamped to at most
/// `canny_threshold2`, so an inverted or zero pair behaves like the
/// equal-threshold case instead of failing.
///
/// Assumes a validated config (see [`CartoonConfig::validate`]); an
/// out-of-set `sobel_kernel_size` falls back to the default 3x3
/// kernels.
#[must_use = "returns the binary edge mask"]
pub fn detect_edges(image: &RgbImage, config: &CartoonConfig) -> GrayImage {
    let mut gray = image::imageops::grayscale(image);

    if config.edge_blur > 0 {
        gray = imageproc::filter::gaussian_blur_f32(&gray, sigma_for_kernel(config.edge_blur));
    }

    let threshold = config.canny_threshold1;
    let edges = match config.edge_method {
        EdgeMethod::Canny => {
            let high = f32::from(config.canny_threshold2).max(MIN_CANNY_THRESHOLD);
            let low = f32::from(config.canny_threshold1)
                .max(MIN_CANNY_THRESHOLD)
                .min(high);
            crate::canny::canny(&gray, low, high)
        }
        EdgeMethod::Sobel => {
            let magnitude = sobel_magnitude(&gray, config.sobel_kernel_size);
            threshold_binary(&rescale_min_max(&magnitude), gray.width(), gray.height(), threshold)
        }
        EdgeMethod::Laplacian => {
            let response = laplacian_abs(&gray);
            threshold_binary(&response, gray.width(), gray.height(), threshold)
        }
    };

    if config.line_size > 1 {
        dilate_square(&edges, config.line_size)
    } else {
        edges
    }
}

/// Sigma for a Gaussian kernel of odd size `k`, matching the classical
/// `0.3 * ((k - 1) * 0.5 - 1) + 0.8` convention so that kernel-size
/// sliders behave the way photographers expect.
#[allow(clippy::cast_precision_loss)]
fn sigma_for_kernel(k: u32) -> f32 {
    0.3 * ((k as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Separable derivative/smoothing kernel pair for a given Sobel size.
///
/// These are the classical extended Sobel kernels: the smoothing tap is
/// a binomial row, the derivative tap its discrete difference.
const fn sobel_kernels(ksize: u32) -> (&'static [f32], &'static [f32]) {
    match ksize {
        1 => (&[-1.0, 0.0, 1.0], &[1.0]),
        5 => (
            &[-1.0, -2.0, 0.0, 2.0, 1.0],
            &[1.0, 4.0, 6.0, 4.0, 1.0],
        ),
        7 => (
            &[-1.0, -4.0, -5.0, 0.0, 5.0, 4.0, 1.0],
            &[1.0, 6.0, 15.0, 20.0, 15.0, 6.0, 1.0],
        ),
        _ => (&[-1.0, 0.0, 1.0], &[1.0, 2.0, 1.0]),
    }
}

/// Euclidean gradient magnitude from horizontal and vertical Sobel
/// convolutions of size `ksize`.
fn sobel_magnitude(gray: &GrayImage, ksize: u32) -> Vec<f32> {
    let (deriv, smooth) = sobel_kernels(ksize);
    let gx = separable_filter(gray, deriv, smooth);
    let gy = separable_filter(gray, smooth, deriv);
    gx.iter().zip(&gy).map(|(&x, &y)| x.hypot(y)).collect()
}

/// Absolute 3x3 Laplacian response, saturated to [0, 255].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn laplacian_abs(gray: &GrayImage) -> Vec<f32> {
    let (w, h) = (i64::from(gray.width()), i64::from(gray.height()));
    let at = |x: i64, y: i64| -> f32 {
        let px = reflect(x, w) as u32;
        let py = reflect(y, h) as u32;
        f32::from(gray.get_pixel(px, py).0[0])
    };

    let mut out = Vec::with_capacity(usize::try_from(w * h).unwrap_or(0));
    for y in 0..h {
        for x in 0..w {
            let response =
                at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4.0 * at(x, y);
            out.push(response.abs().min(255.0));
        }
    }
    out
}

/// Apply a separable convolution (horizontal kernel along x, vertical
/// kernel along y) with reflect-101 border handling, accumulating in
/// f32 so gradient sign and range survive.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
fn separable_filter(gray: &GrayImage, horizontal: &[f32], vertical: &[f32]) -> Vec<f32> {
    let (w, h) = (i64::from(gray.width()), i64::from(gray.height()));
    let size = usize::try_from(w * h).unwrap_or(0);
    let h_anchor = horizontal.len() as i64 / 2;
    let v_anchor = vertical.len() as i64 / 2;

    // Horizontal pass.
    let mut temp = vec![0.0f32; size];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (i, &k) in horizontal.iter().enumerate() {
                let sx = reflect(x + i as i64 - h_anchor, w);
                acc += k * f32::from(gray.get_pixel(sx as u32, y as u32).0[0]);
            }
            temp[(y * w + x) as usize] = acc;
        }
    }

    // Vertical pass.
    let mut out = vec![0.0f32; size];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (i, &k) in vertical.iter().enumerate() {
                let sy = reflect(y + i as i64 - v_anchor, h);
                acc += k * temp[(sy * w + x) as usize];
            }
            out[(y * w + x) as usize] = acc;
        }
    }
    out
}

/// Reflect-101 border index: `-1 -> 1`, `len -> len - 2`.
fn reflect(mut i: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= len {
            i = 2 * (len - 1) - i;
        } else {
            return i;
        }
    }
}

/// Rescale values linearly so the observed min/max map to [0, 255].
/// A constant input maps to all zeros.
fn rescale_min_max(values: &[f32]) -> Vec<f32> {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max <= min {
        return vec![0.0; values.len()];
    }
    let scale = 255.0 / (max - min);
    values.iter().map(|&v| (v - min) * scale).collect()
}

/// Binarize a row-major response buffer: values strictly above
/// `threshold` become 255, the rest 0.
fn threshold_binary(values: &[f32], width: u32, height: u32, threshold: u8) -> GrayImage {
    let cutoff = f32::from(threshold);
    GrayImage::from_fn(width, height, |x, y| {
        let v = values[(y * width + x) as usize];
        image::Luma([if v > cutoff { 255 } else { 0 }])
    })
}

/// Dilate a binary mask with a square structuring element of the exact
/// given side, one iteration.
///
/// Implemented as a separable running max so even sides are supported
/// (`imageproc::morphology::dilate` only expresses odd sides via a
/// radius). For even sides the anchor sits at `side / 2`, giving the
/// window offsets `[-(side / 2), side - 1 - side / 2]`.
#[must_use = "returns the dilated mask"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn dilate_square(mask: &GrayImage, side: u32) -> GrayImage {
    if side <= 1 {
        return mask.clone();
    }
    let (w, h) = (i64::from(mask.width()), i64::from(mask.height()));
    let lo = -i64::from(side / 2);
    let hi = i64::from(side - 1 - side / 2);

    // Horizontal max.
    let horizontal = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let mut best = 0u8;
        for dx in lo..=hi {
            let sx = i64::from(x) + dx;
            if (0..w).contains(&sx) {
                best = best.max(mask.get_pixel(sx as u32, y).0[0]);
            }
        }
        image::Luma([best])
    });

    // Vertical max.
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let mut best = 0u8;
        for dy in lo..=hi {
            let sy = i64::from(y) + dy;
            if (0..h).contains(&sy) {
                best = best.max(horizontal.get_pixel(x, sy as u32).0[0]);
            }
        }
        image::Luma([best])
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// 20x20 color image with a sharp vertical black/white boundary at x=10.
    fn sharp_edge_image() -> RgbImage {
        RgbImage::from_fn(20, 20, |x, _y| {
            if x < 10 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 255, 255])
            }
        })
    }

    fn edge_count(mask: &GrayImage) -> u32 {
        mask.pixels().map(|p| u32::from(p.0[0] > 0)).sum()
    }

    #[test]
    fn canny_mask_is_binary() {
        let img = sharp_edge_image();
        let config = crate::CartoonConfig::default();
        let mask = detect_edges(&img, &config);
        for pixel in mask.pixels() {
            assert!(
                pixel.0[0] == 0 || pixel.0[0] == 255,
                "expected binary mask, got {}",
                pixel.0[0],
            );
        }
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = RgbImage::new(17, 31);
        for method in [EdgeMethod::Canny, EdgeMethod::Sobel, EdgeMethod::Laplacian] {
            let config = crate::CartoonConfig {
                edge_method: method,
                ..crate::CartoonConfig::default()
            };
            let mask = detect_edges(&img, &config);
            assert_eq!(mask.width(), 17, "{method} width");
            assert_eq!(mask.height(), 31, "{method} height");
        }
    }

    #[test]
    fn uniform_image_produces_empty_mask() {
        let img = RgbImage::from_pixel(20, 20, image::Rgb([128, 128, 128]));
        for method in [EdgeMethod::Canny, EdgeMethod::Sobel, EdgeMethod::Laplacian] {
            let config = crate::CartoonConfig {
                edge_method: method,
                ..crate::CartoonConfig::default()
            };
            let mask = detect_edges(&img, &config);
            assert_eq!(edge_count(&mask), 0, "{method} found edges in a flat image");
        }
    }

    #[test]
    fn sharp_boundary_detected_by_all_methods() {
        let img = sharp_edge_image();
        for method in [EdgeMethod::Canny, EdgeMethod::Sobel, EdgeMethod::Laplacian] {
            let config = crate::CartoonConfig {
                edge_method: method,
                ..crate::CartoonConfig::default()
            };
            let mask = detect_edges(&img, &config);
            assert!(edge_count(&mask) > 0, "{method} missed a sharp boundary");
        }
    }

    #[test]
    fn dilation_thickens_lines() {
        let img = sharp_edge_image();
        let thin = crate::CartoonConfig {
            line_size: 1,
            ..crate::CartoonConfig::default()
        };
        let thick = crate::CartoonConfig {
            line_size: 7,
            ..crate::CartoonConfig::default()
        };
        let thin_count = edge_count(&detect_edges(&img, &thin));
        let thick_count = edge_count(&detect_edges(&img, &thick));
        assert!(
            thick_count > thin_count,
            "expected dilation to add edge pixels: {thin_count} -> {thick_count}",
        );
    }

    #[test]
    fn dilated_mask_stays_binary() {
        let img = sharp_edge_image();
        let config = crate::CartoonConfig::default();
        let mask = detect_edges(&img, &config);
        for pixel in mask.pixels() {
            assert!(pixel.0[0] == 0 || pixel.0[0] == 255);
        }
    }

    #[test]
    fn dilate_single_pixel_odd_side() {
        let mut mask = GrayImage::new(9, 9);
        mask.put_pixel(4, 4, image::Luma([255]));
        let dilated = dilate_square(&mask, 3);
        // 3x3 square centered on (4,4).
        assert_eq!(edge_count(&dilated), 9);
        assert_eq!(dilated.get_pixel(3, 3).0[0], 255);
        assert_eq!(dilated.get_pixel(5, 5).0[0], 255);
        assert_eq!(dilated.get_pixel(2, 4).0[0], 0);
    }

    #[test]
    fn dilate_single_pixel_even_side() {
        let mut mask = GrayImage::new(9, 9);
        mask.put_pixel(4, 4, image::Luma([255]));
        let dilated = dilate_square(&mask, 2);
        // Side 2, anchor at 1: window offsets [-1, 0] in each axis, so
        // the hit spreads to (4,4), (5,4), (4,5), (5,5).
        assert_eq!(edge_count(&dilated), 4);
        assert_eq!(dilated.get_pixel(5, 5).0[0], 255);
        assert_eq!(dilated.get_pixel(3, 4).0[0], 0);
    }

    #[test]
    fn dilate_side_one_is_identity() {
        let mut mask = GrayImage::new(5, 5);
        mask.put_pixel(2, 2, image::Luma([255]));
        assert_eq!(dilate_square(&mask, 1), mask);
    }

    #[test]
    fn sobel_kernel_sizes_all_detect_boundary() {
        let img = sharp_edge_image();
        for ksize in [1, 3, 5, 7] {
            let config = crate::CartoonConfig {
                edge_method: EdgeMethod::Sobel,
                sobel_kernel_size: ksize,
                line_size: 1,
                ..crate::CartoonConfig::default()
            };
            let mask = detect_edges(&img, &config);
            assert!(edge_count(&mask) > 0, "ksize {ksize} missed the boundary");
        }
    }

    #[test]
    fn zero_edge_blur_skips_preblur() {
        // With no pre-blur a one-pixel-wide line survives the laplacian.
        let mut img = RgbImage::from_pixel(11, 11, image::Rgb([0, 0, 0]));
        for y in 0..11 {
            img.put_pixel(5, y, image::Rgb([255, 255, 255]));
        }
        let config = crate::CartoonConfig {
            edge_method: EdgeMethod::Laplacian,
            edge_blur: 0,
            line_size: 1,
            ..crate::CartoonConfig::default()
        };
        let mask = detect_edges(&img, &config);
        assert!(edge_count(&mask) > 0);
    }

    #[test]
    fn inverted_canny_thresholds_match_equal_pair() {
        // t1 > t2 is in-domain; the low threshold is clamped down to
        // the high one instead of tripping imageproc's assertion.
        let img = sharp_edge_image();
        let inverted = crate::CartoonConfig {
            canny_threshold1: 200,
            canny_threshold2: 100,
            ..crate::CartoonConfig::default()
        };
        let equal = crate::CartoonConfig {
            canny_threshold1: 100,
            canny_threshold2: 100,
            ..crate::CartoonConfig::default()
        };
        assert_eq!(detect_edges(&img, &inverted), detect_edges(&img, &equal));
    }

    #[test]
    fn equal_canny_thresholds_detect_boundary() {
        let img = sharp_edge_image();
        let config = crate::CartoonConfig {
            canny_threshold1: 100,
            canny_threshold2: 100,
            ..crate::CartoonConfig::default()
        };
        assert!(edge_count(&detect_edges(&img, &config)) > 0);
    }

    #[test]
    fn zero_canny_thresholds_do_not_panic() {
        // t1 = t2 = 0 floors to the minimum threshold; the dense mask
        // is fine, the hysteresis border underflow is not.
        let img = sharp_edge_image();
        let config = crate::CartoonConfig {
            canny_threshold1: 0,
            canny_threshold2: 0,
            ..crate::CartoonConfig::default()
        };
        let mask = detect_edges(&img, &config);
        assert_eq!(mask.dimensions(), (20, 20));
        for pixel in mask.pixels() {
            assert!(pixel.0[0] == 0 || pixel.0[0] == 255);
        }
    }

    #[test]
    fn zero_low_threshold_is_floored_to_min() {
        let img = sharp_edge_image();
        let zero = crate::CartoonConfig {
            canny_threshold1: 0,
            canny_threshold2: 150,
            ..crate::CartoonConfig::default()
        };
        let min = crate::CartoonConfig {
            canny_threshold1: 1,
            canny_threshold2: 150,
            ..crate::CartoonConfig::default()
        };
        assert_eq!(detect_edges(&img, &zero), detect_edges(&img, &min));
    }

    #[test]
    fn rescale_constant_input_is_all_zero() {
        let rescaled = rescale_min_max(&[7.5; 16]);
        assert!(rescaled.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rescale_maps_extremes_to_full_range() {
        let rescaled = rescale_min_max(&[10.0, 20.0, 30.0]);
        assert!((rescaled[0]).abs() < 1e-5);
        assert!((rescaled[1] - 127.5).abs() < 1e-3);
        assert!((rescaled[2] - 255.0).abs() < 1e-3);
    }

    #[test]
    fn reflect_101_indices() {
        assert_eq!(reflect(-1, 10), 1);
        assert_eq!(reflect(-2, 10), 2);
        assert_eq!(reflect(10, 10), 8);
        assert_eq!(reflect(11, 10), 7);
        assert_eq!(reflect(5, 10), 5);
        assert_eq!(reflect(-3, 1), 0);
    }
}
