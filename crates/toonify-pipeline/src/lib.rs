//! toonify-pipeline: Pure cartoon-effect image pipeline (sans-IO).
//!
//! Converts a color photograph into a stylized cartoon rendition
//! through: edge-preserving smoothing -> edge extraction -> color
//! quantization -> saturation boost -> edge-overlay compositing.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! [`RgbImage`] buffers and returns structured data. File loading,
//! preset persistence, and batch iteration live in sibling crates.
//!
//! The pipeline is single-threaded, synchronous, and stateless between
//! invocations: it never mutates its input, holds no globals, and may
//! run on any worker thread the caller chooses. Output is fully
//! determined by the input image and [`CartoonConfig`], except for
//! k-means quantization with `kmeans_seed = None`, whose centroid
//! initialization is random by design.

mod canny;
pub mod composite;
pub mod edge;
pub mod quantize;
pub mod resize;
pub mod saturate;
pub mod smooth;
pub mod types;

pub use resize::resize_to_bounds;
pub use types::{
    CartoonConfig, CartoonResult, EdgeMethod, GrayImage, PipelineError, QuantMethod, RgbImage,
    Stage,
};

/// Run the full cartoon-effect pipeline.
///
/// Produces the final stylized image together with every intermediate
/// artifact (edge mask, smoothed image, quantized image) so diagnostic
/// views can show each stage. All artifacts share the input's width
/// and height; the bundle is either fully populated or not returned at
/// all.
///
/// # Pipeline steps
///
/// 1. Edge-preserving smoothing (bilateral x2, or median blur)
/// 2. Edge mask extraction from the *original* image
/// 3. Color quantization of the smoothed image (k-means or uniform)
/// 4. Saturation enhancement in HSV space
/// 5. Edge-overlay compositing (bitwise AND with inverted mask)
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if any config field is
/// outside its documented domain, [`PipelineError::InvalidImage`] if
/// the image has zero-sized dimensions, and [`PipelineError::Stage`]
/// if an individual stage fails (e.g. k-means asked for more colors
/// than the image has pixels). Stage failures always propagate; the
/// pipeline never substitutes a blank artifact.
pub fn apply_cartoon_effect(
    image: &RgbImage,
    config: &CartoonConfig,
) -> Result<CartoonResult, PipelineError> {
    config.validate()?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::InvalidImage(format!(
            "zero-sized dimensions {}x{}",
            image.width(),
            image.height(),
        )));
    }

    // 1. Smooth the color regions.
    let filtered = smooth::smooth(image, config);

    // 2. Extract the edge mask from the unsmoothed original.
    let edges = edge::detect_edges(image, config);

    // 3. Flatten the palette of the smoothed image.
    let quantized = quantize::quantize(&filtered, config)?;

    // 4. Boost saturation for the cartoon look.
    let saturated = saturate::enhance_saturation(&quantized, config);

    // 5. Draw the line-art over the color regions.
    let cartoon = composite::composite(&saturated, &edges);

    Ok(CartoonResult {
        cartoon,
        edges,
        filtered,
        quantized,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Small two-tone test image with a sharp vertical boundary.
    fn two_tone_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _y| {
            if x < width / 2 {
                image::Rgb([30, 60, 90])
            } else {
                image::Rgb([220, 180, 140])
            }
        })
    }

    /// Config with uniform quantization for deterministic assertions.
    fn deterministic_config() -> CartoonConfig {
        CartoonConfig {
            quant_method: QuantMethod::Uniform,
            ..CartoonConfig::default()
        }
    }

    #[test]
    fn all_artifacts_share_input_dimensions() {
        let img = two_tone_image(24, 18);
        let result = apply_cartoon_effect(&img, &deterministic_config()).unwrap();
        for (name, dims) in [
            ("cartoon", result.cartoon.dimensions()),
            ("filtered", result.filtered.dimensions()),
            ("quantized", result.quantized.dimensions()),
            ("edges", result.edges.dimensions()),
        ] {
            assert_eq!(dims, (24, 18), "{name} changed shape");
        }
    }

    #[test]
    fn black_image_stays_black_with_defaults() {
        // Default config includes k-means; an all-black image must
        // survive with no spurious edges and no color shift.
        let img = RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 0]));
        let config = CartoonConfig {
            kmeans_seed: Some(0),
            ..CartoonConfig::default()
        };
        let result = apply_cartoon_effect(&img, &config).unwrap();

        assert!(
            result.edges.pixels().all(|p| p.0[0] == 0),
            "expected an all-zero edge mask",
        );
        assert!(
            result.cartoon.pixels().all(|p| p.0 == [0, 0, 0]),
            "expected an entirely black cartoon",
        );
    }

    #[test]
    fn zero_sized_image_rejected() {
        let img = RgbImage::new(0, 0);
        let err = apply_cartoon_effect(&img, &deterministic_config()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidImage(_)));
    }

    #[test]
    fn invalid_config_rejected_before_processing() {
        let img = two_tone_image(8, 8);
        let config = CartoonConfig {
            num_colors: 1,
            ..CartoonConfig::default()
        };
        let err = apply_cartoon_effect(&img, &config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidParameter {
                field: "num_colors",
                ..
            }
        ));

        let config = CartoonConfig {
            saturation_factor: -1.0,
            ..CartoonConfig::default()
        };
        let err = apply_cartoon_effect(&img, &config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidParameter {
                field: "saturation_factor",
                ..
            }
        ));
    }

    #[test]
    fn inverted_canny_thresholds_still_produce_a_cartoon() {
        // Both thresholds are independently in [0, 255]; an inverted
        // pair is clamped inside edge detection, not an error and not
        // a panic.
        let img = two_tone_image(20, 20);
        let config = CartoonConfig {
            canny_threshold1: 200,
            canny_threshold2: 100,
            quant_method: QuantMethod::Uniform,
            ..CartoonConfig::default()
        };
        let result = apply_cartoon_effect(&img, &config).unwrap();
        assert_eq!(result.cartoon.dimensions(), (20, 20));
    }

    #[test]
    fn input_image_never_mutated() {
        let img = two_tone_image(16, 16);
        let copy = img.clone();
        let _ = apply_cartoon_effect(&img, &deterministic_config()).unwrap();
        assert_eq!(img, copy);
    }

    #[test]
    fn quantize_stage_failure_propagates() {
        // 1x1 image, k-means with more colors than pixels.
        let img = RgbImage::from_pixel(1, 1, image::Rgb([10, 20, 30]));
        let config = CartoonConfig {
            num_colors: 8,
            kmeans_seed: Some(0),
            ..CartoonConfig::default()
        };
        let err = apply_cartoon_effect(&img, &config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Stage {
                stage: Stage::Quantize,
                ..
            }
        ));
    }

    #[test]
    fn edge_pixels_are_black_in_the_cartoon() {
        let img = two_tone_image(24, 24);
        let result = apply_cartoon_effect(&img, &deterministic_config()).unwrap();
        let mut edge_pixels = 0;
        for (x, y, p) in result.edges.enumerate_pixels() {
            if p.0[0] == 255 {
                edge_pixels += 1;
                assert_eq!(
                    result.cartoon.get_pixel(x, y).0,
                    [0, 0, 0],
                    "edge pixel ({x},{y}) not blacked out",
                );
            }
        }
        assert!(edge_pixels > 0, "expected the boundary to produce edges");
    }

    #[test]
    fn seeded_pipeline_is_reproducible() {
        let img = two_tone_image(16, 16);
        let config = CartoonConfig {
            kmeans_seed: Some(99),
            ..CartoonConfig::default()
        };
        let a = apply_cartoon_effect(&img, &config).unwrap();
        let b = apply_cartoon_effect(&img, &config).unwrap();
        assert_eq!(a.cartoon, b.cartoon);
        assert_eq!(a.quantized, b.quantized);
    }

    #[test]
    fn result_bundle_is_independent_per_invocation() {
        let img = two_tone_image(12, 12);
        let config = deterministic_config();
        let first = apply_cartoon_effect(&img, &config).unwrap();
        let second = apply_cartoon_effect(&img, &config).unwrap();
        // Deterministic config: equal content, separately owned buffers.
        assert_eq!(first.cartoon, second.cartoon);
        assert_eq!(first.edges, second.edges);
    }
}
