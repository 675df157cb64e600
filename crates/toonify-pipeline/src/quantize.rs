//! Color palette reduction.
//!
//! Two interchangeable strategies:
//!
//! - **k-means**: Lloyd's algorithm over the image's RGB samples with
//!   random restarts, keeping the clustering with the lowest
//!   within-cluster variance. Produces smooth, image-adapted palettes
//!   but is seed-dependent unless `kmeans_seed` is set.
//! - **uniform**: fixed per-channel bucketing. Deterministic and
//!   cheap, with visibly coarser banding.

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::types::{CartoonConfig, PipelineError, QuantMethod, RgbImage, Stage};

/// Maximum Lloyd iterations per restart.
const MAX_ITERATIONS: u32 = 100;

/// Convergence epsilon: stop when no centroid moved farther than this.
const CONVERGENCE_EPSILON: f32 = 0.2;

/// Number of independent restarts; the lowest-variance result wins.
const RESTARTS: u32 = 10;

/// Reduce the image's palette according to the config.
///
/// The output has the same dimensions as the input and at most
/// `num_colors` distinct colors (k-means) or at most `num_colors`
/// distinct values per channel (uniform).
///
/// # Errors
///
/// Returns [`PipelineError::Stage`] for the k-means method when the
/// image has fewer pixels than `num_colors`.
pub fn quantize(image: &RgbImage, config: &CartoonConfig) -> Result<RgbImage, PipelineError> {
    match config.quant_method {
        QuantMethod::Kmeans => kmeans_quantize(image, config.num_colors, config.kmeans_seed),
        QuantMethod::Uniform => Ok(uniform_quantize(image, config.num_colors)),
    }
}

/// Uniform per-channel bucket quantization.
///
/// Bucket width is `256 / num_colors` (integer floor); each channel
/// value maps to the floor of its bucket. Idempotent: re-quantizing
/// with the same `num_colors` is a no-op.
#[must_use = "returns the quantized image"]
pub fn uniform_quantize(image: &RgbImage, num_colors: u32) -> RgbImage {
    // Degenerate palettes (validation rejects them upstream) would
    // make the bucket width 0 or overflow u8; pass the image through.
    if num_colors == 0 || num_colors > 128 {
        return image.clone();
    }
    #[allow(clippy::cast_possible_truncation)]
    let div = (256 / num_colors) as u8;
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y).0;
        image::Rgb([
            p[0] / div * div,
            p[1] / div * div,
            p[2] / div * div,
        ])
    })
}

/// Squared Euclidean distance between two RGB samples.
fn distance_squared(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr.mul_add(dr, dg.mul_add(dg, db * db))
}

/// Index of the centroid nearest to `sample`.
fn nearest_centroid(sample: [f32; 3], centroids: &[[f32; 3]]) -> usize {
    let mut best_index = 0;
    let mut best_dist = f32::INFINITY;
    for (i, &c) in centroids.iter().enumerate() {
        let d = distance_squared(sample, c);
        if d < best_dist {
            best_dist = d;
            best_index = i;
        }
    }
    best_index
}

/// One full Lloyd run from the given initial centroids.
///
/// Returns the converged centroids and the within-cluster sum of
/// squared distances (compactness). An empty cluster keeps its
/// previous centroid.
fn lloyd_run(samples: &[[f32; 3]], mut centroids: Vec<[f32; 3]>) -> (Vec<[f32; 3]>, f64) {
    let k = centroids.len();

    for _ in 0..MAX_ITERATIONS {
        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0u64; k];

        for &s in samples {
            let idx = nearest_centroid(s, &centroids);
            for c in 0..3 {
                sums[idx][c] += f64::from(s[c]);
            }
            counts[idx] += 1;
        }

        let mut max_shift = 0.0f32;
        for (i, centroid) in centroids.iter_mut().enumerate() {
            if counts[i] == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let updated: [f32; 3] =
                std::array::from_fn(|c| (sums[i][c] / counts[i] as f64) as f32);
            max_shift = max_shift.max(distance_squared(*centroid, updated).sqrt());
            *centroid = updated;
        }

        if max_shift < CONVERGENCE_EPSILON {
            break;
        }
    }

    let compactness: f64 = samples
        .iter()
        .map(|&s| f64::from(distance_squared(s, centroids[nearest_centroid(s, &centroids)])))
        .sum();
    (centroids, compactness)
}

/// K-means palette quantization with random restarts.
///
/// Runs Lloyd's algorithm [`RESTARTS`] times from different random
/// initial centroids (drawn from the image's distinct colors) and
/// keeps the result with the lowest compactness. Every pixel is then
/// replaced by its cluster's centroid, rounded to the nearest integer
/// channel value.
///
/// With `seed = None` the initialization is entropy-seeded and
/// repeated calls may legitimately differ; a fixed seed makes the
/// output reproducible.
///
/// Initial centroids are drawn from the image's distinct colors when
/// there are at least `num_colors` of them, otherwise from raw pixel
/// samples (duplicate centroids collapse harmlessly: an all-black
/// image quantizes to all black for any `num_colors`).
///
/// # Errors
///
/// Returns [`PipelineError::Stage`] if the image has fewer pixels than
/// `num_colors`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn kmeans_quantize(
    image: &RgbImage,
    num_colors: u32,
    seed: Option<u64>,
) -> Result<RgbImage, PipelineError> {
    let k = num_colors as usize;
    let samples: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| [f32::from(p.0[0]), f32::from(p.0[1]), f32::from(p.0[2])])
        .collect();
    if samples.len() < k {
        return Err(PipelineError::stage(
            Stage::Quantize,
            format!(
                "requested {k} colors but the image has only {} pixels",
                samples.len(),
            ),
        ));
    }

    let distinct: Vec<[f32; 3]> = {
        let mut seen = HashSet::new();
        image
            .pixels()
            .filter(|p| seen.insert(p.0))
            .map(|p| [f32::from(p.0[0]), f32::from(p.0[1]), f32::from(p.0[2])])
            .collect()
    };
    let pool: &[[f32; 3]] = if distinct.len() >= k { &distinct } else { &samples };

    let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

    let mut best: Option<(Vec<[f32; 3]>, f64)> = None;
    for _ in 0..RESTARTS {
        let initial: Vec<[f32; 3]> = pool.choose_multiple(&mut rng, k).copied().collect();
        let (centroids, compactness) = lloyd_run(&samples, initial);
        if best.as_ref().is_none_or(|(_, c)| compactness < *c) {
            best = Some((centroids, compactness));
        }
    }

    let Some((centroids, _)) = best else {
        return Err(PipelineError::stage(Stage::Quantize, "clustering produced no result"));
    };

    let palette: Vec<[u8; 3]> = centroids
        .iter()
        .map(|c| std::array::from_fn(|i| c[i].round().clamp(0.0, 255.0) as u8))
        .collect();

    let width = image.width();
    Ok(RgbImage::from_fn(width, image.height(), |x, y| {
        let idx = (y * width + x) as usize;
        image::Rgb(palette[nearest_centroid(samples[idx], &centroids)])
    }))
}
