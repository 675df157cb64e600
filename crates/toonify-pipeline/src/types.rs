//! Shared types for the toonify cartoon-effect pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference edge masks
/// without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference color
/// buffers without depending on `image` directly.
///
/// Channel order is **RGB** throughout the pipeline. Every stage
/// consumes and produces this ordering; there is no BGR anywhere.
pub use image::RgbImage;

/// Edge extraction algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMethod {
    /// Two-threshold hysteresis detector (Canny). Uses both
    /// `canny_threshold1` and `canny_threshold2`.
    Canny,
    /// Gradient magnitude via horizontal/vertical Sobel convolutions,
    /// min-max rescaled then binarized at `canny_threshold1`.
    Sobel,
    /// Discrete 3x3 Laplacian, absolute value, binarized at
    /// `canny_threshold1`.
    Laplacian,
}

impl Default for EdgeMethod {
    fn default() -> Self {
        Self::Canny
    }
}

impl fmt::Display for EdgeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canny => f.write_str("canny"),
            Self::Sobel => f.write_str("sobel"),
            Self::Laplacian => f.write_str("laplacian"),
        }
    }
}

/// Color quantization algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantMethod {
    /// Lloyd's k-means over RGB samples with random restarts.
    /// Non-deterministic unless `kmeans_seed` is set.
    Kmeans,
    /// Uniform per-channel bucketing: `value / div * div` with
    /// `div = 256 / num_colors`. Deterministic, visibly banded.
    Uniform,
}

impl Default for QuantMethod {
    fn default() -> Self {
        Self::Kmeans
    }
}

impl fmt::Display for QuantMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kmeans => f.write_str("kmeans"),
            Self::Uniform => f.write_str("uniform"),
        }
    }
}

/// Configuration for the cartoon-effect pipeline.
///
/// A flat, self-contained record: given the same config and input
/// image, pipeline output is fully determined (except for k-means with
/// `kmeans_seed = None`, where centroid initialization is random).
///
/// All fields have documented domains enforced by [`validate`]
/// (`Self::validate`). Out-of-domain values are **rejected**, never
/// clamped, so a bad slider or preset value surfaces as an error
/// instead of silently producing a different picture.
///
/// # Kernel oddness policy
///
/// `edge_blur` must be 0 (disabled) or odd; `blur_strength` must be
/// odd; `sobel_kernel_size` must be one of 1, 3, 5, 7. Even values are
/// rejected by [`validate`](Self::validate) rather than rounded.
/// `line_size` has no oddness restriction: dilation uses an exact
/// `line_size`-sided square structuring element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartoonConfig {
    /// Which edge extraction algorithm to use.
    pub edge_method: EdgeMethod,

    /// Canny low threshold. Also reused as the plain binarization
    /// cutoff for the sobel and laplacian methods -- an intentional
    /// parameter-surface simplification, not a hysteresis pair there.
    pub canny_threshold1: u8,

    /// Canny high threshold. Ignored by the sobel/laplacian methods.
    pub canny_threshold2: u8,

    /// Sobel kernel size: 1, 3, 5, or 7.
    pub sobel_kernel_size: u32,

    /// Gaussian pre-blur kernel size applied before edge detection.
    /// 0 disables the blur; otherwise must be odd and at most 15.
    pub edge_blur: u32,

    /// Side of the square structuring element used to dilate the edge
    /// mask, in [1, 15]. 1 disables dilation.
    pub line_size: u32,

    /// Bilateral filter neighborhood diameter, in [1, 25].
    pub bilateral_d: u32,

    /// Bilateral filter color-similarity sigma, in [10, 250].
    pub bilateral_sigma_color: f32,

    /// Bilateral filter spatial sigma, in [10, 250].
    pub bilateral_sigma_space: f32,

    /// `true`: smooth with a two-pass bilateral filter (edge-aware).
    /// `false`: smooth with a median blur of window `blur_strength`.
    pub edge_preserve: bool,

    /// Median blur window (odd). Only used when `edge_preserve` is
    /// `false`.
    pub blur_strength: u32,

    /// Which color quantization algorithm to use.
    pub quant_method: QuantMethod,

    /// Target palette size, in [2, 32].
    pub num_colors: u32,

    /// Saturation channel multiplier, in [0.5, 3.0]. 1.0 is a no-op.
    pub saturation_factor: f32,

    /// Seed for k-means centroid initialization. `None` seeds from
    /// entropy, making repeated runs legitimately differ; set a seed
    /// for reproducible output.
    #[serde(default)]
    pub kmeans_seed: Option<u64>,
}

impl CartoonConfig {
    /// Default Canny low threshold / sobel-laplacian cutoff.
    pub const DEFAULT_CANNY_THRESHOLD1: u8 = 100;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_THRESHOLD2: u8 = 200;
    /// Default Sobel kernel size.
    pub const DEFAULT_SOBEL_KERNEL_SIZE: u32 = 3;
    /// Default Gaussian pre-blur kernel size.
    pub const DEFAULT_EDGE_BLUR: u32 = 5;
    /// Default edge dilation square side.
    pub const DEFAULT_LINE_SIZE: u32 = 7;
    /// Default bilateral neighborhood diameter.
    pub const DEFAULT_BILATERAL_D: u32 = 9;
    /// Default bilateral color sigma.
    pub const DEFAULT_BILATERAL_SIGMA_COLOR: f32 = 75.0;
    /// Default bilateral spatial sigma.
    pub const DEFAULT_BILATERAL_SIGMA_SPACE: f32 = 75.0;
    /// Default median blur window.
    pub const DEFAULT_BLUR_STRENGTH: u32 = 7;
    /// Default palette size.
    pub const DEFAULT_NUM_COLORS: u32 = 8;
    /// Default saturation multiplier.
    pub const DEFAULT_SATURATION_FACTOR: f32 = 1.5;

    /// Check every field against its documented domain.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] naming the first
    /// offending field. Values are never clamped.
    pub fn validate(&self) -> Result<(), PipelineError> {
        // u8 fields are domain-valid by construction ([0, 255]).
        if !matches!(self.sobel_kernel_size, 1 | 3 | 5 | 7) {
            return Err(PipelineError::invalid_parameter(
                "sobel_kernel_size",
                format!("must be 1, 3, 5, or 7, got {}", self.sobel_kernel_size),
            ));
        }
        if self.edge_blur > 15 {
            return Err(PipelineError::invalid_parameter(
                "edge_blur",
                format!("must be at most 15, got {}", self.edge_blur),
            ));
        }
        if self.edge_blur != 0 && self.edge_blur % 2 == 0 {
            return Err(PipelineError::invalid_parameter(
                "edge_blur",
                format!("must be 0 or odd, got {}", self.edge_blur),
            ));
        }
        if !(1..=15).contains(&self.line_size) {
            return Err(PipelineError::invalid_parameter(
                "line_size",
                format!("must be in [1, 15], got {}", self.line_size),
            ));
        }
        if !(1..=25).contains(&self.bilateral_d) {
            return Err(PipelineError::invalid_parameter(
                "bilateral_d",
                format!("must be in [1, 25], got {}", self.bilateral_d),
            ));
        }
        if !(10.0..=250.0).contains(&self.bilateral_sigma_color) {
            return Err(PipelineError::invalid_parameter(
                "bilateral_sigma_color",
                format!("must be in [10, 250], got {}", self.bilateral_sigma_color),
            ));
        }
        if !(10.0..=250.0).contains(&self.bilateral_sigma_space) {
            return Err(PipelineError::invalid_parameter(
                "bilateral_sigma_space",
                format!("must be in [10, 250], got {}", self.bilateral_sigma_space),
            ));
        }
        if self.blur_strength % 2 == 0 {
            return Err(PipelineError::invalid_parameter(
                "blur_strength",
                format!("must be odd, got {}", self.blur_strength),
            ));
        }
        if !(2..=32).contains(&self.num_colors) {
            return Err(PipelineError::invalid_parameter(
                "num_colors",
                format!("must be in [2, 32], got {}", self.num_colors),
            ));
        }
        if !(0.5..=3.0).contains(&self.saturation_factor) {
            return Err(PipelineError::invalid_parameter(
                "saturation_factor",
                format!("must be in [0.5, 3.0], got {}", self.saturation_factor),
            ));
        }
        Ok(())
    }
}

impl Default for CartoonConfig {
    fn default() -> Self {
        Self {
            edge_method: EdgeMethod::default(),
            canny_threshold1: Self::DEFAULT_CANNY_THRESHOLD1,
            canny_threshold2: Self::DEFAULT_CANNY_THRESHOLD2,
            sobel_kernel_size: Self::DEFAULT_SOBEL_KERNEL_SIZE,
            edge_blur: Self::DEFAULT_EDGE_BLUR,
            line_size: Self::DEFAULT_LINE_SIZE,
            bilateral_d: Self::DEFAULT_BILATERAL_D,
            bilateral_sigma_color: Self::DEFAULT_BILATERAL_SIGMA_COLOR,
            bilateral_sigma_space: Self::DEFAULT_BILATERAL_SIGMA_SPACE,
            edge_preserve: true,
            blur_strength: Self::DEFAULT_BLUR_STRENGTH,
            quant_method: QuantMethod::default(),
            num_colors: Self::DEFAULT_NUM_COLORS,
            saturation_factor: Self::DEFAULT_SATURATION_FACTOR,
            kmeans_seed: None,
        }
    }
}

/// Result of one pipeline invocation: the final cartoon plus every
/// intermediate artifact, for diagnostic display.
///
/// All four images share the input's width and height; `edges` is
/// single-channel, the rest match the input's three channels. The
/// bundle is owned by the caller and shares no state with later
/// invocations.
#[derive(Debug, Clone)]
pub struct CartoonResult {
    /// Final stylized image: saturated colors with edge overlay.
    pub cartoon: RgbImage,
    /// Binary edge mask (255 = edge, 0 = background).
    pub edges: GrayImage,
    /// Smoothed copy of the input (bilateral or median).
    pub filtered: RgbImage,
    /// Color-quantized copy of the smoothed image.
    pub quantized: RgbImage,
}

/// Pipeline stage identifiers, used to attribute internal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Edge-preserving or median smoothing.
    Smooth,
    /// Edge mask extraction.
    EdgeDetect,
    /// Color quantization.
    Quantize,
    /// Saturation enhancement.
    Saturate,
    /// Edge-overlay compositing.
    Composite,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smooth => f.write_str("smooth"),
            Self::EdgeDetect => f.write_str("edge-detect"),
            Self::Quantize => f.write_str("quantize"),
            Self::Saturate => f.write_str("saturate"),
            Self::Composite => f.write_str("composite"),
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input image is unusable (zero-sized).
    #[error("invalid input image: {0}")]
    InvalidImage(String),

    /// A configuration field is outside its documented domain.
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter {
        /// Name of the offending configuration field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// An internal algorithmic failure in one stage.
    #[error("{stage} stage failed: {reason}")]
    Stage {
        /// Which stage failed.
        stage: Stage,
        /// What went wrong.
        reason: String,
    },
}

impl PipelineError {
    pub(crate) fn invalid_parameter(field: &'static str, reason: String) -> Self {
        Self::InvalidParameter { field, reason }
    }

    pub(crate) fn stage(stage: Stage, reason: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            reason: reason.into(),
        }
    }
}
