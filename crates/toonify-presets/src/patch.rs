//! Sparse preset records.
//!
//! A preset stores only the parameters it overrides; everything else
//! falls through to the pipeline defaults. This keeps preset files
//! small and lets the defaults evolve without rewriting saved presets.

use serde::{Deserialize, Serialize};
use toonify_pipeline::{CartoonConfig, EdgeMethod, QuantMethod};

/// The set of config fields a preset may override. Every field is
/// optional; absent fields keep their default value when the preset is
/// resolved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_method: Option<EdgeMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canny_threshold1: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canny_threshold2: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sobel_kernel_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_blur: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bilateral_d: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bilateral_sigma_color: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bilateral_sigma_space: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_preserve: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_strength: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quant_method: Option<QuantMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_colors: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation_factor: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kmeans_seed: Option<u64>,
}

/// Field names accepted in a preset record, used to flag typos in
/// hand-edited preset files.
pub(crate) const FIELD_NAMES: &[&str] = &[
    "edge_method",
    "canny_threshold1",
    "canny_threshold2",
    "sobel_kernel_size",
    "edge_blur",
    "line_size",
    "bilateral_d",
    "bilateral_sigma_color",
    "bilateral_sigma_space",
    "edge_preserve",
    "blur_strength",
    "quant_method",
    "num_colors",
    "saturation_factor",
    "kmeans_seed",
];

impl PresetPatch {
    /// Overlay this patch on a config, replacing only the fields the
    /// patch carries.
    pub fn apply_to(&self, config: &mut CartoonConfig) {
        if let Some(v) = self.edge_method {
            config.edge_method = v;
        }
        if let Some(v) = self.canny_threshold1 {
            config.canny_threshold1 = v;
        }
        if let Some(v) = self.canny_threshold2 {
            config.canny_threshold2 = v;
        }
        if let Some(v) = self.sobel_kernel_size {
            config.sobel_kernel_size = v;
        }
        if let Some(v) = self.edge_blur {
            config.edge_blur = v;
        }
        if let Some(v) = self.line_size {
            config.line_size = v;
        }
        if let Some(v) = self.bilateral_d {
            config.bilateral_d = v;
        }
        if let Some(v) = self.bilateral_sigma_color {
            config.bilateral_sigma_color = v;
        }
        if let Some(v) = self.bilateral_sigma_space {
            config.bilateral_sigma_space = v;
        }
        if let Some(v) = self.edge_preserve {
            config.edge_preserve = v;
        }
        if let Some(v) = self.blur_strength {
            config.blur_strength = v;
        }
        if let Some(v) = self.quant_method {
            config.quant_method = v;
        }
        if let Some(v) = self.num_colors {
            config.num_colors = v;
        }
        if let Some(v) = self.saturation_factor {
            config.saturation_factor = v;
        }
        if let Some(v) = self.kmeans_seed {
            config.kmeans_seed = Some(v);
        }
    }

    /// Resolve against the pipeline defaults.
    #[must_use = "returns the resolved config"]
    pub fn resolve(&self) -> CartoonConfig {
        let mut config = CartoonConfig::default();
        self.apply_to(&mut config);
        config
    }

    /// Capture a full config as a patch, e.g. when the user saves the
    /// current slider state under a name. Every field is recorded so
    /// the preset is insulated from future default changes.
    #[must_use = "returns the captured patch"]
    pub fn from_config(config: &CartoonConfig) -> Self {
        Self {
            edge_method: Some(config.edge_method),
            canny_threshold1: Some(config.canny_threshold1),
            canny_threshold2: Some(config.canny_threshold2),
            sobel_kernel_size: Some(config.sobel_kernel_size),
            edge_blur: Some(config.edge_blur),
            line_size: Some(config.line_size),
            bilateral_d: Some(config.bilateral_d),
            bilateral_sigma_color: Some(config.bilateral_sigma_color),
            bilateral_sigma_space: Some(config.bilateral_sigma_space),
            edge_preserve: Some(config.edge_preserve),
            blur_strength: Some(config.blur_strength),
            quant_method: Some(config.quant_method),
            num_colors: Some(config.num_colors),
            saturation_factor: Some(config.saturation_factor),
            kmeans_seed: config.kmeans_seed,
        }
    }
}
