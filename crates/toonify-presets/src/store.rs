//! Preset collection with JSON file persistence.
//!
//! The on-disk shape is a single object keyed by preset name:
//!
//! ```json
//! { "presets": { "vivid": { "saturation_factor": 2.5 } } }
//! ```
//!
//! Preset files are expected to be hand-edited, so loading screens
//! each record: unknown keys, wrong value types, and out-of-domain
//! values are reported per preset. [`Strictness::Warn`] logs and skips
//! the offending preset, keeping the rest; [`Strictness::Reject`]
//! fails the whole load.

use std::collections::BTreeMap;
use std::path::Path;

use toonify_pipeline::CartoonConfig;
use tracing::{debug, warn};

use crate::error::PresetError;
use crate::patch::{FIELD_NAMES, PresetPatch};

/// How to treat invalid records when loading a preset file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Fail the load on the first invalid preset.
    Reject,
    /// Log the problem, skip the preset, keep the rest.
    #[default]
    Warn,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct PresetFile {
    presets: BTreeMap<String, serde_json::Value>,
}

/// A named collection of [`PresetPatch`] records.
///
/// Always contains the built-in presets; loading a file overlays the
/// file's records on top of them, so a file may redefine `"default"`
/// but can never leave the store empty.
#[derive(Clone, Debug)]
pub struct PresetStore {
    presets: BTreeMap<String, PresetPatch>,
}

impl Default for PresetStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PresetStore {
    /// The built-in presets shipped with the application.
    #[must_use = "returns the built-in store"]
    pub fn builtin() -> Self {
        let mut presets = BTreeMap::new();
        presets.insert("default".to_owned(), PresetPatch::default());
        presets.insert(
            "sketch".to_owned(),
            PresetPatch {
                edge_method: Some(toonify_pipeline::EdgeMethod::Laplacian),
                line_size: Some(9),
                num_colors: Some(6),
                saturation_factor: Some(0.8),
                ..PresetPatch::default()
            },
        );
        presets.insert(
            "vivid".to_owned(),
            PresetPatch {
                num_colors: Some(12),
                saturation_factor: Some(2.5),
                ..PresetPatch::default()
            },
        );
        presets.insert(
            "poster".to_owned(),
            PresetPatch {
                quant_method: Some(toonify_pipeline::QuantMethod::Uniform),
                num_colors: Some(4),
                line_size: Some(3),
                ..PresetPatch::default()
            },
        );
        presets.insert(
            "soft".to_owned(),
            PresetPatch {
                edge_preserve: Some(false),
                blur_strength: Some(9),
                edge_blur: Some(7),
                line_size: Some(5),
                ..PresetPatch::default()
            },
        );
        Self { presets }
    }

    /// Load presets from a JSON file, overlaid on the built-ins.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Io`] if the file cannot be read,
    /// [`PresetError::Parse`] if it is not valid JSON of the expected
    /// shape, and with [`Strictness::Reject`] also
    /// [`PresetError::UnknownKey`] or [`PresetError::InvalidValue`]
    /// for the first bad record.
    pub fn load(path: &Path, strictness: Strictness) -> Result<Self, PresetError> {
        let text = std::fs::read_to_string(path)?;
        let file: PresetFile = serde_json::from_str(&text)?;

        let mut store = Self::builtin();
        for (name, value) in file.presets {
            if let Some(patch) = screen_record(&name, &value, strictness)? {
                store.presets.insert(name, patch);
            }
        }
        debug!(path = %path.display(), count = store.presets.len(), "loaded presets");
        Ok(store)
    }

    /// Load presets, falling back to the built-ins if the file is
    /// missing or unreadable. The fallback is logged, never fatal.
    #[must_use = "returns the loaded store"]
    pub fn load_or_builtin(path: &Path, strictness: Strictness) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no preset file, using built-ins");
            return Self::builtin();
        }
        match Self::load(path, strictness) {
            Ok(store) => store,
            Err(error) => {
                warn!(path = %path.display(), %error, "preset file unusable, using built-ins");
                Self::builtin()
            }
        }
    }

    /// Write the whole store to a JSON file, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Io`] on filesystem failure and
    /// [`PresetError::Parse`] if serialization fails.
    pub fn save(&self, path: &Path) -> Result<(), PresetError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = PresetFile {
            presets: self
                .presets
                .iter()
                .map(|(name, patch)| Ok((name.clone(), serde_json::to_value(patch)?)))
                .collect::<Result<_, serde_json::Error>>()?,
        };
        let text = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Resolve a named preset into a full, validated config.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::NotFound`] for an unknown name and
    /// [`PresetError::InvalidValue`] if the stored patch resolves to a
    /// config outside the parameter domains.
    pub fn resolve(&self, name: &str) -> Result<CartoonConfig, PresetError> {
        let patch = self
            .presets
            .get(name)
            .ok_or_else(|| PresetError::NotFound(name.to_owned()))?;
        let config = patch.resolve();
        config
            .validate()
            .map_err(|error| PresetError::InvalidValue {
                preset: name.to_owned(),
                reason: error.to_string(),
            })?;
        Ok(config)
    }

    /// Insert or replace a preset.
    pub fn save_preset(&mut self, name: impl Into<String>, patch: PresetPatch) {
        self.presets.insert(name.into(), patch);
    }

    /// Remove a preset.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::NotFound`] if no preset has that name.
    pub fn delete_preset(&mut self, name: &str) -> Result<PresetPatch, PresetError> {
        self.presets
            .remove(name)
            .ok_or_else(|| PresetError::NotFound(name.to_owned()))
    }

    /// Look up a preset's raw patch.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PresetPatch> {
        self.presets.get(name)
    }

    /// Preset names in sorted order.
    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

/// Screen one raw preset record. Returns `Ok(Some(patch))` for a good
/// record, `Ok(None)` for a skipped one under [`Strictness::Warn`].
fn screen_record(
    name: &str,
    value: &serde_json::Value,
    strictness: Strictness,
) -> Result<Option<PresetPatch>, PresetError> {
    let Some(object) = value.as_object() else {
        return reject_or_skip(
            strictness,
            PresetError::InvalidValue {
                preset: name.to_owned(),
                reason: "preset record is not an object".to_owned(),
            },
        );
    };

    if let Some(key) = object.keys().find(|key| !FIELD_NAMES.contains(&key.as_str())) {
        let error = PresetError::UnknownKey {
            preset: name.to_owned(),
            key: key.clone(),
        };
        match strictness {
            Strictness::Reject => return Err(error),
            Strictness::Warn => warn!(%error, "ignoring unknown preset key"),
        }
    }

    let patch: PresetPatch = match serde_json::from_value(value.clone()) {
        Ok(patch) => patch,
        Err(error) => {
            return reject_or_skip(
                strictness,
                PresetError::InvalidValue {
                    preset: name.to_owned(),
                    reason: error.to_string(),
                },
            );
        }
    };

    if let Err(error) = patch.resolve().validate() {
        return reject_or_skip(
            strictness,
            PresetError::InvalidValue {
                preset: name.to_owned(),
                reason: error.to_string(),
            },
        );
    }

    Ok(Some(patch))
}

fn reject_or_skip(
    strictness: Strictness,
    error: PresetError,
) -> Result<Option<PresetPatch>, PresetError> {
    match strictness {
        Strictness::Reject => Err(error),
        Strictness::Warn => {
            warn!(%error, "skipping invalid preset");
            Ok(None)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn builtin_presets_all_resolve() {
        let store = PresetStore::builtin();
        assert!(store.len() >= 5);
        for name in store.preset_names().map(str::to_owned).collect::<Vec<_>>() {
            store.resolve(&name).unwrap();
        }
    }

    #[test]
    fn default_preset_matches_pipeline_defaults() {
        let store = PresetStore::builtin();
        assert_eq!(store.resolve("default").unwrap(), CartoonConfig::default());
    }

    #[test]
    fn file_presets_overlay_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "presets.json",
            r#"{"presets": {"mine": {"num_colors": 4}, "vivid": {"saturation_factor": 3.0}}}"#,
        );
        let store = PresetStore::load(&path, Strictness::Reject).unwrap();
        assert_eq!(store.resolve("mine").unwrap().num_colors, 4);
        // Redefined built-in.
        let vivid = store.resolve("vivid").unwrap();
        assert!((vivid.saturation_factor - 3.0).abs() < f32::EPSILON);
        // Untouched built-in survives.
        assert!(store.get("sketch").is_some());
    }

    #[test]
    fn unknown_key_rejected_in_strict_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "presets.json",
            r#"{"presets": {"typo": {"num_colours": 4}}}"#,
        );
        let err = PresetStore::load(&path, Strictness::Reject).unwrap_err();
        assert!(matches!(
            err,
            PresetError::UnknownKey { ref preset, ref key }
                if preset == "typo" && key == "num_colours"
        ));
    }

    #[test]
    fn unknown_key_ignored_in_warn_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "presets.json",
            r#"{"presets": {"typo": {"num_colours": 4, "num_colors": 6}}}"#,
        );
        let store = PresetStore::load(&path, Strictness::Warn).unwrap();
        assert_eq!(store.resolve("typo").unwrap().num_colors, 6);
    }

    #[test]
    fn type_mismatch_skips_only_that_preset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "presets.json",
            r#"{"presets": {"bad": {"num_colors": "eight"}, "good": {"num_colors": 8}}}"#,
        );
        let store = PresetStore::load(&path, Strictness::Warn).unwrap();
        assert!(store.get("bad").is_none());
        assert_eq!(store.resolve("good").unwrap().num_colors, 8);
    }

    #[test]
    fn out_of_domain_value_screened_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "presets.json",
            r#"{"presets": {"wild": {"num_colors": 99}}}"#,
        );
        let err = PresetStore::load(&path, Strictness::Reject).unwrap_err();
        assert!(matches!(err, PresetError::InvalidValue { ref preset, .. } if preset == "wild"));

        let store = PresetStore::load(&path, Strictness::Warn).unwrap();
        assert!(store.get("wild").is_none());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "presets.json", "{not json");
        assert!(matches!(
            PresetStore::load(&path, Strictness::Warn),
            Err(PresetError::Parse(_)),
        ));
    }

    #[test]
    fn missing_file_falls_back_to_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let store = PresetStore::load_or_builtin(&dir.path().join("absent.json"), Strictness::Warn);
        assert!(store.get("default").is_some());
    }

    #[test]
    fn corrupt_file_falls_back_to_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "presets.json", "\u{0}\u{1}\u{2}");
        let store = PresetStore::load_or_builtin(&path, Strictness::Warn);
        assert!(store.get("vivid").is_some());
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("presets.json");

        let mut store = PresetStore::builtin();
        store.save_preset(
            "mine",
            PresetPatch {
                num_colors: Some(5),
                kmeans_seed: Some(42),
                ..PresetPatch::default()
            },
        );
        store.save(&path).unwrap();

        let reloaded = PresetStore::load(&path, Strictness::Reject).unwrap();
        assert_eq!(reloaded.get("mine"), store.get("mine"));
        assert_eq!(reloaded.len(), store.len());
    }

    #[test]
    fn delete_unknown_preset_errors() {
        let mut store = PresetStore::builtin();
        assert!(matches!(
            store.delete_preset("nope"),
            Err(PresetError::NotFound(ref name)) if name == "nope"
        ));
        store.delete_preset("sketch").unwrap();
        assert!(store.get("sketch").is_none());
    }

    #[test]
    fn resolve_unknown_preset_errors() {
        let store = PresetStore::builtin();
        assert!(matches!(
            store.resolve("nope"),
            Err(PresetError::NotFound(_)),
        ));
    }
}
