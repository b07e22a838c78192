//! Frozen classifier parameters
//!
//! A [`ClassifierModel`] is loaded once at startup, validated against the
//! canonical feature schema and then shared read-only between every
//! analysis (wrap it in an `Arc`). Anything inconsistent (wrong array
//! length, misnamed or reordered feature, non-finite number) is rejected
//! here so inference never sees a malformed model.
//!
//! # File format
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "feature_names": ["pitch_stability", "jitter_proxy", ...],
//!   "mean":    [...],
//!   "std":     [...],
//!   "weights": [...],
//!   "bias": 0.0,
//!   "calib_a": 1.0,
//!   "calib_b": 0.0,
//!   "primary_language": "English"
//! }
//! ```
//!
//! `mu` / `sigma` are accepted for `mean` / `std`. `calib_a`, `calib_b`,
//! `primary_language` and `schema_version` may be omitted.

use crate::error::ModelError;
use crate::features::{FeatureId, FEATURE_COUNT, FEATURE_NAMES, SCHEMA_VERSION};
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_calib_a() -> f64 {
    1.0
}

/// Per-feature spread of the built-in model, in schema order
const BUILTIN_STD: [f64; FEATURE_COUNT] = [
    0.12, 0.015, 0.15, 0.08, 25.0, 0.3, 0.03, 1.5, 600.0, 0.15, 0.15, 0.1, 0.2,
];

/// Built-in weights; positive pushes toward AI-generated
const BUILTIN_WEIGHTS: [f64; FEATURE_COUNT] = [
    0.9,  // pitch_stability
    -0.7, // jitter_proxy
    0.6,  // hnr_ratio
    -0.3, // spectral_flatness_mean
    -0.6, // mfcc_temporal_var
    -0.5, // energy_variation
    0.3,  // energy_entropy_norm
    -0.3, // onset_rate
    -0.1, // spectral_rolloff_median
    0.4,  // phase_coherence
    -0.2, // pause_mean
    -0.3, // pause_std
    0.2,  // voiced_ratio
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierModel {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    #[serde(alias = "mu")]
    pub mean: Vec<f64>,
    #[serde(alias = "sigma")]
    pub std: Vec<f64>,
    pub weights: Vec<f64>,
    pub bias: f64,
    #[serde(default = "default_calib_a")]
    pub calib_a: f64,
    #[serde(default)]
    pub calib_b: f64,
    /// Language the model was trained and validated on
    #[serde(default)]
    pub primary_language: Language,
}

impl ClassifierModel {
    /// Hand-set reference model
    ///
    /// Means are the schema's neutral values; weights encode the usual
    /// synthetic-speech tells (flat pitch, low jitter, steady timbre and
    /// energy, coherent phase). Used when no model file is supplied.
    pub fn builtin() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            mean: FeatureId::ALL.iter().map(|id| id.neutral()).collect(),
            std: BUILTIN_STD.to_vec(),
            weights: BUILTIN_WEIGHTS.to_vec(),
            bias: 0.0,
            calib_a: 1.0,
            calib_b: 0.0,
            primary_language: Language::English,
        }
    }

    /// Parse and validate a model from JSON
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Read, parse and validate a model file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let model = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            schema_version = model.schema_version,
            language = %model.primary_language,
            "loaded classifier model"
        );
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Check the model against the canonical feature schema
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ModelError::SchemaVersion {
                expected: SCHEMA_VERSION,
                found: self.schema_version,
            });
        }

        let arrays: [(&'static str, usize); 4] = [
            ("feature_names", self.feature_names.len()),
            ("mean", self.mean.len()),
            ("std", self.std.len()),
            ("weights", self.weights.len()),
        ];
        for (field, actual) in arrays {
            if actual != FEATURE_COUNT {
                return Err(ModelError::DimensionMismatch {
                    field,
                    expected: FEATURE_COUNT,
                    actual,
                });
            }
        }

        for (index, (actual, expected)) in self.feature_names.iter().zip(FEATURE_NAMES).enumerate() {
            if actual != expected {
                return Err(ModelError::FeatureNameMismatch {
                    index,
                    expected,
                    actual: actual.clone(),
                });
            }
        }

        for (field, values) in [("mean", &self.mean), ("std", &self.std), ("weights", &self.weights)] {
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(ModelError::NonFinite { field, index });
            }
        }
        for (field, value) in [("bias", self.bias), ("calib_a", self.calib_a), ("calib_b", self.calib_b)] {
            if !value.is_finite() {
                return Err(ModelError::NonFinite { field, index: 0 });
            }
        }

        if let Some(index) = self.std.iter().position(|&s| s < 0.0) {
            return Err(ModelError::NegativeStd { index });
        }

        Ok(())
    }
}

impl Default for ClassifierModel {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin_json() -> String {
        ClassifierModel::builtin().to_json().unwrap()
    }

    fn edit(f: impl FnOnce(&mut serde_json::Value)) -> String {
        let mut value: serde_json::Value = serde_json::from_str(&builtin_json()).unwrap();
        f(&mut value);
        value.to_string()
    }

    // ==========================================================================
    // PERSISTENCE TESTS
    // ==========================================================================

    #[test]
    fn test_builtin_is_valid() {
        ClassifierModel::builtin().validate().unwrap();
    }

    #[test]
    fn test_round_trip_idempotent() {
        let mut model = ClassifierModel::builtin();
        model.bias = -0.123456789;
        model.calib_a = 1.37;
        model.calib_b = -0.042;
        model.weights[3] = 0.1 + 0.2;

        let first = ClassifierModel::from_json(&model.to_json().unwrap()).unwrap();
        let second = ClassifierModel::from_json(&first.to_json().unwrap()).unwrap();

        assert_eq!(first, model);
        assert_eq!(second, first);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("voxguard-model-{}.json", std::process::id()));
        let model = ClassifierModel::builtin();
        model.save(&path).unwrap();
        let loaded = ClassifierModel::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_aliases_and_defaults() {
        let json = edit(|v| {
            let obj = v.as_object_mut().unwrap();
            let mean = obj.remove("mean").unwrap();
            let std = obj.remove("std").unwrap();
            obj.insert("mu".into(), mean);
            obj.insert("sigma".into(), std);
            obj.remove("calib_a");
            obj.remove("calib_b");
            obj.remove("primary_language");
            obj.remove("schema_version");
        });
        let model = ClassifierModel::from_json(&json).unwrap();
        assert_eq!(model.calib_a, 1.0);
        assert_eq!(model.calib_b, 0.0);
        assert_eq!(model.primary_language, Language::English);
        assert_eq!(model.schema_version, SCHEMA_VERSION);
        assert_eq!(model.mean, ClassifierModel::builtin().mean);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ClassifierModel::load("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    // ==========================================================================
    // VALIDATION TESTS
    // ==========================================================================
    //
    // Every inconsistency between a model file and the feature schema must
    // fail at load time, never at inference time.
    // ==========================================================================

    #[test]
    fn test_rejects_short_weights() {
        let json = edit(|v| {
            v["weights"].as_array_mut().unwrap().pop();
        });
        match ClassifierModel::from_json(&json) {
            Err(ModelError::DimensionMismatch { field, expected, actual }) => {
                assert_eq!(field, "weights");
                assert_eq!(expected, FEATURE_COUNT);
                assert_eq!(actual, FEATURE_COUNT - 1);
            }
            other => panic!("expected dimension mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_extra_mean() {
        let json = edit(|v| {
            v["mean"].as_array_mut().unwrap().push(0.0.into());
        });
        assert!(matches!(
            ClassifierModel::from_json(&json),
            Err(ModelError::DimensionMismatch { field: "mean", .. })
        ));
    }

    #[test]
    fn test_rejects_reordered_names() {
        let json = edit(|v| {
            v["feature_names"].as_array_mut().unwrap().swap(0, 1);
        });
        match ClassifierModel::from_json(&json) {
            Err(ModelError::FeatureNameMismatch { index, expected, actual }) => {
                assert_eq!(index, 0);
                assert_eq!(expected, "pitch_stability");
                assert_eq!(actual, "jitter_proxy");
            }
            other => panic!("expected name mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_wrong_schema_version() {
        let json = edit(|v| v["schema_version"] = 99.into());
        assert!(matches!(
            ClassifierModel::from_json(&json),
            Err(ModelError::SchemaVersion { expected: SCHEMA_VERSION, found: 99 })
        ));
    }

    #[test]
    fn test_rejects_non_finite_and_negative_std() {
        let mut model = ClassifierModel::builtin();
        model.weights[4] = f64::NAN;
        assert!(matches!(
            model.validate(),
            Err(ModelError::NonFinite { field: "weights", index: 4 })
        ));

        let mut model = ClassifierModel::builtin();
        model.calib_a = f64::INFINITY;
        assert!(matches!(model.validate(), Err(ModelError::NonFinite { field: "calib_a", .. })));

        let mut model = ClassifierModel::builtin();
        model.std[2] = -1.0;
        assert!(matches!(model.validate(), Err(ModelError::NegativeStd { index: 2 })));
    }

    #[test]
    fn test_rejects_missing_field() {
        let json = edit(|v| {
            v.as_object_mut().unwrap().remove("bias");
        });
        assert!(matches!(ClassifierModel::from_json(&json), Err(ModelError::Parse(_))));
    }
}
