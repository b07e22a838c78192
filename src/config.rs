//! Detector configuration
//!
//! Every tunable of the pipeline lives here, grouped by the stage that reads
//! it. Values load from a JSON file; any section or field left out falls
//! back to its default, so a config file only needs the fields it changes:
//!
//! ```json
//! {
//!   "quality": { "min_duration_secs": 2.0 },
//!   "confidence": { "borderline_threshold": 0.65 }
//! }
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub quality: QualityConfig,
    pub features: FeatureConfig,
    pub confidence: ConfidenceConfig,
    pub explanation: ExplanationConfig,
}

/// Bounds used by the audio quality assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Clips shorter than this, or with less non-silent signal than this,
    /// are flagged `short_audio`
    pub min_duration_secs: f64,
    /// Clips longer than this lose quality score
    pub max_duration_secs: f64,
    /// Sample rates below this are flagged `sample_rate_suspect`
    pub min_sample_rate: u32,
    /// Absolute sample value at or above which a sample counts as clipped
    pub clip_threshold: f64,
    /// Peak amplitude below which the clip is treated as (near) silent
    pub silence_threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 1.0,
            max_duration_secs: 60.0,
            min_sample_rate: 8_000,
            clip_threshold: 0.99,
            silence_threshold: 0.003,
        }
    }
}

/// Feature extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Below this duration extraction is skipped and neutral defaults are used
    pub min_window_secs: f64,
    /// Lowest fundamental frequency searched by the pitch tracker (Hz)
    pub pitch_min_hz: f64,
    /// Highest fundamental frequency searched by the pitch tracker (Hz)
    pub pitch_max_hz: f64,
    /// Normalized autocorrelation needed to call a frame voiced
    pub voicing_threshold: f64,
    /// Input above this rate is resampled down to it before extraction (Hz)
    pub analysis_rate: u32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_window_secs: 0.5,
            pitch_min_hz: 62.5,
            pitch_max_hz: 500.0,
            voicing_threshold: 0.5,
            analysis_rate: 16_000,
        }
    }
}

/// Probability adjustment and labelling thresholds
///
/// The display category and the classification decision are driven by two
/// independent threshold sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Fraction of the distance from 0.5 removed for short or low-rate clips.
    /// What remains is further scaled by the clip's quality score.
    pub reliability_shrinkage: f64,
    /// Multiplier on the distance from 0.5 when the request language differs
    /// from the model's primary language
    pub language_mismatch_weight: f64,
    /// Scores at or above this are the "medium" category
    pub category_medium: f64,
    /// Scores at or above this are the "high" category
    pub category_high: f64,
    /// Scores below this are classified BORDERLINE
    pub borderline_threshold: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            reliability_shrinkage: 0.4,
            language_mismatch_weight: 0.5,
            category_medium: 0.6,
            category_high: 0.8,
            borderline_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplanationConfig {
    /// Number of feature phrases in the explanation
    pub top_k: usize,
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self { top_k: 2 }
    }
}

impl DetectorConfig {
    /// Load and validate configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&contents)?;
        tracing::info!(path = %path.display(), "loaded detector configuration");
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the pipeline meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let q = &self.quality;
        if !(q.min_duration_secs.is_finite() && q.min_duration_secs > 0.0) {
            return Err(invalid("quality.min_duration_secs must be > 0"));
        }
        if !(q.max_duration_secs.is_finite() && q.max_duration_secs >= q.min_duration_secs) {
            return Err(invalid(
                "quality.max_duration_secs must be >= quality.min_duration_secs",
            ));
        }
        if q.min_sample_rate == 0 {
            return Err(invalid("quality.min_sample_rate must be > 0"));
        }
        if !(q.clip_threshold > 0.0 && q.clip_threshold <= 1.0) {
            return Err(invalid("quality.clip_threshold must be in (0, 1]"));
        }
        if !(q.silence_threshold > 0.0 && q.silence_threshold < q.clip_threshold) {
            return Err(invalid(
                "quality.silence_threshold must be in (0, clip_threshold)",
            ));
        }

        let f = &self.features;
        if !(f.min_window_secs.is_finite() && f.min_window_secs >= 0.0) {
            return Err(invalid("features.min_window_secs must be >= 0"));
        }
        if !(f.pitch_min_hz > 0.0 && f.pitch_max_hz > f.pitch_min_hz) {
            return Err(invalid(
                "features.pitch_min_hz must be > 0 and below features.pitch_max_hz",
            ));
        }
        if !(0.0..=1.0).contains(&f.voicing_threshold) {
            return Err(invalid("features.voicing_threshold must be in [0, 1]"));
        }
        // The pitch search must stay below Nyquist at the analysis rate
        if f.analysis_rate == 0 || f.pitch_max_hz >= f.analysis_rate as f64 / 2.0 {
            return Err(invalid(
                "features.analysis_rate must be > 0 and above twice features.pitch_max_hz",
            ));
        }

        let c = &self.confidence;
        if !(0.0..=1.0).contains(&c.reliability_shrinkage) {
            return Err(invalid("confidence.reliability_shrinkage must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&c.language_mismatch_weight) {
            return Err(invalid(
                "confidence.language_mismatch_weight must be in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&c.category_medium)
            || !(0.0..=1.0).contains(&c.category_high)
            || c.category_medium > c.category_high
        {
            return Err(invalid(
                "confidence.category_medium must be <= confidence.category_high, both in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&c.borderline_threshold) {
            return Err(invalid("confidence.borderline_threshold must be in [0, 1]"));
        }

        if self.explanation.top_k == 0 {
            return Err(invalid("explanation.top_k must be >= 1"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Invalid(msg.to_string())
}
