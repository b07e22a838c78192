//! Error types
//!
//! Three families, one per concern:
//!
//! - [`ModelError`]: the model file is unusable. Fatal at startup.
//! - [`ConfigError`]: the detector configuration is unusable. Fatal at startup.
//! - [`AnalysisError`]: a single clip could not be analyzed. Reported per item.
//!
//! Short clips, suspect sample rates and silent audio are *not* errors; they
//! show up in [`QualityMetrics`](crate::quality::QualityMetrics) instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model: failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("model: malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model: schema version {found} is not supported (expected {expected})")]
    SchemaVersion { expected: u32, found: u32 },

    #[error("model: `{field}` has {actual} entries, feature schema has {expected}")]
    DimensionMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("model: feature {index} is {actual:?}, schema expects {expected:?}")]
    FeatureNameMismatch {
        index: usize,
        expected: &'static str,
        actual: String,
    },

    #[error("model: `{field}` value at index {index} is not finite")]
    NonFinite { field: &'static str, index: usize },

    #[error("model: std at index {index} is negative")]
    NegativeStd { index: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config: failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config: malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config: {0}")]
    Invalid(String),

    /// The model handed to the detector does not match the feature schema
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("analysis: audio buffer is empty")]
    EmptyAudio,

    #[error("analysis: audio buffer has a sample rate of 0 Hz")]
    ZeroSampleRate,

    #[error("analysis: failed to decode audio: {0}")]
    Decode(String),

    #[error("analysis: failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
