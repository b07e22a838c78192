//! Canonical feature schema
//!
//! The single ordered list of features shared by extraction, model files and
//! classification. A model whose `feature_names` differ from
//! [`FEATURE_NAMES`] in length, spelling or order is rejected at load time.
//!
//! Bump [`SCHEMA_VERSION`] whenever a feature is added, removed, reordered or
//! its computation changes meaning; older model files will then refuse to
//! load instead of silently scoring the wrong inputs.

/// Version of the feature layout below
pub const SCHEMA_VERSION: u32 = 1;

/// Number of features in the schema
pub const FEATURE_COUNT: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureId {
    PitchStability,
    JitterProxy,
    HnrRatio,
    SpectralFlatnessMean,
    MfccTemporalVar,
    EnergyVariation,
    EnergyEntropyNorm,
    OnsetRate,
    SpectralRolloffMedian,
    PhaseCoherence,
    PauseMean,
    PauseStd,
    VoicedRatio,
}

/// Canonical names, in schema order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "pitch_stability",
    "jitter_proxy",
    "hnr_ratio",
    "spectral_flatness_mean",
    "mfcc_temporal_var",
    "energy_variation",
    "energy_entropy_norm",
    "onset_rate",
    "spectral_rolloff_median",
    "phase_coherence",
    "pause_mean",
    "pause_std",
    "voiced_ratio",
];

/// Neutral defaults, in schema order.
///
/// Typical values for natural conversational speech. Used whenever a feature
/// cannot be computed (too short, all silent, no voiced frames, non-finite).
const NEUTRAL_VALUES: [f64; FEATURE_COUNT] = [
    0.15,   // pitch_stability: 1 / (1 + semitone variance)
    0.03,   // jitter_proxy
    0.55,   // hnr_ratio
    0.15,   // spectral_flatness_mean
    60.0,   // mfcc_temporal_var
    0.6,    // energy_variation
    0.93,   // energy_entropy_norm
    3.0,    // onset_rate (per second)
    2000.0, // spectral_rolloff_median (Hz)
    0.3,    // phase_coherence
    0.25,   // pause_mean (s)
    0.15,   // pause_std (s)
    0.55,   // voiced_ratio
];

impl FeatureId {
    /// All features, in schema order
    pub const ALL: [FeatureId; FEATURE_COUNT] = [
        FeatureId::PitchStability,
        FeatureId::JitterProxy,
        FeatureId::HnrRatio,
        FeatureId::SpectralFlatnessMean,
        FeatureId::MfccTemporalVar,
        FeatureId::EnergyVariation,
        FeatureId::EnergyEntropyNorm,
        FeatureId::OnsetRate,
        FeatureId::SpectralRolloffMedian,
        FeatureId::PhaseCoherence,
        FeatureId::PauseMean,
        FeatureId::PauseStd,
        FeatureId::VoicedRatio,
    ];

    /// Position in the schema
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    pub fn neutral(self) -> f64 {
        NEUTRAL_VALUES[self.index()]
    }

    pub fn from_index(index: usize) -> Option<FeatureId> {
        FeatureId::ALL.get(index).copied()
    }

    pub fn from_name(name: &str) -> Option<FeatureId> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .and_then(FeatureId::from_index)
    }
}
