//! Human-readable rationale for a verdict
//!
//! Each feature's signed contribution `w_i · z_i` says which way it pushed
//! the score. Features are ranked by absolute contribution (ties keep schema
//! order) and the top `top_k` that agree with the label are turned into
//! canned phrases:
//!
//! | Label | Contributions used | Phrase table |
//! |-------|--------------------|--------------|
//! | AI_GENERATED | positive | AI |
//! | HUMAN | negative | human |
//! | BORDERLINE | either sign | by sign, prefixed "Inconclusive: " |
//!
//! The result is never empty; when nothing qualifies a fixed fallback is
//! returned. No randomness: the same inputs always give the same sentence.

use crate::config::ExplanationConfig;
use crate::confidence::Classification;
use crate::features::{FeatureId, FEATURE_COUNT};

const AI_FALLBACK: &str = "Synthesis-like stability across key cues";
const HUMAN_FALLBACK: &str = "Human-like variability across key cues";
const BORDERLINE_PREFIX: &str = "Inconclusive: ";
const BORDERLINE_FALLBACK: &str = "no acoustic cue stands out";
const SEPARATOR: &str = "; ";

/// Phrase for a feature that pushed toward AI-generated
pub fn ai_phrase(id: FeatureId) -> &'static str {
    match id {
        FeatureId::PitchStability => "Unnatural pitch stability detected",
        FeatureId::JitterProxy => "Low micro-jitter typical of synthetic speech",
        FeatureId::HnrRatio => "Clean harmonic profile typical of synthesis",
        FeatureId::SpectralFlatnessMean => "Stable spectral envelope across frames",
        FeatureId::MfccTemporalVar => "Unusually steady timbre over time",
        FeatureId::EnergyVariation => "Flat loudness contour",
        FeatureId::EnergyEntropyNorm => "Uniform energy envelope with low entropy",
        FeatureId::OnsetRate => "Few articulation onsets for the duration",
        FeatureId::SpectralRolloffMedian => "Band-limited spectral rolloff",
        FeatureId::PhaseCoherence => "High phase coherence across frames",
        FeatureId::PauseMean => "Short, clipped pauses",
        FeatureId::PauseStd => "Uniform pause timing",
        FeatureId::VoicedRatio => "Extended voiced continuity",
    }
}

/// Phrase for a feature that pushed toward human
pub fn human_phrase(id: FeatureId) -> &'static str {
    match id {
        FeatureId::PitchStability => "Natural pitch variability observed",
        FeatureId::JitterProxy => "Micro-jitter consistent with human phonation",
        FeatureId::HnrRatio => "Variable harmonic-to-noise profile",
        FeatureId::SpectralFlatnessMean => "Fluctuating spectral texture",
        FeatureId::MfccTemporalVar => "Timbre shifts naturally across phonemes",
        FeatureId::EnergyVariation => "Dynamic loudness contour",
        FeatureId::EnergyEntropyNorm => "Dynamic energy envelope",
        FeatureId::OnsetRate => "Natural articulation rhythm",
        FeatureId::SpectralRolloffMedian => "Full-band spectral content",
        FeatureId::PhaseCoherence => "Irregular phase relationships",
        FeatureId::PauseMean => "Natural breathing pauses",
        FeatureId::PauseStd => "Variable pause timing",
        FeatureId::VoicedRatio => "Balanced voiced and unvoiced distribution",
    }
}

/// Features by descending absolute contribution; stable, so ties keep
/// schema order
pub fn rank(contributions: &[f64; FEATURE_COUNT]) -> Vec<FeatureId> {
    let mut ids = FeatureId::ALL.to_vec();
    ids.sort_by(|a, b| {
        let ca = contributions[a.index()].abs();
        let cb = contributions[b.index()].abs();
        cb.total_cmp(&ca)
    });
    ids
}

pub struct Explainer {
    top_k: usize,
}

impl Explainer {
    pub fn new(config: ExplanationConfig) -> Self {
        Self {
            top_k: config.top_k.max(1),
        }
    }

    pub fn explain(&self, contributions: &[f64; FEATURE_COUNT], label: Classification) -> String {
        let phrases: Vec<&str> = rank(contributions)
            .into_iter()
            .filter_map(|id| {
                let c = contributions[id.index()];
                match label {
                    Classification::AiGenerated if c > 0.0 => Some(ai_phrase(id)),
                    Classification::Human if c < 0.0 => Some(human_phrase(id)),
                    Classification::Borderline if c > 0.0 => Some(ai_phrase(id)),
                    Classification::Borderline if c < 0.0 => Some(human_phrase(id)),
                    _ => None,
                }
            })
            .take(self.top_k)
            .collect();

        match label {
            Classification::Borderline => {
                let body = if phrases.is_empty() {
                    BORDERLINE_FALLBACK.to_string()
                } else {
                    phrases.join(SEPARATOR)
                };
                format!("{}{}", BORDERLINE_PREFIX, body)
            }
            Classification::AiGenerated if phrases.is_empty() => AI_FALLBACK.to_string(),
            Classification::Human if phrases.is_empty() => HUMAN_FALLBACK.to_string(),
            _ => phrases.join(SEPARATOR),
        }
    }
}

impl Default for Explainer {
    fn default() -> Self {
        Self::new(ExplanationConfig::default())
    }
}
