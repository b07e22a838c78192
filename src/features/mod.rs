//! Acoustic feature extraction
//!
//! Turns an [`AudioBuffer`] into a [`FeatureVector`] laid out exactly as the
//! canonical [`schema`]. Extraction never fails: input too short to analyze
//! yields the all-neutral vector, and any single feature that cannot be
//! computed (no voiced frames, all-silent spectrum, non-finite arithmetic)
//! falls back to its neutral default.
//!
//! ## Pipeline
//!
//! ```text
//! channels ─▶ median mixdown ─▶ resample to analysis rate ─▶ 32 ms / 10 ms frames ─┬─▶ pitch track ─▶ stability, jitter, voiced ratio
//!                                                                                  ├─▶ frame RMS ───▶ energy, pauses
//!                                                                                  └─▶ STFT ────────▶ flatness, rolloff, MFCC,
//!                                                                                                     HNR, phase, onsets
//! ```

pub mod fft;
pub mod harmonic;
pub mod pitch;
pub mod resample;
pub mod schema;
pub mod spectral;
pub mod temporal;

use crate::audio::AudioBuffer;
use crate::config::FeatureConfig;
use fft::{FrameParams, Spectrogram};
use serde::ser::{Serialize, SerializeMap, Serializer};

pub use schema::{FeatureId, FEATURE_COUNT, FEATURE_NAMES, SCHEMA_VERSION};

/// Feature values in canonical schema order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Every feature at its neutral default
    pub fn neutral() -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        for id in FeatureId::ALL {
            values[id.index()] = id.neutral();
        }
        Self { values }
    }

    /// Build from raw values; non-finite entries become neutral defaults
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        let mut v = Self::neutral();
        for id in FeatureId::ALL {
            v.set(id, values[id.index()]);
        }
        v
    }

    pub fn get(&self, id: FeatureId) -> f64 {
        self.values[id.index()]
    }

    /// Set a feature, substituting its neutral default for non-finite input
    pub fn set(&mut self, id: FeatureId, value: f64) {
        self.values[id.index()] = if value.is_finite() { value } else { id.neutral() };
    }

    /// Set a feature if it could be computed, else leave it at its current value
    fn set_opt(&mut self, id: FeatureId, value: Option<f64>) {
        if let Some(v) = value {
            self.set(id, v);
        }
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn names(&self) -> &'static [&'static str; FEATURE_COUNT] {
        &FEATURE_NAMES
    }

    /// `(feature, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, f64)> + '_ {
        FeatureId::ALL.iter().map(move |&id| (id, self.get(id)))
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::neutral()
    }
}

// Serialized as a name -> value map in schema order
impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (id, value) in self.iter() {
            map.serialize_entry(id.name(), &value)?;
        }
        map.end()
    }
}

/// Computes feature vectors from decoded audio
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn extract(&self, audio: &AudioBuffer) -> FeatureVector {
        let Some((signal, sample_rate)) = self.analysis_signal(audio) else {
            return FeatureVector::neutral();
        };

        let params = FrameParams::for_sample_rate(sample_rate);
        if params.frame_count(signal.len()) == 0 {
            return FeatureVector::neutral();
        }

        self.extract_signal(&signal, sample_rate, params)
    }

    /// Mono, finite signal at the analysis rate, with the rate it is at.
    ///
    /// `None` when the clip is too short or has no usable rate. Input at or
    /// below the analysis rate is left at its native rate.
    pub(crate) fn analysis_signal(&self, audio: &AudioBuffer) -> Option<(Vec<f64>, u32)> {
        let sample_rate = audio.sample_rate();
        if audio.is_empty() || sample_rate == 0 || audio.duration_secs() < self.config.min_window_secs {
            return None;
        }

        let mut signal = audio.median_mixdown();
        for s in signal.iter_mut() {
            if !s.is_finite() {
                *s = 0.0;
            }
        }

        let target = self.config.analysis_rate;
        if sample_rate > target {
            if let Some(resampled) = resample::resample(&signal, sample_rate, target) {
                return Some((resampled, target));
            }
        }
        Some((signal, sample_rate))
    }

    fn extract_signal(&self, signal: &[f64], sample_rate: u32, params: FrameParams) -> FeatureVector {
        let mut v = FeatureVector::neutral();
        let duration = signal.len() as f64 / sample_rate as f64;

        // Pitch
        let track = pitch::track(signal, sample_rate, &params, &self.config);
        v.set_opt(FeatureId::PitchStability, track.stability());
        v.set_opt(FeatureId::JitterProxy, track.jitter());
        v.set_opt(FeatureId::VoicedRatio, track.voiced_ratio());

        // Energy envelope
        let rms = temporal::frame_rms(signal, &params);
        v.set_opt(FeatureId::EnergyVariation, temporal::energy_variation(&rms));
        v.set_opt(FeatureId::EnergyEntropyNorm, temporal::energy_entropy_norm(&rms));
        if let Some((mean, std)) = temporal::pause_stats(&rms, params.hop_secs(sample_rate)) {
            v.set(FeatureId::PauseMean, mean);
            v.set(FeatureId::PauseStd, std);
        }

        // Spectrum
        let spec = Spectrogram::compute(signal, params);
        let mags = spec.magnitudes();
        let bin_hz = params.bin_hz(sample_rate);
        v.set_opt(FeatureId::HnrRatio, harmonic::hnr_ratio(&mags));
        v.set_opt(FeatureId::SpectralFlatnessMean, spectral::flatness_mean(&mags));
        v.set_opt(
            FeatureId::MfccTemporalVar,
            spectral::mfcc_temporal_var(&mags, bin_hz, sample_rate),
        );
        v.set_opt(FeatureId::SpectralRolloffMedian, spectral::rolloff_median(&mags, bin_hz));
        v.set_opt(FeatureId::PhaseCoherence, spectral::phase_coherence(&spec.frames));
        v.set_opt(FeatureId::OnsetRate, temporal::onset_rate(&mags, duration));

        v
    }
}
