//! Audio quality assessment
//!
//! Scores a decoded clip on how far its raw numbers can be trusted. Nothing
//! here fails: a bad clip just gets bad flags and a low score, and the
//! confidence stage discounts the classifier output accordingly.
//!
//! # Sub-scores
//!
//! | Sub-score | 1.0 when | Degrades as |
//! |-----------|----------|-------------|
//! | sample rate | `sr >= min_sample_rate` | `sr / min_sample_rate` |
//! | duration | `min <= d <= max` | `d / min` below, `max / d` above |
//! | format | buffer decoded with data | 0.0 otherwise |
//! | amplitude | peak above the silence floor, nothing clipped | silence or clipping |
//!
//! The overall score is their weighted geometric mean, so a single zero
//! sub-score (silence, no data) pulls the whole score to zero.
//!
//! `short_audio` looks at both the clip length and how much of it carries
//! signal: five seconds of silence are as useless to the pitch and spectral
//! statistics as no audio at all.

use crate::audio::AudioBuffer;
use crate::config::QualityConfig;
use serde::{Deserialize, Serialize};

/// Weights of the rate, duration, format and amplitude sub-scores
const SUB_SCORE_WEIGHTS: [f64; 4] = [0.25, 0.25, 0.25, 0.25];

/// Each 1% of clipped samples removes 10% of the amplitude sub-score
const CLIP_PENALTY: f64 = 10.0;

/// Block length used to measure active (non-silent) duration
const ACTIVITY_BLOCK_SECS: f64 = 0.01;

/// Per-clip quality flags and score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub format_valid: bool,
    pub sample_rate_suspect: bool,
    pub short_audio: bool,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: usize,
    /// Overall score, 0.0 (unusable) to 1.0 (clean)
    pub quality_score: f64,
}

impl QualityMetrics {
    /// True when the classifier output should be discounted
    pub fn is_unreliable(&self) -> bool {
        self.short_audio || self.sample_rate_suspect
    }
}

pub struct AudioQualityAssessor {
    config: QualityConfig,
}

impl AudioQualityAssessor {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn assess(&self, audio: &AudioBuffer) -> QualityMetrics {
        let duration = audio.duration_secs();
        let sample_rate = audio.sample_rate();
        let channels = audio.channel_count();

        if audio.is_empty() || sample_rate == 0 {
            return QualityMetrics {
                format_valid: false,
                sample_rate_suspect: true,
                short_audio: true,
                duration_seconds: duration,
                sample_rate,
                channels,
                quality_score: 0.0,
            };
        }

        let sub_scores = [
            self.rate_score(sample_rate),
            self.duration_score(duration),
            1.0,
            self.amplitude_score(audio),
        ];

        QualityMetrics {
            format_valid: true,
            sample_rate_suspect: sample_rate < self.config.min_sample_rate,
            short_audio: duration < self.config.min_duration_secs
                || active_duration(audio, self.config.silence_threshold)
                    < self.config.min_duration_secs,
            duration_seconds: duration,
            sample_rate,
            channels,
            quality_score: weighted_geometric_mean(&sub_scores, &SUB_SCORE_WEIGHTS),
        }
    }

    fn rate_score(&self, sample_rate: u32) -> f64 {
        (sample_rate as f64 / self.config.min_sample_rate as f64).min(1.0)
    }

    fn duration_score(&self, duration: f64) -> f64 {
        let min = self.config.min_duration_secs;
        let max = self.config.max_duration_secs;
        if duration <= 0.0 {
            0.0
        } else if duration < min {
            duration / min
        } else if duration > max {
            max / duration
        } else {
            1.0
        }
    }

    fn amplitude_score(&self, audio: &AudioBuffer) -> f64 {
        let (peak, clipped_fraction) = amplitude_stats(audio, self.config.clip_threshold);

        if peak < self.config.silence_threshold {
            return peak / self.config.silence_threshold;
        }
        (1.0 - CLIP_PENALTY * clipped_fraction).clamp(0.0, 1.0)
    }
}

/// Peak absolute sample value and fraction of samples at or above the clip level
fn amplitude_stats(audio: &AudioBuffer, clip_threshold: f64) -> (f64, f64) {
    let mut peak = 0.0f64;
    let mut clipped = 0usize;
    let mut total = 0usize;

    for ch in audio.channels() {
        for &s in ch {
            let a = s.abs();
            if a.is_finite() {
                peak = peak.max(a);
                if a >= clip_threshold {
                    clipped += 1;
                }
            }
            total += 1;
        }
    }

    if total == 0 {
        return (0.0, 0.0);
    }
    (peak, clipped as f64 / total as f64)
}

/// Seconds of audio in 10 ms blocks whose peak reaches the silence floor
fn active_duration(audio: &AudioBuffer, silence_threshold: f64) -> f64 {
    let sample_rate = audio.sample_rate();
    let len = audio.frames();
    if sample_rate == 0 || len == 0 {
        return 0.0;
    }

    let block = ((sample_rate as f64 * ACTIVITY_BLOCK_SECS) as usize).max(1);
    let mut active = 0usize;
    let mut start = 0;
    while start < len {
        let end = (start + block).min(len);
        let loud = audio.channels().iter().any(|ch| {
            ch[start..end]
                .iter()
                .any(|s| s.is_finite() && s.abs() >= silence_threshold)
        });
        if loud {
            active += end - start;
        }
        start = end;
    }
    active as f64 / sample_rate as f64
}

fn weighted_geometric_mean(scores: &[f64], weights: &[f64]) -> f64 {
    let weight_sum: f64 = weights.iter().sum();
    let mut log_sum = 0.0;
    for (&s, &w) in scores.iter().zip(weights) {
        let s = s.clamp(0.0, 1.0);
        if s <= 0.0 {
            return 0.0;
        }
        log_sum += w * s.ln();
    }
    (log_sum / weight_sum).exp().clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessor() -> AudioQualityAssessor {
        AudioQualityAssessor::new(QualityConfig::default())
    }

    fn tone(duration_secs: f64, sample_rate: u32, amplitude: f64) -> AudioBuffer {
        let n = (duration_secs * sample_rate as f64) as usize;
        let samples = (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                amplitude * (2.0 * std::f64::consts::PI * 220.0 * t).sin()
            })
            .collect();
        AudioBuffer::from_mono(samples, sample_rate)
    }

    // ==========================================================================
    // FLAG TESTS
    // ==========================================================================

    #[test]
    fn test_clean_clip() {
        let m = assessor().assess(&tone(5.0, 16000, 0.5));

        assert!(m.format_valid);
        assert!(!m.sample_rate_suspect);
        assert!(!m.short_audio);
        assert!(!m.is_unreliable());
        assert_eq!(m.channels, 1);
        assert_eq!(m.sample_rate, 16000);
        assert!((m.duration_seconds - 5.0).abs() < 1e-9);
        assert!((m.quality_score - 1.0).abs() < 1e-9, "got {}", m.quality_score);
    }

    #[test]
    fn test_empty_buffer_is_worst_state() {
        let m = assessor().assess(&AudioBuffer::from_mono(vec![], 16000));

        assert!(!m.format_valid);
        assert!(m.sample_rate_suspect);
        assert!(m.short_audio);
        assert_eq!(m.quality_score, 0.0);
    }

    #[test]
    fn test_low_sample_rate_flagged() {
        let m = assessor().assess(&tone(5.0, 4000, 0.5));
        assert!(m.sample_rate_suspect);
        assert!(m.is_unreliable());
        assert!(m.quality_score < 1.0);
    }

    #[test]
    fn test_telephone_band_not_suspect() {
        for sr in [8000, 11025] {
            let m = assessor().assess(&tone(5.0, sr, 0.5));
            assert!(!m.sample_rate_suspect, "{} Hz flagged", sr);
            assert!(!m.is_unreliable());
        }
    }

    #[test]
    fn test_short_clip_flagged() {
        let m = assessor().assess(&tone(0.5, 16000, 0.5));
        assert!(m.short_audio);
        assert!(m.quality_score < 1.0);
    }

    #[test]
    fn test_two_second_clip_not_short() {
        let m = assessor().assess(&tone(2.0, 16000, 0.5));
        assert!(!m.short_audio);
        assert!(!m.is_unreliable());
        assert!((m.quality_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_silence_counts_as_short() {
        let m = assessor().assess(&AudioBuffer::from_mono(vec![0.0; 80000], 16000));
        assert!(m.short_audio);
        assert!(!m.sample_rate_suspect);
    }

    #[test]
    fn test_active_duration() {
        let sr = 16000;
        let mut samples = vec![0.0; 3 * sr as usize];
        for s in samples[..sr as usize / 2].iter_mut() {
            *s = 0.5;
        }
        let audio = AudioBuffer::from_mono(samples, sr);
        assert!((active_duration(&audio, 0.003) - 0.5).abs() < 1e-9);
        // Half a second of signal in a three second clip is still too little
        assert!(assessor().assess(&audio).short_audio);
    }

    // ==========================================================================
    // SCORE TESTS
    // ==========================================================================

    #[test]
    fn test_silence_scores_zero() {
        let silent = AudioBuffer::from_mono(vec![0.0; 8000], 4000);
        let m = assessor().assess(&silent);

        assert!(m.format_valid);
        assert!(m.short_audio);
        assert!(m.sample_rate_suspect);
        assert!(m.quality_score < 0.01, "got {}", m.quality_score);
    }

    #[test]
    fn test_quality_monotone_as_duration_shrinks() {
        let a = assessor();
        let durations = [6.0, 3.0, 2.5, 2.0, 1.5, 1.0, 0.5, 0.25, 0.1];
        let scores: Vec<f64> = durations
            .iter()
            .map(|&d| a.assess(&tone(d, 16000, 0.5)).quality_score)
            .collect();

        for pair in scores.windows(2) {
            assert!(
                pair[1] <= pair[0] + 1e-12,
                "score rose as duration fell: {:?}",
                scores
            );
        }
        assert!(scores.last().copied().unwrap_or(1.0) < scores[0]);
    }

    #[test]
    fn test_overlong_clip_penalized() {
        let m = assessor().assess(&tone(120.0, 8000, 0.5));
        let ok = assessor().assess(&tone(30.0, 8000, 0.5));
        assert!(m.quality_score < ok.quality_score);
    }

    #[test]
    fn test_clipping_penalized() {
        let clean = assessor().assess(&tone(4.0, 16000, 0.5));
        let clipped = assessor().assess(&tone(4.0, 16000, 1.5).clamped());
        assert!(clipped.quality_score < clean.quality_score);
    }

    #[test]
    fn test_score_bounds() {
        for (d, sr, amp) in [(0.01, 4000, 1e-6), (10.0, 48000, 0.9), (2.0, 22050, 1.0)] {
            let m = assessor().assess(&tone(d, sr, amp));
            assert!((0.0..=1.0).contains(&m.quality_score));
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let m = assessor().assess(&tone(4.0, 16000, 0.5));
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"qualityScore\""));
        assert!(json.contains("\"sampleRateSuspect\""));
        assert!(json.contains("\"shortAudio\""));
        assert!(json.contains("\"formatValid\""));
    }

    #[test]
    fn test_weighted_geometric_mean() {
        assert_eq!(weighted_geometric_mean(&[1.0, 1.0], &[0.5, 0.5]), 1.0);
        assert_eq!(weighted_geometric_mean(&[0.0, 1.0], &[0.5, 0.5]), 0.0);
        assert!((weighted_geometric_mean(&[0.25, 1.0], &[0.5, 0.5]) - 0.5).abs() < 1e-12);
    }

    trait Clamped {
        fn clamped(self) -> Self;
    }

    impl Clamped for AudioBuffer {
        fn clamped(self) -> Self {
            let channels = self
                .channels()
                .iter()
                .map(|ch| ch.iter().map(|s| s.clamp(-1.0, 1.0)).collect())
                .collect();
            AudioBuffer::from_channels(channels, self.sample_rate())
        }
    }
}
