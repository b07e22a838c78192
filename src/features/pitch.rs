//! Fundamental frequency tracking
//!
//! Per frame, the normalized autocorrelation
//!
//! ```text
//! nac(τ) = Σ x[i]·x[i+τ] / sqrt(Σ x[i]² · Σ x[i+τ]²)
//! ```
//!
//! is evaluated over the lags covering the configured pitch range. The
//! numerator for every lag comes from one zero-padded FFT, the two energy
//! terms from a running sum of squares. The first local maximum within 90%
//! of the best peak is taken (this avoids picking a sub-octave), refined
//! with a parabola through its neighbours. A frame is voiced when its best
//! peak reaches the voicing threshold.

use super::fft::FrameParams;
use crate::audio::median_in_place;
use crate::config::FeatureConfig;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Frames quieter than this RMS are unvoiced without further analysis
const SILENT_FRAME_RMS: f64 = 1e-4;

/// A peak within this fraction of the global best counts as the period
const OCTAVE_TOLERANCE: f64 = 0.9;

/// Per-frame f0 estimates; `None` for unvoiced or silent frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchTrack {
    pub f0: Vec<Option<f64>>,
}

impl PitchTrack {
    fn voiced(&self) -> impl Iterator<Item = f64> + '_ {
        self.f0.iter().filter_map(|f| *f)
    }

    pub fn voiced_count(&self) -> usize {
        self.voiced().count()
    }

    /// `1 / (1 + variance)` of the voiced f0 values in semitones around
    /// their median. 1.0 for a perfectly flat contour.
    pub fn stability(&self) -> Option<f64> {
        let f0: Vec<f64> = self.voiced().collect();
        if f0.len() < 2 {
            return None;
        }
        let median = median_in_place(&mut f0.clone());
        let semitones: Vec<f64> = f0.iter().map(|f| 12.0 * (f / median).log2()).collect();
        Some(1.0 / (1.0 + variance(&semitones)))
    }

    /// Mean absolute relative f0 change between adjacent voiced frames
    pub fn jitter(&self) -> Option<f64> {
        let changes: Vec<f64> = self
            .f0
            .windows(2)
            .filter_map(|pair| match (pair[0], pair[1]) {
                (Some(a), Some(b)) => Some((b - a).abs() / ((a + b) / 2.0)),
                _ => None,
            })
            .collect();
        if changes.is_empty() {
            return None;
        }
        Some(changes.iter().sum::<f64>() / changes.len() as f64)
    }

    /// Fraction of frames that are voiced
    pub fn voiced_ratio(&self) -> Option<f64> {
        if self.f0.is_empty() {
            return None;
        }
        Some(self.voiced_count() as f64 / self.f0.len() as f64)
    }
}

/// Population variance; 0.0 for fewer than two values
pub(crate) fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

struct Autocorrelator {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    size: usize,
    buffer: Vec<Complex<f64>>,
}

impl Autocorrelator {
    fn new(frame_len: usize) -> Self {
        let size = (2 * frame_len).next_power_of_two();
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
            size,
            buffer: vec![Complex::new(0.0, 0.0); size],
        }
    }

    /// Raw autocorrelation `r[τ]` for `τ` in `0..x.len()`
    fn compute(&mut self, x: &[f64]) -> Vec<f64> {
        for (slot, &s) in self.buffer.iter_mut().zip(x) {
            *slot = Complex::new(s, 0.0);
        }
        for slot in self.buffer.iter_mut().skip(x.len()) {
            *slot = Complex::new(0.0, 0.0);
        }
        self.forward.process(&mut self.buffer);
        for c in self.buffer.iter_mut() {
            *c = Complex::new(c.norm_sqr(), 0.0);
        }
        self.inverse.process(&mut self.buffer);

        let scale = self.size as f64;
        self.buffer[..x.len()].iter().map(|c| c.re / scale).collect()
    }
}

/// Track f0 over every complete frame of `signal`
pub fn track(signal: &[f64], sample_rate: u32, params: &FrameParams, config: &FeatureConfig) -> PitchTrack {
    let sr = sample_rate as f64;
    let min_lag = ((sr / config.pitch_max_hz).floor() as usize).max(2);
    let max_lag = ((sr / config.pitch_min_hz).ceil() as usize).min(params.frame_len / 2);

    let mut ac = Autocorrelator::new(params.frame_len);
    let mut centered = vec![0.0; params.frame_len];

    let f0 = params
        .frames(signal)
        .map(|frame| {
            let mean = frame.iter().sum::<f64>() / frame.len() as f64;
            for (c, &s) in centered.iter_mut().zip(frame) {
                *c = s - mean;
            }
            estimate_f0(&centered, sr, min_lag, max_lag, config.voicing_threshold, &mut ac)
        })
        .collect();

    PitchTrack { f0 }
}

fn estimate_f0(
    x: &[f64],
    sample_rate: f64,
    min_lag: usize,
    max_lag: usize,
    voicing_threshold: f64,
    ac: &mut Autocorrelator,
) -> Option<f64> {
    let n = x.len();
    if min_lag + 1 >= max_lag || max_lag + 1 >= n {
        return None;
    }

    // prefix[i] = Σ x[..i]²
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for &s in x {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + s * s);
    }
    let total = prefix[n];
    if (total / n as f64).sqrt() < SILENT_FRAME_RMS {
        return None;
    }

    let r = ac.compute(x);
    let nac = |lag: usize| -> f64 {
        let head = prefix[n - lag];
        let tail = total - prefix[lag];
        let denom = (head * tail).sqrt();
        if denom <= f64::EPSILON {
            0.0
        } else {
            r[lag] / denom
        }
    };

    let values: Vec<f64> = (min_lag - 1..=max_lag + 1).map(nac).collect();
    // values[j] holds nac(min_lag - 1 + j)
    let at = |lag: usize| values[lag + 1 - min_lag];

    let best = (min_lag..=max_lag).map(at).fold(f64::NEG_INFINITY, f64::max);
    if !best.is_finite() || best < voicing_threshold {
        return None;
    }

    let lag = (min_lag..=max_lag).find(|&lag| {
        let v = at(lag);
        v >= OCTAVE_TOLERANCE * best && v >= at(lag - 1) && v >= at(lag + 1)
    })?;

    let (a, b, c) = (at(lag - 1), at(lag), at(lag + 1));
    let denom = a - 2.0 * b + c;
    let delta = if denom.abs() > 1e-12 {
        (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };

    let period = lag as f64 + delta;
    let f0 = sample_rate / period;
    if f0.is_finite() {
        Some(f0)
    } else {
        None
    }
}
