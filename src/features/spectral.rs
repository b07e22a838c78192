//! Frequency-domain features
//!
//! All functions take per-frame spectra and return `None` when the input is
//! too degenerate to define the feature (no frames, every frame silent);
//! the caller substitutes the schema's neutral default.

use super::pitch::variance;
use crate::audio::median_in_place;
use rustfft::num_complex::Complex;

/// Frames whose mean magnitude is below this are treated as silent
const SILENT_MAGNITUDE: f64 = 1e-8;

/// Spectral rolloff threshold (85% of spectral power)
const ROLLOFF_FRACTION: f64 = 0.85;

const MEL_BANDS: usize = 40;
const MFCC_COUNT: usize = 13;
const LOG_FLOOR: f64 = 1e-10;

/// Calculate spectral flatness (Wiener entropy)
/// Returns 1.0 for white noise, 0.0 for pure tone or silence
pub fn spectral_flatness(magnitudes: &[f64]) -> f64 {
    if magnitudes.is_empty() {
        return 0.0;
    }

    let n = magnitudes.len() as f64;

    // Geometric mean (via log to avoid underflow)
    let log_sum: f64 = magnitudes.iter().map(|&x| (x + LOG_FLOOR).ln()).sum();
    let geo_mean = (log_sum / n).exp();

    let arith_mean: f64 = magnitudes.iter().sum::<f64>() / n;

    if arith_mean <= 0.0 {
        return 0.0;
    }

    (geo_mean / arith_mean).min(1.0)
}

fn is_silent(frame: &[f64]) -> bool {
    frame.is_empty() || frame.iter().sum::<f64>() / (frame.len() as f64) < SILENT_MAGNITUDE
}

/// Mean spectral flatness over non-silent frames
pub fn flatness_mean(mags: &[Vec<f64>]) -> Option<f64> {
    let values: Vec<f64> = mags
        .iter()
        .filter(|frame| !is_silent(frame))
        .map(|frame| spectral_flatness(frame))
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median over non-silent frames of the frequency below which 85% of the
/// frame's power lies
pub fn rolloff_median(mags: &[Vec<f64>], bin_hz: f64) -> Option<f64> {
    let mut rolloffs: Vec<f64> = mags
        .iter()
        .filter(|frame| !is_silent(frame))
        .filter_map(|frame| {
            let total: f64 = frame.iter().map(|m| m * m).sum();
            if total <= 0.0 {
                return None;
            }
            let target = ROLLOFF_FRACTION * total;
            let mut cumulative = 0.0;
            for (bin, m) in frame.iter().enumerate() {
                cumulative += m * m;
                if cumulative >= target {
                    return Some(bin as f64 * bin_hz);
                }
            }
            Some((frame.len() - 1) as f64 * bin_hz)
        })
        .collect();
    if rolloffs.is_empty() {
        return None;
    }
    Some(median_in_place(&mut rolloffs))
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filter, stored sparsely as (first bin, weights)
struct MelFilter {
    start: usize,
    weights: Vec<f64>,
}

fn mel_filterbank(bins: usize, bin_hz: f64, sample_rate: u32) -> Vec<MelFilter> {
    let max_mel = hz_to_mel(sample_rate as f64 / 2.0);
    let edges: Vec<f64> = (0..MEL_BANDS + 2)
        .map(|i| mel_to_hz(max_mel * i as f64 / (MEL_BANDS + 1) as f64))
        .collect();

    edges
        .windows(3)
        .map(|edge| {
            let (lo, center, hi) = (edge[0], edge[1], edge[2]);
            let start = (lo / bin_hz).ceil() as usize;
            let end = ((hi / bin_hz).floor() as usize).min(bins.saturating_sub(1));
            let weights = (start..=end.max(start))
                .map(|bin| {
                    let f = bin as f64 * bin_hz;
                    let w = if f <= center {
                        (f - lo) / (center - lo)
                    } else {
                        (hi - f) / (hi - center)
                    };
                    if w.is_finite() {
                        w.max(0.0)
                    } else {
                        0.0
                    }
                })
                .collect();
            MelFilter { start, weights }
        })
        .collect()
}

/// Orthonormal DCT-II, first `count` coefficients
fn dct_ii(input: &[f64], count: usize) -> Vec<f64> {
    let n = input.len() as f64;
    (0..count)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos()
                })
                .sum();
            scale * sum
        })
        .collect()
}

/// 13 MFCCs per frame from 40 log-mel power bands
pub fn mfcc(mags: &[Vec<f64>], bin_hz: f64, sample_rate: u32) -> Vec<Vec<f64>> {
    let bins = mags.first().map_or(0, Vec::len);
    if bins == 0 {
        return Vec::new();
    }
    let filters = mel_filterbank(bins, bin_hz, sample_rate);

    mags.iter()
        .map(|frame| {
            let log_mel: Vec<f64> = filters
                .iter()
                .map(|filter| {
                    let energy: f64 = filter
                        .weights
                        .iter()
                        .enumerate()
                        .filter_map(|(i, w)| frame.get(filter.start + i).map(|m| w * m * m))
                        .sum();
                    (energy + LOG_FLOOR).ln()
                })
                .collect();
            dct_ii(&log_mel, MFCC_COUNT)
        })
        .collect()
}

/// Mean over coefficients of each MFCC's variance across frames
pub fn mfcc_temporal_var(mags: &[Vec<f64>], bin_hz: f64, sample_rate: u32) -> Option<f64> {
    let coeffs = mfcc(mags, bin_hz, sample_rate);
    if coeffs.len() < 2 {
        return None;
    }
    let per_coeff: Vec<f64> = (0..MFCC_COUNT)
        .map(|k| {
            let track: Vec<f64> = coeffs.iter().map(|c| c[k]).collect();
            variance(&track)
        })
        .collect();
    Some(per_coeff.iter().sum::<f64>() / per_coeff.len() as f64)
}

/// Consistency of frame-to-frame phase advance in the dominant band
///
/// The dominant bin is the one with the largest mean magnitude (DC
/// excluded). For it and its two neighbours, the phase advance between
/// consecutive frames is turned into a unit vector weighted by magnitude;
/// the length of their mean is that bin's coherence (1.0 for a stationary
/// partial, ~0 for noise). Bin coherences are averaged weighted by energy.
pub fn phase_coherence(frames: &[Vec<Complex<f64>>]) -> Option<f64> {
    if frames.len() < 2 {
        return None;
    }
    let bins = frames[0].len();
    if bins < 3 {
        return None;
    }

    let mean_mag = |k: usize| frames.iter().map(|f| f[k].norm()).sum::<f64>() / frames.len() as f64;
    let (dominant, peak) = (1..bins)
        .map(|k| (k, mean_mag(k)))
        .fold((1, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
    if !(peak > SILENT_MAGNITUDE) {
        return None;
    }

    let lo = dominant.saturating_sub(1).max(1);
    let hi = (dominant + 1).min(bins - 1);

    let mut weighted = 0.0;
    let mut weight_total = 0.0;
    for k in lo..=hi {
        let mut re = 0.0;
        let mut im = 0.0;
        let mut w_sum = 0.0;
        for pair in frames.windows(2) {
            let (prev, cur) = (pair[0][k], pair[1][k]);
            let w = prev.norm().min(cur.norm());
            if w <= 0.0 {
                continue;
            }
            let advance = cur.arg() - prev.arg();
            re += w * advance.cos();
            im += w * advance.sin();
            w_sum += w;
        }
        if w_sum <= 0.0 {
            continue;
        }
        let coherence = (re * re + im * im).sqrt() / w_sum;
        let bin_weight = mean_mag(k);
        weighted += bin_weight * coherence;
        weight_total += bin_weight;
    }

    if weight_total <= 0.0 {
        return None;
    }
    Some((weighted / weight_total).clamp(0.0, 1.0))
}
