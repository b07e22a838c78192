//! Harmonic/percussive separation
//!
//! Median filtering the magnitude spectrogram along time keeps steady
//! partials (harmonic), along frequency keeps broadband transients
//! (percussive). A soft mask `H² / (H² + P²)` assigns each cell's power to
//! the harmonic part; the HNR feature is the harmonic share of total power.

use crate::audio::median_in_place;

/// Median filter length, in frames (time) and bins (frequency)
const KERNEL: usize = 17;

/// Median over a centered window, truncated at the edges
fn median_filter(values: &[f64], kernel: usize, scratch: &mut Vec<f64>) -> Vec<f64> {
    let half = kernel / 2;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            scratch.clear();
            scratch.extend_from_slice(&values[lo..hi]);
            median_in_place(scratch)
        })
        .collect()
}

/// Harmonic-enhanced spectrogram, `[frame][bin]`
fn harmonic_part(mags: &[Vec<f64>], scratch: &mut Vec<f64>) -> Vec<Vec<f64>> {
    let frames = mags.len();
    let bins = mags.first().map_or(0, Vec::len);
    let mut out = vec![vec![0.0; bins]; frames];
    let mut column = vec![0.0; frames];
    for k in 0..bins {
        for (slot, frame) in column.iter_mut().zip(mags) {
            *slot = frame[k];
        }
        for (t, v) in median_filter(&column, KERNEL, scratch).into_iter().enumerate() {
            out[t][k] = v;
        }
    }
    out
}

/// Fraction of spectral power assigned to the harmonic component
pub fn hnr_ratio(mags: &[Vec<f64>]) -> Option<f64> {
    if mags.is_empty() {
        return None;
    }
    let mut scratch = Vec::with_capacity(KERNEL);
    let harmonic = harmonic_part(mags, &mut scratch);

    let mut harmonic_power = 0.0;
    let mut total_power = 0.0;
    for (frame, h_frame) in mags.iter().zip(&harmonic) {
        let percussive = median_filter(frame, KERNEL, &mut scratch);
        for ((&m, &h), &p) in frame.iter().zip(h_frame).zip(&percussive) {
            let power = m * m;
            let (h2, p2) = (h * h, p * p);
            let mask = if h2 + p2 > 0.0 { h2 / (h2 + p2) } else { 0.5 };
            harmonic_power += mask * power;
            total_power += power;
        }
    }

    if total_power <= f64::EPSILON {
        return None;
    }
    Some((harmonic_power / total_power).clamp(0.0, 1.0))
}
