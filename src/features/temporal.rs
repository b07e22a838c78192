//! Energy, onset and pause features
//!
//! Everything here works on the per-frame RMS envelope or on frame-to-frame
//! spectral change, using the same framing as the spectral features.

use super::fft::FrameParams;
use super::pitch::variance;
use crate::audio::median_in_place;

/// Frames below `PAUSE_RELATIVE * max_rms` (or the absolute floor) are pauses
const PAUSE_RELATIVE: f64 = 0.1;
const PAUSE_FLOOR: f64 = 1e-4;

/// Onset threshold is `median(flux) + ONSET_MEAN_OFFSET * mean(flux)`
const ONSET_MEAN_OFFSET: f64 = 0.5;

/// RMS of every complete frame
pub fn frame_rms(signal: &[f64], params: &FrameParams) -> Vec<f64> {
    params
        .frames(signal)
        .map(|frame| (frame.iter().map(|s| s * s).sum::<f64>() / frame.len() as f64).sqrt())
        .collect()
}

/// Variance of frame RMS normalized by the squared mean
pub fn energy_variation(rms: &[f64]) -> Option<f64> {
    if rms.len() < 2 {
        return None;
    }
    let mean = rms.iter().sum::<f64>() / rms.len() as f64;
    if mean <= f64::EPSILON {
        return None;
    }
    Some(variance(rms) / (mean * mean))
}

/// Shannon entropy of the frame-energy distribution, divided by its maximum
/// `ln(frames)`. 1.0 when every frame carries the same energy.
pub fn energy_entropy_norm(rms: &[f64]) -> Option<f64> {
    if rms.len() < 2 {
        return None;
    }
    let total: f64 = rms.iter().sum();
    if total <= f64::EPSILON {
        return None;
    }
    let entropy: f64 = rms
        .iter()
        .map(|&e| e / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum();
    Some((entropy / (rms.len() as f64).ln()).clamp(0.0, 1.0))
}

/// Half-wave rectified spectral flux between consecutive frames.
/// Entry `t` compares frame `t + 1` with frame `t`.
pub fn spectral_flux(mags: &[Vec<f64>]) -> Vec<f64> {
    mags.windows(2)
        .map(|pair| {
            pair[1]
                .iter()
                .zip(&pair[0])
                .map(|(cur, prev)| (cur - prev).max(0.0))
                .sum()
        })
        .collect()
}

/// Indices of flux peaks above an adaptive threshold
pub fn detect_onsets(flux: &[f64]) -> Vec<usize> {
    if flux.len() < 3 {
        return Vec::new();
    }
    let mean = flux.iter().sum::<f64>() / flux.len() as f64;
    let median = median_in_place(&mut flux.to_vec());
    let threshold = median + ONSET_MEAN_OFFSET * mean + 1e-6;

    (1..flux.len() - 1)
        .filter(|&i| flux[i] > threshold && flux[i] >= flux[i - 1] && flux[i] > flux[i + 1])
        .collect()
}

/// Onsets per second of audio
pub fn onset_rate(mags: &[Vec<f64>], duration_secs: f64) -> Option<f64> {
    if mags.len() < 2 || duration_secs <= 0.0 {
        return None;
    }
    let onsets = detect_onsets(&spectral_flux(mags));
    Some(onsets.len() as f64 / duration_secs)
}

/// Durations in seconds of every run of quiet frames
pub fn pause_durations(rms: &[f64], hop_secs: f64) -> Vec<f64> {
    let peak = rms.iter().copied().fold(0.0, f64::max);
    let threshold = (PAUSE_RELATIVE * peak).max(PAUSE_FLOOR);

    let mut pauses = Vec::new();
    let mut run = 0usize;
    for &e in rms {
        if e < threshold {
            run += 1;
        } else if run > 0 {
            pauses.push(run as f64 * hop_secs);
            run = 0;
        }
    }
    if run > 0 {
        pauses.push(run as f64 * hop_secs);
    }
    pauses
}

/// Mean and population standard deviation of pause durations.
/// `(0.0, 0.0)` when there are no pauses; `None` when there is no envelope.
pub fn pause_stats(rms: &[f64], hop_secs: f64) -> Option<(f64, f64)> {
    if rms.is_empty() {
        return None;
    }
    let pauses = pause_durations(rms, hop_secs);
    if pauses.is_empty() {
        return Some((0.0, 0.0));
    }
    let mean = pauses.iter().sum::<f64>() / pauses.len() as f64;
    Some((mean, variance(&pauses).sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rms_constant() {
        let params = FrameParams::for_sample_rate(16000);
        let rms = frame_rms(&vec![0.5; 16000], &params);
        assert_eq!(rms.len(), params.frame_count(16000));
        assert!(rms.iter().all(|&r| (r - 0.5).abs() < 1e-12));
    }

    // ==========================================================================
    // ENERGY TESTS
    // ==========================================================================

    #[test]
    fn test_energy_variation() {
        assert_eq!(energy_variation(&[0.5, 0.5, 0.5]), Some(0.0));
        // mean 0.5, population variance 0.25 → 0.25 / 0.25
        assert!((energy_variation(&[0.0, 1.0]).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(energy_variation(&[0.0, 0.0]), None);
        assert_eq!(energy_variation(&[1.0]), None);
    }

    #[test]
    fn test_energy_entropy_uniform_is_one() {
        let e = energy_entropy_norm(&[0.2; 50]).unwrap();
        assert!((e - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_energy_entropy_concentrated_is_low() {
        let mut rms = vec![0.0; 50];
        rms[10] = 1.0;
        assert_eq!(energy_entropy_norm(&rms), Some(0.0));

        let bursty: Vec<f64> = (0..50).map(|i| if i % 10 == 0 { 1.0 } else { 0.01 }).collect();
        assert!(energy_entropy_norm(&bursty).unwrap() < 0.9);
    }

    // ==========================================================================
    // ONSET TESTS
    // ==========================================================================

    #[test]
    fn test_flux_is_half_wave_rectified() {
        let mags = vec![vec![1.0, 1.0], vec![2.0, 0.0], vec![2.0, 0.0]];
        assert_eq!(spectral_flux(&mags), vec![1.0, 0.0]);
    }

    #[test]
    fn test_detect_onsets_isolated_peaks() {
        let mut flux = vec![0.1; 40];
        flux[10] = 5.0;
        flux[25] = 4.0;
        assert_eq!(detect_onsets(&flux), vec![10, 25]);
    }

    #[test]
    fn test_detect_onsets_flat_has_none() {
        assert!(detect_onsets(&[1.0; 30]).is_empty());
        assert!(detect_onsets(&[0.0; 30]).is_empty());
    }

    #[test]
    fn test_onset_rate_bursts() {
        // Ten one-frame bursts over 100 frames of silence
        let mags: Vec<Vec<f64>> = (0..100)
            .map(|t| if t % 10 == 5 { vec![1.0; 8] } else { vec![0.0; 8] })
            .collect();
        let rate = onset_rate(&mags, 2.0).unwrap();
        assert!((rate - 5.0).abs() < 1e-12, "got {}", rate);
        assert_eq!(onset_rate(&mags[..1], 2.0), None);
    }

    // ==========================================================================
    // PAUSE TESTS
    // ==========================================================================

    #[test]
    fn test_pause_runs() {
        let rms = vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let pauses = pause_durations(&rms, 0.01);
        assert_eq!(pauses.len(), 2);
        assert!((pauses[0] - 0.02).abs() < 1e-12);
        assert!((pauses[1] - 0.04).abs() < 1e-12);

        let (mean, std) = pause_stats(&rms, 0.01).unwrap();
        assert!((mean - 0.03).abs() < 1e-12);
        assert!((std - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_trailing_pause_counted() {
        let pauses = pause_durations(&[1.0, 1.0, 0.0, 0.0], 0.01);
        assert_eq!(pauses.len(), 1);
    }

    #[test]
    fn test_no_pauses_is_zero() {
        assert_eq!(pause_stats(&[0.5; 20], 0.01), Some((0.0, 0.0)));
        assert_eq!(pause_stats(&[], 0.01), None);
    }

    #[test]
    fn test_all_silent_is_one_pause() {
        let pauses = pause_durations(&[0.0; 10], 0.01);
        assert_eq!(pauses.len(), 1);
        assert!((pauses[0] - 0.1).abs() < 1e-12);
    }
}
