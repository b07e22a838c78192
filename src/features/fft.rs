//! Framing and short-time Fourier transform
//!
//! Speech is analyzed in 32 ms frames with a 10 ms hop. The FFT size is the
//! next power of two at or above the frame length; the Hann-windowed frame
//! is zero-padded up to it.

use rustfft::{num_complex::Complex, FftPlanner};

const FRAME_SECS: f64 = 0.032;
const HOP_SECS: f64 = 0.010;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParams {
    pub frame_len: usize,
    pub hop: usize,
    pub n_fft: usize,
}

impl FrameParams {
    pub fn for_sample_rate(sample_rate: u32) -> Self {
        let sr = sample_rate as f64;
        let frame_len = ((sr * FRAME_SECS).round() as usize).max(4);
        let hop = ((sr * HOP_SECS).round() as usize).max(1);
        Self {
            frame_len,
            hop,
            n_fft: frame_len.next_power_of_two(),
        }
    }

    /// Number of complete frames in a signal of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        if len < self.frame_len {
            0
        } else {
            (len - self.frame_len) / self.hop + 1
        }
    }

    /// Complete frames of `signal`, in order
    pub fn frames<'a>(&self, signal: &'a [f64]) -> impl Iterator<Item = &'a [f64]> + 'a {
        let (frame_len, hop) = (self.frame_len, self.hop);
        (0..self.frame_count(signal.len())).map(move |i| &signal[i * hop..i * hop + frame_len])
    }

    /// Number of non-negative frequency bins
    pub fn bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub fn bin_hz(&self, sample_rate: u32) -> f64 {
        sample_rate as f64 / self.n_fft as f64
    }

    pub fn hop_secs(&self, sample_rate: u32) -> f64 {
        self.hop as f64 / sample_rate as f64
    }
}

/// Hanning window function
pub fn hanning_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos()))
        .collect()
}

/// Complex spectra of every frame, non-negative frequencies only
pub struct Spectrogram {
    /// `frames[t][k]`: frame `t`, bin `k`
    pub frames: Vec<Vec<Complex<f64>>>,
    pub params: FrameParams,
}

impl Spectrogram {
    pub fn compute(signal: &[f64], params: FrameParams) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(params.n_fft);
        let window = hanning_window(params.frame_len);
        let bins = params.bins();

        let mut buffer = vec![Complex::new(0.0, 0.0); params.n_fft];
        let frames = params
            .frames(signal)
            .map(|frame| {
                for (slot, (&s, &w)) in buffer.iter_mut().zip(frame.iter().zip(&window)) {
                    *slot = Complex::new(s * w, 0.0);
                }
                for slot in buffer.iter_mut().skip(frame.len()) {
                    *slot = Complex::new(0.0, 0.0);
                }
                fft.process(&mut buffer);
                buffer[..bins].to_vec()
            })
            .collect();

        Self { frames, params }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn bins(&self) -> usize {
        self.params.bins()
    }

    /// Magnitude spectra, `[frame][bin]`
    pub fn magnitudes(&self) -> Vec<Vec<f64>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // HANNING WINDOW TESTS
    // ==========================================================================
    //
    // w(n) = 0.5 * (1 - cos(2πn/(N-1))): zero at the edges, 1.0 in the middle,
    // symmetric.
    // ==========================================================================

    #[test]
    fn test_hanning_window_edges() {
        let window = hanning_window(100);
        assert!(window[0] < 0.001, "Window should start near zero, got {}", window[0]);
        assert!(window[99] < 0.001, "Window should end near zero, got {}", window[99]);
    }

    #[test]
    fn test_hanning_window_center() {
        let window = hanning_window(101);
        assert!((window[50] - 1.0).abs() < 0.001, "Window center should be 1.0, got {}", window[50]);
    }

    #[test]
    fn test_hanning_window_symmetry() {
        let window = hanning_window(64);
        for i in 0..32 {
            assert!((window[i] - window[63 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_hanning_window_degenerate_sizes() {
        assert!(hanning_window(0).is_empty());
        assert_eq!(hanning_window(1), vec![1.0]);
    }

    // ==========================================================================
    // FRAMING TESTS
    // ==========================================================================
    //
    // At 16 kHz: 32 ms = 512 samples, 10 ms = 160 samples, FFT size 512.
    // At 44.1 kHz: 1411 samples → FFT size 2048.
    // ==========================================================================

    #[test]
    fn test_frame_params_16k() {
        let p = FrameParams::for_sample_rate(16000);
        assert_eq!(p.frame_len, 512);
        assert_eq!(p.hop, 160);
        assert_eq!(p.n_fft, 512);
        assert_eq!(p.bins(), 257);
        assert!((p.bin_hz(16000) - 31.25).abs() < 1e-12);
    }

    #[test]
    fn test_frame_params_44k() {
        let p = FrameParams::for_sample_rate(44100);
        assert_eq!(p.frame_len, 1411);
        assert_eq!(p.hop, 441);
        assert_eq!(p.n_fft, 2048);
    }

    #[test]
    fn test_frame_count() {
        let p = FrameParams::for_sample_rate(16000);
        assert_eq!(p.frame_count(511), 0);
        assert_eq!(p.frame_count(512), 1);
        assert_eq!(p.frame_count(512 + 159), 1);
        assert_eq!(p.frame_count(512 + 160), 2);
        assert_eq!(p.frames(&vec![0.0; 1000]).count(), p.frame_count(1000));
    }

    // ==========================================================================
    // SPECTROGRAM TESTS
    // ==========================================================================

    #[test]
    fn test_spectrogram_peak_at_tone_bin() {
        let sr = 16000;
        let p = FrameParams::for_sample_rate(sr);
        // 1000 Hz lands exactly on bin 32 (31.25 Hz per bin)
        let signal: Vec<f64> = (0..sr as usize)
            .map(|i| (2.0 * std::f64::consts::PI * 1000.0 * i as f64 / sr as f64).sin())
            .collect();

        let spec = Spectrogram::compute(&signal, p);
        assert_eq!(spec.frame_count(), p.frame_count(signal.len()));
        assert_eq!(spec.bins(), 257);

        let mags = spec.magnitudes();
        let peak = mags[0]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 32);
    }

    #[test]
    fn test_spectrogram_silence_is_zero() {
        let p = FrameParams::for_sample_rate(16000);
        let spec = Spectrogram::compute(&vec![0.0; 4000], p);
        assert!(spec.magnitudes().iter().flatten().all(|&m| m == 0.0));
    }
}
