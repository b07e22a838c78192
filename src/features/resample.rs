//! Sample rate conversion to the analysis rate
//!
//! The mel filterbank spans everything up to Nyquist, so the same voice
//! recorded at 16 kHz and 48 kHz would otherwise land in different bands.
//! Higher-rate input is brought down to one analysis rate first.

use rubato::{FftFixedInOut, Resampler};

/// Frames handed to the FFT resampler per block
const CHUNK_FRAMES: usize = 1024;

/// Resample a mono signal from `from` Hz to `to` Hz.
///
/// Returns `None` when the resampler cannot be built for this rate pair; the
/// caller keeps the native-rate signal in that case.
pub fn resample(signal: &[f64], from: u32, to: u32) -> Option<Vec<f64>> {
    if from == to || signal.is_empty() {
        return Some(signal.to_vec());
    }
    match run(signal, from, to) {
        Ok(out) => Some(out),
        Err(e) => {
            tracing::warn!(from, to, error = %e, "resampling failed, analyzing at native rate");
            None
        }
    }
}

fn run(signal: &[f64], from: u32, to: u32) -> Result<Vec<f64>, Box<dyn std::error::Error>> {
    if from == 0 || to == 0 {
        return Err("sample rate must be non-zero".into());
    }
    let mut resampler = FftFixedInOut::<f64>::new(from as usize, to as usize, CHUNK_FRAMES, 1)?;

    let delay = resampler.output_delay();
    let expected = (signal.len() as f64 * to as f64 / from as f64).round() as usize;
    let chunk_in = resampler.input_frames_next();

    let mut input = vec![vec![0.0; chunk_in]];
    let mut output = vec![vec![0.0; resampler.output_frames_next()]];
    let mut out = Vec::with_capacity(expected + delay + output[0].len());

    // Zero-pad past the end until the delayed tail has been flushed
    let mut pos = 0;
    while out.len() < expected + delay {
        let block = &mut input[0];
        block.fill(0.0);
        if pos < signal.len() {
            let end = (pos + chunk_in).min(signal.len());
            block[..end - pos].copy_from_slice(&signal[pos..end]);
        }
        pos += chunk_in;

        let (_, written) = resampler.process_into_buffer(&input, &mut output, None)?;
        if written == 0 {
            break;
        }
        out.extend_from_slice(&output[0][..written]);
    }

    out.drain(..delay.min(out.len()));
    out.truncate(expected);
    Ok(out)
}
