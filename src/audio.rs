//! Decoded audio and the decoding collaborator
//!
//! The analysis core only ever sees an [`AudioBuffer`]: planar `f64` samples
//! in [-1.0, 1.0], one `Vec` per channel, plus a sample rate. Compressed
//! input (MP3, FLAC, WAV, OGG, ...) is turned into a buffer here, before any
//! analysis starts.

use crate::error::AnalysisError;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// A fully decoded clip. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f64>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Build from planar channel data.
    ///
    /// Channels of unequal length are truncated to the shortest one so every
    /// sample frame has a value for every channel.
    pub fn from_channels(mut channels: Vec<Vec<f64>>, sample_rate: u32) -> Self {
        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        for ch in &mut channels {
            ch.truncate(frames);
        }
        Self {
            channels,
            sample_rate,
        }
    }

    pub fn from_mono(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self::from_channels(vec![samples], sample_rate)
    }

    /// Build from interleaved samples (`L R L R ...`). A trailing partial
    /// frame is dropped.
    pub fn from_interleaved(samples: &[f64], channel_count: usize, sample_rate: u32) -> Self {
        let channel_count = channel_count.max(1);
        let mut channels = vec![Vec::with_capacity(samples.len() / channel_count); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Self::from_channels(channels, sample_rate)
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Collapse all channels into one analysis signal by taking the median of
    /// each sample frame. A single loud or broken channel cannot drag the
    /// result the way a plain average would.
    pub fn median_mixdown(&self) -> Vec<f64> {
        match self.channels.len() {
            0 => Vec::new(),
            1 => self.channels[0].clone(),
            n => {
                let mut scratch = vec![0.0; n];
                (0..self.frames())
                    .map(|i| {
                        for (slot, ch) in scratch.iter_mut().zip(&self.channels) {
                            *slot = ch[i];
                        }
                        median_in_place(&mut scratch)
                    })
                    .collect()
            }
        }
    }
}

/// Median of a slice, reordering it. Empty input yields 0.0.
pub(crate) fn median_in_place(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Read and decode an audio file.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<AudioBuffer, AnalysisError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| AnalysisError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    decode_with_hint(data, hint)
}

/// Decode in-memory audio, letting symphonia detect the container.
pub fn decode_bytes(data: &[u8]) -> Result<AudioBuffer, AnalysisError> {
    decode_with_hint(data.to_vec(), Hint::new())
}

fn decode_with_hint(data: Vec<u8>, hint: Hint) -> Result<AudioBuffer, AnalysisError> {
    let cursor = std::io::Cursor::new(data);
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AnalysisError::Decode(e.to_string()))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| AnalysisError::Decode("no audio track".to_string()))?;
    let track_id = track.id;
    let declared_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AnalysisError::Decode(e.to_string()))?;

    let mut interleaved: Vec<f64> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut buf_frames = 0u64;
    let mut channel_count = 0usize;
    let mut sample_rate = declared_rate.unwrap_or(0);

    loop {
        // End of stream surfaces as an error from next_packet.
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(_) => break,
        };

        if packet.track_id() != track_id {
            continue;
        }

        // A corrupt packet is skipped, not fatal.
        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(_) => continue,
        };

        let spec = *decoded.spec();
        let frames = decoded.capacity() as u64;
        if sample_buf.is_none() || frames > buf_frames {
            sample_buf = Some(SampleBuffer::new(frames, spec));
            buf_frames = frames;
        }
        channel_count = spec.channels.count();
        sample_rate = spec.rate;

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend(buf.samples().iter().map(|&s| s as f64));
        }
    }

    if interleaved.is_empty() || channel_count == 0 {
        return Err(AnalysisError::EmptyAudio);
    }

    Ok(AudioBuffer::from_interleaved(
        &interleaved,
        channel_count,
        sample_rate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // BUFFER CONSTRUCTION TESTS
    // ==========================================================================

    #[test]
    fn test_from_interleaved_splits_channels() {
        let buf = AudioBuffer::from_interleaved(&[0.1, -0.1, 0.2, -0.2, 0.3], 2, 8000);

        assert_eq!(buf.channel_count(), 2);
        assert_eq!(buf.frames(), 2, "trailing partial frame is dropped");
        assert_eq!(buf.channels()[0], vec![0.1, 0.2]);
        assert_eq!(buf.channels()[1], vec![-0.1, -0.2]);
    }

    #[test]
    fn test_unequal_channels_truncate() {
        let buf = AudioBuffer::from_channels(vec![vec![0.0; 10], vec![0.0; 7]], 16000);
        assert_eq!(buf.frames(), 7);
        assert!(buf.channels().iter().all(|c| c.len() == 7));
    }

    #[test]
    fn test_duration() {
        let buf = AudioBuffer::from_mono(vec![0.0; 32000], 16000);
        assert!((buf.duration_secs() - 2.0).abs() < 1e-12);

        let zero_rate = AudioBuffer::from_mono(vec![0.0; 100], 0);
        assert_eq!(zero_rate.duration_secs(), 0.0);
    }

    #[test]
    fn test_empty() {
        assert!(AudioBuffer::from_mono(vec![], 16000).is_empty());
        assert!(AudioBuffer::from_channels(vec![], 16000).is_empty());
    }

    // ==========================================================================
    // MEDIAN MIXDOWN TESTS
    // ==========================================================================
    //
    // With three or more channels the median ignores a single outlier channel.
    // With two channels the median is the midpoint.
    // ==========================================================================

    #[test]
    fn test_median_mixdown_rejects_outlier_channel() {
        let buf = AudioBuffer::from_channels(
            vec![vec![0.1, 0.2], vec![0.1, 0.2], vec![1.0, -1.0]],
            16000,
        );
        assert_eq!(buf.median_mixdown(), vec![0.1, 0.2]);
    }

    #[test]
    fn test_median_mixdown_two_channels_is_midpoint() {
        let buf = AudioBuffer::from_channels(vec![vec![0.2], vec![0.4]], 16000);
        let mono = buf.median_mixdown();
        assert!((mono[0] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_median_mixdown_mono_passthrough() {
        let buf = AudioBuffer::from_mono(vec![0.5, -0.5], 16000);
        assert_eq!(buf.median_mixdown(), vec![0.5, -0.5]);
    }

    #[test]
    fn test_median_in_place() {
        assert_eq!(median_in_place(&mut []), 0.0);
        assert_eq!(median_in_place(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median_in_place(&mut [4.0, 1.0, 2.0, 3.0]), 2.5);
    }

    // ==========================================================================
    // DECODING TESTS
    // ==========================================================================

    #[test]
    fn test_decode_garbage_is_error() {
        let result = decode_bytes(b"definitely not audio");
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }

    #[test]
    fn test_decode_missing_file_is_io_error() {
        let result = decode_file("/nonexistent/voxguard/clip.wav");
        assert!(matches!(result, Err(AnalysisError::Io { .. })));
    }

    /// Minimal 16-bit PCM WAV writer for decode tests.
    fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        let byte_rate = sample_rate * channels as u32 * 2;
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&(channels * 2).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_stereo_wav() {
        let mut samples = Vec::new();
        for _ in 0..1600 {
            samples.push(8192i16);
            samples.push(-8192i16);
        }
        let buf = decode_bytes(&wav_bytes(&samples, 16000, 2)).unwrap();

        assert_eq!(buf.sample_rate(), 16000);
        assert_eq!(buf.channel_count(), 2);
        assert_eq!(buf.frames(), 1600);
        assert!((buf.channels()[0][0] - 0.25).abs() < 1e-3);
        assert!((buf.channels()[1][0] + 0.25).abs() < 1e-3);
    }
}
