//! WAV loading and preparation for analysis and playback.

use std::io::Read;
use std::path::Path;

use crate::error::AudioError;
use crate::resample::resample_mono;

/// Decoded WAV content, interleaved, scaled to [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct WavData {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl WavData {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_sec(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Channel mean of every frame.
    pub fn to_mono(&self) -> Vec<f32> {
        mix_to_mono(&self.samples, self.channels)
    }
}

/// Reads a WAV file.
pub fn read_wav(path: impl AsRef<Path>) -> Result<WavData, AudioError> {
    let reader = hound::WavReader::open(path)?;
    decode(reader)
}

/// Reads WAV content from any reader.
pub fn read_wav_from<R: Read>(reader: R) -> Result<WavData, AudioError> {
    decode(hound::WavReader::new(reader)?)
}

fn decode<R: Read>(reader: hound::WavReader<R>) -> Result<WavData, AudioError> {
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::UnsupportedWav("zero channels".into()));
    }

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, bits @ 1..=32) => {
            let scale = 1.0 / (1u64 << (bits - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| (v as f64 * scale) as f32))
                .collect::<Result<Vec<_>, _>>()?
        }
        (hound::SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        (format, bits) => {
            return Err(AudioError::UnsupportedWav(format!("{format:?} {bits}-bit")));
        }
    };

    Ok(WavData {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

/// Mixes interleaved audio down to mono by averaging the channels.
pub fn mix_to_mono(interleaved: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Scales `samples` in place so the peak sits just below full scale.
///
/// Silence stays silent.
pub fn peak_normalize(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let gain = 1.0 / (peak + 1e-6);
    for s in samples {
        *s *= gain;
    }
}

/// Loads a WAV file as mono audio at `sample_rate`.
///
/// The result is not normalised. Use [`peak_normalize`] on a copy for
/// playback.
pub fn load_for_analysis(
    path: impl AsRef<Path>,
    sample_rate: u32,
) -> Result<Vec<f32>, AudioError> {
    let path = path.as_ref();
    let wav = read_wav(path)?;
    tracing::info!(
        "loaded {}: rate={}, channels={}, duration={:.2}s",
        path.display(),
        wav.sample_rate,
        wav.channels,
        wav.duration_sec()
    );

    let mono = wav.to_mono();
    if wav.sample_rate == sample_rate {
        return Ok(mono);
    }
    tracing::debug!("resampling {} Hz -> {} Hz", wav.sample_rate, sample_rate);
    resample_mono(&mono, wav.sample_rate, sample_rate)
}
