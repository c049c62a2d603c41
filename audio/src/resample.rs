//! Offline sample rate conversion.

use rubato::{FftFixedInOut, Resampler};

use crate::error::AudioError;

/// Frames per processing block.
const CHUNK_SIZE: usize = 1024;

/// Resamples a mono signal from `from_rate` to `to_rate`.
///
/// The output holds `floor(len * to_rate / from_rate)` samples and is
/// aligned with the input: the resampler's group delay is trimmed and the
/// final partial block is zero-padded.
pub fn resample_mono(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 1)?;
    let expected = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let delay = resampler.output_delay();

    let mut input_buf = vec![Vec::with_capacity(resampler.input_frames_max())];
    let mut output_buf = vec![vec![0.0f32; resampler.output_frames_max()]];
    let mut out = Vec::with_capacity(expected + delay + resampler.output_frames_max());

    let mut pos = 0;
    while out.len() < expected + delay {
        let need = resampler.input_frames_next();
        let end = (pos + need).min(samples.len());
        let input = &mut input_buf[0];
        input.clear();
        if pos < end {
            input.extend_from_slice(&samples[pos..end]);
        }
        input.resize(need, 0.0);

        let (_, written) = resampler.process_into_buffer(&input_buf, &mut output_buf, None)?;
        out.extend_from_slice(&output_buf[0][..written]);
        pos += need;
    }

    out.drain(..delay);
    out.truncate(expected);
    Ok(out)
}
