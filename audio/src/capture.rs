//! Microphone capture into a ring buffer.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use fcp_buffer::RingBuffer;

use crate::devices::{Direction, choose_config, device_name, stream_error};
use crate::error::AudioError;

/// A running input stream that feeds the first channel of every frame into
/// a [`RingBuffer`].
///
/// The callback only converts samples and pushes them; it never allocates
/// or waits on the analysis side. Dropping the stream stops the device.
///
/// `cpal::Stream` is not `Send` on every platform, so a `CaptureStream`
/// must be stopped on the thread that opened it.
pub struct CaptureStream {
    stream: Option<cpal::Stream>,
    buffer: RingBuffer<f32>,
    device: String,
    sample_rate: u32,
}

impl CaptureStream {
    /// Opens `device` at exactly `sample_rate` and starts capturing.
    pub fn open(
        device: &cpal::Device,
        sample_rate: u32,
        buffer: RingBuffer<f32>,
    ) -> Result<Self, AudioError> {
        let config = choose_config(device, Direction::Input, sample_rate)?;
        let channels = config.channels() as usize;
        let stream_config: cpal::StreamConfig = config.clone().into();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>,
            cpal::SampleFormat::I16 => build_stream::<i16>,
            cpal::SampleFormat::U16 => build_stream::<u16>,
            other => return Err(AudioError::UnsupportedSampleFormat(format!("{other:?}"))),
        }(device, &stream_config, channels, buffer.clone())?;
        stream.play()?;

        let device = device_name(device);
        tracing::info!(
            "capture started: device={device}, rate={sample_rate}, channels={channels}, format={:?}",
            config.sample_format()
        );

        Ok(Self {
            stream: Some(stream),
            buffer,
            device,
            sample_rate,
        })
    }

    pub fn buffer(&self) -> &RingBuffer<f32> {
        &self.buffer
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    /// Stops the device and closes the buffer.
    ///
    /// Late callbacks that race the pause are rejected by the closed buffer.
    /// Snapshots keep working after stop. Calling stop twice is a no-op.
    pub fn stop(&mut self) -> Result<(), AudioError> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        self.buffer.close();
        let paused = stream.pause();
        drop(stream);
        tracing::info!(
            "capture stopped: device={}, samples={}",
            self.device,
            self.buffer.total_written()
        );
        paused.map_err(AudioError::from)
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("stop capture on drop: {e}");
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    buffer: RingBuffer<f32>,
) -> Result<cpal::Stream, AudioError>
where
    T: Sample + SizedSample,
    f32: FromSample<T>,
{
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _| {
            let _ = buffer.push_iter(data.chunks(channels).map(|frame| frame[0].to_sample::<f32>()));
        },
        stream_error,
        None,
    )?;
    Ok(stream)
}
