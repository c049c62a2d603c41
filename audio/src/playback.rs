//! Playback of a mono signal with a shared position cursor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use crossbeam_channel::Sender;

use crate::devices::{Direction, choose_config, device_name, stream_error};
use crate::error::AudioError;

/// Position of an ongoing playback, shared between the output callback and
/// whoever displays results in sync with it.
///
/// The callback advances `position` by the frames it renders. Readers only
/// ever see a position in `0..=len`.
#[derive(Debug)]
pub struct PlaybackCursor {
    samples: Arc<[f32]>,
    sample_rate: u32,
    position: AtomicUsize,
    cancelled: AtomicBool,
    finished: AtomicBool,
}

impl PlaybackCursor {
    pub fn new(samples: impl Into<Arc<[f32]>>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            position: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples already handed to the device.
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    /// Playback time at the current position.
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.position() as f64 / self.sample_rate as f64)
    }

    /// Requests the callback to emit silence from now on.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Reports whether the callback has run past the end or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Renders the next block into `out`, an interleaved buffer with
    /// `channels` channels. The mono sample is copied to every channel.
    ///
    /// Frames past the end, or after cancellation, are zero. Returns true
    /// exactly once, on the call that first observes the end.
    pub fn fill<T>(&self, out: &mut [T], channels: usize) -> bool
    where
        T: Sample + FromSample<f32>,
    {
        let channels = channels.max(1);
        let frames = out.len() / channels;

        if self.is_cancelled() {
            out.fill(T::EQUILIBRIUM);
            return self.mark_finished();
        }

        let start = self.position().min(self.samples.len());
        let available = (self.samples.len() - start).min(frames);
        for (frame, &s) in out
            .chunks_mut(channels)
            .zip(&self.samples[start..start + available])
        {
            frame.fill(T::from_sample(s));
        }
        out[available * channels..].fill(T::EQUILIBRIUM);

        let next = (start + frames).min(self.samples.len());
        self.position.store(next, Ordering::Release);
        if available < frames {
            return self.mark_finished();
        }
        false
    }

    fn mark_finished(&self) -> bool {
        !self.finished.swap(true, Ordering::AcqRel)
    }
}

/// A running output stream driven by a [`PlaybackCursor`].
///
/// Like [`CaptureStream`](crate::CaptureStream), it must be stopped on the
/// thread that opened it.
pub struct PlaybackStream {
    stream: Option<cpal::Stream>,
    cursor: Arc<PlaybackCursor>,
    device: String,
}

impl PlaybackStream {
    /// Opens `device` at the cursor's sample rate and starts playing.
    ///
    /// `done` receives one message when the signal is exhausted or the
    /// cursor is cancelled.
    pub fn open(
        device: &cpal::Device,
        cursor: Arc<PlaybackCursor>,
        done: Sender<()>,
    ) -> Result<Self, AudioError> {
        let config = choose_config(device, Direction::Output, cursor.sample_rate())?;
        let channels = config.channels() as usize;
        let stream_config: cpal::StreamConfig = config.clone().into();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>,
            cpal::SampleFormat::I16 => build_stream::<i16>,
            cpal::SampleFormat::U16 => build_stream::<u16>,
            other => return Err(AudioError::UnsupportedSampleFormat(format!("{other:?}"))),
        }(device, &stream_config, channels, Arc::clone(&cursor), done)?;
        stream.play()?;

        let device = device_name(device);
        tracing::info!(
            "playback started: device={device}, rate={}, duration={:.2}s",
            cursor.sample_rate(),
            cursor.len() as f64 / cursor.sample_rate() as f64
        );

        Ok(Self {
            stream: Some(stream),
            cursor,
            device,
        })
    }

    pub fn cursor(&self) -> &Arc<PlaybackCursor> {
        &self.cursor
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Cancels the cursor and releases the device. Idempotent.
    pub fn stop(&mut self) -> Result<(), AudioError> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        self.cursor.cancel();
        let paused = stream.pause();
        drop(stream);
        tracing::info!(
            "playback stopped: device={}, position={:.2}s",
            self.device,
            self.cursor.elapsed().as_secs_f64()
        );
        paused.map_err(AudioError::from)
    }
}

impl Drop for PlaybackStream {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("stop playback on drop: {e}");
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    cursor: Arc<PlaybackCursor>,
    done: Sender<()>,
) -> Result<cpal::Stream, AudioError>
where
    T: Sample + SizedSample + FromSample<f32>,
{
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            if cursor.fill(data, channels) {
                let _ = done.try_send(());
            }
        },
        stream_error,
        None,
    )?;
    Ok(stream)
}
