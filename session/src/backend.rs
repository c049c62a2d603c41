//! Pluggable audio device access.

use std::sync::Arc;

use crossbeam_channel::Sender;
use fcp_audio::{AudioError, CaptureStream, Direction, PlaybackCursor, PlaybackStream, find_device};
use fcp_buffer::RingBuffer;

/// A running device stream.
pub trait StreamHandle {
    /// Stops the stream and releases the device. Must be idempotent.
    fn stop(&mut self) -> Result<(), AudioError>;
}

impl StreamHandle for CaptureStream {
    fn stop(&mut self) -> Result<(), AudioError> {
        CaptureStream::stop(self)
    }
}

impl StreamHandle for PlaybackStream {
    fn stop(&mut self) -> Result<(), AudioError> {
        PlaybackStream::stop(self)
    }
}

/// Opens capture and playback streams for a session.
///
/// Both methods must fail synchronously, before any callback runs, when the
/// device cannot be used.
pub trait AudioBackend {
    /// Starts capturing mono samples at `sample_rate` into `buffer`.
    fn open_capture(
        &self,
        sample_rate: u32,
        buffer: RingBuffer<f32>,
    ) -> Result<Box<dyn StreamHandle>, AudioError>;

    /// Starts playing `cursor`, signalling `done` once it is exhausted.
    fn open_playback(
        &self,
        cursor: Arc<PlaybackCursor>,
        done: Sender<()>,
    ) -> Result<Box<dyn StreamHandle>, AudioError>;
}

/// Backend using the cpal default host.
///
/// Device names are resolved on every open, so a device plugged in after
/// startup is picked up. `None` selects the host default.
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    pub input_device: Option<String>,
    pub output_device: Option<String>,
}

impl CpalBackend {
    pub fn new(input_device: Option<String>, output_device: Option<String>) -> Self {
        Self {
            input_device,
            output_device,
        }
    }
}

impl AudioBackend for CpalBackend {
    fn open_capture(
        &self,
        sample_rate: u32,
        buffer: RingBuffer<f32>,
    ) -> Result<Box<dyn StreamHandle>, AudioError> {
        let device = find_device(Direction::Input, self.input_device.as_deref())?;
        Ok(Box::new(CaptureStream::open(&device, sample_rate, buffer)?))
    }

    fn open_playback(
        &self,
        cursor: Arc<PlaybackCursor>,
        done: Sender<()>,
    ) -> Result<Box<dyn StreamHandle>, AudioError> {
        let device = find_device(Direction::Output, self.output_device.as_deref())?;
        Ok(Box::new(PlaybackStream::open(&device, cursor, done)?))
    }
}
