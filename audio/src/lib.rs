//! Audio I/O for FCP analysis.
//!
//! - [`list_devices`], [`find_device`]: device discovery through the cpal
//!   default host
//! - [`CaptureStream`]: microphone capture into a [`fcp_buffer::RingBuffer`]
//! - [`PlaybackStream`] and [`PlaybackCursor`]: playback with a position
//!   other threads can follow
//! - [`read_wav`], [`load_for_analysis`]: WAV decoding, mono mix-down and
//!   resampling to the analysis rate
//!
//! Streams must be stopped on the thread that opened them.
//!
//! # Example
//!
//! ```no_run
//! use fcp_audio::{CaptureStream, Direction, find_device};
//! use fcp_buffer::RingBuffer;
//!
//! let device = find_device(Direction::Input, None)?;
//! let buffer = RingBuffer::<f32>::new(44100);
//! let mut capture = CaptureStream::open(&device, 44100, buffer.clone())?;
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! capture.stop()?;
//! let last_second = buffer.snapshot();
//! # Ok::<(), fcp_audio::AudioError>(())
//! ```

mod capture;
mod devices;
mod error;
mod playback;
mod resample;
mod wav;

pub use capture::CaptureStream;
pub use devices::{DeviceInfo, Direction, choose_config, device_name, find_device, list_devices};
pub use error::AudioError;
pub use playback::{PlaybackCursor, PlaybackStream};
pub use resample::resample_mono;
pub use wav::{WavData, load_for_analysis, mix_to_mono, peak_normalize, read_wav, read_wav_from};
