//! Live and playback sessions for FCP analysis.
//!
//! A [`Session`] is always in exactly one [`SessionState`]:
//!
//! - **idle**: results of the last run can be read, a recording can be
//!   loaded
//! - **live**: the input device feeds a ring buffer that a [`LiveMonitor`]
//!   analyzes once per update interval
//! - **playback**: the loaded recording plays while a [`PlaybackTicker`]
//!   reports the precomputed result under the playback position
//!
//! Device access goes through [`AudioBackend`], so sessions can be driven
//! by fake devices in tests. [`CpalBackend`] is the real one.

mod backend;
mod error;
mod live;
mod playback;
mod session;
mod state;

pub use backend::{AudioBackend, CpalBackend, StreamHandle};
pub use error::SessionError;
pub use live::{LiveMonitor, LiveStats, LiveUpdate};
pub use playback::{PlaybackTicker, PlaybackUpdate, ResultTimeline};
pub use session::Session;
pub use state::SessionState;
