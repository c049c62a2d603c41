//! Fixed-capacity sample buffer for live audio capture.
//!
//! [`RingBuffer<T>`] keeps the most recent `capacity` elements written to it.
//! It is designed for one real-time producer (an audio driver callback) and
//! any number of readers that periodically take a consistent snapshot of the
//! whole window.
//!
//! ```
//! use fcp_buffer::RingBuffer;
//!
//! let buf = RingBuffer::<i32>::new(3);
//! buf.push(&[1, 2, 3, 4, 5]).unwrap();  // Overwrites 1, 2
//! assert_eq!(buf.snapshot(), vec![3, 4, 5]);
//! ```
//!
//! # Thread Safety
//!
//! `RingBuffer` is `Send + Sync` and can be shared between threads using
//! `Clone` (which shares the underlying window via `Arc`).

mod error;
mod ring_buffer;

pub use error::BufferError;
pub use ring_buffer::RingBuffer;
