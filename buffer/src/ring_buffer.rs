//! Overwriting ring buffer implementation.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::BufferError;

/// A thread-safe, always-full overwriting ring buffer.
///
/// `RingBuffer<T>` holds exactly `capacity` elements at all times. It starts
/// out filled with `T::default()` (silence for samples) and every write
/// shifts the window forward, overwriting the oldest elements. A snapshot
/// always returns the most recent `capacity` elements in the order they
/// were written.
///
/// # Semantics
///
/// - **Push**: Never blocks on readers, never allocates, O(len) per call
/// - **Snapshot**: Copies the whole window under the same short lock, so a
///   reader never observes a half-applied push
/// - **Close**: Rejects further pushes; snapshots keep working
///
/// # Example
///
/// ```
/// use fcp_buffer::RingBuffer;
///
/// // Keep only the 4 most recent samples
/// let buf = RingBuffer::<f32>::new(4);
/// assert_eq!(buf.snapshot(), vec![0.0; 4]);
///
/// buf.push(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// assert_eq!(buf.snapshot(), vec![2.0, 3.0, 4.0, 5.0]);
/// ```
pub struct RingBuffer<T> {
    inner: Arc<Mutex<RingBufferState<T>>>,
}

struct RingBufferState<T> {
    buf: Box<[T]>,
    // Index of the oldest element. The buffer is always full, so this is
    // also the next write position.
    head: usize,
    written: u64,
    closed: bool,
}

impl<T> Clone for RingBuffer<T> {
    fn clone(&self) -> Self {
        RingBuffer {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Creates a new RingBuffer with the specified capacity, zero-filled.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        RingBuffer {
            inner: Arc::new(Mutex::new(RingBufferState {
                buf: vec![T::default(); capacity].into_boxed_slice(),
                head: 0,
                written: 0,
                closed: false,
            })),
        }
    }

    /// Returns the buffer capacity.
    pub fn capacity(&self) -> usize {
        self.inner.lock().buf.len()
    }

    /// Returns the total number of elements pushed since creation or the
    /// last reset.
    pub fn total_written(&self) -> u64 {
        self.inner.lock().written
    }

    /// Returns true once at least `capacity` elements have been pushed, i.e.
    /// the window no longer contains any of the initial padding.
    pub fn is_filled(&self) -> bool {
        let state = self.inner.lock();
        state.written >= state.buf.len() as u64
    }

    /// Appends `data` at the tail, dropping the oldest elements.
    ///
    /// If `data` is at least as long as the capacity, the window is replaced
    /// by the last `capacity` elements of `data`.
    pub fn push(&self, data: &[T]) -> Result<(), BufferError> {
        let mut state = self.inner.lock();
        if state.closed {
            return Err(BufferError::Closed);
        }

        let capacity = state.buf.len();
        state.written = state.written.wrapping_add(data.len() as u64);

        if data.len() >= capacity {
            state.buf.copy_from_slice(&data[data.len() - capacity..]);
            state.head = 0;
            return Ok(());
        }

        let head = state.head;
        let first = data.len().min(capacity - head);
        state.buf[head..head + first].copy_from_slice(&data[..first]);
        let rest = data.len() - first;
        if rest > 0 {
            state.buf[..rest].copy_from_slice(&data[first..]);
        }
        state.head = (head + data.len()) % capacity;
        Ok(())
    }

    /// Appends every element yielded by `items`, without staging them in an
    /// intermediate buffer.
    ///
    /// This is the entry point for the capture callback, which converts and
    /// de-interleaves device frames on the fly.
    pub fn push_iter<I>(&self, items: I) -> Result<(), BufferError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut state = self.inner.lock();
        if state.closed {
            return Err(BufferError::Closed);
        }

        let capacity = state.buf.len();
        let mut head = state.head;
        let mut count = 0u64;
        for item in items {
            state.buf[head] = item;
            head += 1;
            if head == capacity {
                head = 0;
            }
            count += 1;
        }
        state.head = head;
        state.written = state.written.wrapping_add(count);
        Ok(())
    }

    /// Returns a copy of the window, oldest element first.
    pub fn snapshot(&self) -> Vec<T> {
        let mut out = Vec::new();
        self.snapshot_into(&mut out);
        out
    }

    /// Copies the window into `out`, oldest element first, and returns the
    /// total number of elements written when the copy was taken.
    ///
    /// `out` is cleared first; once it has grown to the buffer capacity it is
    /// reused without reallocating.
    pub fn snapshot_into(&self, out: &mut Vec<T>) -> u64 {
        let state = self.inner.lock();
        out.clear();
        out.reserve(state.buf.len());
        out.extend_from_slice(&state.buf[state.head..]);
        out.extend_from_slice(&state.buf[..state.head]);
        state.written
    }

    /// Resets the window to the default value.
    ///
    /// This does not change the closed state of the buffer.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        state.buf.fill(T::default());
        state.head = 0;
        state.written = 0;
    }

    /// Closes the write side of the buffer. Later pushes fail with
    /// [`BufferError::Closed`].
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }

    /// Returns true if the buffer has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}
