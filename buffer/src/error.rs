//! Error types for buffer operations.

use thiserror::Error;

/// Buffer operation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Buffer has been closed (write side).
    #[error("buffer: closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_error_display() {
        let err = BufferError::Closed;
        assert_eq!(format!("{}", err), "buffer: closed");
    }
}
