//! Page error types
//!
//! Every failure a page operation can report. Lookups that simply find
//! nothing return `None` instead of an error.

use thiserror::Error;

/// Errors that can occur in the page layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The record (plus its index slot) does not fit in the remaining free space
    #[error("Out of space: record needs {required} bytes, {available} available")]
    OutOfSpace { required: u64, available: u64 },

    /// The record's declared length is inconsistent with its payload
    #[error("Bad entry data: {0}")]
    BadData(String),

    /// Entry index outside `[0, entry_count)`
    #[error("Entry index {index} out of range (count = {count})")]
    IndexOutOfRange { index: u32, count: u32 },

    /// Receiving buffer is smaller than the stored record
    #[error("Receiver too small: {required} bytes required")]
    BufferTooSmall { required: u32 },

    /// Buffer length is not a usable page capacity
    #[error("Invalid page capacity: {0} bytes")]
    InvalidCapacity(u64),

    /// Buffer content is not a valid page (checksum mismatch, bad offsets, etc.)
    #[error("Corrupt page: {0}")]
    Corruption(String),
}

/// Result type alias for page operations
pub type PageResult<T> = Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PageError::BufferTooSmall { required: 48 };
        assert_eq!(err.to_string(), "Receiver too small: 48 bytes required");

        let err = PageError::IndexOutOfRange { index: 3, count: 2 };
        assert_eq!(err.to_string(), "Entry index 3 out of range (count = 2)");
    }

    #[test]
    fn test_out_of_space_display() {
        let err = PageError::OutOfSpace {
            required: 40,
            available: 12,
        };
        assert_eq!(
            err.to_string(),
            "Out of space: record needs 40 bytes, 12 available"
        );
    }
}
