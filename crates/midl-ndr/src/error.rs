//! NDR error types

use thiserror::Error;

/// Upper bound for a single count-driven allocation while decoding.
///
/// Counts come straight off the wire, so a corrupted or hostile stub could
/// otherwise request gigabytes before the first element is read.
pub const MAX_NDR_ALLOCATION_SIZE: usize = 16 * 1024 * 1024;

/// NDR encoding/decoding errors
#[derive(Debug, Error)]
pub enum NdrError {
    /// Not enough input left for the next item
    #[error("buffer underflow: needed {needed} bytes, have {have}")]
    BufferUnderflow { needed: usize, have: usize },

    /// A count does not fit the 32-bit wire field
    #[error("count {0} does not fit in a 32-bit conformance field")]
    CountOverflow(usize),

    /// A decoded count would allocate more than the runtime allows
    #[error("allocation of {requested} bytes exceeds limit of {limit}")]
    AllocationLimitExceeded { requested: usize, limit: usize },

    #[error("invalid string: {0}")]
    InvalidString(String),

    /// An embedded `[ref]` pointer arrived as null
    #[error("null reference pointer")]
    NullRefPointer,

    #[error("invalid pointer: referent ID {0:#010x}")]
    InvalidPointer(u32),

    #[error("array size mismatch: expected {expected}, got {got}")]
    ArraySizeMismatch { expected: usize, got: usize },

    #[error("invalid union discriminant: {0}")]
    InvalidDiscriminant(i64),

    #[error("invalid enum value: {0}")]
    InvalidEnumValue(i64),

    /// Variance outside of the conformance bounds
    #[error("conformance mismatch: max_count={max_count}, offset={offset}, actual_count={actual_count}")]
    ConformanceMismatch {
        max_count: u32,
        offset: u32,
        actual_count: u32,
    },

    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("UTF-16 error: {0}")]
    Utf16Error(#[from] std::char::DecodeUtf16Error),
}

/// Result type for NDR operations
pub type Result<T> = std::result::Result<T, NdrError>;
