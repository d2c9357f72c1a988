//! Error types for encoding, decoding and shape handling.

use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Everything that can go wrong while moving values through a byte stream.
///
/// Clock conversions never produce these: they are infallible given their
/// documented preconditions.
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying sink or source failed.
    #[error("stream I/O failure: {0}")]
    Io(#[from] io::Error),

    /// The source ran dry before the value was complete.
    #[error("truncated input: requested {requested} bytes, only {available} available")]
    TruncatedInput { requested: usize, available: usize },

    /// A bounded or fixed-size destination disagrees with the element count.
    #[error("size mismatch: destination holds {expected} elements, input carries {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A whole-buffer decode left bytes behind.
    #[error("trailing bytes: value consumed {consumed} bytes, {remaining} left over")]
    TrailingBytes { consumed: usize, remaining: usize },

    #[error("invalid boolean byte: {0:#04x}")]
    InvalidBool(u8),

    #[error("string payload is not valid UTF-8")]
    InvalidUtf8(#[from] FromUtf8Error),

    /// The element count does not fit in the wire size prefix.
    #[error("sequence of {0} elements does not fit in the size prefix")]
    SequenceTooLong(usize),

    #[error("invalid shape tag {tag:?} at offset {offset}")]
    InvalidTag { tag: String, offset: usize },

    /// A dynamic value does not have the shape it is being encoded as.
    #[error("value {value} does not match shape {shape}")]
    ShapeMismatch { shape: String, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
