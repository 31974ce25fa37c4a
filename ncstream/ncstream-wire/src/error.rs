//! Error types for the wire layer.

use ncstream_core::{ArrayError, SchemaError};

/// Low-level framing failure.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The stream does not start with [`START_MAGIC`](crate::START_MAGIC).
    #[error("bad start magic: {found:02x?}")]
    BadMagic { found: Vec<u8> },

    /// The source ended before the declared frame length was read.
    #[error("truncated frame: expected {expected} bytes, {available} available")]
    Truncated { expected: u64, available: u64 },

    /// A length prefix ran past 10 bytes or does not fit in a `u64`.
    #[error("varint length prefix does not fit in 64 bits")]
    VarintOverflow,

    /// Declared frame length exceeds [`MAX_FRAME_LEN`](crate::MAX_FRAME_LEN).
    #[error("frame length {length} exceeds limit {limit}")]
    TooLarge { length: u64, limit: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The metadata frame could not be turned into a
/// [`DatasetSchema`](ncstream_core::DatasetSchema).
#[derive(Debug, thiserror::Error)]
pub enum SchemaDecodeError {
    /// Metadata is not valid UTF-8.
    #[error("schema text is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Grammar violation at a byte offset of the schema text.
    #[error("schema syntax error at offset {offset}: {detail}")]
    Syntax { offset: usize, detail: String },

    /// A variable declares a type keyword the decoder does not know.
    #[error("variable '{variable}' has unknown type '{tag}'")]
    UnknownType { variable: String, tag: String },

    /// The parsed schema violates a structural invariant.
    #[error(transparent)]
    Invalid(#[from] SchemaError),
}

/// A data payload or record stream could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Payload length differs from the size implied by type and shape.
    #[error("payload is {actual} bytes, expected {expected}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// A record frame does not match the member layout.
    #[error("malformed record {index}: {detail}")]
    MalformedRecord { index: u64, detail: String },

    /// The header frame of a data response is not `name` or `name(section)`.
    #[error("malformed data header: {detail}")]
    MalformedHeader { detail: String },

    /// The record stream ended without its zero-length terminator.
    #[error("record stream ended after {records} records without a terminator")]
    MissingTerminator { records: u64 },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Array(#[from] ArrayError),
}
