//! Error types for switchboard-proxy.
//!
//! [`Error`] is what every proxy and codec operation returns. Failures of the
//! underlying request/reply channel are described by [`TransportError`] and
//! are carried unchanged inside [`Error::Transport`].

use std::io;

use thiserror::Error;

use crate::rpc::Method;
use crate::schema::ScalarType;

/// Main error type for proxy and codec operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Buffer too short to hold every field of the schema
    #[error("malformed {record} record: need {expected} bytes, got {actual}")]
    MalformedRecord {
        record: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Update names a field the schema does not define
    #[error("unknown field `{field}` in {record} record")]
    UnknownField { record: &'static str, field: String },

    /// Update value does not match the scalar type of its field
    #[error("field `{field}` is {expected}, got {actual}")]
    FieldType {
        field: String,
        expected: ScalarType,
        actual: ScalarType,
    },

    /// Channel array length differs from the device's channel count
    #[error("expected {expected} channel states, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },

    /// Channel index beyond the device's channel count
    #[error("channel {index} out of range (device has {channel_count})")]
    ChannelIndex { index: usize, channel_count: usize },

    /// Packed channel reply too short for the channel count
    #[error("channel reply too short: need {expected} bytes, got {actual}")]
    ShortChannelBuffer { expected: usize, actual: usize },

    /// Device returned a negative acknowledgement
    #[error("device rejected {method}")]
    UpdateRejected { method: Method },

    /// Update was applied but committing it to nonvolatile storage failed
    #[error("config applied but not saved: {0}")]
    NotPersisted(#[source] Box<Error>),

    /// Reply did not have the shape the method defines
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Board model has no command for the requested operation
    #[error("{model} does not support {operation}")]
    Unsupported {
        model: &'static str,
        operation: &'static str,
    },

    /// Record schema is inconsistent
    #[error("schema error: {0}")]
    Schema(String),

    /// Proxy configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying request/reply channel failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Failure of the raw request/reply channel.
#[derive(Error, Debug)]
pub enum TransportError {
    /// I/O errors from the link
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Lock, write or read did not finish in time
    #[error("timed out: {0}")]
    Timeout(&'static str),

    /// Bus-level error reported by the link (NAK, arbitration loss, ...)
    #[error("bus error: {0}")]
    Bus(String),

    /// Link closed while a reply was outstanding
    #[error("link closed")]
    Closed,
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when the device holds the requested change in volatile memory
    /// only, i.e. [`crate::DeviceProxy::save_config`] can still commit it.
    pub fn is_applied_but_unsaved(&self) -> bool {
        matches!(self, Error::NotPersisted(_))
    }
}
