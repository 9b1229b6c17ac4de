//! Host-side proxy for remote-controlled HV switching and waveform boards.
//!
//! The crate sits above a request/reply RPC primitive ([`rpc::RpcTransport`])
//! and provides:
//!
//! - a schema-driven codec for the device's config and state records
//!   ([`record`], [`schema`]),
//! - the packed channel bitmask codec ([`channels`]),
//! - [`DeviceProxy`], the single facade applications use to read and update
//!   a connected board.
//!
//! Board layouts live in [`boards`]; transports that can carry the RPC
//! primitive live in [`transport`].

pub mod boards;
pub mod channels;
pub mod config;
pub mod error;
pub mod hw_trait;
pub mod proxy;
pub mod record;
pub mod rpc;
pub mod schema;
pub mod tracing;
pub mod transport;

pub use error::{Error, Result, TransportError};
pub use proxy::{DeviceProxy, FieldValue, Persistence};
pub use record::{Record, Value};
pub use rpc::{Method, RpcTransport};
pub use schema::{DeviceSchema, FieldSpec, RecordSchema, ScalarType};
