//! Raw RPC primitive consumed by the proxy.
//!
//! Boards expose a fixed set of remote methods. A transport issues one
//! request for a [`Method`] with a byte payload and returns the raw reply
//! bytes. Everything above that (decoding, acknowledgement handling,
//! persistence sequencing) happens in [`crate::proxy`].

use async_trait::async_trait;
use strum::{Display, FromRepr, IntoStaticStr};

use crate::error::{Error, Result, TransportError};

/// Remote methods this layer calls.
///
/// Discriminants are the method ids sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Method {
    /// Reply: encoded config record
    SerializeConfig = 0x10,
    /// Payload: encoded config record. Reply: ack
    UpdateConfig = 0x11,
    /// Commit the active config to EEPROM. Reply: ack
    SaveConfig = 0x12,
    /// Reply: encoded state record
    SerializeState = 0x20,
    /// Payload: encoded state record. Reply: ack
    UpdateState = 0x21,
    /// Reply: u16 little-endian
    ChannelCount = 0x30,
    /// Reply: u16 little-endian. Boards that detect attached switching
    /// boards at startup report their channel count through this method.
    NumberOfChannels = 0x31,
    /// Reply: packed channel bytes
    StateOfChannels = 0x32,
    /// Payload: packed channel bytes. Reply: ack
    SetStateOfChannels = 0x33,
    /// Payload: u8 boost converter level. Reply: ack
    SetVoltage = 0x34,
}

impl Method {
    /// Wire id of the method.
    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Synchronous request/reply channel to one device.
///
/// Each call is a complete unit: the request is sent and the reply awaited
/// before the call returns. Implementations must not pipeline requests;
/// `&mut self` keeps a single caller on the channel at a time.
#[async_trait]
pub trait RpcTransport: Send {
    async fn call(
        &mut self,
        method: Method,
        payload: &[u8],
    ) -> std::result::Result<Vec<u8>, TransportError>;

    /// Hold the channel for a sequence of calls.
    ///
    /// No other user of the channel gets a call in until the returned
    /// handle is dropped. An exclusively owned transport already has that
    /// guarantee and hands out itself. Shared transports override this to
    /// take their lock once for the whole sequence.
    async fn exclusive(
        &mut self,
    ) -> std::result::Result<Box<dyn RpcTransport + '_>, TransportError> {
        let this: Box<dyn RpcTransport + '_> = Box::new(self);
        Ok(this)
    }
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for &mut T {
    async fn call(
        &mut self,
        method: Method,
        payload: &[u8],
    ) -> std::result::Result<Vec<u8>, TransportError> {
        (**self).call(method, payload).await
    }

    async fn exclusive(
        &mut self,
    ) -> std::result::Result<Box<dyn RpcTransport + '_>, TransportError> {
        (**self).exclusive().await
    }
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for Box<T> {
    async fn call(
        &mut self,
        method: Method,
        payload: &[u8],
    ) -> std::result::Result<Vec<u8>, TransportError> {
        (**self).call(method, payload).await
    }

    async fn exclusive(
        &mut self,
    ) -> std::result::Result<Box<dyn RpcTransport + '_>, TransportError> {
        (**self).exclusive().await
    }
}

/// Interpret a write acknowledgement.
///
/// Acks are a single boolean byte, non-zero meaning the device accepted the
/// request.
pub(crate) fn check_ack(method: Method, reply: &[u8]) -> Result<()> {
    match reply {
        [0] => Err(Error::UpdateRejected { method }),
        [_] => Ok(()),
        _ => Err(Error::Protocol(format!(
            "{method}: expected 1-byte ack, got {} bytes",
            reply.len()
        ))),
    }
}

/// Interpret a little-endian u16 reply.
pub(crate) fn read_u16(method: Method, reply: &[u8]) -> Result<u16> {
    let bytes: [u8; 2] = reply.try_into().map_err(|_| {
        Error::Protocol(format!(
            "{method}: expected 2-byte reply, got {} bytes",
            reply.len()
        ))
    })?;
    Ok(u16::from_le_bytes(bytes))
}
