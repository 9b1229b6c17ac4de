//! RPC over an I2C bus.
//!
//! A request is written as the method id followed by the payload, and the
//! reply length byte is read back with a repeated start. The reply data is
//! then read in a second transaction, like an SMBus block read.

use async_trait::async_trait;

use crate::config::ProxyConfig;
use crate::error::{Error, Result, TransportError};
use crate::hw_trait::I2c;
use crate::rpc::{Method, RpcTransport};
use crate::tracing::prelude::*;

/// RPC transport for one board on an I2C bus.
pub struct I2cTransport<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cTransport<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Use the board address from `config`.
    pub fn from_config(i2c: I2C, config: &ProxyConfig) -> Result<Self> {
        let address = config
            .i2c_address
            .ok_or_else(|| Error::Config("I2C transport needs an i2c_address".into()))?;
        Ok(Self::new(i2c, address))
    }

    pub fn address(&self) -> u8 {
        self.address
    }
}

#[async_trait]
impl<I2C: I2c> RpcTransport for I2cTransport<I2C> {
    async fn call(
        &mut self,
        method: Method,
        payload: &[u8],
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let mut request = Vec::with_capacity(payload.len() + 1);
        request.push(method.id());
        request.extend_from_slice(payload);
        trace!(
            "i2c {:#04x} <- {method} [{}]",
            self.address,
            hex::encode(&request)
        );
        let mut length = [0u8; 1];
        self.i2c
            .write_read(self.address, &request, &mut length)
            .await?;
        let mut reply = vec![0u8; usize::from(length[0])];
        if !reply.is_empty() {
            self.i2c.read(self.address, &mut reply).await?;
        }
        trace!(
            "i2c {:#04x} -> {method} [{}]",
            self.address,
            hex::encode(&reply)
        );
        Ok(reply)
    }
}
