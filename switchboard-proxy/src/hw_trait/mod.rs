//! Hardware abstraction layer traits.
//!
//! Transports are built on small capability traits so the same RPC adapter
//! works whether the bus is a Linux i2c-dev node, a USB bridge, or a bus
//! tunneled through another board.

use async_trait::async_trait;

use crate::error::TransportError;

/// Controller side of an I2C bus.
#[async_trait]
pub trait I2c: Send {
    /// Write `bytes` to the device at `address` in one transaction.
    async fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), TransportError>;

    /// Fill `buffer` from the device at `address` in one transaction.
    async fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), TransportError>;

    /// Write then read with a repeated start.
    async fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), TransportError>;
}
