//! Transports that carry the RPC primitive.
//!
//! - [`I2cTransport`] adapts any [`crate::hw_trait::I2c`] bus.
//! - [`SharedTransport`] lets several owners use one transport, one request
//!   or one held sequence at a time.

mod i2c;
#[cfg(test)]
pub(crate) mod mock;

pub use i2c::I2cTransport;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time;

use crate::config::ProxyConfig;
use crate::error::TransportError;
use crate::rpc::{Method, RpcTransport};
use crate::tracing::prelude::*;

/// Cloneable handle to a transport guarded by a mutex.
///
/// The underlying link is half-duplex request/reply, so each call holds the
/// lock from request to reply. Boards sharing a bus each get a clone.
/// [`RpcTransport::exclusive`] holds the lock across a whole sequence of
/// calls, which [`crate::DeviceProxy`] uses for read-modify-write updates.
///
/// After a `Timeout("request/reply")` the exchange was abandoned partway and
/// the link state is undefined: the next request may read a stale reply.
pub struct SharedTransport<T> {
    inner: Arc<Mutex<T>>,
    lock_timeout: Duration,
    call_timeout: Duration,
}

impl<T> Clone for SharedTransport<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            lock_timeout: self.lock_timeout,
            call_timeout: self.call_timeout,
        }
    }
}

impl<T: RpcTransport> SharedTransport<T> {
    pub fn new(transport: T, config: &ProxyConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transport)),
            lock_timeout: config.lock_timeout(),
            call_timeout: config.call_timeout(),
        }
    }

    async fn lock(&self) -> Result<MutexGuard<'_, T>, TransportError> {
        // Acquire lock with timeout to prevent deadlocks
        time::timeout(self.lock_timeout, self.inner.lock())
            .await
            .map_err(|_| TransportError::Timeout("transport lock (possible deadlock)"))
    }
}

async fn timed_call<T: RpcTransport + ?Sized>(
    transport: &mut T,
    call_timeout: Duration,
    method: Method,
    payload: &[u8],
) -> Result<Vec<u8>, TransportError> {
    time::timeout(call_timeout, transport.call(method, payload))
        .await
        .map_err(|_| {
            warn!("{method} did not complete within {call_timeout:?}");
            TransportError::Timeout("request/reply")
        })?
}

#[async_trait]
impl<T: RpcTransport> RpcTransport for SharedTransport<T> {
    async fn call(&mut self, method: Method, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut inner = self.lock().await?;
        timed_call(&mut *inner, self.call_timeout, method, payload).await
    }

    async fn exclusive(&mut self) -> Result<Box<dyn RpcTransport + '_>, TransportError> {
        let call_timeout = self.call_timeout;
        let guard = self.lock().await?;
        let held: Box<dyn RpcTransport + '_> = Box::new(Held {
            guard,
            call_timeout,
        });
        Ok(held)
    }
}

/// Shared transport with its lock held.
struct Held<'a, T> {
    guard: MutexGuard<'a, T>,
    call_timeout: Duration,
}

#[async_trait]
impl<'a, T: RpcTransport> RpcTransport for Held<'a, T> {
    async fn call(&mut self, method: Method, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        timed_call(&mut *self.guard, self.call_timeout, method, payload).await
    }
}
