//! In-memory board used by tests.
//!
//! Behaves like the firmware side of the RPC methods: config and state are
//! byte buffers the device serializes and overwrites, `save_config` copies
//! the active config to a separate EEPROM buffer, and channel writes of the
//! wrong length are refused. Every call is logged so tests can assert on
//! bus traffic.
//!
//! Each exchange yields to the scheduler first, like a real link waiting on
//! the bus, so concurrent callers interleave between calls.

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use crate::channels::packed_len;
use crate::error::TransportError;
use crate::record::Record;
use crate::rpc::{Method, RpcTransport};
use crate::schema::DeviceSchema;

#[derive(Debug, Default)]
pub(crate) struct DeviceMemory {
    pub config: Vec<u8>,
    pub eeprom: Vec<u8>,
    pub state: Vec<u8>,
    pub channels: Vec<u8>,
    pub channel_count: u16,
    /// Last level written with `set_voltage`
    pub boost_voltage: Option<u8>,
    pub calls: Vec<(Method, Vec<u8>)>,
    /// Methods answered with a negative ack
    pub reject: HashSet<Method>,
    /// Methods that fail at the transport level
    pub fail: HashSet<Method>,
}

/// Cloneable handle; one clone goes into the proxy, the test keeps another.
#[derive(Clone, Default)]
pub(crate) struct MockDevice {
    memory: Arc<Mutex<DeviceMemory>>,
}

impl MockDevice {
    /// Board with zeroed records, all channels off.
    pub fn new(schema: &DeviceSchema, channel_count: u16) -> Self {
        let config = Record::zeroed(schema.config).encode();
        let device = Self::default();
        {
            let mut memory = device.memory();
            memory.eeprom = config.clone();
            memory.config = config;
            memory.state = Record::zeroed(schema.state).encode();
            memory.channels = vec![0; packed_len(usize::from(channel_count))];
            memory.channel_count = channel_count;
        }
        device
    }

    pub fn memory(&self) -> MutexGuard<'_, DeviceMemory> {
        self.memory.lock()
    }

    /// Methods called so far, in order.
    pub fn methods(&self) -> Vec<Method> {
        self.memory().calls.iter().map(|(method, _)| *method).collect()
    }

    pub fn clear_calls(&self) {
        self.memory().calls.clear();
    }

    pub fn reject(&self, method: Method) {
        self.memory().reject.insert(method);
    }

    pub fn fail(&self, method: Method) {
        self.memory().fail.insert(method);
    }
}

fn ack(accepted: bool) -> Vec<u8> {
    vec![u8::from(accepted)]
}

#[async_trait]
impl RpcTransport for MockDevice {
    async fn call(&mut self, method: Method, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        tokio::task::yield_now().await;
        let mut memory = self.memory();
        memory.calls.push((method, payload.to_vec()));
        if memory.fail.contains(&method) {
            return Err(TransportError::Io(io::Error::other(format!(
                "{method}: link dropped"
            ))));
        }
        let accepted = !memory.reject.contains(&method);

        let reply = match method {
            Method::SerializeConfig => memory.config.clone(),
            Method::UpdateConfig => {
                if accepted {
                    memory.config = payload.to_vec();
                }
                ack(accepted)
            }
            Method::SaveConfig => {
                if accepted {
                    memory.eeprom = memory.config.clone();
                }
                ack(accepted)
            }
            Method::SerializeState => memory.state.clone(),
            Method::UpdateState => {
                if accepted {
                    memory.state = payload.to_vec();
                }
                ack(accepted)
            }
            Method::ChannelCount | Method::NumberOfChannels => {
                memory.channel_count.to_le_bytes().to_vec()
            }
            Method::StateOfChannels => memory.channels.clone(),
            Method::SetVoltage => {
                let fits = payload.len() == 1;
                if accepted && fits {
                    memory.boost_voltage = Some(payload[0]);
                }
                ack(accepted && fits)
            }
            Method::SetStateOfChannels => {
                let fits = payload.len() == packed_len(usize::from(memory.channel_count));
                if accepted && fits {
                    memory.channels = payload.to_vec();
                }
                ack(accepted && fits)
            }
        };
        Ok(reply)
    }
}
