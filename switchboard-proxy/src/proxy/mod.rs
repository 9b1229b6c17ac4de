//! Device proxy.
//!
//! [`DeviceProxy`] is the facade for one connected board. It combines the
//! board's [`DeviceSchema`], the record and channel codecs, and an
//! [`RpcTransport`]:
//!
//! - config reads and partial updates, optionally committed to EEPROM,
//! - state reads and partial updates, never committed,
//! - channel state reads and writes.
//!
//! Each operation is a complete request/reply sequence. It runs on one
//! [`RpcTransport::exclusive`] handle, so a read-modify-write cannot
//! interleave with another user of a shared transport. Nothing is retried
//! and nothing runs in the background.

mod accessors;

pub use accessors::FieldValue;

use crate::channels;
use crate::error::{Error, Result};
use crate::record::{validate_updates, Record, Value};
use crate::rpc::{check_ack, read_u16, Method, RpcTransport};
use crate::schema::{DeviceSchema, RecordSchema};
use crate::tracing::prelude::*;

/// Whether a config update is committed to nonvolatile storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Persistence {
    /// Update, then `save_config`
    #[default]
    Save,
    /// Update only. The change is active until the board power cycles or
    /// [`DeviceProxy::save_config`] commits it.
    Volatile,
}

/// Proxy for one board.
///
/// Operations take `&mut self`: the link is half-duplex request/reply, so a
/// proxy has a single owner at a time. To use a board from several tasks,
/// wrap the proxy in a mutex or give each owner its own proxy over a
/// [`crate::transport::SharedTransport`]. The shared transport's lock is
/// held for each whole operation.
pub struct DeviceProxy<T> {
    transport: T,
    schema: DeviceSchema,
    channel_count: usize,
    // Last records read or written. Advisory only: every read goes to the
    // device.
    config: Option<Record>,
    state: Option<Record>,
}

impl<T: RpcTransport> DeviceProxy<T> {
    /// Validate `schema` and fetch the board's channel count.
    pub async fn connect(transport: T, schema: DeviceSchema) -> Result<Self> {
        schema.validate()?;
        let mut proxy = Self {
            transport,
            schema,
            channel_count: 0,
            config: None,
            state: None,
        };
        let channel_count = proxy.channel_count().await?;
        debug!("Connected to {} with {} channels", schema.model, channel_count);
        Ok(proxy)
    }

    pub fn schema(&self) -> &DeviceSchema {
        &self.schema
    }

    /// Last config read from or written to the board.
    pub fn cached_config(&self) -> Option<&Record> {
        self.config.as_ref()
    }

    /// Last state read from or written to the board.
    pub fn cached_state(&self) -> Option<&Record> {
        self.state.as_ref()
    }

    /// Channel count as of `connect` or the last [`Self::channel_count`].
    pub fn known_channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    // Config

    /// Fetch and decode the board's active config.
    pub async fn read_config(&mut self) -> Result<Record> {
        let mut link = self.transport.exclusive().await?;
        let record = fetch(&mut *link, Method::SerializeConfig, self.schema.config).await?;
        self.config = Some(record.clone());
        Ok(record)
    }

    /// Change the named config fields and leave every other field as the
    /// board currently has it.
    ///
    /// Nothing is sent unless every field exists and has the right type.
    /// With [`Persistence::Save`], a failure of the save step after the
    /// board accepted the update is reported as [`Error::NotPersisted`].
    pub async fn update_config(
        &mut self,
        fields: &[(&str, Value)],
        persistence: Persistence,
    ) -> Result<()> {
        validate_updates(&self.schema.config, fields)?;
        let mut link = self.transport.exclusive().await?;
        let current = fetch(&mut *link, Method::SerializeConfig, self.schema.config).await?;
        self.config = Some(current.clone());
        let merged = push(&mut *link, Method::UpdateConfig, &current, fields).await?;
        debug!("{} config updated: {}", self.schema.model, field_names(fields));
        self.config = Some(merged);

        if persistence == Persistence::Save {
            save(&mut *link)
                .await
                .map_err(|e| Error::NotPersisted(Box::new(e)))?;
            debug!("{} config saved", self.schema.model);
        }
        Ok(())
    }

    /// Commit the board's active config to EEPROM.
    pub async fn save_config(&mut self) -> Result<()> {
        let mut link = self.transport.exclusive().await?;
        save(&mut *link).await?;
        debug!("{} config saved", self.schema.model);
        Ok(())
    }

    // State

    /// Fetch and decode the board's runtime state.
    pub async fn read_state(&mut self) -> Result<Record> {
        let mut link = self.transport.exclusive().await?;
        let record = fetch(&mut *link, Method::SerializeState, self.schema.state).await?;
        self.state = Some(record.clone());
        Ok(record)
    }

    /// Change the named state fields. State is runtime-only and is never
    /// saved.
    pub async fn update_state(&mut self, fields: &[(&str, Value)]) -> Result<()> {
        validate_updates(&self.schema.state, fields)?;
        let mut link = self.transport.exclusive().await?;
        let current = fetch(&mut *link, Method::SerializeState, self.schema.state).await?;
        self.state = Some(current.clone());
        let merged = push(&mut *link, Method::UpdateState, &current, fields).await?;
        debug!("{} state updated: {}", self.schema.model, field_names(fields));
        self.state = Some(merged);
        Ok(())
    }

    // Channels

    /// Ask the board how many channels it has.
    pub async fn channel_count(&mut self) -> Result<usize> {
        let mut link = self.transport.exclusive().await?;
        self.channel_count = fetch_channel_count(&mut *link, self.schema.channel_count).await?;
        Ok(self.channel_count)
    }

    /// One entry per channel, index = channel number.
    pub async fn get_channel_states(&mut self) -> Result<Vec<bool>> {
        let mut link = self.transport.exclusive().await?;
        let states = fetch_channel_states(&mut *link, self.schema.channel_count).await?;
        self.channel_count = states.len();
        Ok(states)
    }

    /// Set every channel at once.
    ///
    /// `states` must have exactly one entry per channel; otherwise nothing
    /// is sent.
    pub async fn set_channel_states(&mut self, states: &[bool]) -> Result<()> {
        check_channel_count(self.channel_count, states)?;
        let mut link = self.transport.exclusive().await?;
        write_channel_states(&mut *link, states).await
    }

    /// Switch one channel, leaving the others as they are.
    pub async fn set_channel(&mut self, index: usize, on: bool) -> Result<()> {
        if index >= self.channel_count {
            return Err(Error::ChannelIndex {
                index,
                channel_count: self.channel_count,
            });
        }
        let mut link = self.transport.exclusive().await?;
        let mut states = fetch_channel_states(&mut *link, self.schema.channel_count).await?;
        self.channel_count = states.len();
        // The count may have changed on re-read.
        let slot = states.get_mut(index).ok_or(Error::ChannelIndex {
            index,
            channel_count: self.channel_count,
        })?;
        *slot = on;
        write_channel_states(&mut *link, &states).await
    }

    pub async fn set_all_channels(&mut self, on: bool) -> Result<()> {
        let states = vec![on; self.channel_count];
        self.set_channel_states(&states).await
    }

    // Boost converter

    /// Set the raw boost converter level on boards that program it with a
    /// dedicated command instead of a state field.
    pub async fn set_boost_voltage(&mut self, level: u8) -> Result<()> {
        let method = self.schema.voltage_command.ok_or(Error::Unsupported {
            model: self.schema.model,
            operation: "set_boost_voltage",
        })?;
        let mut link = self.transport.exclusive().await?;
        call_ack(&mut *link, method, &[level]).await?;
        debug!("{} boost converter level {level}", self.schema.model);
        Ok(())
    }
}

async fn call(link: &mut dyn RpcTransport, method: Method, payload: &[u8]) -> Result<Vec<u8>> {
    trace!("{method} <- [{}]", hex::encode(payload));
    let reply = link.call(method, payload).await.map_err(|e| {
        warn!("{method} failed: {e}");
        Error::from(e)
    })?;
    trace!("{method} -> [{}]", hex::encode(&reply));
    Ok(reply)
}

async fn call_ack(link: &mut dyn RpcTransport, method: Method, payload: &[u8]) -> Result<()> {
    let reply = call(link, method, payload).await?;
    check_ack(method, &reply).inspect_err(|e| warn!("{e}"))
}

async fn fetch(link: &mut dyn RpcTransport, method: Method, schema: RecordSchema) -> Result<Record> {
    let reply = call(link, method, &[]).await?;
    Record::decode(&reply, schema)
}

async fn push(
    link: &mut dyn RpcTransport,
    method: Method,
    current: &Record,
    fields: &[(&str, Value)],
) -> Result<Record> {
    let merged = current.merge(fields)?;
    call_ack(link, method, &merged.encode()).await?;
    Ok(merged)
}

async fn save(link: &mut dyn RpcTransport) -> Result<()> {
    call_ack(link, Method::SaveConfig, &[]).await
}

async fn fetch_channel_count(link: &mut dyn RpcTransport, method: Method) -> Result<usize> {
    let reply = call(link, method, &[]).await?;
    Ok(usize::from(read_u16(method, &reply)?))
}

async fn fetch_channel_states(link: &mut dyn RpcTransport, count_method: Method) -> Result<Vec<bool>> {
    let channel_count = fetch_channel_count(link, count_method).await?;
    let reply = call(link, Method::StateOfChannels, &[]).await?;
    channels::unpack(&reply, channel_count)
}

fn check_channel_count(channel_count: usize, states: &[bool]) -> Result<()> {
    if states.len() != channel_count {
        return Err(Error::ChannelCountMismatch {
            expected: channel_count,
            actual: states.len(),
        });
    }
    Ok(())
}

async fn write_channel_states(link: &mut dyn RpcTransport, states: &[bool]) -> Result<()> {
    call_ack(link, Method::SetStateOfChannels, &channels::pack(states)).await?;
    debug!(
        "{} channels set, {} on",
        states.len(),
        states.iter().filter(|&&on| on).count()
    );
    Ok(())
}

fn field_names(fields: &[(&str, Value)]) -> String {
    let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    names.join(", ")
}
