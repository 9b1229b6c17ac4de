//! Typed field access by name.
//!
//! The generic [`DeviceProxy::config_field`] and [`DeviceProxy::state_field`]
//! work for any board. The named getters and setters cover the fields the
//! shipped boards define. Calling one on a board without that field returns
//! [`Error::UnknownField`].

use super::{DeviceProxy, Persistence};
use crate::error::{Error, Result};
use crate::record::{Record, Value};
use crate::rpc::RpcTransport;
use crate::schema::ScalarType;

/// Rust type stored in a scalar record field.
pub trait FieldValue: Sized + Into<Value> {
    const TYPE: ScalarType;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! field_value {
    ($ty:ty, $scalar:ident, $as:ident) => {
        impl FieldValue for $ty {
            const TYPE: ScalarType = ScalarType::$scalar;

            fn from_value(value: &Value) -> Option<Self> {
                value.$as()
            }
        }
    };
}

field_value!(bool, Bool, as_bool);
field_value!(u8, U8, as_u8);
field_value!(u16, U16, as_u16);
field_value!(u32, U32, as_u32);
field_value!(i32, I32, as_i32);
field_value!(f32, F32, as_f32);

fn field<V: FieldValue>(record: &Record, name: &str) -> Result<V> {
    let schema = record.schema();
    let spec = schema.field(name).ok_or_else(|| Error::UnknownField {
        record: schema.name,
        field: name.to_string(),
    })?;
    record
        .get(name)
        .and_then(V::from_value)
        .ok_or_else(|| Error::FieldType {
            field: name.to_string(),
            expected: V::TYPE,
            actual: spec.ty,
        })
}

macro_rules! config_accessors {
    ($($get:ident, $set:ident: $ty:ty;)*) => {
        $(
            pub async fn $get(&mut self) -> Result<$ty> {
                self.config_field(stringify!($get)).await
            }

            /// Update and save.
            pub async fn $set(&mut self, value: $ty) -> Result<()> {
                self.update_config(&[(stringify!($get), value.into())], Persistence::Save)
                    .await
            }
        )*
    };
}

macro_rules! state_accessors {
    ($($get:ident, $set:ident: $ty:ty;)*) => {
        $(
            pub async fn $get(&mut self) -> Result<$ty> {
                self.state_field(stringify!($get)).await
            }

            pub async fn $set(&mut self, value: $ty) -> Result<()> {
                self.update_state(&[(stringify!($get), value.into())]).await
            }
        )*
    };
}

impl<T: RpcTransport> DeviceProxy<T> {
    /// Read the config and return one field.
    pub async fn config_field<V: FieldValue>(&mut self, name: &str) -> Result<V> {
        let config = self.read_config().await?;
        field(&config, name)
    }

    /// Read the state and return one field.
    pub async fn state_field<V: FieldValue>(&mut self, name: &str) -> Result<V> {
        let state = self.read_state().await?;
        field(&state, name)
    }

    pub fn hardware_version(&self) -> &'static str {
        self.schema.hardware_version
    }

    config_accessors! {
        serial_number, set_serial_number: u32;
        baud_rate, set_baud_rate: u32;
        i2c_address, set_i2c_address: u8;
        switching_board_i2c_address, set_switching_board_i2c_address: u8;
        min_waveform_frequency, set_min_waveform_frequency: f32;
        max_waveform_frequency, set_max_waveform_frequency: f32;
        max_waveform_voltage, set_max_waveform_voltage: f32;
    }

    state_accessors! {
        frequency, set_frequency: f32;
        voltage, set_voltage: f32;
        output_enabled, set_output_enabled: bool;
    }
}
