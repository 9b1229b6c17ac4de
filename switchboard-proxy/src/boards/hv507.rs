//! HV507 128-channel switching board.

use crate::rpc::Method;
use crate::schema::{DeviceSchema, FieldSpec, RecordSchema, ScalarType};

const CONFIG_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("serial_number", 0, ScalarType::U32),
    FieldSpec::new("baud_rate", 4, ScalarType::U32),
    FieldSpec::new("i2c_address", 8, ScalarType::U8),
    FieldSpec::new("min_waveform_frequency", 9, ScalarType::F32),
    FieldSpec::new("max_waveform_frequency", 13, ScalarType::F32),
];

// The boost converter voltage is set by `set_voltage`, not through the
// state record.
const STATE_FIELDS: &[FieldSpec] = &[FieldSpec::new("frequency", 0, ScalarType::F32)];

pub const SCHEMA: DeviceSchema = DeviceSchema {
    model: "hv507-switching-board",
    config: RecordSchema::new("config", CONFIG_FIELDS),
    state: RecordSchema::new("state", STATE_FIELDS),
    channel_count: Method::ChannelCount,
    voltage_command: Some(Method::SetVoltage),
    hardware_version: "0.1",
};
