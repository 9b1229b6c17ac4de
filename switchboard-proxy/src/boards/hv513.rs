//! HV513 waveform board.
//!
//! The HV513 drives 8 channels itself and discovers PCA9505 switching boards
//! (40 channels each) at consecutive I2C addresses starting from
//! `switching_board_i2c_address` when it boots. The channel count is
//! therefore only known to the firmware and is reported through
//! `number_of_channels`.

use crate::rpc::Method;
use crate::schema::{DeviceSchema, FieldSpec, RecordSchema, ScalarType};

const CONFIG_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("serial_number", 0, ScalarType::U32),
    FieldSpec::new("baud_rate", 4, ScalarType::U32),
    FieldSpec::new("i2c_address", 8, ScalarType::U8),
    FieldSpec::new("switching_board_i2c_address", 9, ScalarType::U8),
    FieldSpec::new("min_waveform_frequency", 10, ScalarType::F32),
    FieldSpec::new("max_waveform_frequency", 14, ScalarType::F32),
    FieldSpec::new("max_waveform_voltage", 18, ScalarType::F32),
];

const STATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("frequency", 0, ScalarType::F32),
    FieldSpec::new("voltage", 4, ScalarType::F32),
    FieldSpec::new("output_enabled", 8, ScalarType::Bool),
];

pub const SCHEMA: DeviceSchema = DeviceSchema {
    model: "hv513-board",
    config: RecordSchema::new("config", CONFIG_FIELDS),
    state: RecordSchema::new("state", STATE_FIELDS),
    channel_count: Method::NumberOfChannels,
    voltage_command: None,
    hardware_version: "0.1",
};
