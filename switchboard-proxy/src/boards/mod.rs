//! Schemas of the supported boards.
//!
//! Each board module declares its config and state layout once as `const`
//! data. All boards share the base config fields (`serial_number`,
//! `baud_rate`, `i2c_address`) at the same offsets, so the named accessors on
//! [`crate::DeviceProxy`] work for every model.

pub mod hv507;
pub mod hv513;

use crate::schema::DeviceSchema;

/// Known boards, by package model name.
pub static BOARDS: &[&DeviceSchema] = &[&hv507::SCHEMA, &hv513::SCHEMA];

/// Find the schema for a model name such as `"hv513-board"`.
///
/// Underscores and dashes are treated alike.
pub fn find_by_model(model: &str) -> Option<&'static DeviceSchema> {
    let wanted = model.replace('_', "-");
    BOARDS.iter().copied().find(|schema| schema.model == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::Method;
    use crate::schema::ScalarType;

    #[test]
    fn test_all_board_schemas_are_valid() {
        for schema in BOARDS {
            schema.validate().unwrap();
        }
    }

    #[test]
    fn test_base_fields_shared() {
        for schema in BOARDS {
            for (name, offset, ty) in [
                ("serial_number", 0, ScalarType::U32),
                ("baud_rate", 4, ScalarType::U32),
                ("i2c_address", 8, ScalarType::U8),
            ] {
                let field = schema.config.field(name).unwrap();
                assert_eq!((field.offset, field.ty), (offset, ty), "{} {name}", schema.model);
            }
        }
    }

    #[test]
    fn test_find_by_model() {
        assert_eq!(find_by_model("hv513-board"), Some(&hv513::SCHEMA));
        assert_eq!(find_by_model("hv507_switching_board"), Some(&hv507::SCHEMA));
        assert!(find_by_model("dmf-control-board").is_none());
    }

    #[test]
    fn test_channel_count_methods() {
        assert_eq!(hv507::SCHEMA.channel_count, Method::ChannelCount);
        assert_eq!(hv513::SCHEMA.channel_count, Method::NumberOfChannels);
    }

    #[test]
    fn test_only_hv507_has_boost_voltage_command() {
        assert_eq!(hv507::SCHEMA.voltage_command, Some(Method::SetVoltage));
        assert_eq!(hv513::SCHEMA.voltage_command, None);
    }
}
