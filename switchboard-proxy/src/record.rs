//! Schema-driven record codec.
//!
//! Config and state records share one representation, [`Record`]: a schema
//! plus one typed [`Value`] per field. Records are decoded from the flat
//! buffer the device serializes, merged with partial updates, and encoded
//! back into a buffer of exactly [`RecordSchema::width`] bytes.

use std::fmt;

use crate::error::{Error, Result};
use crate::schema::{FieldSpec, RecordSchema, ScalarType};

/// Typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    I32(i32),
    F32(f32),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Value::Bool(_) => ScalarType::Bool,
            Value::U8(_) => ScalarType::U8,
            Value::U16(_) => ScalarType::U16,
            Value::U32(_) => ScalarType::U32,
            Value::I32(_) => ScalarType::I32,
            Value::F32(_) => ScalarType::F32,
            Value::Bytes(bytes) => ScalarType::Bytes(bytes.len()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Value::U8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Value::U16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    fn decode(ty: ScalarType, raw: &[u8]) -> Self {
        // `raw` is exactly `ty.width()` bytes; the caller slices it.
        let word = |raw: &[u8]| [raw[0], raw[1], raw[2], raw[3]];
        match ty {
            ScalarType::Bool => Value::Bool(raw[0] != 0),
            ScalarType::U8 => Value::U8(raw[0]),
            ScalarType::U16 => Value::U16(u16::from_le_bytes([raw[0], raw[1]])),
            ScalarType::U32 => Value::U32(u32::from_le_bytes(word(raw))),
            ScalarType::I32 => Value::I32(i32::from_le_bytes(word(raw))),
            ScalarType::F32 => Value::F32(f32::from_le_bytes(word(raw))),
            ScalarType::Bytes(_) => Value::Bytes(raw.to_vec()),
        }
    }

    fn encode_into(&self, dst: &mut [u8]) {
        match self {
            Value::Bool(v) => dst[0] = u8::from(*v),
            Value::U8(v) => dst[0] = *v,
            Value::U16(v) => dst.copy_from_slice(&v.to_le_bytes()),
            Value::U32(v) => dst.copy_from_slice(&v.to_le_bytes()),
            Value::I32(v) => dst.copy_from_slice(&v.to_le_bytes()),
            Value::F32(v) => dst.copy_from_slice(&v.to_le_bytes()),
            Value::Bytes(v) => dst.copy_from_slice(v),
        }
    }

    fn zero(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Bool => Value::Bool(false),
            ScalarType::U8 => Value::U8(0),
            ScalarType::U16 => Value::U16(0),
            ScalarType::U32 => Value::U32(0),
            ScalarType::I32 => Value::I32(0),
            ScalarType::F32 => Value::F32(0.0),
            ScalarType::Bytes(len) => Value::Bytes(vec![0; len]),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::Bytes(v) => write!(f, "{}", hex::encode(v)),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

/// A decoded config or state record.
///
/// Every value matches the scalar type of its field, so encoding cannot
/// fail.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: RecordSchema,
    values: Vec<Value>,
}

impl Record {
    /// Record with every field zeroed.
    pub fn zeroed(schema: RecordSchema) -> Self {
        let values = schema.fields.iter().map(|f| Value::zero(f.ty)).collect();
        Self { schema, values }
    }

    /// Decode a record from the buffer the device serialized.
    ///
    /// Bytes past the schema width are ignored.
    pub fn decode(buffer: &[u8], schema: RecordSchema) -> Result<Self> {
        let expected = schema.width();
        if buffer.len() < expected {
            return Err(Error::MalformedRecord {
                record: schema.name,
                expected,
                actual: buffer.len(),
            });
        }

        let values = schema
            .fields
            .iter()
            .map(|field| Value::decode(field.ty, &buffer[field.offset..field.end()]))
            .collect();
        Ok(Self { schema, values })
    }

    /// Encode into a buffer of exactly `schema.width()` bytes. Gaps between
    /// fields are zero.
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; self.schema.width()];
        for (field, value) in self.schema.fields.iter().zip(&self.values) {
            value.encode_into(&mut buffer[field.offset..field.end()]);
        }
        buffer
    }

    /// New record equal to this one except for the fields named in
    /// `updates`. A field named more than once takes its last value.
    ///
    /// Fails without producing a record if any name is unknown or any value
    /// has the wrong type.
    pub fn merge(&self, updates: &[(&str, Value)]) -> Result<Self> {
        let mut merged = self.clone();
        for (name, value) in updates {
            let index = checked_index(&self.schema, name, value)?;
            merged.values[index] = value.clone();
        }
        Ok(merged)
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.index_of(name).map(|index| &self.values[index])
    }

    /// Field specs paired with their values, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldSpec, &Value)> {
        self.schema.fields.iter().zip(&self.values)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.schema.name)?;
        for (i, (field, value)) in self.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{}: {value}", field.name)?;
        }
        write!(f, " }}")
    }
}

/// Check a set of updates against a schema without touching any record.
pub fn validate_updates(schema: &RecordSchema, updates: &[(&str, Value)]) -> Result<()> {
    for (name, value) in updates {
        checked_index(schema, name, value)?;
    }
    Ok(())
}

fn checked_index(schema: &RecordSchema, name: &str, value: &Value) -> Result<usize> {
    let index = schema.index_of(name).ok_or_else(|| Error::UnknownField {
        record: schema.name,
        field: name.to_string(),
    })?;
    let expected = schema.fields[index].ty;
    let actual = value.scalar_type();
    if expected != actual {
        return Err(Error::FieldType {
            field: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::new("serial_number", 0, ScalarType::U32),
        FieldSpec::new("baud_rate", 4, ScalarType::U32),
        FieldSpec::new("i2c_address", 8, ScalarType::U8),
        FieldSpec::new("offset_trim", 9, ScalarType::I32),
        FieldSpec::new("frequency", 13, ScalarType::F32),
        FieldSpec::new("word", 17, ScalarType::U16),
        FieldSpec::new("enabled", 19, ScalarType::Bool),
        FieldSpec::new("uuid", 24, ScalarType::Bytes(4)),
    ];
    const SCHEMA: RecordSchema = RecordSchema::new("config", FIELDS);

    fn sample_buffer() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1234u32.to_le_bytes());
        buf.extend_from_slice(&115_200u32.to_le_bytes());
        buf.push(0x20);
        buf.extend_from_slice(&(-5i32).to_le_bytes());
        buf.extend_from_slice(&1000.5f32.to_le_bytes());
        buf.extend_from_slice(&0xBEEFu16.to_le_bytes());
        buf.push(1);
        buf.extend_from_slice(&[0; 4]); // gap 20..24
        buf.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        buf
    }

    #[test]
    fn test_decode_every_scalar_type() {
        let record = Record::decode(&sample_buffer(), SCHEMA).unwrap();
        assert_eq!(record.get("serial_number"), Some(&Value::U32(1234)));
        assert_eq!(record.get("baud_rate"), Some(&Value::U32(115_200)));
        assert_eq!(record.get("i2c_address"), Some(&Value::U8(0x20)));
        assert_eq!(record.get("offset_trim"), Some(&Value::I32(-5)));
        assert_eq!(record.get("frequency"), Some(&Value::F32(1000.5)));
        assert_eq!(record.get("word"), Some(&Value::U16(0xBEEF)));
        assert_eq!(record.get("enabled"), Some(&Value::Bool(true)));
        assert_eq!(
            record.get("uuid"),
            Some(&Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]))
        );
    }

    #[test]
    fn test_encode_reproduces_device_buffer() {
        let buffer = sample_buffer();
        let record = Record::decode(&buffer, SCHEMA).unwrap();
        assert_eq!(record.encode(), buffer);
    }

    #[test]
    fn test_nonzero_bool_byte_is_true() {
        let mut buffer = sample_buffer();
        buffer[19] = 0x7F;
        let record = Record::decode(&buffer, SCHEMA).unwrap();
        assert_eq!(record.get("enabled").and_then(Value::as_bool), Some(true));
        // Re-encoding normalizes to 1.
        assert_eq!(record.encode()[19], 1);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut buffer = sample_buffer();
        buffer.extend_from_slice(&[0xAA, 0xBB]);
        let record = Record::decode(&buffer, SCHEMA).unwrap();
        assert_eq!(record.encode(), sample_buffer());
    }

    #[test_case(2 ; "two bytes short")]
    #[test_case(1 ; "one byte short")]
    #[test_case(28 ; "empty")]
    fn test_short_buffer_is_malformed(short_by: usize) {
        let buffer = sample_buffer();
        let truncated = &buffer[..buffer.len() - short_by];
        match Record::decode(truncated, SCHEMA) {
            Err(Error::MalformedRecord { record, expected, actual }) => {
                assert_eq!(record, "config");
                assert_eq!(expected, 28);
                assert_eq!(actual, 28 - short_by);
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_changes_only_named_fields() {
        let record = Record::decode(&sample_buffer(), SCHEMA).unwrap();
        let merged = record
            .merge(&[("baud_rate", 57_600u32.into()), ("enabled", false.into())])
            .unwrap();

        for (field, value) in merged.iter() {
            match field.name {
                "baud_rate" => assert_eq!(value, &Value::U32(57_600)),
                "enabled" => assert_eq!(value, &Value::Bool(false)),
                name => assert_eq!(Some(value), record.get(name), "field {name}"),
            }
        }
        // Original untouched.
        assert_eq!(record.get("baud_rate"), Some(&Value::U32(115_200)));
    }

    #[test]
    fn test_merge_empty_update_is_identity() {
        let record = Record::decode(&sample_buffer(), SCHEMA).unwrap();
        assert_eq!(record.merge(&[]).unwrap(), record);
    }

    #[test]
    fn test_merge_last_assignment_wins() {
        let record = Record::zeroed(SCHEMA);
        let merged = record
            .merge(&[("i2c_address", 0x10u8.into()), ("i2c_address", 0x11u8.into())])
            .unwrap();
        assert_eq!(merged.get("i2c_address"), Some(&Value::U8(0x11)));
    }

    #[test]
    fn test_merge_unknown_field_applies_nothing() {
        let record = Record::zeroed(SCHEMA);
        let err = record
            .merge(&[("baud_rate", 9600u32.into()), ("port", 3u8.into())])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownField { record: "config", ref field } if field == "port"
        ));
    }

    #[test]
    fn test_merge_wrong_type_rejected() {
        let record = Record::zeroed(SCHEMA);
        let err = record.merge(&[("baud_rate", 9600u16.into())]).unwrap_err();
        assert!(matches!(
            err,
            Error::FieldType {
                expected: ScalarType::U32,
                actual: ScalarType::U16,
                ..
            }
        ));
    }

    #[test]
    fn test_merge_wrong_identifier_length_rejected() {
        let record = Record::zeroed(SCHEMA);
        let err = record
            .merge(&[("uuid", vec![1u8, 2, 3].into())])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::FieldType {
                expected: ScalarType::Bytes(4),
                actual: ScalarType::Bytes(3),
                ..
            }
        ));
    }

    #[test]
    fn test_zeroed_encodes_to_zero_buffer() {
        assert_eq!(Record::zeroed(SCHEMA).encode(), vec![0u8; 28]);
    }

    #[test]
    fn test_display() {
        const SMALL: &[FieldSpec] = &[
            FieldSpec::new("frequency", 0, ScalarType::F32),
            FieldSpec::new("output_enabled", 4, ScalarType::Bool),
        ];
        let record = Record::zeroed(RecordSchema::new("state", SMALL))
            .merge(&[("frequency", 100.0f32.into())])
            .unwrap();
        assert_eq!(
            record.to_string(),
            "state { frequency: 100, output_enabled: false }"
        );
    }
}
