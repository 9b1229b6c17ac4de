//! Record layouts.
//!
//! A [`RecordSchema`] lists the fields of a flat, little-endian record: name,
//! byte offset and scalar type. Schemas are plain `const` data so that each
//! board model can declare its layout once (see [`crate::boards`]) and share
//! the same codec.

use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};
use crate::rpc::Method;

/// Scalar field types. Multi-byte values are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// One byte, non-zero is true
    Bool,
    U8,
    U16,
    U32,
    I32,
    /// IEEE-754 single precision
    F32,
    /// Fixed-size identifier of the given length
    Bytes(usize),
}

impl ScalarType {
    /// Encoded width in bytes.
    pub const fn width(self) -> usize {
        match self {
            ScalarType::Bool | ScalarType::U8 => 1,
            ScalarType::U16 => 2,
            ScalarType::U32 | ScalarType::I32 | ScalarType::F32 => 4,
            ScalarType::Bytes(len) => len,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Bool => write!(f, "bool"),
            ScalarType::U8 => write!(f, "u8"),
            ScalarType::U16 => write!(f, "u16"),
            ScalarType::U32 => write!(f, "u32"),
            ScalarType::I32 => write!(f, "i32"),
            ScalarType::F32 => write!(f, "f32"),
            ScalarType::Bytes(len) => write!(f, "bytes[{len}]"),
        }
    }
}

/// One named field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub ty: ScalarType,
}

impl FieldSpec {
    pub const fn new(name: &'static str, offset: usize, ty: ScalarType) -> Self {
        Self { name, offset, ty }
    }

    /// Offset one past the last byte of the field.
    pub const fn end(&self) -> usize {
        self.offset + self.ty.width()
    }
}

/// Layout of one record type (config or state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    /// Record name used in errors and logs, e.g. `"config"`
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl RecordSchema {
    pub const fn new(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self { name, fields }
    }

    /// Total encoded width: the end of the furthest field.
    pub fn width(&self) -> usize {
        self.fields.iter().map(FieldSpec::end).max().unwrap_or(0)
    }

    /// Position of the named field in [`RecordSchema::fields`].
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Check that field names are unique and field byte ranges do not
    /// overlap.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for field in self.fields {
            if !names.insert(field.name) {
                return Err(Error::Schema(format!(
                    "{}: duplicate field `{}`",
                    self.name, field.name
                )));
            }
        }

        let mut by_offset: Vec<&FieldSpec> = self.fields.iter().collect();
        by_offset.sort_by_key(|field| field.offset);
        for pair in by_offset.windows(2) {
            if pair[0].end() > pair[1].offset {
                return Err(Error::Schema(format!(
                    "{}: field `{}` overlaps `{}`",
                    self.name, pair[0].name, pair[1].name
                )));
            }
        }
        Ok(())
    }
}

/// Everything the proxy needs to know about one board model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSchema {
    pub model: &'static str,
    pub config: RecordSchema,
    pub state: RecordSchema,
    /// Remote method that reports the number of channels
    pub channel_count: Method,
    /// Remote method that programs the boost converter, on boards where the
    /// output voltage is not part of the state record
    pub voltage_command: Option<Method>,
    /// Placeholder until boards report their hardware revision remotely
    pub hardware_version: &'static str,
}

impl DeviceSchema {
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        self.state.validate()
    }
}
