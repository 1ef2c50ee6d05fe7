//! Scalar values exchanged between field descriptors and record accessors.

use std::sync::Arc;

use bytes::Bytes;

use crate::{DataType, error::ValueTypeError};

/// Decoded scalar field value.
/// Variants map one-to-one onto scalar [`DataType`] families; no lossy conversions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Bytes(Bytes),
    String(Arc<str>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::String(Arc::from(s.as_ref()))
    }

    pub fn try_u8(&self) -> Result<u8, ValueTypeError> {
        match self {
            Value::U8(v) => Ok(*v),
            _ => Err(self.type_mismatch("U8")),
        }
    }

    pub fn try_u16(&self) -> Result<u16, ValueTypeError> {
        match self {
            Value::U16(v) => Ok(*v),
            _ => Err(self.type_mismatch("U16")),
        }
    }

    pub fn try_u32(&self) -> Result<u32, ValueTypeError> {
        match self {
            Value::U32(v) => Ok(*v),
            _ => Err(self.type_mismatch("U32")),
        }
    }

    pub fn try_u64(&self) -> Result<u64, ValueTypeError> {
        match self {
            Value::U64(v) => Ok(*v),
            _ => Err(self.type_mismatch("U64")),
        }
    }

    pub fn try_str(&self) -> Result<&str, ValueTypeError> {
        match self {
            Value::String(v) => Ok(v.as_ref()),
            _ => Err(self.type_mismatch("String")),
        }
    }

    pub fn try_bytes(&self) -> Result<&[u8], ValueTypeError> {
        match self {
            Value::Bytes(v) => Ok(v.as_ref()),
            _ => Err(self.type_mismatch("Bytes")),
        }
    }

    pub fn type_mismatch(&self, expected: impl Into<String>) -> ValueTypeError {
        ValueTypeError::new(expected, self.variant_name())
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Value::U8(_) => "U8",
            Value::U16(_) => "U16",
            Value::U32(_) => "U32",
            Value::U64(_) => "U64",
            Value::Bytes(_) => "Bytes",
            Value::String(_) => "String",
        }
    }
}

/// Rust field types that a scalar accessor may be bound to.
///
/// `accepts` is checked once when a schema is compiled, so a mismatch between
/// a declared [`DataType`] and the accessor's type is a configuration error
/// rather than a per-message failure.
pub trait FieldValue: Sized + Send + Sync + 'static {
    /// Name used in diagnostics.
    const TYPE_NAME: &'static str;

    fn accepts(data_type: DataType) -> bool;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Result<Self, ValueTypeError>;
}

impl FieldValue for u8 {
    const TYPE_NAME: &'static str = "u8";

    fn accepts(data_type: DataType) -> bool {
        data_type == DataType::Byte
    }

    fn into_value(self) -> Value {
        Value::U8(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueTypeError> {
        value.try_u8()
    }
}

impl FieldValue for u16 {
    const TYPE_NAME: &'static str = "u16";

    fn accepts(data_type: DataType) -> bool {
        matches!(data_type, DataType::Word | DataType::WordLe)
    }

    fn into_value(self) -> Value {
        Value::U16(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueTypeError> {
        value.try_u16()
    }
}

impl FieldValue for u32 {
    const TYPE_NAME: &'static str = "u32";

    fn accepts(data_type: DataType) -> bool {
        matches!(data_type, DataType::Dword | DataType::DwordLe)
    }

    fn into_value(self) -> Value {
        Value::U32(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueTypeError> {
        value.try_u32()
    }
}

impl FieldValue for u64 {
    const TYPE_NAME: &'static str = "u64";

    fn accepts(data_type: DataType) -> bool {
        matches!(data_type, DataType::Qword | DataType::QwordLe)
    }

    fn into_value(self) -> Value {
        Value::U64(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueTypeError> {
        value.try_u64()
    }
}

impl FieldValue for String {
    const TYPE_NAME: &'static str = "String";

    fn accepts(data_type: DataType) -> bool {
        matches!(data_type, DataType::String | DataType::Bcd8421)
    }

    fn into_value(self) -> Value {
        Value::String(Arc::from(self))
    }

    fn from_value(value: Value) -> Result<Self, ValueTypeError> {
        value.try_str().map(str::to_owned)
    }
}

impl FieldValue for Vec<u8> {
    const TYPE_NAME: &'static str = "Vec<u8>";

    fn accepts(data_type: DataType) -> bool {
        data_type == DataType::Bytes
    }

    fn into_value(self) -> Value {
        Value::Bytes(Bytes::from(self))
    }

    fn from_value(value: Value) -> Result<Self, ValueTypeError> {
        value.try_bytes().map(<[u8]>::to_vec)
    }
}

impl FieldValue for Bytes {
    const TYPE_NAME: &'static str = "Bytes";

    fn accepts(data_type: DataType) -> bool {
        data_type == DataType::Bytes
    }

    fn into_value(self) -> Value {
        Value::Bytes(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueTypeError> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => Err(other.type_mismatch("Bytes")),
        }
    }
}
