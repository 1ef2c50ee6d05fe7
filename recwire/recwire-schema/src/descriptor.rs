//! Compiled per-field decode/encode plan.

use std::{borrow::Cow, fmt, sync::Arc};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use recwire_core::{CodecError, DataType, ScalarError, Value, read_scalar, write_scalar};
use tracing::trace;

use crate::{
    declare::{Field, ScalarAccess},
    resolver::CompositeCodec,
};

/// Result of reading one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The field was decoded from `consumed` bytes.
    Read { consumed: usize },
    /// Too few bytes remained; nothing was consumed.
    Skipped,
}

/// Result of writing one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { bytes: usize },
    /// The source value was absent; nothing was written.
    Absent,
}

/// Static description of a compiled field, used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub index: u32,
    /// Encoded length; `None` for variable-width fields.
    pub length: Option<usize>,
    pub label: String,
    pub data_type: DataType,
    /// Nested record layout for OBJ / LIST fields.
    pub nested: Option<NestedInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedInfo {
    pub type_name: &'static str,
    pub fields: Vec<FieldInfo>,
}

/// How to decode and encode one field of record type `T`.
///
/// Scalar descriptors are shared between every version that declares the
/// field; composite descriptors exist once per version because each version
/// delegates to a different nested schema.
pub struct FieldDescriptor<T> {
    owner: &'static str,
    index: u32,
    length: Option<usize>,
    label: Cow<'static, str>,
    data_type: DataType,
    codec: FieldCodec<T>,
}

enum FieldCodec<T> {
    Scalar(Arc<dyn ScalarAccess<T>>),
    Composite(Box<dyn CompositeCodec<T>>),
}

impl<T> FieldDescriptor<T> {
    pub(crate) fn scalar(owner: &'static str, field: &Field, access: Arc<dyn ScalarAccess<T>>) -> Self {
        Self::with_codec(owner, field, FieldCodec::Scalar(access))
    }

    pub(crate) fn composite(
        owner: &'static str,
        field: &Field,
        codec: Box<dyn CompositeCodec<T>>,
    ) -> Self {
        Self::with_codec(owner, field, FieldCodec::Composite(codec))
    }

    fn with_codec(owner: &'static str, field: &Field, codec: FieldCodec<T>) -> Self {
        Self {
            owner,
            index: field.index,
            length: field.encoded_len(),
            label: field.label.clone(),
            data_type: field.data_type,
            codec,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Encoded length; `None` for variable-width fields.
    pub fn length(&self) -> Option<usize> {
        self.length
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Name of the nested record for OBJ / LIST fields.
    pub fn nested_type(&self) -> Option<&'static str> {
        match &self.codec {
            FieldCodec::Scalar(_) => None,
            FieldCodec::Composite(codec) => Some(codec.nested_type()),
        }
    }

    pub fn info(&self) -> FieldInfo {
        let nested = match &self.codec {
            FieldCodec::Scalar(_) => None,
            FieldCodec::Composite(codec) => Some(NestedInfo {
                type_name: codec.nested_type(),
                fields: codec.nested_fields(),
            }),
        };
        FieldInfo {
            index: self.index,
            length: self.length,
            label: self.label.to_string(),
            data_type: self.data_type,
            nested,
        }
    }

    /// Decode this field's value without storing it anywhere.
    ///
    /// Returns `Ok(None)` when the buffer is too short, and for composite
    /// fields, whose values only exist as nested records.
    pub fn read_value(&self, buf: &mut Bytes) -> Result<Option<(Value, usize)>, CodecError> {
        if matches!(self.codec, FieldCodec::Composite(_)) {
            return Ok(None);
        }
        let Some(raw) = self.take(buf) else {
            return Ok(None);
        };
        let consumed = raw.len();
        let value = read_scalar(self.data_type, raw).map_err(|e| self.decode_error(e))?;
        Ok(Some((value, consumed)))
    }

    /// Decode this field from `buf` into `target`.
    pub fn read_to(&self, buf: &mut Bytes, target: &mut T) -> Result<ReadOutcome, CodecError> {
        match &self.codec {
            FieldCodec::Scalar(access) => {
                let Some(raw) = self.take(buf) else {
                    return Ok(ReadOutcome::Skipped);
                };
                let consumed = raw.len();
                trace!(
                    record = self.owner,
                    index = self.index,
                    label = %self.label,
                    bytes = %hex::encode(&raw),
                    "read field"
                );
                let value = read_scalar(self.data_type, raw).map_err(|e| self.decode_error(e))?;
                access
                    .set(target, value)
                    .map_err(|source| CodecError::Accessor {
                        type_name: self.owner,
                        index: self.index,
                        label: self.label.to_string(),
                        source,
                    })?;
                Ok(ReadOutcome::Read { consumed })
            }
            FieldCodec::Composite(codec) => match self.length {
                Some(n) if buf.remaining() < n => Ok(ReadOutcome::Skipped),
                Some(n) => {
                    let mut window = buf.split_to(n);
                    codec.read_to(&mut window, target)?;
                    Ok(ReadOutcome::Read { consumed: n })
                }
                None if !buf.has_remaining() => Ok(ReadOutcome::Skipped),
                None => {
                    let before = buf.remaining();
                    // Nothing decoded means the nested record's first field
                    // did not fit, so this field ends decoding like a short
                    // scalar would.
                    if !codec.read_to(buf, target)? {
                        return Ok(ReadOutcome::Skipped);
                    }
                    Ok(ReadOutcome::Read {
                        consumed: before - buf.remaining(),
                    })
                }
            },
        }
    }

    /// Encode this field from `source`, writing nothing if the value is absent.
    pub fn write_from(&self, source: &T, buf: &mut BytesMut) -> Result<WriteOutcome, CodecError> {
        let start = buf.len();
        match &self.codec {
            FieldCodec::Scalar(access) => {
                let Some(value) = access.get(source) else {
                    return Ok(WriteOutcome::Absent);
                };
                write_scalar(self.data_type, &value, self.length, buf).map_err(|source| {
                    CodecError::Encode {
                        type_name: self.owner,
                        index: self.index,
                        label: self.label.to_string(),
                        source,
                    }
                })?;
            }
            FieldCodec::Composite(codec) => match self.length {
                None => {
                    if !codec.write_from(source, buf)? {
                        return Ok(WriteOutcome::Absent);
                    }
                }
                Some(declared) => {
                    let mut scratch = BytesMut::new();
                    if !codec.write_from(source, &mut scratch)? {
                        return Ok(WriteOutcome::Absent);
                    }
                    if scratch.len() > declared {
                        return Err(CodecError::LengthOverflow {
                            type_name: self.owner,
                            index: self.index,
                            label: self.label.to_string(),
                            declared,
                            actual: scratch.len(),
                        });
                    }
                    buf.put_slice(&scratch);
                    buf.put_bytes(0, declared - scratch.len());
                }
            },
        }
        Ok(WriteOutcome::Written {
            bytes: buf.len() - start,
        })
    }

    /// Split off the bytes belonging to a scalar field, or `None` if the
    /// buffer cannot supply them.
    fn take(&self, buf: &mut Bytes) -> Option<Bytes> {
        match self.length {
            Some(n) if buf.remaining() < n => None,
            Some(n) => Some(buf.split_to(n)),
            None if !buf.has_remaining() => None,
            None => Some(std::mem::take(buf)),
        }
    }

    fn decode_error(&self, source: ScalarError) -> CodecError {
        CodecError::Decode {
            type_name: self.owner,
            index: self.index,
            label: self.label.to_string(),
            source,
        }
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("index", &self.index)
            .field("length", &self.length)
            .field("label", &self.label)
            .field("data_type", &self.data_type)
            .field("nested", &self.nested_type())
            .finish()
    }
}
