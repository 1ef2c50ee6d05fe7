//! Composite field resolution.
//!
//! An OBJ or LIST field is declared with the nested record type captured in
//! its accessor signature. When the enclosing record is compiled, the binding
//! asks the compile context for the nested type's schemas (compiling them if
//! needed) and produces one [`CompositeCodec`] per declared version, each
//! sharing the registry-owned nested [`TypeSchema`].

use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use recwire_core::{CodecError, DataType, Version};

use crate::{
    declare::{Field, Record},
    descriptor::FieldInfo,
    error::SchemaError,
    registry::CompileContext,
    schema::TypeSchema,
};

/// Decode/encode of a composite field, delegating to a nested schema.
pub(crate) trait CompositeCodec<T>: Send + Sync {
    fn nested_type(&self) -> &'static str;

    fn nested_fields(&self) -> Vec<FieldInfo>;

    /// Returns `false` when the nested record decoded no field; `target` is
    /// left untouched in that case.
    fn read_to(&self, buf: &mut Bytes, target: &mut T) -> Result<bool, CodecError>;

    /// Returns `false` when the source value is absent and nothing was written.
    fn write_from(&self, source: &T, buf: &mut BytesMut) -> Result<bool, CodecError>;
}

/// A declared composite field waiting for its nested type to be compiled.
pub(crate) trait NestedBinding<T>: Send + Sync {
    fn nested_type(&self) -> &'static str;

    /// Kind the field must be declared with to use this binding.
    fn expected_kind(&self) -> DataType;

    fn resolve(
        &self,
        cx: &mut CompileContext<'_>,
        owner: &'static str,
        field: &Field,
    ) -> Result<Vec<(Version, Box<dyn CompositeCodec<T>>)>, SchemaError>;
}

/// Fetch the nested schema for every version `field` declares.
fn nested_schemas<U: Record>(
    cx: &mut CompileContext<'_>,
    owner: &'static str,
    field: &Field,
) -> Result<Vec<(Version, Arc<TypeSchema<U>>)>, SchemaError> {
    let resolved = cx.resolve::<U>()?;
    field
        .versions
        .iter()
        .map(|&version| {
            let schema = match &resolved {
                Some(set) => set.get(version).cloned().ok_or_else(|| {
                    SchemaError::MissingNestedVersion {
                        type_name: owner,
                        index: field.index,
                        label: field.label.to_string(),
                        nested: U::type_name(),
                        version,
                    }
                })?,
                // Recursive occurrence under the truncating cycle policy.
                None => Arc::new(TypeSchema::empty(U::type_name(), version)),
            };
            Ok((version, schema))
        })
        .collect()
}

pub(crate) struct ObjectBinding<T, U> {
    get: fn(&T) -> Option<&U>,
    set: fn(&mut T, U),
}

impl<T, U> ObjectBinding<T, U> {
    pub(crate) fn new(get: fn(&T) -> Option<&U>, set: fn(&mut T, U)) -> Self {
        Self { get, set }
    }
}

impl<T: Record, U: Record> NestedBinding<T> for ObjectBinding<T, U> {
    fn nested_type(&self) -> &'static str {
        U::type_name()
    }

    fn expected_kind(&self) -> DataType {
        DataType::Obj
    }

    fn resolve(
        &self,
        cx: &mut CompileContext<'_>,
        owner: &'static str,
        field: &Field,
    ) -> Result<Vec<(Version, Box<dyn CompositeCodec<T>>)>, SchemaError> {
        Ok(nested_schemas::<U>(cx, owner, field)?
            .into_iter()
            .map(|(version, schema)| {
                let codec: Box<dyn CompositeCodec<T>> = Box::new(ObjectCodec {
                    schema,
                    get: self.get,
                    set: self.set,
                });
                (version, codec)
            })
            .collect())
    }
}

pub(crate) struct ListBinding<T, U> {
    get: fn(&T) -> Option<&[U]>,
    set: fn(&mut T, Vec<U>),
}

impl<T, U> ListBinding<T, U> {
    pub(crate) fn new(get: fn(&T) -> Option<&[U]>, set: fn(&mut T, Vec<U>)) -> Self {
        Self { get, set }
    }
}

impl<T: Record, U: Record> NestedBinding<T> for ListBinding<T, U> {
    fn nested_type(&self) -> &'static str {
        U::type_name()
    }

    fn expected_kind(&self) -> DataType {
        DataType::List
    }

    fn resolve(
        &self,
        cx: &mut CompileContext<'_>,
        owner: &'static str,
        field: &Field,
    ) -> Result<Vec<(Version, Box<dyn CompositeCodec<T>>)>, SchemaError> {
        Ok(nested_schemas::<U>(cx, owner, field)?
            .into_iter()
            .map(|(version, schema)| {
                let codec: Box<dyn CompositeCodec<T>> = Box::new(ListCodec {
                    schema,
                    get: self.get,
                    set: self.set,
                });
                (version, codec)
            })
            .collect())
    }
}

struct ObjectCodec<T, U> {
    schema: Arc<TypeSchema<U>>,
    get: fn(&T) -> Option<&U>,
    set: fn(&mut T, U),
}

impl<T: Record, U: Record> CompositeCodec<T> for ObjectCodec<T, U> {
    fn nested_type(&self) -> &'static str {
        self.schema.type_name()
    }

    fn nested_fields(&self) -> Vec<FieldInfo> {
        self.schema.describe()
    }

    fn read_to(&self, buf: &mut Bytes, target: &mut T) -> Result<bool, CodecError> {
        let mut item = U::default();
        if self.schema.decode_into(buf, &mut item)? == 0 {
            return Ok(false);
        }
        (self.set)(target, item);
        Ok(true)
    }

    fn write_from(&self, source: &T, buf: &mut BytesMut) -> Result<bool, CodecError> {
        let Some(item) = (self.get)(source) else {
            return Ok(false);
        };
        self.schema.encode_from(item, buf)?;
        Ok(true)
    }
}

/// Repeats nested decoding until the buffer (or the field's window) is
/// exhausted. An item that decodes no field or consumes no bytes ends the
/// list and is not kept.
struct ListCodec<T, U> {
    schema: Arc<TypeSchema<U>>,
    get: fn(&T) -> Option<&[U]>,
    set: fn(&mut T, Vec<U>),
}

impl<T: Record, U: Record> CompositeCodec<T> for ListCodec<T, U> {
    fn nested_type(&self) -> &'static str {
        self.schema.type_name()
    }

    fn nested_fields(&self) -> Vec<FieldInfo> {
        self.schema.describe()
    }

    fn read_to(&self, buf: &mut Bytes, target: &mut T) -> Result<bool, CodecError> {
        let mut items = Vec::new();
        while buf.has_remaining() {
            let before = buf.remaining();
            let mut item = U::default();
            let decoded = self.schema.decode_into(buf, &mut item)?;
            if decoded == 0 || buf.remaining() == before {
                break;
            }
            items.push(item);
        }
        if items.is_empty() {
            return Ok(false);
        }
        (self.set)(target, items);
        Ok(true)
    }

    fn write_from(&self, source: &T, buf: &mut BytesMut) -> Result<bool, CodecError> {
        let Some(items) = (self.get)(source) else {
            return Ok(false);
        };
        for item in items {
            self.schema.encode_from(item, buf)?;
        }
        Ok(true)
    }
}
