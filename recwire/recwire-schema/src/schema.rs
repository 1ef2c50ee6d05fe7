//! Ordered per-version field plans and their type-erased view.

use std::{any::Any, collections::BTreeMap, fmt, sync::Arc};

use bytes::{Bytes, BytesMut};
use recwire_core::{CodecError, Version};

use crate::{
    declare::Record,
    descriptor::{FieldDescriptor, FieldInfo, ReadOutcome},
    format::format_fields,
};

/// Immutable decode/encode plan for one record type at one protocol version.
///
/// Fields are sorted ascending by index; ties keep declaration order.
pub struct TypeSchema<T> {
    type_name: &'static str,
    version: Version,
    fields: Vec<Arc<FieldDescriptor<T>>>,
}

impl<T> TypeSchema<T> {
    pub(crate) fn new(
        type_name: &'static str,
        version: Version,
        fields: Vec<Arc<FieldDescriptor<T>>>,
    ) -> Self {
        Self {
            type_name,
            version,
            fields,
        }
    }

    pub(crate) fn empty(type_name: &'static str, version: Version) -> Self {
        Self::new(type_name, version, Vec::new())
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn fields(&self) -> &[Arc<FieldDescriptor<T>>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First field with the given index.
    pub fn field(&self, index: u32) -> Option<&FieldDescriptor<T>> {
        self.fields
            .iter()
            .find(|f| f.index() == index)
            .map(Arc::as_ref)
    }

    pub fn describe(&self) -> Vec<FieldInfo> {
        self.fields.iter().map(|f| f.info()).collect()
    }
}

impl<T: Record> TypeSchema<T> {
    /// Decode fields in index order into `target`, returning how many were read.
    ///
    /// The first field the buffer is too short for ends decoding: it and every
    /// later field keep their current values. This lets a shorter payload from
    /// an older revision decode against a schema with more trailing fields.
    pub fn decode_into(&self, buf: &mut Bytes, target: &mut T) -> Result<usize, CodecError> {
        let mut decoded = 0;
        for field in &self.fields {
            match field.read_to(buf, target)? {
                ReadOutcome::Read { .. } => decoded += 1,
                ReadOutcome::Skipped => break,
            }
        }
        Ok(decoded)
    }

    pub fn decode(&self, buf: &mut Bytes) -> Result<T, CodecError> {
        let mut record = T::default();
        self.decode_into(buf, &mut record)?;
        Ok(record)
    }

    pub fn decode_slice(&self, data: &[u8]) -> Result<T, CodecError> {
        self.decode(&mut Bytes::copy_from_slice(data))
    }

    /// Encode fields in index order; absent values are skipped.
    pub fn encode_from(&self, source: &T, buf: &mut BytesMut) -> Result<(), CodecError> {
        for field in &self.fields {
            field.write_from(source, buf)?;
        }
        Ok(())
    }

    pub fn encode(&self, source: &T) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::new();
        self.encode_from(source, &mut buf)?;
        Ok(buf.freeze())
    }
}

impl<T> fmt::Display for TypeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (version {})", self.type_name, self.version)?;
        f.write_str(&format_fields(&self.describe(), 4)?)
    }
}

impl<T> fmt::Debug for TypeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchema")
            .field("type_name", &self.type_name)
            .field("version", &self.version)
            .field("fields", &self.fields)
            .finish()
    }
}

/// All compiled versions of one record type.
pub struct SchemaSet<T> {
    type_name: &'static str,
    by_version: BTreeMap<Version, Arc<TypeSchema<T>>>,
}

impl<T> SchemaSet<T> {
    pub(crate) fn new(type_name: &'static str, by_version: BTreeMap<Version, Arc<TypeSchema<T>>>) -> Self {
        Self {
            type_name,
            by_version,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn get(&self, version: Version) -> Option<&Arc<TypeSchema<T>>> {
        self.by_version.get(&version)
    }

    pub fn versions(&self) -> impl Iterator<Item = Version> + '_ {
        self.by_version.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Version, &Arc<TypeSchema<T>>)> {
        self.by_version.iter().map(|(v, s)| (*v, s))
    }

    pub fn len(&self) -> usize {
        self.by_version.len()
    }

    /// True when the record declared no fields at all.
    pub fn is_empty(&self) -> bool {
        self.by_version.is_empty()
    }
}

impl<T> fmt::Debug for SchemaSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSet")
            .field("type_name", &self.type_name)
            .field("versions", &self.by_version.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A decoded record whose concrete type is known only at run time.
pub trait AnyRecord: Any + fmt::Debug + Send + Sync {
    fn record_type(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Record> AnyRecord for T {
    fn record_type(&self) -> &'static str {
        T::type_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn AnyRecord {
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Object-safe view of a [`TypeSchema`], used for dispatch by message id.
pub trait DynSchema: fmt::Display + Send + Sync {
    fn type_name(&self) -> &'static str;

    fn version(&self) -> Version;

    fn describe(&self) -> Vec<FieldInfo>;

    fn decode_any(&self, buf: &mut Bytes) -> Result<Box<dyn AnyRecord>, CodecError>;

    fn encode_any(&self, record: &dyn AnyRecord, buf: &mut BytesMut) -> Result<(), CodecError>;
}

impl<T: Record> DynSchema for TypeSchema<T> {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn version(&self) -> Version {
        self.version
    }

    fn describe(&self) -> Vec<FieldInfo> {
        TypeSchema::describe(self)
    }

    fn decode_any(&self, buf: &mut Bytes) -> Result<Box<dyn AnyRecord>, CodecError> {
        Ok(Box::new(self.decode(buf)?))
    }

    fn encode_any(&self, record: &dyn AnyRecord, buf: &mut BytesMut) -> Result<(), CodecError> {
        let source = record
            .downcast_ref::<T>()
            .ok_or_else(|| CodecError::RecordType {
                expected: self.type_name,
                found: record.record_type(),
            })?;
        self.encode_from(source, buf)
    }
}
