//! Declarative field schema attached to record types.
//!
//! A record describes its wire layout once, in [`Record::declare`], by adding
//! [`Field`] metadata together with statically bound accessor functions:
//!
//! ```
//! use recwire_schema::{Field, FieldSet, Record};
//!
//! #[derive(Debug, Default)]
//! struct Heartbeat {
//!     sequence: u16,
//!     status: u8,
//! }
//!
//! impl Record for Heartbeat {
//!     fn declare(fields: &mut FieldSet<Self>) {
//!         fields
//!             .scalar(Field::word(1, "sequence"), |r| Some(r.sequence), |r, v| r.sequence = v)
//!             .scalar(Field::byte(2, "status"), |r| Some(r.status), |r, v| r.status = v);
//!     }
//! }
//! ```
//!
//! The declaration is only collected here; validation and composite
//! resolution happen when the [`SchemaRegistry`](crate::SchemaRegistry)
//! compiles the type.

use std::{borrow::Cow, fmt, sync::Arc};

use recwire_core::{DataType, FieldValue, MessageId, Value, ValueTypeError, Version};

use crate::resolver::{ListBinding, NestedBinding, ObjectBinding};

/// Version assigned to fields that do not name any.
pub const DEFAULT_VERSION: Version = 0;

/// A structured record whose fields are encoded sequentially.
pub trait Record: Default + fmt::Debug + Send + Sync + 'static {
    /// External message ids this record decodes, used by
    /// [`SchemaRegistry::register`](crate::SchemaRegistry::register).
    const MESSAGE_IDS: &'static [MessageId] = &[];

    /// Short name used in diagnostics and error messages.
    ///
    /// The module path is dropped from the type itself but generic
    /// arguments are kept as written, so `proto::Envelope<proto::Inner>`
    /// becomes `Envelope<proto::Inner>`.
    fn type_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        let base_end = full.find('<').unwrap_or(full.len());
        let start = full[..base_end].rfind("::").map_or(0, |i| i + 2);
        &full[start..]
    }

    /// Describe the record's fields for every protocol version.
    fn declare(fields: &mut FieldSet<Self>);
}

/// Metadata of one declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Ordinal position; fields are encoded in ascending index order.
    pub index: u32,
    /// Declared byte length; `None` falls back to the kind's canonical length.
    pub length: Option<usize>,
    /// Human-readable description, diagnostics only.
    pub label: Cow<'static, str>,
    pub data_type: DataType,
    /// Protocol versions the field belongs to, sorted and deduplicated.
    pub versions: Vec<Version>,
}

impl Field {
    pub fn new(index: u32, data_type: DataType) -> Self {
        Self {
            index,
            length: None,
            label: Cow::Borrowed(""),
            data_type,
            versions: vec![DEFAULT_VERSION],
        }
    }

    pub fn byte(index: u32, label: &'static str) -> Self {
        Self::new(index, DataType::Byte).label(label)
    }

    pub fn word(index: u32, label: &'static str) -> Self {
        Self::new(index, DataType::Word).label(label)
    }

    pub fn dword(index: u32, label: &'static str) -> Self {
        Self::new(index, DataType::Dword).label(label)
    }

    pub fn qword(index: u32, label: &'static str) -> Self {
        Self::new(index, DataType::Qword).label(label)
    }

    pub fn bytes(index: u32, label: &'static str) -> Self {
        Self::new(index, DataType::Bytes).label(label)
    }

    pub fn bcd(index: u32, label: &'static str) -> Self {
        Self::new(index, DataType::Bcd8421).label(label)
    }

    pub fn string(index: u32, label: &'static str) -> Self {
        Self::new(index, DataType::String).label(label)
    }

    pub fn obj(index: u32, label: &'static str) -> Self {
        Self::new(index, DataType::Obj).label(label)
    }

    pub fn list(index: u32, label: &'static str) -> Self {
        Self::new(index, DataType::List).label(label)
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    pub fn versions(mut self, versions: impl IntoIterator<Item = Version>) -> Self {
        let mut versions: Vec<Version> = versions.into_iter().collect();
        versions.sort_unstable();
        versions.dedup();
        self.versions = versions;
        self
    }

    pub fn version(self, version: Version) -> Self {
        self.versions([version])
    }

    /// Length used on the wire: declared, else canonical, else variable (`None`).
    pub fn encoded_len(&self) -> Option<usize> {
        self.length.or(self.data_type.canonical_len())
    }
}

/// Collects a record's field declarations.
pub struct FieldSet<T> {
    decls: Vec<FieldDecl<T>>,
}

pub(crate) struct FieldDecl<T> {
    pub(crate) field: Field,
    pub(crate) binding: Binding<T>,
}

pub(crate) enum Binding<T> {
    Scalar(Arc<dyn ScalarAccess<T>>),
    Nested(Box<dyn NestedBinding<T>>),
}

impl<T: Record> FieldSet<T> {
    pub(crate) fn new() -> Self {
        Self { decls: Vec::new() }
    }

    /// Bind a scalar field. A getter returning `None` marks the value absent,
    /// which skips the field when encoding.
    pub fn scalar<V: FieldValue>(
        &mut self,
        field: Field,
        get: fn(&T) -> Option<V>,
        set: fn(&mut T, V),
    ) -> &mut Self {
        let access = TypedScalar { get, set };
        self.decls.push(FieldDecl {
            field,
            binding: Binding::Scalar(Arc::new(access)),
        });
        self
    }

    /// Bind an OBJ field holding a single nested record.
    pub fn object<U: Record>(
        &mut self,
        field: Field,
        get: fn(&T) -> Option<&U>,
        set: fn(&mut T, U),
    ) -> &mut Self {
        self.decls.push(FieldDecl {
            field,
            binding: Binding::Nested(Box::new(ObjectBinding::new(get, set))),
        });
        self
    }

    /// Bind a LIST field holding repeated nested records.
    pub fn list<U: Record>(
        &mut self,
        field: Field,
        get: fn(&T) -> Option<&[U]>,
        set: fn(&mut T, Vec<U>),
    ) -> &mut Self {
        self.decls.push(FieldDecl {
            field,
            binding: Binding::Nested(Box::new(ListBinding::new(get, set))),
        });
        self
    }

    pub(crate) fn into_decls(self) -> Vec<FieldDecl<T>> {
        self.decls
    }
}

/// Type-erased scalar accessor exchanging [`Value`]s with a record.
pub(crate) trait ScalarAccess<T>: Send + Sync {
    fn value_type(&self) -> &'static str;

    fn accepts(&self, data_type: DataType) -> bool;

    fn get(&self, source: &T) -> Option<Value>;

    fn set(&self, target: &mut T, value: Value) -> Result<(), ValueTypeError>;
}

struct TypedScalar<T, V> {
    get: fn(&T) -> Option<V>,
    set: fn(&mut T, V),
}

impl<T, V: FieldValue> ScalarAccess<T> for TypedScalar<T, V> {
    fn value_type(&self) -> &'static str {
        V::TYPE_NAME
    }

    fn accepts(&self, data_type: DataType) -> bool {
        V::accepts(data_type)
    }

    fn get(&self, source: &T) -> Option<Value> {
        (self.get)(source).map(V::into_value)
    }

    fn set(&self, target: &mut T, value: Value) -> Result<(), ValueTypeError> {
        (self.set)(target, V::from_value(value)?);
        Ok(())
    }
}
