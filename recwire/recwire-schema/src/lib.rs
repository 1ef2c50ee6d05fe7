//! Versioned record schemas for sequential binary encodings.
//!
//! The pipeline has three stages:
//!
//! 1. A record type implements [`Record`] and declares its fields through a
//!    [`FieldSet`]: index, kind, optional length, and the protocol versions
//!    each field belongs to, each bound to accessor functions.
//! 2. [`SchemaRegistry::compile`] validates those declarations, resolves OBJ
//!    and LIST fields to the nested record's compiled schemas, and produces a
//!    [`SchemaSet`] with one [`TypeSchema`] per version. Results are cached for
//!    the lifetime of the registry.
//! 3. [`TypeSchema::decode`] / [`TypeSchema::encode`] walk the fields in index
//!    order. Decoding stops quietly at the first field the buffer is too short
//!    for, and encoding skips fields whose value is absent.
//!
//! Records can also be registered under [`MessageId`]s and looked up as
//! type-erased [`DynSchema`]s for dispatch.

mod declare;
mod descriptor;
mod error;
mod format;
mod registry;
mod resolver;
mod schema;

pub use declare::{DEFAULT_VERSION, Field, FieldSet, Record};
pub use descriptor::{FieldDescriptor, FieldInfo, NestedInfo, ReadOutcome, WriteOutcome};
pub use error::SchemaError;
pub use format::format_fields;
pub use recwire_core::{CodecError, DataType, MessageId, Value, Version};
pub use registry::{
    CyclePolicy, IndexPolicy, RegistryOptions, SchemaRegistry, SchemaRegistryBuilder,
};
pub use schema::{AnyRecord, DynSchema, SchemaSet, TypeSchema};
