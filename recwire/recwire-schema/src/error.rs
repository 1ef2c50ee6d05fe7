//! Schema configuration errors.
//!
//! Every variant except [`SchemaError::NotFound`] and
//! [`SchemaError::UnknownMessageId`] describes a defect in a record's field
//! declarations. They are raised when the schema is compiled, never while a
//! message is being decoded or encoded.

use recwire_core::{DataType, MessageId, Version};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A field belongs to no protocol version.
    #[error("{type_name}: field {index} ({label}) declares no versions")]
    MissingVersions {
        type_name: &'static str,
        index: u32,
        label: String,
    },

    /// An integer field declares a length other than its kind's width.
    #[error(
        "{type_name}: field {index} ({label}) declares length {declared} but {data_type} is {expected} bytes"
    )]
    LengthMismatch {
        type_name: &'static str,
        index: u32,
        label: String,
        data_type: DataType,
        declared: usize,
        expected: usize,
    },

    /// The accessor's Rust type cannot hold values of the declared kind.
    #[error("{type_name}: field {index} ({label}) binds {value_type} to a {data_type} field")]
    IncompatibleAccessor {
        type_name: &'static str,
        index: u32,
        label: String,
        data_type: DataType,
        value_type: &'static str,
    },

    /// A composite field's kind does not match how it was bound.
    #[error("{type_name}: field {index} ({label}) is malformed: {detail}")]
    MalformedComposite {
        type_name: &'static str,
        index: u32,
        label: String,
        detail: String,
    },

    /// A composite field names a version the nested record does not define.
    #[error(
        "{type_name}: field {index} ({label}) needs {nested} version {version}, which declares no fields for it"
    )]
    MissingNestedVersion {
        type_name: &'static str,
        index: u32,
        label: String,
        nested: &'static str,
        version: Version,
    },

    /// A record nests itself, directly or through other records.
    #[error("self-referential record schema: {path}")]
    CyclicSchema { path: String },

    /// Two fields of one version share an index.
    #[error("{type_name} version {version}: index {index} is declared more than once")]
    DuplicateIndex {
        type_name: &'static str,
        version: Version,
        index: u32,
    },

    /// The record has no schema for the requested version.
    #[error("{type_name} has no schema for version {version}")]
    NotFound {
        type_name: &'static str,
        version: Version,
    },

    /// No record type is registered under the message id.
    #[error("no record type registered for message id {id}")]
    UnknownMessageId { id: MessageId },

    /// A message id is already bound to a different record type.
    #[error("message id {id} is registered to {registered}, cannot register {requested}")]
    ConflictingMessageId {
        id: MessageId,
        registered: &'static str,
        requested: &'static str,
    },
}
