//! Encoding-agnostic core types for `recwire` record codecs.
//!
//! This crate provides the scalar [`Value`] representation exchanged between
//! field descriptors and record accessors, the [`DataType`] catalogue with its
//! canonical byte lengths, and the byte-level codec for scalar kinds.

mod data_type;
mod error;
mod message_id;
mod scalar;
mod value;

pub use data_type::DataType;
pub use error::{CodecError, ScalarError, ValueTypeError};
pub use message_id::MessageId;
pub use scalar::{read_scalar, write_scalar};
pub use value::{FieldValue, Value};

/// Protocol version a field belongs to.
///
/// Signed so that pre-standard revisions can be numbered below zero
/// (for example `-1` for a 2011 revision, `0` for 2013, `1` for 2019).
pub type Version = i32;
