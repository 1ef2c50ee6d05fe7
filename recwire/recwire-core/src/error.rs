//! Error types for the value and field codec layer.

use crate::DataType;

/// A [`Value`](crate::Value) did not hold the variant an accessor expected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} value, found {found}")]
pub struct ValueTypeError {
    pub expected: String,
    pub found: &'static str,
}

impl ValueTypeError {
    pub fn new(expected: impl Into<String>, found: &'static str) -> Self {
        Self {
            expected: expected.into(),
            found,
        }
    }
}

/// Failure while converting a scalar [`Value`](crate::Value) to or from bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScalarError {
    #[error(transparent)]
    Type(#[from] ValueTypeError),

    /// The value does not fit in the field's declared width.
    #[error("value of {actual} bytes exceeds declared length {limit}")]
    TooLong { limit: usize, actual: usize },

    /// Fewer bytes than the kind's fixed width were supplied.
    #[error("{data_type} needs {expected} bytes, got {actual}")]
    Truncated {
        data_type: DataType,
        expected: usize,
        actual: usize,
    },

    /// A BCD string contained a character that is not a hex digit.
    #[error("invalid BCD digit {0:?}")]
    InvalidBcdDigit(char),

    /// OBJ / LIST fields are not handled by the scalar codec.
    #[error("{0} is not a scalar kind")]
    NotScalar(DataType),
}

/// Error raised while decoding or encoding a single record.
///
/// Short buffers and absent values are not errors; these variants only cover
/// values that an accessor or the wire format cannot accept.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The bound setter rejected the decoded value.
    #[error("{type_name}: field {index} ({label}) rejected decoded value: {source}")]
    Accessor {
        type_name: &'static str,
        index: u32,
        label: String,
        #[source]
        source: ValueTypeError,
    },

    /// The field's bytes could not be turned into a value.
    #[error("{type_name}: failed to decode field {index} ({label}): {source}")]
    Decode {
        type_name: &'static str,
        index: u32,
        label: String,
        #[source]
        source: ScalarError,
    },

    /// The source value could not be written in the field's wire format.
    #[error("{type_name}: failed to encode field {index} ({label}): {source}")]
    Encode {
        type_name: &'static str,
        index: u32,
        label: String,
        #[source]
        source: ScalarError,
    },

    /// A type-erased record was handed to a schema of another record type.
    #[error("schema for {expected} cannot encode a {found} record")]
    RecordType {
        expected: &'static str,
        found: &'static str,
    },

    /// A nested record encoded to more bytes than its declared window.
    #[error(
        "{type_name}: nested field {index} ({label}) encoded {actual} bytes, declared length is {declared}"
    )]
    LengthOverflow {
        type_name: &'static str,
        index: u32,
        label: String,
        declared: usize,
        actual: usize,
    },
}
