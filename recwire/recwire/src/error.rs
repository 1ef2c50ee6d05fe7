//! Error types for message dispatch.

use recwire_core::{CodecError, MessageId, Version};
use recwire_schema::SchemaError;

/// Errors produced by [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No schema could be resolved for the frame's message id and version.
    #[error("no schema for message {message_id} version {version}: {source}")]
    Schema {
        message_id: MessageId,
        version: Version,
        #[source]
        source: SchemaError,
    },

    /// The frame body could not be decoded.
    #[error("message {message_id} version {version} decode failed: {source}")]
    Decode {
        message_id: MessageId,
        version: Version,
        #[source]
        source: CodecError,
    },

    /// The record could not be encoded into a frame body.
    #[error("message {message_id} version {version} encode failed: {source}")]
    Encode {
        message_id: MessageId,
        version: Version,
        #[source]
        source: CodecError,
    },
}
