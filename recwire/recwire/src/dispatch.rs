//! Decoding of message bodies selected by message id and protocol version.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use rayon::prelude::*;
use recwire_core::{MessageId, Version};
use recwire_schema::{AnyRecord, Record, SchemaRegistry};
use tracing::{debug, warn};

use crate::error::DispatchError;

/// A message body together with the id and version that select its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub message_id: MessageId,
    pub version: Version,
    pub body: Bytes,
}

impl Frame {
    pub fn new(message_id: impl Into<MessageId>, version: Version, body: impl Into<Bytes>) -> Self {
        Self {
            message_id: message_id.into(),
            version,
            body: body.into(),
        }
    }
}

/// A decoded frame whose record type is resolved at run time.
#[derive(Debug)]
pub struct DecodedMessage {
    pub message_id: MessageId,
    pub version: Version,
    pub record: Box<dyn AnyRecord>,
}

impl DecodedMessage {
    pub fn record_type(&self) -> &'static str {
        self.record.record_type()
    }

    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.record.downcast_ref::<T>()
    }

    /// Take the record out as `T`; `None` if it holds another record type.
    pub fn downcast<T: Record>(self) -> Option<T> {
        self.record.into_any().downcast::<T>().ok().map(|record| *record)
    }
}

/// Decodes and encodes frames through the message ids registered in a
/// [`SchemaRegistry`].
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<SchemaRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn decode(&self, frame: &Frame) -> Result<DecodedMessage, DispatchError> {
        let schema = self
            .registry
            .lookup_by_id(&frame.message_id, frame.version)
            .map_err(|source| DispatchError::Schema {
                message_id: frame.message_id.clone(),
                version: frame.version,
                source,
            })?;
        let mut body = frame.body.clone();
        let record = schema
            .decode_any(&mut body)
            .map_err(|source| DispatchError::Decode {
                message_id: frame.message_id.clone(),
                version: frame.version,
                source,
            })?;
        if !body.is_empty() {
            debug!(
                message_id = %frame.message_id,
                version = frame.version,
                trailing = body.len(),
                "frame body has undecoded trailing bytes"
            );
        }
        Ok(DecodedMessage {
            message_id: frame.message_id.clone(),
            version: frame.version,
            record,
        })
    }

    /// Encode `record` as the body of a `message_id` frame.
    ///
    /// The id must be registered to `T`.
    pub fn encode<T: Record>(
        &self,
        message_id: impl Into<MessageId>,
        version: Version,
        record: &T,
    ) -> Result<Frame, DispatchError> {
        let message_id = message_id.into();
        let schema = self
            .registry
            .lookup_by_id(&message_id, version)
            .map_err(|source| DispatchError::Schema {
                message_id: message_id.clone(),
                version,
                source,
            })?;
        let mut body = BytesMut::new();
        schema
            .encode_any(record, &mut body)
            .map_err(|source| DispatchError::Encode {
                message_id: message_id.clone(),
                version,
                source,
            })?;
        Ok(Frame {
            message_id,
            version,
            body: body.freeze(),
        })
    }

    /// Decode frames in order. Each frame gets its own result, so one bad
    /// frame never stops the ones after it.
    pub fn decode_all<'a, I>(
        &'a self,
        frames: I,
    ) -> impl Iterator<Item = Result<DecodedMessage, DispatchError>> + 'a
    where
        I: IntoIterator<Item = &'a Frame>,
        I::IntoIter: 'a,
    {
        frames.into_iter().map(move |frame| self.logged(frame))
    }

    /// Decode a batch of frames on the rayon thread pool, keeping input order.
    pub fn par_decode(&self, frames: &[Frame]) -> Vec<Result<DecodedMessage, DispatchError>> {
        frames.par_iter().map(|frame| self.logged(frame)).collect()
    }

    fn logged(&self, frame: &Frame) -> Result<DecodedMessage, DispatchError> {
        let result = self.decode(frame);
        if let Err(e) = &result {
            warn!(error = %e, "skipping undecodable frame");
        }
        result
    }
}
