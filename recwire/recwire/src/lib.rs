//! Schema-driven binary record codec.
//!
//! Record types declare their sequential wire layout once, per protocol
//! version, and get decoding and encoding from the compiled schema:
//!
//! ```
//! use std::sync::Arc;
//!
//! use recwire::{Dispatcher, Field, FieldSet, Frame, MessageId, Record, SchemaRegistry};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Heartbeat {
//!     sequence: u16,
//! }
//!
//! impl Record for Heartbeat {
//!     const MESSAGE_IDS: &'static [MessageId] = &[MessageId::code(0x0002)];
//!
//!     fn declare(fields: &mut FieldSet<Self>) {
//!         fields.scalar(Field::word(1, "sequence"), |r| Some(r.sequence), |r, v| r.sequence = v);
//!     }
//! }
//!
//! let registry = SchemaRegistry::builder().register::<Heartbeat>().build()?;
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//!
//! let message = dispatcher.decode(&Frame::new(MessageId::code(0x0002), 0, vec![0x00u8, 0x2A]))?;
//! assert_eq!(message.downcast_ref::<Heartbeat>(), Some(&Heartbeat { sequence: 42 }));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The building blocks live in [`core`] (values, data types, scalar codec)
//! and [`schema`] (declarations, compiled schemas, registry).

mod dispatch;
mod error;

pub use dispatch::{DecodedMessage, Dispatcher, Frame};
pub use error::DispatchError;
pub use recwire_core as core;
pub use recwire_core::{CodecError, DataType, MessageId, Value, Version};
pub use recwire_schema as schema;
pub use recwire_schema::{
    AnyRecord, CyclePolicy, DynSchema, Field, FieldSet, IndexPolicy, Record, SchemaError,
    SchemaRegistry, SchemaSet, TypeSchema,
};
