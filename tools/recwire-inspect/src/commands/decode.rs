use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use recwire::{Dispatcher, Frame, MessageId, SchemaRegistry, Version};
use tracing::info;

#[derive(Args)]
pub struct DecodeArgs {
    /// Message id, `0x`-prefixed hex or decimal
    #[arg(short, long)]
    id: MessageId,

    /// Protocol version
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    version: Version,

    /// Message body as hex; whitespace is ignored
    #[arg(required = true, num_args = 1..)]
    payload: Vec<String>,
}

impl DecodeArgs {
    pub fn run(self, registry: SchemaRegistry) -> Result<()> {
        let hex_body: String = self.payload.concat().split_whitespace().collect();
        let body = hex::decode(&hex_body).context("payload is not valid hex")?;
        info!(message_id = %self.id, version = self.version, bytes = body.len(), "decoding");

        let dispatcher = Dispatcher::new(Arc::new(registry));
        let frame = Frame::new(self.id, self.version, body);
        let message = dispatcher.decode(&frame)?;

        println!(
            "{} {} (version {})",
            message.message_id,
            message.record_type(),
            message.version
        );
        println!("{:#?}", message.record);
        Ok(())
    }
}
