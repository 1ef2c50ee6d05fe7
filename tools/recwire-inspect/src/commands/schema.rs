use std::{fs, path::PathBuf};

use anyhow::Result;
use clap::Args;
use recwire::{MessageId, SchemaRegistry, Version};

#[derive(Args)]
pub struct SchemaArgs {
    /// Message id, `0x`-prefixed hex or decimal
    #[arg(short, long)]
    id: MessageId,

    /// Protocol version
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    version: Version,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl SchemaArgs {
    pub fn run(self, registry: &SchemaRegistry) -> Result<()> {
        let schema = registry.lookup_by_id(&self.id, self.version)?;
        let text = format!("{} {schema}", self.id);

        match self.output {
            Some(path) => fs::write(path, text)?,
            None => print!("{text}"),
        }
        Ok(())
    }
}
