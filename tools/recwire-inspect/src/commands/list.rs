use anyhow::Result;
use clap::Args;
use recwire::SchemaRegistry;

#[derive(Args)]
pub struct ListArgs {
    /// Also print the versions each message defines
    #[arg(long)]
    versions: bool,
}

impl ListArgs {
    pub fn run(self, registry: &SchemaRegistry) -> Result<()> {
        for (id, type_name) in registry.message_ids() {
            if !self.versions {
                println!("{id}  {type_name}");
                continue;
            }
            let versions: Vec<String> = registry
                .versions_by_id(&id)?
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("{id}  {type_name}  [{}]", versions.join(", "));
        }
        Ok(())
    }
}
