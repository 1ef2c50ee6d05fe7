mod commands;
mod messages;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{decode::DecodeArgs, list::ListArgs, schema::SchemaArgs};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(
    name = "recwire-inspect",
    about = "Inspect record schemas and decode payloads of the built-in telemetry messages"
)]
struct Cli {
    /// Log schema compilation and per-field decoding to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the compiled schema of a message
    Schema(SchemaArgs),
    /// Decode a hex payload
    Decode(DecodeArgs),
    /// List registered message ids
    List(ListArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if cli.verbose => EnvFilter::new("recwire=debug,recwire_schema=trace"),
        Err(_) => EnvFilter::new("warn"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let registry = messages::registry()?;

    match cli.command {
        Commands::Schema(args) => args.run(&registry),
        Commands::Decode(args) => args.run(registry),
        Commands::List(args) => args.run(&registry),
    }
}
