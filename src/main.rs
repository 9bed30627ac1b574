use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wle_stack::cli::Cli;

fn main() -> Result<()> {
    // RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wle_stack=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Cli::parse().run()
}
