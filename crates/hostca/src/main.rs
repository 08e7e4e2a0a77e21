// ABOUTME: hostca CLI entry point.
// ABOUTME: Parses flags, sets up logging, and hands off to the poll loop.

use clap::Parser;
use hostca::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    hostca_log::init(cli.debug);

    hostca::run(cli).await
}
