mod cli;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli::play_ws(&cli.server, &cli.room, &cli.name, cli.from, cli.json).await
}
