use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "castlefall-cli",
    version,
    about = "Headless display client for Castlefall rooms",
    long_about = "Joins a room over websocket, prints the event feed and reads commands \
                  from stdin:\n  start [word ...] | declare | win [name] | kick <name> | \
                  new | leave | quit"
)]
pub struct Cli {
    /// Server address: ws://host:port/ws, http://host:port or host:port
    #[arg(long, default_value = "ws://localhost:3000/ws")]
    pub server: String,

    /// Room to join
    #[arg(short, long)]
    pub room: String,

    /// Player name
    #[arg(short, long)]
    pub name: String,

    /// Replay the feed from this sequence number instead of the server default
    #[arg(long)]
    pub from: Option<u64>,

    /// Output raw ServerMsg JSON instead of human-readable text
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
