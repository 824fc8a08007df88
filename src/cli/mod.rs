use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::Config;
use crate::game::AssignmentKind;

/// Server CLI for castlefall-server
#[derive(Parser, Debug, Clone)]
#[command(
    name = "castlefall-server",
    version,
    about = "Castlefall room session coordinator"
)]
pub struct ServerCli {
    /// Path to config file
    #[arg(long, default_value = "castlefall.toml")]
    pub config: PathBuf,

    /// Address to listen on (overrides config.bind)
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Reconnect grace period in seconds (overrides config.reconnect_grace_secs)
    #[arg(long)]
    pub grace_secs: Option<u64>,

    /// Word assignment policy: uniform or split (overrides config.assignment)
    #[arg(long)]
    pub assignment: Option<AssignmentKind>,

    /// Directory with a Display Client bundle to serve (overrides config.static_dir)
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Verbose logging with targets, thread ids and source locations
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Persist CLI overrides back to the config file
    #[arg(long, default_value_t = false)]
    pub persist: bool,
}

impl ServerCli {
    /// Apply command-line overrides on top of `cfg`. Returns true if anything changed.
    pub fn apply_overrides(&self, cfg: &mut Config) -> bool {
        let before = cfg.clone();
        if let Some(bind) = self.bind {
            cfg.bind = bind;
        }
        if let Some(grace) = self.grace_secs {
            cfg.reconnect_grace_secs = grace;
        }
        if let Some(kind) = self.assignment {
            cfg.assignment = kind;
        }
        if let Some(dir) = &self.static_dir {
            cfg.static_dir = Some(dir.clone());
        }
        *cfg != before
    }
}
