pub mod args;
pub mod commands;
pub mod play;
pub mod transport;
pub mod utils;

pub use args::Cli;
pub use play::play_ws;
