//! Command-line interface for tilewar.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tilewar - N-dimensional 2048 between an attacker and a defender
#[derive(Parser, Debug)]
#[command(name = "tilewar")]
#[command(about = "N-dimensional 2048 where one player places tiles and the other slides them", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP round server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Path to the arena configuration
        #[arg(short, long, default_value = "tilewar.toml")]
        config: PathBuf,
    },

    /// Play rounds in this terminal
    Local {
        /// Side lengths of an empty board
        #[arg(long, default_value = "[4,4]")]
        board_shape: String,

        /// Starting layout, overrides the shape
        #[arg(long, default_value = "")]
        board_tiles: String,

        /// Random, Strategy, Manual or Online
        #[arg(long, default_value = "Random")]
        attacker_type: String,

        /// Random, Strategy, Manual or Online
        #[arg(long, default_value = "Manual")]
        defender_type: String,

        /// Replace every manual player with a random one
        #[arg(long)]
        auto: bool,

        /// Number of rounds, endless when omitted
        #[arg(long)]
        rounds: Option<u64>,

        /// Seed for reproducible robots
        #[arg(long)]
        seed: Option<u64>,
    },
}
