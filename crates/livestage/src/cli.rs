//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "livestage")]
#[command(about = "Synchronized audio-reactive virtual concert", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, short, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the session server
    Serve {
        /// Bind address (overrides the config file)
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Port (overrides the config file)
        #[arg(long, short, value_name = "PORT")]
        port: Option<u16>,
    },
    /// Run a coordinator and two viewers in-process on a synthesized track
    Simulate(SimulateArgs),
}

/// Simulation parameters
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Song reference sent with the start request
    #[arg(long, value_name = "SONG", default_value = "assets/audio/fast_track.mp3")]
    pub song: String,

    /// Number of 60 Hz frames to run
    #[arg(long, value_name = "N", default_value = "1800")]
    pub frames: u32,

    /// Show time at which the second viewer connects
    #[arg(long, value_name = "MS", default_value = "5000")]
    pub join_delay_ms: i64,

    /// Offset of the second viewer's local clock from the server clock
    #[arg(long, value_name = "MS", default_value = "-2500", allow_hyphen_values = true)]
    pub skew_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["livestage", "serve", "--port", "4000"]);
        match cli.command {
            Command::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(4000));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_simulate_defaults() {
        let cli = Cli::parse_from(["livestage", "--config", "show.toml", "simulate"]);
        assert_eq!(cli.config, Some(PathBuf::from("show.toml")));
        match cli.command {
            Command::Simulate(args) => {
                assert_eq!(args.frames, 1800);
                assert_eq!(args.skew_ms, -2500);
                assert!(args.song.contains("fast"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_negative_skew() {
        let cli = Cli::parse_from(["livestage", "simulate", "--skew-ms", "-40000"]);
        match cli.command {
            Command::Simulate(args) => assert_eq!(args.skew_ms, -40_000),
            other => panic!("unexpected {:?}", other),
        }
    }
}
