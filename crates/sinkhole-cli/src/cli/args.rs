//! Command-line argument definitions using clap.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Manage sinkhole settings and the shared log ring.
#[derive(Parser, Debug)]
#[command(name = "sinkhole")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (or set SINKHOLE_CONFIG)
    #[arg(
        short,
        long,
        env = "SINKHOLE_CONFIG",
        global = true,
        default_value = "/etc/sinkhole/sinkhole.toml"
    )]
    pub config: PathBuf,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read and change settings
    Config(ConfigArgs),

    /// Work with the shared log ring
    Log(LogArgs),
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the value of a setting
    Get {
        /// Setting key, e.g. dns.blockingMode
        key: String,

        /// For boolean keys: print nothing, exit 0 if true and 1 if false
        #[arg(short, long)]
        quiet: bool,
    },

    /// Change a setting and save the config file
    Set {
        /// Setting key, e.g. dns.upstreams
        key: String,

        /// New value (JSON array for list settings)
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Print every setting
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,

        /// Only settings that differ from the default
        #[arg(long)]
        modified: bool,
    },

    /// List known keys with their types and allowed values
    Keys,

    /// Rewrite the config file with current values and fresh comments
    Write,

    /// Show config file path
    Path,
}

// ============================================================================
// Log command
// ============================================================================

#[derive(Args, Debug)]
pub struct LogArgs {
    #[command(subcommand)]
    pub command: LogCommands,
}

#[derive(Subcommand, Debug)]
pub enum LogCommands {
    /// Append one line to the ring
    Append {
        /// Message words, joined with spaces
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        message: Vec<String>,

        /// Epoch seconds (default: now)
        #[arg(long)]
        timestamp: Option<i64>,
    },

    /// Print retained lines, optionally resuming after a known id
    Tail {
        /// Next id not yet seen (from a previous nextID)
        #[arg(long = "next-id")]
        next_id: Option<u64>,

        /// Print the API response body
        #[arg(long)]
        json: bool,

        /// Keep polling for new lines until interrupted
        #[arg(short, long)]
        follow: bool,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "500", value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,
    },

    /// Show ring capacity and position
    Info,

    /// Create the ring and append lines read from stdin until EOF
    Record {
        /// Also record this process's own log events
        #[arg(long)]
        self_log: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::parse_from(["sinkhole", "-c", "/tmp/x.toml", "config", "set", "misc.nice", "-5"]);
        assert_eq!(cli.config, PathBuf::from("/tmp/x.toml"));
        let Commands::Config(ConfigArgs {
            command: ConfigCommands::Set { key, value },
        }) = cli.command
        else {
            panic!("expected config set");
        };
        assert_eq!(key, "misc.nice");
        assert_eq!(value, "-5");
    }

    #[test]
    fn test_parse_log_tail() {
        let cli = Cli::parse_from(["sinkhole", "log", "tail", "--next-id", "42", "--json"]);
        let Commands::Log(LogArgs {
            command: LogCommands::Tail { next_id, json, .. },
        }) = cli.command
        else {
            panic!("expected log tail");
        };
        assert_eq!(next_id, Some(42));
        assert!(json);
    }

    #[test]
    fn test_follow_interval_must_be_positive() {
        let err = Cli::try_parse_from(["sinkhole", "log", "tail", "--follow", "--interval-ms", "0"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let cli = Cli::parse_from(["sinkhole", "log", "tail", "--follow", "--interval-ms", "1"]);
        let Commands::Log(LogArgs {
            command: LogCommands::Tail { interval_ms, follow, .. },
        }) = cli.command
        else {
            panic!("expected log tail");
        };
        assert!(follow);
        assert_eq!(interval_ms, 1);
    }
}
