//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "longplan", version, about = "Longitudinal planner CLI")]
pub struct Cli {
    /// Path to config TOML (typed); built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit plans, summaries and errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Re-plan every row of a recorded drive log (open loop)
    Replay {
        /// Drive log CSV (strict header)
        #[arg(long, value_name = "FILE")]
        log: PathBuf,
        /// Stop after this many cycles (takes precedence over [runner].max_cycles)
        #[arg(long, value_name = "N")]
        max_cycles: Option<u64>,
        /// Sleep to the loop period between cycles
        #[arg(long, action = ArgAction::SetTrue)]
        pace: bool,
    },
    /// Closed-loop drive against the simulated vehicle and lead from [sim]
    Sim {
        /// Override [sim].duration_s
        #[arg(long, value_name = "SECONDS")]
        duration_s: Option<f32>,
        /// Stop after this many cycles (takes precedence over [runner].max_cycles)
        #[arg(long, value_name = "N")]
        max_cycles: Option<u64>,
        /// Sleep to the loop period between cycles
        #[arg(long, action = ArgAction::SetTrue)]
        pace: bool,
    },
    /// Build a planner from the config and run a short simulated drive
    SelfCheck,
}
