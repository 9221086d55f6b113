//! Process wiring for the fleetcore cluster action engine.
//!
//! The engine crates (`fleetcore-*`) are pure libraries with no knowledge of how they
//! are deployed; this crate combines them into a runnable process, the way
//! `bin/replicore` combines `core/*` in the teacher repository. Persistence, provider
//! drivers and the dispatch transport are external collaborators the spec explicitly
//! keeps out of scope (§1), so this binary only ever assembles the in-memory backends
//! the engine ships for its own tests — a real deployment would swap those for
//! database-, queue- and provider-backed implementations of the same traits.
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;

mod commands;
mod config;
mod logging;

pub use config::Conf;

/// Command line interface for the `fleetcored` process.
#[derive(Parser, Debug)]
#[command(name = "fleetcored", about = "fleetcore cluster action engine")]
pub struct Cli {
    /// Path to the process configuration file (YAML). Missing file falls back to
    /// defaults, matching `core/conf`'s precedent.
    #[arg(long, default_value = "fleetcored.yaml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single `ClusterCreate` action end to end against the in-memory engine
    /// stack and print its result code and message.
    Demo {
        /// Desired node capacity for the demo cluster.
        #[arg(long, default_value_t = 1)]
        capacity: i64,
    },
}

/// Initialise the process (config, logging) and dispatch to the requested command.
pub async fn execute(cli: Cli, conf: Conf) -> Result<()> {
    let logger = logging::configure(&conf.logging);
    match cli.command {
        Command::Demo { capacity } => commands::run_demo(logger, conf, capacity).await,
    }
}

/// Parse arguments, load configuration and run the async entry point.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let conf = config::load(&cli.config)?;
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed tokio runtime initialisation")
        .block_on(execute(cli, conf))
}
