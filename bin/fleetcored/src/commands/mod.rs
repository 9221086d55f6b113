//! `fleetcored` subcommands.
mod demo;

pub use demo::run as run_demo;
