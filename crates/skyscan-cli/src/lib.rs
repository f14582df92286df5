//! skyscan CLI - JSON in, JSON out front end for the flight-path engine.
//!
//! Subcommands live in [`commands`]; the `skyscan` binary only parses
//! arguments and wires up logging.

pub mod commands;
pub mod config;

pub use commands::{analyze, smooth, spiral, SpiralOptions, SpiralReport};
pub use config::Config;
