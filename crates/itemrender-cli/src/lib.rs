//! ItemRender command line
//!
//! Drives the configuration manager from a terminal: inspect records,
//! toggle items, adjust transforms and reload after hand edits.

pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod router;

pub use error::{CliError, CliResult};
