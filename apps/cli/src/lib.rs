//! Library half of the `biogate` binary: argument definitions, logging setup,
//! store wiring and command execution, kept here so they can be tested
//! without spawning the process.

pub mod args;
pub mod commands;
pub mod logging;
pub mod runtime;

pub use args::{Cli, Command};
pub use commands::{Outcome, execute};
