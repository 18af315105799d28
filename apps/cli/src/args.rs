//! # CLI Argument Definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI structure parsing command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "biogate")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Gate features behind platform biometric authentication")]
pub struct Cli {
    /// Configuration file (format picked by extension; `biogate.*` in the working directory by default)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Check whether biometric authentication can be evaluated
    Available,
    /// Show the state of one feature, or of every configured feature
    Status {
        feature: Option<String>,
    },
    /// Require biometric authentication for a feature
    Enable {
        feature: String,
    },
    /// Stop requiring biometric authentication (challenges if currently gated)
    Disable {
        feature: String,
        /// Text shown in the authentication prompt
        #[arg(short, long)]
        reason: String,
    },
    /// Authorize one access to a feature
    Request {
        feature: String,
        /// Text shown in the authentication prompt
        #[arg(short, long)]
        reason: String,
    },
    /// Forget the stored enrollment baseline
    ResetDomainState,
}
