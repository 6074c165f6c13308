//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Mirror a Neat cloud account into a local folder.
///
/// Folders and documents are downloaded depth-first. Already downloaded
/// documents are remembered between attempts, and up to five attempts are
/// made. Missing values are asked for on stdin; the password is always read
/// from stdin.
#[derive(Parser, Debug)]
#[command(name = "neat-mirror")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Neat account username (prompted for when omitted)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Destination directory (prompted for when omitted)
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// API base URL (overrides the config file)
    #[arg(long)]
    pub api_base: Option<String>,

    /// Attempts before giving up (1-20, overrides the config file)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_attempts: Option<u32>,
}

impl Args {
    /// Default tracing level for the flags; `RUST_LOG` still wins.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
