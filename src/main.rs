//! CLI entry point for neat-mirror.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use neat_mirror_core::{
    CliOverrides, Console, Credentials, FileConfig, Orchestrator, ProcessExit, RunLog,
    SyncSettings,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Args;

/// Values gathered from flags and stdin before the run starts.
struct RunInputs {
    credentials: Credentials,
    dest: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(args.log_level());
    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(exit) => ExitCode::from(exit.code()),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(ProcessExit::Fatal.code())
        }
    }
}

fn init_tracing(default_level: &str) {
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

async fn run(args: Args) -> Result<ProcessExit> {
    let file_config = FileConfig::load_default().context("Failed to load configuration")?;

    let inputs = {
        let stdin = io::stdin();
        let mut reader = stdin.lock();
        read_inputs(&args, &mut reader, stdin.is_terminal())?
    };

    let overrides = CliOverrides {
        api_base: args.api_base.clone(),
        max_attempts: args.max_attempts,
    };
    let settings = SyncSettings::resolve(inputs.dest, &file_config, &overrides)
        .context("Invalid configuration")?;

    std::fs::create_dir_all(&settings.dest).with_context(|| {
        format!(
            "Failed to create destination directory '{}'",
            settings.dest.display()
        )
    })?;
    let run_log = RunLog::create(&settings.log_dir(), Local::now()).with_context(|| {
        format!(
            "Failed to create log directory '{}'",
            settings.log_dir().display()
        )
    })?;
    info!(
        dest = %settings.dest.display(),
        api_base = %settings.api_base,
        max_attempts = settings.max_attempts,
        run_log = %run_log.path().display(),
        "neat-mirror starting"
    );

    let console = Console::new(args.quiet, io::stderr().is_terminal());
    let orchestrator = Orchestrator::new(settings, inputs.credentials, run_log, console);
    let final_state = orchestrator.run().await;
    debug!(?final_state, "run finished");

    Ok(ProcessExit::from(final_state))
}

/// Fills in everything not given as a flag from `input`, one line each:
/// username, password, destination.
fn read_inputs(args: &Args, input: &mut impl BufRead, interactive: bool) -> Result<RunInputs> {
    let username = match &args.username {
        Some(username) => username.clone(),
        None => prompt(input, "Enter username: ", interactive)?,
    };
    let password = prompt(input, "Enter password: ", interactive)?;
    let dest = match &args.dest {
        Some(dest) => dest.clone(),
        None => PathBuf::from(prompt(input, "Enter download path: ", interactive)?),
    };

    if username.is_empty() {
        bail!("Username must not be empty");
    }
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    if dest.as_os_str().is_empty() {
        bail!("Download path must not be empty");
    }

    Ok(RunInputs {
        credentials: Credentials::new(username, password),
        dest,
    })
}

fn prompt(input: &mut impl BufRead, label: &str, interactive: bool) -> Result<String> {
    if interactive {
        let mut stdout = io::stdout();
        stdout.write_all(label.as_bytes())?;
        stdout.flush()?;
    }

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        bail!("Expected input for '{}' on stdin", label.trim_end_matches([':', ' ']));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
