//! repkv: replicated key-value store simulator.
//!
//! Two modes:
//! - **Script mode**: `repkv script.txt`: execute a command file
//! - **Pipe mode**: `repkv`: read commands from stdin until EOF or a
//!   blank line

use clap::Parser;
use repkv_cli::{parse_line, render};
use repkv_engine::Coordinator;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

/// Replicated key-value store simulator.
#[derive(Parser)]
#[command(name = "repkv", version, about)]
struct Cli {
    /// Script file to execute; reads standard input when omitted.
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut coordinator = Coordinator::new();

    let result = match cli.script {
        Some(path) => match File::open(&path) {
            Ok(file) => drive(&mut coordinator, BufReader::new(file), false),
            Err(err) => {
                eprintln!("Failed to open script file {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => drive(&mut coordinator, io::stdin().lock(), true),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error reading commands: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Feed lines into the coordinator; the clock ticks once per executed
/// command. In pipe mode a blank line terminates the session.
fn drive<R: BufRead>(
    coordinator: &mut Coordinator,
    reader: R,
    stop_on_blank: bool,
) -> io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        if stop_on_blank && line.trim().is_empty() {
            break;
        }
        execute_line(coordinator, &line);
    }
    Ok(())
}

fn execute_line(coordinator: &mut Coordinator, line: &str) {
    match parse_line(line) {
        Ok(Some(command)) => {
            for event in coordinator.apply(command) {
                println!("{}", render(&event));
            }
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(%err, line, "rejected input line");
            println!("Invalid input command: {}", line.trim());
        }
    }
}
