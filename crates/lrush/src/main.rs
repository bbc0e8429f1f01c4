//! lrush - line-oriented shell over an LRU cache

mod command;
mod handler;

use anyhow::{Context, Result};
use clap::Parser;
use lrucache::SharedLruCache;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::command::parse_command;
use crate::handler::{CommandHandler, Reply};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of items)
    #[arg(short, long, default_value_t = 1024)]
    capacity: usize,

    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Print one JSON object per reply
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries replies only
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting lrush v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);

    let cache = SharedLruCache::new(args.capacity)
        .with_context(|| format!("failed to create cache with capacity {}", args.capacity))?;
    let handler = CommandHandler::new(cache);

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => {
            info!("Reading commands from {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let stdout = io::stdout();
    let processed = run(&handler, input, stdout.lock(), args.json)?;

    let stats = handler.stats_report();
    info!(
        commands = processed,
        len = stats.len,
        capacity = handler.cache().capacity(),
        hits = stats.hits,
        misses = stats.misses,
        evictions = stats.evictions,
        "Input finished"
    );

    Ok(())
}

/// Execute every command in `input`, writing one reply per command
///
/// Returns the number of commands executed, parse failures included.
fn run<R: BufRead, W: Write>(
    handler: &CommandHandler,
    input: R,
    mut out: W,
    json: bool,
) -> Result<usize> {
    let mut processed = 0;

    for (lineno, line) in input.lines().enumerate() {
        let line = line.context("failed to read command")?;

        let reply = match parse_command(&line) {
            Ok(Some(cmd)) => handler.handle(cmd),
            Ok(None) => continue,
            Err(e) => {
                warn!(line = lineno + 1, "Parse error: {}", e);
                Reply::Error(e)
            }
        };
        processed += 1;

        if json {
            serde_json::to_writer(&mut out, &reply)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", reply)?;
        }
    }

    out.flush()?;
    Ok(processed)
}
