//! # usnfind CLI
//!
//! Command-line adapter over the MFT search core: parses arguments,
//! compiles the requested predicate, wires the parallel coordinator, and
//! maps the result to stdout lines and a process exit code.
//!
//! ## Example Usage
//!
//! ```bash
//! usnfind "report_*.log"
//! usnfind --regex '^img_\d+\.(png|jpg)$' "img"
//! usnfind --distance 3 "config"
//! usnfind --folders --volume C "proj-uuid"
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use usnfind_core::{CancellationToken, FileMatch, Predicate};
use usnfind_ntfs::NtfsError;

const EXIT_SUCCESS: u8 = 0;
const EXIT_NOT_ADMINISTRATOR: u8 = 1;
const EXIT_INVALID_ARGUMENTS: u8 = 2;
const EXIT_NO_ELIGIBLE_VOLUME: u8 = 3;

/// Find files and folders on NTFS volumes by enumerating the Master File
/// Table instead of walking the directory tree.
#[derive(Parser)]
#[command(name = "usnfind")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Name to search for: a glob by default (`*`/`?`), or a regex/fuzzy
    /// query depending on the flags below.
    name: String,

    /// Treat `name` as a regex instead of a glob (mutually exclusive with
    /// `--distance`).
    #[arg(long, conflicts_with = "distance")]
    regex: bool,

    /// Match directories instead of files.
    #[arg(long)]
    folders: bool,

    /// Restrict the search to this drive letter; repeatable. Default: all
    /// ready NTFS volumes.
    #[arg(long = "volume", value_name = "X")]
    volumes: Vec<char>,

    /// Fuzzy match: accept names within this many edits of `name`
    /// (mutually exclusive with `--regex`).
    #[arg(long, value_name = "N", conflicts_with = "regex")]
    distance: Option<u8>,

    /// Show the summary line after results.
    #[arg(long, default_value_t = true, overrides_with = "no_stats")]
    stats: bool,

    /// Suppress the summary line.
    #[arg(long = "no-stats")]
    no_stats: bool,

    /// Sort output paths lexicographically instead of leaving them in
    /// enumeration/arrival order.
    #[arg(long)]
    sort: bool,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(EXIT_INVALID_ARGUMENTS)
        }
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let predicate = compile_predicate(&cli).context("failed to compile name predicate")?;
    let folders = cli.folders;
    let sort = cli.sort;
    let show_stats = cli.stats && !cli.no_stats;

    let volumes = match usnfind_ntfs::select_volumes(&cli.volumes) {
        Ok(v) if v.is_empty() => {
            eprintln!("no eligible NTFS volume found");
            return Ok(EXIT_NO_ELIGIBLE_VOLUME);
        }
        Ok(v) => v,
        Err(e) if e.is_access_denied() => {
            eprintln!("usnfind must be run as administrator to enumerate the MFT");
            return Ok(EXIT_NOT_ADMINISTRATOR);
        }
        Err(e) => bail!(e),
    };

    let cancellation = CancellationToken::new();
    let (tx, rx) = crossbeam_channel::unbounded::<FileMatch>();

    let collector = std::thread::spawn(move || rx.into_iter().collect::<Vec<FileMatch>>());

    let result = usnfind_ntfs::run(volumes, Arc::new(predicate), folders, cancellation, move |m| {
        let _ = tx.send(m);
    });

    let mut collected = collector.join().unwrap_or_default();

    let stats = match result {
        Ok(stats) => stats,
        Err(NtfsError::NoEligibleVolume) => {
            eprintln!("no eligible NTFS volume found");
            return Ok(EXIT_NO_ELIGIBLE_VOLUME);
        }
        Err(e) if e.is_access_denied() => {
            eprintln!("usnfind must be run as administrator to enumerate the MFT");
            return Ok(EXIT_NOT_ADMINISTRATOR);
        }
        Err(e) => bail!(e),
    };

    if sort {
        collected.sort_by(|a, b| a.path.cmp(&b.path));
    }

    for m in &collected {
        println!("{}", m.path);
    }

    if show_stats {
        println!("{}", stats.summary_line());
    }

    Ok(EXIT_SUCCESS)
}

fn compile_predicate(cli: &Cli) -> Result<Predicate, usnfind_core::PredicateError> {
    if let Some(distance) = cli.distance {
        return Ok(Predicate::fuzzy(&cli.name, distance));
    }
    if cli.regex {
        return Predicate::regex(&cli.name);
    }
    Predicate::glob(&cli.name)
}
