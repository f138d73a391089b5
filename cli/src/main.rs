use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use cache_sim::{
    common::{HitAging, SimulationOption},
    config::CacheConfig,
    report::{CacheDump, Report},
    sim::Simulator,
    trace::Trace,
};
use clap::{Parser, ValueEnum};

#[cfg(feature = "stat")]
use terminal_size::terminal_size;

/// Replays a memory trace through a set-associative cache
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File path to cache config (associativity, line size, total size)
    config: PathBuf,
    /// File path to memory trace (`<R|W>:<size>:<hex address>` per line)
    trace: PathBuf,
    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Keep the age of a line on hit, as the legacy tool did
    #[arg(long)]
    legacy_aging: bool,
    /// Install lines dirty on a write miss
    #[arg(long)]
    dirty_on_write_miss: bool,
    /// Print the final cache contents
    #[arg(long)]
    dump: bool,
    /// Print detailed statistics
    #[arg(long)]
    stats: bool,
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::init();
    }

    let config = read_to_string(&args.config)?;
    let geometry = CacheConfig::parse(&config)
        .and_then(|c| c.geometry())
        .with_context(|| format!("invalid cache config {}", args.config.display()))?;

    let trace = read_to_string(&args.trace)?;
    let trace = Trace::parse(&trace)
        .with_context(|| format!("failed to parse trace {}", args.trace.display()))?;
    log::info!("finished parsing trace. # of references: {}", trace.len());

    let option = SimulationOption {
        hit_aging: if args.legacy_aging {
            HitAging::KeepAge
        } else {
            HitAging::ResetOnHit
        },
        dirty_on_write_miss: args.dirty_on_write_miss,
    };
    let mut sim = Simulator::new(geometry, option);
    sim.run(&trace);
    log::info!("finished simulation.");

    if args.stats {
        output_stat(&sim);
    }
    if args.dump {
        println!("{}", CacheDump::new(sim.model()));
    }
    let output = sim.into_output();
    match args.format {
        Format::Text => print!("{}", Report::new(&output)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&output)?),
    }
    Ok(())
}

#[cfg(not(feature = "stat"))]
fn output_stat(_: &Simulator) {
    log::warn!("statistics are not available: built without the `stat` feature");
}

#[cfg(feature = "stat")]
fn output_stat(sim: &Simulator) {
    let max_width = get_terminal_width().unwrap_or(120) as usize;
    eprintln!("{}", sim.collect_stat().view(max_width));
}

#[cfg(feature = "stat")]
fn get_terminal_width() -> Option<u16> {
    terminal_size().map(|(w, _)| w.0.saturating_sub(20))
}

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
