use std::fs;
use std::path::PathBuf;

use acec::{parse_records, produce_box, Aig, Config};
use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

/// Recover the adder box of an AIGER circuit from detected XOR and adder records
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// AIGER file holding the circuit
    aig: PathBuf,

    /// Record file with `xor` and `add` lines
    records: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Cross-check 2-input XOR records against the circuit
    #[arg(long)]
    check_xors: bool,

    /// Skip the report on how adder boxes feed one another
    #[arg(long)]
    no_connection_check: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).format_timestamp(None).init();

    let aig = Aig::from_aiger(&cli.aig).with_context(|| format!("failed to load circuit from {}", cli.aig.display()))?;

    let text = fs::read_to_string(&cli.records)
        .with_context(|| format!("failed to read records from {}", cli.records.display()))?;
    let (xors, adders) =
        parse_records(&text).with_context(|| format!("failed to parse records in {}", cli.records.display()))?;

    let config = Config {
        verbose: cli.verbose > 0,
        check_xors: cli.check_xors,
        verify_connections: !cli.no_connection_check,
    };

    let adder_box = produce_box(&aig, &xors, &adders, &config).context("adder box recovery failed")?;
    print!("{}", adder_box);

    Ok(())
}
