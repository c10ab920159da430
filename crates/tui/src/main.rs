mod renderer;

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use timeline_overlays_core::{CommandRecorder, parse_scenario};

/// Draw the overlays of a scenario file on a terminal timeline
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario JSON (panes, window, entries, overlays)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Print the node commands of one update pass as JSON and exit
    #[arg(long)]
    dump: bool,

    /// Write log output to this file instead of stderr
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    log: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbosity: u8,
}

fn init_logger(args: &Args) -> Result<()> {
    let default_level = match args.verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    builder.format_timestamp_millis();
    if let Some(path) = &args.log {
        let file = File::create(path)
            .with_context(|| format!("cannot create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args)?;

    let data = std::fs::read(&args.scenario)
        .with_context(|| format!("cannot read {}", args.scenario.display()))?;
    let scenario = parse_scenario(&data)
        .with_context(|| format!("invalid scenario {}", args.scenario.display()))?;
    log::info!(
        "loaded {} entries and {} overlays from {}",
        scenario.entries.len(),
        scenario.overlays.len(),
        args.scenario.display()
    );

    if args.dump {
        let mut overlays = scenario.build(CommandRecorder::new())?;
        overlays.update()?;
        let commands = overlays.backend_mut().drain();
        let mut out = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, &commands)?;
        writeln!(out)?;
        return Ok(());
    }

    let overlays = scenario.build(renderer::TerminalBackend::default())?;
    renderer::run(overlays)
}
