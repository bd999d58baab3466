// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use colorful::Colorful;

use phasescope::cli::{self, Args};
use phasescope::core::scheduler;

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    ctrlc::set_handler(scheduler::request_shutdown)
        .context("Failed to install signal handler")?;

    let report = match cli::run(&args) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red(), e);
            std::process::exit(1);
        }
    };

    if args.json {
        cli::print_json(&report);
    } else {
        cli::print_summary(&report, args.verbose);
        if let Some(path) = &args.snapshot {
            println!("  Snapshot saved to: {}", path.display());
        }
        if let Some(path) = &args.raw_snapshot {
            println!("  Phosphor layer saved to: {}", path.display());
        }
    }

    Ok(())
}
