//! `harvester`: collect files of chosen types from the Common Crawl archive.

mod cli;

use std::num::NonZeroUsize;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use harvest_logging::{harvest_error, harvest_info};
use harvester_core::{ConfigError, HarvestConfig, TypeRules};
use harvester_engine::{EngineConfig, HarvestEngine, HarvestSummary, StopReason};

use crate::cli::CliArgs;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(err) = harvest_logging::initialize(args.log_destination(), args.log_level()) {
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(err) if err.downcast_ref::<ConfigError>().is_some() => {
            harvest_error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
        Err(err) => {
            harvest_error!("{err:#}");
            eprintln!("Error: {err:#}");
            eprintln!("Harvest stopped; check the log file for details.");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<HarvestSummary> {
    let type_rules = TypeRules::load(&args.config)
        .with_context(|| format!("Could not load file type rules from {}", args.config.display()))?;
    let max_parallelism = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    let config = HarvestConfig::new(
        args.filetypes,
        args.limit,
        args.num_procs,
        args.output,
        args.tolerance,
        type_rules,
        max_parallelism,
    )?;
    harvest_info!(
        "Collecting {} files each of {:?} into {} with {} workers",
        config.limit,
        config.categories,
        config.output_dir.display(),
        config.parallelism
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(async {
        let engine = HarvestEngine::new(EngineConfig::default())
            .context("Failed to initialize HTTP client")?;
        engine.run(&config).await.context("Harvest failed")
    })
}

fn print_summary(summary: &HarvestSummary) {
    match summary.stop {
        StopReason::QuotaMet => println!("All quotas met."),
        StopReason::CatalogExhausted => println!("Catalog exhausted before all quotas were met."),
    }
    for (category, count) in &summary.counts {
        println!("  {category:<12} {count}");
    }
    println!(
        "Visited {} crawl indexes, processed {} shards, penalized {} hosts.",
        summary.indexes_visited, summary.shards_processed, summary.penalized_hosts
    );
}
