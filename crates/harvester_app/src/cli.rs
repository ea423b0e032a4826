//! Command-line surface of the `harvester` binary.

use std::path::PathBuf;

use clap::Parser;
use harvest_logging::{LogDestination, DEFAULT_LOG_FILE};
use harvester_core::{DEFAULT_PARALLELISM, DEFAULT_TOLERANCE};
use log::LevelFilter;

/// Default type-rules file, resolved against the working directory.
pub const DEFAULT_RULES_FILE: &str = "filetype_config.json";

/// Harvest files of chosen types from the Common Crawl archive.
#[derive(Parser, Debug, Clone)]
#[command(name = "harvester", version)]
pub struct CliArgs {
    /// Number of files to collect for every requested file type.
    #[arg(short, long, value_name = "NUM")]
    pub limit: u64,

    /// File types to collect, e.g. `jpg pdf`.
    #[arg(short, long = "filetypes", value_name = "TYPE", num_args = 1.., required = true)]
    pub filetypes: Vec<String>,

    /// Number of shards processed concurrently.
    #[arg(
        short = 'p',
        long = "num-procs",
        default_value_t = DEFAULT_PARALLELISM,
        value_name = "NUM"
    )]
    pub num_procs: usize,

    /// Directory that receives one subdirectory per file type.
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Failed downloads a host may accumulate before it is skipped.
    #[arg(short, long, default_value_t = DEFAULT_TOLERANCE, value_name = "NUM")]
    pub tolerance: u32,

    /// JSON file mapping file types to detected MIME types and extensions.
    #[arg(short, long, default_value = DEFAULT_RULES_FILE, value_name = "FILE")]
    pub config: PathBuf,

    /// Log file, truncated at startup.
    #[arg(long, default_value = DEFAULT_LOG_FILE, value_name = "FILE")]
    pub log_file: PathBuf,

    /// Log debug detail.
    #[arg(short, long)]
    pub verbose: bool,

    /// Log to the file only.
    #[arg(long)]
    pub quiet: bool,
}

impl CliArgs {
    pub fn log_destination(&self) -> LogDestination {
        if self.quiet {
            LogDestination::File(self.log_file.clone())
        } else {
            LogDestination::Both(self.log_file.clone())
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
