#![deny(missing_docs)]
//! Shared logging utilities for the harvester workspace.
//!
//! This crate provides the `harvest_*` logging macros used across the codebase,
//! the logger initialization used by the binary, and a minimal test initializer.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Default log file, created in the current working directory.
pub const DEFAULT_LOG_FILE: &str = "harvest.log";

/// Destination for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the given file only.
    File(PathBuf),
    /// Write to terminal (stderr for warnings and errors, stdout otherwise).
    Terminal,
    /// Write to both the given file and the terminal.
    Both(PathBuf),
}

/// Errors raised while installing the global logger.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The log file could not be created.
    #[error("could not create log file {}: {source}", .path.display())]
    LogFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A global logger was already installed.
    #[error("logger already initialized")]
    AlreadyInitialized,
}

/// Initialize the global logger.
///
/// The log file, when requested, is truncated so each harvest run starts with
/// a fresh log.
pub fn initialize(destination: LogDestination, level: LevelFilter) -> Result<(), LoggingError> {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File(path) => vec![create_file_logger(&path, level, config)?],
        LogDestination::Terminal => vec![TermLogger::new(
            level,
            config,
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )],
        LogDestination::Both(path) => vec![
            TermLogger::new(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
            create_file_logger(&path, level, config)?,
        ],
    };

    CombinedLogger::init(loggers).map_err(|_| LoggingError::AlreadyInitialized)
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Result<Box<WriteLogger<File>>, LoggingError> {
    let file = File::create(path).map_err(|source| LoggingError::LogFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(WriteLogger::new(level, config, file))
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_log_directory_is_reported() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("no_such_dir").join("harvest.log");

        let err = create_file_logger(&path, LevelFilter::Info, build_config()).err().unwrap();
        assert!(matches!(err, LoggingError::LogFile { .. }));
        assert!(err.to_string().contains("harvest.log"));
    }

    #[test]
    fn file_logger_truncates_existing_log() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("harvest.log");
        std::fs::write(&path, "previous run").unwrap();

        create_file_logger(&path, LevelFilter::Info, build_config()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
