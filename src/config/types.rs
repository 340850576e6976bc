//! Runtime settings and the program log level.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::rename::{Order, RunOptions};

/// Program-defined verbosity exposed to users and config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    #[default]
    Normal,
    /// Engine decisions (plan size, cleanup)
    Info,
    /// Every phase transition and relocation
    Debug,
}

impl LogLevel {
    /// Case-insensitive, with a few aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        })
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Settings for one invocation, after XML and CLI have been merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: LogLevel,
    /// Optional log file in addition to stderr
    pub log_file: Option<PathBuf>,
    /// JSON log lines instead of the compact human format
    pub json: bool,
    pub dry_run: bool,
    /// One line per relocation instead of a summary
    pub verbose: bool,
    /// Skip the advisory `.renumber.lock` (filesystems without flock)
    pub disable_locks: bool,
    /// Index transform for `run`
    pub order: Order,
    /// Append relocation events here
    pub transcript: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Normal,
            log_file: None,
            json: false,
            dry_run: false,
            verbose: false,
            disable_locks: false,
            order: Order::Reverse,
            transcript: None,
        }
    }
}

impl Config {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            verbose: self.verbose,
            use_lock: !self.disable_locks,
        }
    }
}
