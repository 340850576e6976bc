//! CLI definition and parsing.
//!
//! Notes:
//! - Global flags may appear before or after the subcommand.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::rename::Order;

/// Collision-free bulk renumbering of numbered file sets.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Record what would happen without touching the filesystem.
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Print one line per relocation instead of a summary.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Append every relocation to this transcript (needed for `undo`).
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub transcript: Option<PathBuf>,

    /// Disable the advisory directory lock (for filesystems without flock).
    #[arg(long, global = true)]
    pub disable_locks: bool,

    /// Enable debug logging (shorthand for --log-level debug).
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Set log level: quiet, normal, info, debug.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Emit logs in structured JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Print the config file location and exit.
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Renumber PREFIX<digits>.EXTENSION files in DIR.
    Run {
        #[arg(value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        /// Text before the number (may be empty: "").
        #[arg(allow_hyphen_values = true)]
        prefix: String,
        /// Extension without the dot (a leading dot is accepted).
        extension: String,
        /// Index transform; defaults to the config value, else reverse.
        #[arg(long, value_enum)]
        order: Option<Order>,
    },
    /// Move every file of the last run recorded in TRANSCRIPT back.
    Undo {
        #[arg(value_hint = ValueHint::FilePath)]
        transcript: PathBuf,
    },
}

impl Args {
    /// Precedence: --debug > --log-level > None (use config).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.clone()
    }

    /// Apply CLI overrides to a loaded Config. Unset flags leave it alone.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
        if self.verbose {
            cfg.verbose = true;
        }
        if self.disable_locks {
            cfg.disable_locks = true;
        }
        if self.json {
            cfg.json = true;
        }
        if let Some(t) = &self.transcript {
            cfg.transcript = Some(t.clone());
        }
        if let Some(Command::Run {
            order: Some(order), ..
        }) = &self.command
        {
            cfg.order = *order;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
