//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the signal handler and
//! dispatches `run` / `undo` to the library.

use anyhow::{Context, Result, bail};
use std::env;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use renumber::cli::{Args, Command};
use renumber::output as out;
use renumber::{
    CONFIG_ENV_VAR, Config, ConsoleSink, Job, NamePattern, Outcome, RenumberError, Transcript,
    default_config_path, load_config, renumber as renumber_dir, shutdown, undo,
};

use crate::logging::init_tracing;

fn print_config_location() {
    if let Some(raw) = env::var_os(CONFIG_ENV_VAR) {
        out::print_info(&format!(
            "Using {CONFIG_ENV_VAR} (explicit):\n  {}",
            raw.to_string_lossy()
        ));
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("renumber config path:\n  {}", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file there yet; built-in defaults apply.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a config path: {e}")),
    }
}

/// Structured log line for a typed failure; the binary prints the user-facing part.
fn log_failure(e: &RenumberError) {
    let code = e.code();
    let kind = e.kind();
    match e {
        RenumberError::Collision {
            staging_dir: Some(staging_dir),
            names,
        } => {
            error!(code, kind, staging = %staging_dir.display(), collisions = names.len(), "run failed")
        }
        RenumberError::Collision {
            staging_dir: None,
            names,
        } => error!(code, kind, collisions = names.len(), "run refused before staging"),
        RenumberError::PartialFailure {
            staging_dir,
            remaining,
            cause,
        } => {
            error!(code, kind, staging = %staging_dir.display(), remaining = remaining.len(), %cause, "run failed")
        }
        RenumberError::Interrupted => error!(code, kind, "run aborted by user"),
        _ => error!(code, kind, error = %e, "run failed"),
    }
}

fn open_transcript(cfg: &Config) -> Result<Option<Transcript>, RenumberError> {
    cfg.transcript
        .as_deref()
        .map(|p| Transcript::open(p, cfg.dry_run))
        .transpose()
}

fn dispatch(command: &Command, cfg: &Config) -> Result<Outcome, RenumberError> {
    let transcript = open_transcript(cfg)?;
    let mut sink = ConsoleSink;
    match command {
        Command::Run {
            dir,
            prefix,
            extension,
            ..
        } => {
            let pattern = NamePattern::new(prefix, extension)?;
            info!(dir = %dir.display(), pattern = %pattern, order = %cfg.order, "renumber requested");
            let job = Job::new(dir.clone(), pattern);
            let transform = cfg.order.transform();
            renumber_dir(&job, transform.as_ref(), cfg.run_options(), transcript, &mut sink)
        }
        Command::Undo { transcript: source } => {
            info!(transcript = %source.display(), "undo requested");
            undo(source, cfg.run_options(), transcript, &mut sink)
        }
    }
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    if args.print_config {
        print_config_location();
        return Ok(());
    }
    let Some(command) = args.command.clone() else {
        bail!("missing subcommand; try `renumber run --help` or `renumber undo --help`");
    };

    // Build config (may read XML). CLI args override config values.
    let (mut cfg, cfg_path) = load_config().context("load configuration")?;
    args.apply_overrides(&mut cfg);
    cfg.validate()?;

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), cfg.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    // Dropping the guard on SIGINT flushes the file appender.
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; stopping after the current file...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })
        .context("install interrupt handler")?;
    }

    debug!(
        config = ?cfg_path.as_ref().map(|p| p.display().to_string()),
        dry_run = cfg.dry_run,
        locks = !cfg.disable_locks,
        "starting renumber"
    );

    let result = dispatch(&command, &cfg);
    if let Err(e) = &result {
        log_failure(e);
    }

    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result.map(|_| ()).map_err(anyhow::Error::from)
}
