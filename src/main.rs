use std::process::ExitCode;

use renumber::RenumberError;
use renumber::output as out;

mod app;
mod logging;

/// User-facing report of a failed run: the message, then what is left where.
fn report(e: &anyhow::Error) -> u8 {
    let Some(re) = e.downcast_ref::<RenumberError>() else {
        out::print_error(&format!("{e:#}"));
        return 1;
    };
    out::print_error(&re.to_string());
    match re {
        RenumberError::PartialFailure { remaining, .. } if !remaining.is_empty() => {
            out::print_warn("still in the staging directory:");
            out::print_list(remaining.iter().map(|p| p.display().to_string()));
        }
        RenumberError::Collision { names, .. } => {
            out::print_warn("already present in the target directory:");
            out::print_list(names);
        }
        _ => {}
    }
    if re.leaves_directory_modified() {
        out::print_warn(
            "nothing was deleted; move the staged files back by hand or run `renumber undo <transcript>`",
        );
    }
    u8::try_from(re.code()).unwrap_or(1)
}

fn main() -> ExitCode {
    let args = renumber::cli::parse();
    match app::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(report(&e)),
    }
}
