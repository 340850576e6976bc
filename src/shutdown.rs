//! Process-wide shutdown coordination.
//! A ctrlc handler sets the flag; the engine polls it before every relocation so
//! an interrupted run stops at a file boundary instead of mid-rename.
//!
//! Notes:
//! - Relaxed atomics are sufficient for a one-way "stop" flag.
//! - `request()` is safe to call from signal handlers.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::RenumberError;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Request a cooperative shutdown (idempotent).
#[inline]
pub fn request() {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

/// Check whether a shutdown has been requested.
#[inline]
pub fn is_requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Fail with `Interrupted` if a shutdown was requested.
pub fn check() -> Result<(), RenumberError> {
    if is_requested() {
        Err(RenumberError::Interrupted)
    } else {
        Ok(())
    }
}

/// Test-only: clear the shutdown flag.
#[cfg(test)]
#[inline]
pub fn reset() {
    SHUTDOWN.store(false, Ordering::Relaxed);
}
