//! Filesystem operations used by the rename engine.

mod atomic;
mod helpers;
mod lock;
mod relocator;
mod util;

pub use atomic::relocate_no_clobber;
pub use helpers::{io_error_with_help, io_error_with_help_io};
pub use lock::{DirLock, LOCK_FILE_NAME, try_acquire_dir_lock};
pub use relocator::{DryRunRelocator, FsRelocator, Relocator};
pub use util::{STAGING_DIR_PREFIX, list_dir};

pub(crate) use util::staging_dir_candidate;
