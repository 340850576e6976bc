//! Default config/log locations and the symlink-ancestor check used before
//! writing log files.

use anyhow::{Context, Result, anyhow};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Explicit config location; overrides the per-user default.
pub const CONFIG_ENV_VAR: &str = "RENUMBER_CONFIG";

const APP_DIR: &str = "renumber";
const CONFIG_FILE: &str = "config.xml";
const LOG_FILE: &str = "renumber.log";

/// Resolve the config file path.
///
/// `$RENUMBER_CONFIG` wins when set: a relative value is taken from the current
/// directory and an existing directory gets `config.xml` appended. Otherwise
/// `<config dir>/renumber/config.xml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(raw) = env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        let mut p = PathBuf::from(raw);
        if p.is_relative() {
            let cwd = env::current_dir().context("resolve current directory")?;
            p = cwd.join(p);
        }
        if p.is_dir() {
            p.push(CONFIG_FILE);
        }
        return Ok(p);
    }
    let base = config_dir()
        .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or_else(|| anyhow!("cannot determine a config directory; set {CONFIG_ENV_VAR}"))?;
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

/// Default log file: next to an explicitly chosen config file, else
/// `<data dir>/renumber/renumber.log`. Nothing is created here.
pub fn default_log_path() -> Result<PathBuf> {
    if env::var_os(CONFIG_ENV_VAR).is_some_and(|v| !v.is_empty()) {
        let cfg = default_config_path()?;
        let dir = cfg.parent().map(Path::to_path_buf).unwrap_or_default();
        return Ok(dir.join(LOG_FILE));
    }
    let base = data_dir()
        .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share")))
        .ok_or_else(|| anyhow!("cannot determine a data directory"))?;
    Ok(base.join(APP_DIR).join(LOG_FILE))
}

/// True if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        match fs::symlink_metadata(anc) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        p = anc.parent();
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn plain_ancestors_are_not_symlinks() {
        let td = tempdir().unwrap();
        let real = dunce::canonicalize(td.path()).unwrap();
        assert!(!path_has_symlink_ancestor(&real.join("a").join("b.log")).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_ancestor_is_detected() {
        let td = tempdir().unwrap();
        let real = dunce::canonicalize(td.path()).unwrap();
        fs::create_dir(real.join("target")).unwrap();
        std::os::unix::fs::symlink(real.join("target"), real.join("link")).unwrap();
        assert!(path_has_symlink_ancestor(&real.join("link").join("x.log")).unwrap());
    }
}
