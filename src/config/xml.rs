//! XML configuration file.
//!
//! ```xml
//! <config>
//!   <log_level>normal</log_level>
//!   <log_file>/var/log/renumber.log</log_file>
//!   <disable_locks>false</disable_locks>
//!   <order>reverse</order>
//!   <transcript>/srv/scans/renumber.transcript</transcript>
//!   <verbose>false</verbose>
//! </config>
//! ```
//!
//! Every element is optional. Unknown elements are rejected so that a typo
//! does not silently fall back to a default. Values are trimmed; an empty
//! path element means "not set", and `<log_file>default</log_file>` picks the
//! default log location (next to an explicit config, else the data dir).

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::paths::{default_config_path, default_log_path};
use super::types::{Config, LogLevel};
use crate::fs_ops::io_error_with_help;
use crate::rename::Order;

#[derive(Debug, Default, Deserialize)]
#[serde(rename = "config", deny_unknown_fields)]
struct XmlConfig {
    log_level: Option<String>,
    log_file: Option<String>,
    disable_locks: Option<String>,
    order: Option<String>,
    transcript: Option<String>,
    verbose: Option<String>,
}

const DEFAULT_LOG_FILE: &str = "default";

fn non_empty_path(s: Option<&str>) -> Option<PathBuf> {
    s.map(str::trim).filter(|t| !t.is_empty()).map(PathBuf::from)
}

fn parse_bool(field: &str, raw: Option<&str>) -> Result<Option<bool>> {
    let Some(v) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    match v.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(Some(true)),
        "false" | "no" | "0" => Ok(Some(false)),
        _ => bail!("<{field}> expects true or false, got '{v}'"),
    }
}

fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();
    if let Some(s) = parsed.log_level.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        cfg.log_level = s.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
    }
    if let Some(s) = parsed.order.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        cfg.order = s.parse::<Order>().map_err(anyhow::Error::msg)?;
    }
    cfg.log_file = match non_empty_path(parsed.log_file.as_deref()) {
        Some(p) if p.as_os_str().eq_ignore_ascii_case(DEFAULT_LOG_FILE) => Some(default_log_path()?),
        other => other,
    };
    cfg.transcript = non_empty_path(parsed.transcript.as_deref());
    if let Some(b) = parse_bool("disable_locks", parsed.disable_locks.as_deref())? {
        cfg.disable_locks = b;
    }
    if let Some(b) = parse_bool("verbose", parsed.verbose.as_deref())? {
        cfg.verbose = b;
    }
    Ok(cfg)
}

/// Load a Config from a specific XML file.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).map_err(io_error_with_help("read config xml", path))?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid value in '{}'", path.display()))
}

/// Load the config from its resolved location. A missing file yields the
/// defaults; the returned path is `Some` only when a file was read.
pub fn load_config() -> Result<(Config, Option<PathBuf>)> {
    let path = default_config_path()?;
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok((Config::default(), None));
    }
    let cfg = load_config_from_xml_path(&path)?;
    debug!(path = %path.display(), "loaded config");
    Ok((cfg, Some(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn load(xml: &str) -> Result<Config> {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(&p, xml).unwrap();
        load_config_from_xml_path(&p)
    }

    #[test]
    fn full_file_maps_every_field() {
        let cfg = load(
            "<config>\n  <log_level> debug </log_level>\n  <log_file>/tmp/r.log</log_file>\n  \
             <disable_locks>true</disable_locks>\n  <order>sequential</order>\n  \
             <transcript> /tmp/t.log </transcript>\n  <verbose>yes</verbose>\n</config>",
        )
        .unwrap();
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/r.log")));
        assert!(cfg.disable_locks);
        assert_eq!(cfg.order, Order::Sequential);
        assert_eq!(cfg.transcript, Some(PathBuf::from("/tmp/t.log")));
        assert!(cfg.verbose);
        assert!(!cfg.dry_run);
    }

    #[test]
    fn missing_and_empty_elements_use_defaults() {
        let cfg = load("<config><log_file>   </log_file></config>").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(load("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_element_is_rejected() {
        let err = load("<config><download_base>/x</download_base></config>").unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"), "{err:#}");
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(load("<config><order>shuffle</order></config>").is_err());
        assert!(load("<config><verbose>maybe</verbose></config>").is_err());
        assert!(load("<config><log_level>loud</log_level></config>").is_err());
    }

    #[test]
    fn default_marker_selects_default_log_path() {
        let cfg = load("<config><log_file> default </log_file></config>").unwrap();
        assert_eq!(cfg.log_file, Some(default_log_path().unwrap()));
    }
}
