use assert_fs::TempDir;
use renumber::config::load_config_from_xml_path;
use renumber::{Config, LogLevel, Order};
use std::fs;

#[test]
fn directory_as_log_file_is_rejected() {
    let td = TempDir::new().unwrap();
    let root = dunce::canonicalize(td.path()).unwrap();
    let cfg = Config {
        log_file: Some(root.clone()),
        ..Config::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(format!("{err}").contains("is a directory"), "{err}");
}

#[test]
fn transcript_in_missing_directory_is_fine() {
    let td = TempDir::new().unwrap();
    let root = dunce::canonicalize(td.path()).unwrap();
    let cfg = Config {
        transcript: Some(root.join("later").join("t.log")),
        ..Config::default()
    };
    cfg.validate().expect("parent is created on open");
}

#[test]
fn whitespace_around_values_is_trimmed() {
    let td = TempDir::new().unwrap();
    let root = dunce::canonicalize(td.path()).unwrap();
    let path = root.join("config.xml");
    fs::write(
        &path,
        "<config>\n  <log_level>\n    info\n  </log_level>\n  <order>  reverse  </order>\n  <disable_locks> true </disable_locks>\n</config>\n",
    )
    .unwrap();
    let cfg = load_config_from_xml_path(&path).unwrap();
    assert_eq!(cfg.log_level, LogLevel::Info);
    assert_eq!(cfg.order, Order::Reverse);
    assert!(cfg.disable_locks);
    assert!(!cfg.run_options().use_lock);
}

#[test]
fn malformed_xml_names_the_file() {
    let td = TempDir::new().unwrap();
    let path = td.path().join("config.xml");
    fs::write(&path, "<config><order>reverse</config>").unwrap();
    let err = load_config_from_xml_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("config.xml"), "{err:#}");
}
