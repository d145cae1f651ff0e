use super::PoolConfig;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_loads_defaults() {
    let config = PoolConfig::load(None).expect("Should load default config");

    assert_eq!(config.thread_percentage, 100);
    assert!(config.show_progress);
    assert!(config.resolved_workers() >= 1);
}

#[test]
fn test_custom_toml_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pool.toml");
    fs::write(&path, "max_workers = 3\nshow_progress = false\n").unwrap();

    let config = PoolConfig::load(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(config.max_workers, 3);
    assert!(!config.show_progress);
    assert_eq!(config.resolved_workers(), 3);
}

#[test]
fn test_custom_yaml_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pool.yaml");
    fs::write(&path, "thread_percentage: 50\n").unwrap();

    let config = PoolConfig::load(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(config.thread_percentage, 50);
    assert_eq!(config.max_workers, 0);
}

#[test]
fn test_invalid_percentage_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pool.json");
    fs::write(&path, r#"{ "thread_percentage": 0 }"#).unwrap();

    let err = PoolConfig::load(Some(path.to_str().unwrap())).unwrap_err();
    assert!(err.to_string().contains("thread_percentage"));
}

#[test]
fn test_resolved_workers() {
    let auto = PoolConfig::default();
    assert_eq!(auto.resolved_workers(), num_cpus::get().max(1));

    let explicit = PoolConfig::default().with_workers(Some(5));
    assert_eq!(explicit.resolved_workers(), 5);

    let unchanged = PoolConfig::default().with_workers(None);
    assert_eq!(unchanged.max_workers, 0);

    let tiny = PoolConfig {
        thread_percentage: 1,
        ..PoolConfig::default()
    };
    assert_eq!(tiny.resolved_workers(), 1);
}

#[test]
fn test_resolved_workers_clamps_unvalidated_percentage() {
    let oversized = PoolConfig {
        thread_percentage: 250,
        ..PoolConfig::default()
    };
    assert!(oversized.validate().is_err());
    assert_eq!(oversized.resolved_workers(), num_cpus::get().max(1));

    let zero = PoolConfig {
        thread_percentage: 0,
        ..PoolConfig::default()
    };
    assert!(zero.resolved_workers() >= 1);
}
