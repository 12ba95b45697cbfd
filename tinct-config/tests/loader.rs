use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tinct_config::{
    BusConfig, ConfigGuardRailError, ConfigLoadError, ConfigLoader, EnvConfig, StoreConfig,
};

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("tinct.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn loads_explicit_file() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.json");
    let path = write_config(
        &dir,
        &format!(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8088

            [store]
            kind = "file"
            path = "{}"

            [bus]
            kind = "none"

            [engine]
            store_timeout = "1s"
            "#,
            settings.display()
        ),
    );

    let load = ConfigLoader::new()
        .with_config_path(&path)
        .with_env(EnvConfig::default())
        .load()
        .unwrap();

    assert_eq!(load.config.server.bind_address(), "127.0.0.1:8088");
    assert_eq!(load.config.store, StoreConfig::File { path: settings });
    assert_eq!(load.config.bus, BusConfig::None);
    assert_eq!(load.config.engine.store_timeout, Duration::from_secs(1));
    assert_eq!(load.config.metadata.config_path.as_deref(), Some(path.as_path()));
    assert!(!load.config.metadata.env_file_loaded);
    // Only the disabled-bus notice.
    assert_eq!(load.warnings.len(), 1);
}

#[test]
fn environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        [store]
        kind = "memory"

        [bus]
        kind = "inproc"
        "#,
    );

    let env = EnvConfig {
        store_kind: Some("postgres".into()),
        database_url: Some("postgresql://tinct:secret@db:5432/tinct".into()),
        bus_kind: Some("redis".into()),
        redis_url: Some("redis://cache:6379".into()),
        bus_channel: Some("theme_changes".into()),
        ..EnvConfig::default()
    };

    let load = ConfigLoader::new()
        .with_config_path(&path)
        .with_env(env)
        .load()
        .unwrap();

    assert_eq!(
        load.config.store,
        StoreConfig::Postgres {
            url: "postgresql://tinct:secret@db:5432/tinct".into()
        }
    );
    assert_eq!(
        load.config.bus,
        BusConfig::Redis {
            url: "redis://cache:6379".into(),
            channel: "theme_changes".into()
        }
    );
    assert!(load.warnings.is_empty());
}

#[test]
fn postgres_bus_on_a_custom_channel_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[bus]\nkind = \"postgres\"\nchannel = \"theme_changes\"\n");

    let env = EnvConfig {
        database_url: Some("postgres://tinct@db/tinct".into()),
        ..EnvConfig::default()
    };

    let err = ConfigLoader::new()
        .with_config_path(&path)
        .with_env(env)
        .load()
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::PostgresChannelMismatch { .. })
    ));
}

#[test]
fn config_path_from_env_is_used() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server]\nport = 9000\n");

    let load = ConfigLoader::new()
        .with_env(EnvConfig {
            config_path: Some(path),
            ..EnvConfig::default()
        })
        .load()
        .unwrap();

    assert_eq!(load.config.server.port, 9000);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = ConfigLoader::new()
        .with_config_path(dir.path().join("absent.toml"))
        .with_env(EnvConfig::default())
        .load()
        .unwrap_err();

    assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
}

#[test]
fn malformed_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server\nport = ");

    let err = ConfigLoader::new()
        .with_config_path(&path)
        .with_env(EnvConfig::default())
        .load()
        .unwrap_err();

    match err {
        ConfigLoadError::Parse { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn guard_rails_run_after_composition() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        [store]
        kind = "memory"

        [bus]
        kind = "postgres"
        "#,
    );

    let err = ConfigLoader::new()
        .with_config_path(&path)
        .with_env(EnvConfig::default())
        .load()
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::PostgresBusWithoutPostgresStore)
    ));
}

#[test]
fn env_file_is_optional() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[store]\nkind = \"memory\"\n");

    let load = ConfigLoader::new()
        .with_config_path(&path)
        .with_env_file(dir.path().join("missing.env"))
        .load()
        .unwrap();

    assert!(!load.config.metadata.env_file_loaded);
}
