use std::io::Write;

use std::collections::HashMap;
use std::path::Path;

use ragpipe_cli::config::{ENV_PORT, ENV_QDRANT_URL};
use ragpipe_cli::{AppConfig, ConfigError, StoreBackend, build_state};

/// Load `path` with no environment overrides at all.
fn load_isolated(path: &Path) -> ragpipe_cli::config::Result<AppConfig> {
    AppConfig::load_with(Some(path), |_| None)
}

#[test]
fn loads_yaml_file_and_wires_services() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "api:\n  port: 8181\n  collection: books\nchunk:\n  size: 120\n  overlap: 20\nevaluation:\n  collection_name: books_eval\nretrieval:\n  top_k: 4"
    )
    .unwrap();

    let config = load_isolated(file.path()).unwrap();
    assert_eq!(config.api.collection, "books");
    assert_eq!(config.chunk.size, 120);

    let state = build_state(&config, StoreBackend::Memory).unwrap();
    assert_eq!(state.pipeline.collection(), "books");
    assert_eq!(state.pipeline.config().chunk_overlap, 20);
    assert_eq!(state.evaluator.pipeline().collection(), "books_eval");
    assert_eq!(state.evaluator.settings().top_k, 4);
}

#[test]
fn invalid_file_values_fail_validation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "chunk:\n  size: 10\n  overlap: 10").unwrap();

    let err = load_isolated(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let err = load_isolated(Path::new("/no/such/ragpipe.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn overrides_apply_on_top_of_the_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "api:\n  port: 8181\nqdrant:\n  url: http://from-file:6334").unwrap();
    let env = HashMap::from([(ENV_PORT, "9191"), (ENV_QDRANT_URL, "http://from-env:6334")]);

    let config =
        AppConfig::load_with(Some(file.path()), |key| env.get(key).map(|v| v.to_string())).unwrap();

    assert_eq!(config.api.port, 9191);
    assert_eq!(config.qdrant.url, "http://from-env:6334");
}
