//! Configuration loading and service wiring for the `ragpipe` binary.

pub mod app;
pub mod config;

pub use app::{StoreBackend, build_state};
pub use config::{AppConfig, ConfigError};
