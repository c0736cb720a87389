//! Logging setup and re-exports
//!
//! Thin wrapper over `env_logger`. Hosts call [`init`] once at startup with
//! the level from their engine config; per-module directives in `RUST_LOG`
//! still apply on top of it.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system with a default filter level
pub fn init(default_level: log::LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(default_level)
        .init();
}

/// Fallible variant of [`init`] for tests, where several may race to install
/// the global logger
pub fn try_init(default_level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_default_env()
        .filter_level(default_level)
        .try_init()
}
