//! Configuration for an engine session.
//!
//! Every tunable has a compile-time default and can be overridden at runtime
//! via a dedicated environment variable (see [`SessionConfig::from_env`]).

use std::path::PathBuf;
use std::time::Duration;

/// Default bound on the `uci` → `uciok` handshake (in seconds).
const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// Default bound on the `isready` → `readyok` round trip (in seconds).
const DEFAULT_READY_TIMEOUT_SECS: u64 = 30;

/// Default bound on a best-move search (in seconds), independent of search limits.
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;

/// Default time the engine gets to exit after `quit` before it is killed (in milliseconds).
const DEFAULT_QUIT_GRACE_MS: u64 = 200;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Engine executable; spawned with no arguments.
    pub engine_path: PathBuf,
    pub handshake_timeout: Duration,
    pub ready_timeout: Duration,
    pub search_timeout: Duration,
    pub quit_grace: Duration,
}

impl SessionConfig {
    pub fn new(engine_path: impl Into<PathBuf>) -> Self {
        Self {
            engine_path: engine_path.into(),
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            ready_timeout: Duration::from_secs(DEFAULT_READY_TIMEOUT_SECS),
            search_timeout: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
            quit_grace: Duration::from_millis(DEFAULT_QUIT_GRACE_MS),
        }
    }

    /// Build a config for `engine_path`, applying environment overrides.
    ///
    /// Recognised variables (unparseable values fall back to the default):
    /// - `UCI_HANDSHAKE_TIMEOUT_SECS`
    /// - `UCI_READY_TIMEOUT_SECS`
    /// - `UCI_SEARCH_TIMEOUT_SECS`
    /// - `UCI_QUIT_GRACE_MS`
    pub fn from_env(engine_path: impl Into<PathBuf>) -> Self {
        Self {
            engine_path: engine_path.into(),
            handshake_timeout: Duration::from_secs(env_or(
                "UCI_HANDSHAKE_TIMEOUT_SECS",
                DEFAULT_HANDSHAKE_TIMEOUT_SECS,
            )),
            ready_timeout: Duration::from_secs(env_or(
                "UCI_READY_TIMEOUT_SECS",
                DEFAULT_READY_TIMEOUT_SECS,
            )),
            search_timeout: Duration::from_secs(env_or(
                "UCI_SEARCH_TIMEOUT_SECS",
                DEFAULT_SEARCH_TIMEOUT_SECS,
            )),
            quit_grace: Duration::from_millis(env_or("UCI_QUIT_GRACE_MS", DEFAULT_QUIT_GRACE_MS)),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    if let Ok(value) = std::env::var(key) {
        return value.parse().unwrap_or(default);
    }

    default
}
