//! Configuration for the counter binary.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which store strategy the state holder uses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Value lives in the state holder
    #[default]
    Memory,
    /// Value lives in an in-memory repository the state holder delegates to
    Repository,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => Ok(Self::Memory),
            "repository" | "repo" => Ok(Self::Repository),
            other => Err(format!("unknown counter backend: {other}")),
        }
    }
}

/// Counter configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Store strategy (`COUNTER_BACKEND`, default `memory`)
    pub backend: Backend,
    /// Starting value (`COUNTER_INITIAL`, default 0)
    pub initial: i64,
    /// Graceful shutdown timeout in seconds (`COUNTER_SHUTDOWN_TIMEOUT_SECS`, default 5)
    pub shutdown_timeout: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            initial: 0,
            shutdown_timeout: 5,
        }
    }
}

impl CounterConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            backend: parse_or(&lookup, "COUNTER_BACKEND", defaults.backend),
            initial: parse_or(&lookup, "COUNTER_INITIAL", defaults.initial),
            shutdown_timeout: parse_or(
                &lookup,
                "COUNTER_SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout,
            ),
        }
    }

    /// Shutdown timeout as a `Duration`
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(key, value = %raw, error = %e, "invalid configuration value, using default");
            default
        }),
    }
}
