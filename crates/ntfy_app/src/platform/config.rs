//! Environment-driven configuration for the listener binary.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;
use ntfy_core::{SinceWindow, SubscriptionKey};
use ntfy_engine::WorkerConfig;

use super::logging::LogDestination;

pub const ENV_STATE: &str = "NTFY_LISTENER_STATE";
pub const ENV_AUTO_RECONNECT: &str = "NTFY_LISTENER_AUTO_RECONNECT";
pub const ENV_RECONNECT_DELAY: &str = "NTFY_LISTENER_RECONNECT_DELAY";
pub const ENV_BACKFILL: &str = "NTFY_LISTENER_BACKFILL";
pub const ENV_SUBSCRIBE: &str = "NTFY_LISTENER_SUBSCRIBE";
pub const ENV_LOG: &str = "NTFY_LISTENER_LOG";
pub const ENV_LOG_LEVEL: &str = "NTFY_LISTENER_LOG_LEVEL";

const DEFAULT_STATE_FILE: &str = "./ntfy_client_data.ron";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub state_path: PathBuf,
    pub worker: WorkerConfig,
    pub backfill: Option<SinceWindow>,
    pub subscribe: Vec<SubscriptionKey>,
    pub log_destination: LogDestination,
    pub log_level: LevelFilter,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_FILE),
            worker: WorkerConfig::default(),
            backfill: None,
            subscribe: Vec::new(),
            log_destination: LogDestination::default(),
            log_level: LevelFilter::Info,
        }
    }
}

/// A rejected environment value. The default was used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigProblem {
    pub variable: &'static str,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for ConfigProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}='{}' ignored: {}",
            self.variable, self.value, self.reason
        )
    }
}

impl ClientConfig {
    pub fn from_env() -> (Self, Vec<ConfigProblem>) {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source. Problems are returned rather
    /// than logged because the logger depends on this config.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> (Self, Vec<ConfigProblem>) {
        let mut config = Self::default();
        let mut problems = Vec::new();
        let mut reject = |variable: &'static str, value: &str, reason: String| {
            problems.push(ConfigProblem {
                variable,
                value: value.to_string(),
                reason,
            });
        };

        if let Some(path) = non_empty(lookup(ENV_STATE)) {
            config.state_path = PathBuf::from(path);
        }

        if let Some(raw) = non_empty(lookup(ENV_AUTO_RECONNECT)) {
            match parse_flag(&raw) {
                Some(flag) => config.worker.auto_reconnect = flag,
                None => reject(ENV_AUTO_RECONNECT, &raw, "expected true or false".into()),
            }
        }

        if let Some(raw) = non_empty(lookup(ENV_RECONNECT_DELAY)) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.worker.reconnect_delay = Duration::from_secs(secs),
                Err(err) => reject(ENV_RECONNECT_DELAY, &raw, err.to_string()),
            }
        }

        if let Some(raw) = non_empty(lookup(ENV_BACKFILL)) {
            match raw.parse::<SinceWindow>() {
                Ok(since) => config.backfill = Some(since),
                Err(err) => reject(ENV_BACKFILL, &raw, err.to_string()),
            }
        }

        if let Some(raw) = non_empty(lookup(ENV_SUBSCRIBE)) {
            for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                match SubscriptionKey::parse_combined(entry) {
                    Ok(key) => config.subscribe.push(key),
                    Err(err) => reject(ENV_SUBSCRIBE, entry, err.to_string()),
                }
            }
        }

        if let Some(raw) = non_empty(lookup(ENV_LOG)) {
            match raw.parse::<LogDestination>() {
                Ok(destination) => config.log_destination = destination,
                Err(err) => reject(ENV_LOG, &raw, err.to_string()),
            }
        }

        if let Some(raw) = non_empty(lookup(ENV_LOG_LEVEL)) {
            match raw.trim().parse::<LevelFilter>() {
                Ok(level) => config.log_level = level,
                Err(err) => reject(ENV_LOG_LEVEL, &raw, err.to_string()),
            }
        }

        (config, problems)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
