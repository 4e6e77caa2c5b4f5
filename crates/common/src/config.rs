use crate::{Error, Result};

/// Runtime configuration loaded from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the TOML file listing the detectors to run.
    pub detector_config_path: String,
    /// Path of the JSON-lines file of recorded bar updates to replay.
    pub bar_feed_path: String,
    /// Capacity of the bar and signal channels between feeder and registry.
    pub channel_capacity: usize,
}

impl Config {
    const DEFAULT_DETECTOR_CONFIG_PATH: &'static str = "config/detectors.toml";
    const DEFAULT_CHANNEL_CAPACITY: usize = 256;

    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Fails on any missing required variable.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let channel_capacity = match optional_env("REPLAY_CHANNEL_CAPACITY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(Error::Config(format!(
                        "REPLAY_CHANNEL_CAPACITY must be a positive integer, got: '{raw}'"
                    )))
                }
            },
            None => Self::DEFAULT_CHANNEL_CAPACITY,
        };

        Ok(Config {
            detector_config_path: optional_env("DETECTOR_CONFIG_PATH")
                .unwrap_or_else(|| Self::DEFAULT_DETECTOR_CONFIG_PATH.to_string()),
            bar_feed_path: required_env("BAR_FEED_PATH")?,
            channel_capacity,
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        Error::Config(format!(
            "Required environment variable '{key}' is not set. Check your .env file."
        ))
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
