use thiserror::Error;

use crate::IndicatorKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid threshold level {0}: must be within (0, 100]")]
    InvalidThreshold(f64),

    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Indicator series missing for current bar: {0}")]
    MissingSeries(IndicatorKind),

    #[error("Malformed {kind} series: {reason}")]
    MalformedSeries {
        kind: IndicatorKind,
        reason: &'static str,
    },

    #[error("Malformed price {field}: {value}")]
    MalformedPrice { field: &'static str, value: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
