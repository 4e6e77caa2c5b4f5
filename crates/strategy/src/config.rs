use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use common::{Period, Result};

/// Top-level detector config file (TOML).
///
/// Example `config/detectors.toml`:
/// ```toml
/// [[detector]]
/// type = "strong_candle_momentum"
/// name = "EURUSD 1h long"
/// pair = "EURUSD"
/// period = "1h"
/// threshold = 20.0
///
/// [detector.params]
/// stoch_floor = 20.0
/// smi_floor = -60.0
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorFileConfig {
    #[serde(rename = "detector", default)]
    pub detectors: Vec<DetectorConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Detector type identifier: "candle_momentum" or "strong_candle_momentum".
    #[serde(rename = "type")]
    pub detector_type: String,
    /// Human-readable name shown in logs and on emitted signals.
    pub name: String,
    /// Trading pair, e.g. "EURUSD".
    pub pair: String,
    /// Bar period the detector is fed with.
    pub period: Period,
    /// Maximum channel position for a candle pattern to be latched.
    pub threshold: f64,
    /// Confirmation-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

impl DetectorFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_detector_list() {
        let cfg = DetectorFileConfig::from_toml_str(
            r#"
            [[detector]]
            type = "candle_momentum"
            name = "EURUSD 1h long"
            pair = "EURUSD"
            period = "1h"
            threshold = 20.0

            [[detector]]
            type = "strong_candle_momentum"
            name = "GBPUSD 4h long"
            pair = "GBPUSD"
            period = "4h"
            threshold = 15.0

            [detector.params]
            smi_floor = -50.0
            "#,
        )
        .unwrap();

        assert_eq!(cfg.detectors.len(), 2);
        assert_eq!(cfg.detectors[0].period, Period::OneHour);
        assert!(cfg.detectors[0].params.is_empty());
        assert_eq!(cfg.detectors[1].detector_type, "strong_candle_momentum");
        assert_eq!(
            cfg.detectors[1].params.get("smi_floor").and_then(|v| v.as_float()),
            Some(-50.0)
        );
    }

    #[test]
    fn unknown_period_is_a_parse_error() {
        let result = DetectorFileConfig::from_toml_str(
            r#"
            [[detector]]
            type = "candle_momentum"
            name = "x"
            pair = "EURUSD"
            period = "2h"
            threshold = 20.0
            "#,
        );
        assert!(matches!(result, Err(common::Error::Toml(_))));
    }
}
