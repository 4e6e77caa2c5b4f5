use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{info, warn};

use common::{BarUpdate, EntrySignal, Error, Result};

use crate::config::{DetectorConfig, DetectorFileConfig};
use crate::confirmation::{StochSmiConfirmation, StochasticConfirmation, DEFAULT_STOCH_FLOOR};
use crate::detector::CandleMomentumDetector;
use crate::{EntryDetector, Phase};

/// Holds one detector per configured pair/period and dispatches closed bars to them.
pub struct DetectorRegistry {
    detectors: Vec<RegisteredDetector>,
}

/// What one bar produced across the detectors that watch it.
#[derive(Debug, Default)]
pub struct BarOutcome {
    pub signals: Vec<EntrySignal>,
    pub failures: Vec<DetectorFailure>,
}

/// A detector that could not evaluate a bar. Its state is left as it was
/// before the failing read.
#[derive(Debug)]
pub struct DetectorFailure {
    pub detector: String,
    pub error: Error,
}

struct RegisteredDetector {
    cfg: DetectorConfig,
    detector: Box<dyn EntryDetector>,
}

impl DetectorRegistry {
    /// Build the registry from config. Unknown detector types and invalid
    /// parameters are configuration errors.
    pub fn from_config(file_cfg: &DetectorFileConfig) -> Result<Self> {
        let mut detectors = Vec::with_capacity(file_cfg.detectors.len());

        for cfg in &file_cfg.detectors {
            let detector = build_detector(cfg)?;
            info!(
                name = %cfg.name,
                pair = %cfg.pair,
                period = %cfg.period,
                variant = detector.variant(),
                threshold = cfg.threshold,
                "Registered detector"
            );
            detectors.push(RegisteredDetector {
                cfg: cfg.clone(),
                detector,
            });
        }

        Ok(Self { detectors })
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Phase of the detector registered under `name`.
    pub fn phase(&self, name: &str) -> Option<Phase> {
        self.detectors
            .iter()
            .find(|d| d.cfg.name == name)
            .map(|d| d.detector.phase())
    }

    /// Process one bar. Returns signals from all detectors watching its pair
    /// and period, alongside the detectors that failed on it.
    ///
    /// Bars that are not closed yet are ignored. Detectors are independent: a
    /// failure in one does not hold back the signals of the others.
    pub fn process(&mut self, update: &BarUpdate) -> BarOutcome {
        let mut outcome = BarOutcome::default();
        if !update.is_bar_closed {
            return outcome;
        }

        for entry in self
            .detectors
            .iter_mut()
            .filter(|d| d.cfg.pair == update.pair && d.cfg.period == update.period)
        {
            match entry.detector.check_entry(&update.prices, &update.indicators) {
                Ok(Some(descriptor)) => {
                    info!(
                        name = %entry.cfg.name,
                        pair = %update.pair,
                        period = %update.period,
                        channel_position = descriptor.channel_position,
                        pivot = descriptor.pivot_level,
                        "Entry signal"
                    );
                    outcome.signals.push(EntrySignal {
                        detector: entry.cfg.name.clone(),
                        pair: update.pair.clone(),
                        period: update.period,
                        timestamp: update.timestamp,
                        descriptor,
                    });
                }
                Ok(None) => {}
                Err(error) => outcome.failures.push(DetectorFailure {
                    detector: entry.cfg.name.clone(),
                    error,
                }),
            }
        }

        outcome
    }

    /// Reset every detector watching `pair`, e.g. after its trade was closed
    /// or abandoned. Returns how many detectors were reset.
    pub fn reset_pair(&mut self, pair: &str) -> usize {
        let mut count = 0;
        for entry in self.detectors.iter_mut().filter(|d| d.cfg.pair == pair) {
            entry.detector.reset();
            count += 1;
        }
        info!(pair, detectors = count, "Detectors reset");
        count
    }

    /// Run the detector dispatch loop.
    /// Reads from `bar_rx`, pushes signals to `signal_tx`.
    /// Detector failures are logged; the other detectors' signals still go out.
    pub async fn run(mut self, mut bar_rx: mpsc::Receiver<BarUpdate>, signal_tx: mpsc::Sender<EntrySignal>) {
        info!(detectors = self.detectors.len(), "DetectorRegistry running");
        while let Some(update) = bar_rx.recv().await {
            let outcome = self.process(&update);
            for failure in &outcome.failures {
                warn!(
                    name = %failure.detector,
                    pair = %update.pair,
                    timestamp = %update.timestamp,
                    error = %failure.error,
                    "Detector failed on bar"
                );
            }
            for signal in outcome.signals {
                if signal_tx.send(signal).await.is_err() {
                    warn!("Signal channel closed, stopping detector registry");
                    return;
                }
            }
        }
        info!("Bar channel closed");
    }
}

// ─── Detector builders ────────────────────────────────────────────────────────

fn build_detector(cfg: &DetectorConfig) -> Result<Box<dyn EntryDetector>> {
    let stoch_floor = param_f64(&cfg.params, "stoch_floor", DEFAULT_STOCH_FLOOR);
    match cfg.detector_type.as_str() {
        "candle_momentum" => {
            let overbought = param_f64(
                &cfg.params,
                "overbought",
                StochasticConfirmation::DEFAULT_OVERBOUGHT,
            );
            let confirmation = StochasticConfirmation::new(stoch_floor, overbought)?;
            Ok(Box::new(CandleMomentumDetector::new(cfg.threshold, confirmation)?))
        }
        "strong_candle_momentum" => {
            let smi_floor = param_f64(&cfg.params, "smi_floor", StochSmiConfirmation::DEFAULT_SMI_FLOOR);
            let confirmation = StochSmiConfirmation::new(stoch_floor, smi_floor)?;
            Ok(Box::new(CandleMomentumDetector::new(cfg.threshold, confirmation)?))
        }
        other => Err(Error::Config(format!(
            "unknown detector type '{other}' for '{}'",
            cfg.name
        ))),
    }
}

fn param_f64(params: &HashMap<String, toml::Value>, key: &str, default: f64) -> f64 {
    params
        .get(key)
        .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::{CurrentPrices, IndicatorSnapshot, Oscillator, Period, SignalDescriptor};

    const CONFIG: &str = r#"
        [[detector]]
        type = "candle_momentum"
        name = "EURUSD 1h basic"
        pair = "EURUSD"
        period = "1h"
        threshold = 0.2

        [[detector]]
        type = "candle_momentum"
        name = "EURUSD 4h basic"
        pair = "EURUSD"
        period = "4h"
        threshold = 0.2

        [[detector]]
        type = "candle_momentum"
        name = "GBPUSD 1h basic"
        pair = "GBPUSD"
        period = "1h"
        threshold = 0.2
    "#;

    fn registry() -> DetectorRegistry {
        DetectorRegistry::from_config(&DetectorFileConfig::from_toml_str(CONFIG).unwrap()).unwrap()
    }

    fn bar(pair: &str, period: Period, closed: bool, indicators: IndicatorSnapshot) -> BarUpdate {
        BarUpdate {
            pair: pair.into(),
            period,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            is_bar_closed: closed,
            prices: CurrentPrices::from_bid_close(1.09, 0.0002),
            indicators,
        }
    }

    fn confirming() -> IndicatorSnapshot {
        IndicatorSnapshot::default()
            .with_candle(SignalDescriptor::new(0.15, 1.08))
            .with_stochastic(Oscillator::flat(25.0, 18.0))
    }

    #[test]
    fn dispatches_only_to_matching_pair_and_period() {
        let mut reg = registry();
        assert_eq!(reg.len(), 3);

        let outcome = reg.process(&bar("EURUSD", Period::OneHour, true, confirming()));
        assert!(outcome.failures.is_empty());
        let signals = outcome.signals;
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].detector, "EURUSD 1h basic");
        assert_eq!(signals[0].descriptor, SignalDescriptor::new(0.15, 1.08));

        assert_eq!(reg.phase("EURUSD 4h basic"), Some(Phase::Idle));
        assert_eq!(reg.phase("GBPUSD 1h basic"), Some(Phase::Idle));
    }

    #[test]
    fn open_bars_are_ignored() {
        let mut reg = registry();
        let outcome = reg.process(&bar("EURUSD", Period::OneHour, false, confirming()));
        assert!(outcome.signals.is_empty());
        assert!(outcome.failures.is_empty());
        assert_eq!(reg.phase("EURUSD 1h basic"), Some(Phase::Idle));
    }

    #[test]
    fn reset_pair_clears_confirmed_detector() {
        let mut reg = registry();
        reg.process(&bar("EURUSD", Period::OneHour, true, confirming()));
        assert!(matches!(reg.phase("EURUSD 1h basic"), Some(Phase::Confirmed(_))));

        assert_eq!(reg.reset_pair("EURUSD"), 2);
        assert_eq!(reg.phase("EURUSD 1h basic"), Some(Phase::Idle));
    }

    #[test]
    fn detector_error_is_reported_by_name() {
        let mut reg = registry();
        let missing_stoch = IndicatorSnapshot::default().with_candle(SignalDescriptor::new(0.1, 1.08));
        let outcome = reg.process(&bar("EURUSD", Period::OneHour, true, missing_stoch));
        assert!(outcome.signals.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].detector, "EURUSD 1h basic");
        assert!(matches!(outcome.failures[0].error, Error::MissingSeries(_)));
    }

    #[test]
    fn failing_detector_does_not_hold_back_its_neighbour() {
        let cfg = DetectorFileConfig::from_toml_str(
            r#"
            [[detector]]
            type = "candle_momentum"
            name = "basic"
            pair = "EURUSD"
            period = "1h"
            threshold = 0.2

            [[detector]]
            type = "strong_candle_momentum"
            name = "strong"
            pair = "EURUSD"
            period = "1h"
            threshold = 0.2
            "#,
        )
        .unwrap();
        let mut reg = DetectorRegistry::from_config(&cfg).unwrap();

        // no SMI on this bar: only the strong detector needs it
        let outcome = reg.process(&bar("EURUSD", Period::OneHour, true, confirming()));

        assert_eq!(outcome.signals.len(), 1);
        assert_eq!(outcome.signals[0].detector, "basic");
        assert_eq!(outcome.signals[0].timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        assert!(matches!(reg.phase("basic"), Some(Phase::Confirmed(_))));

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].detector, "strong");
        assert!(matches!(
            outcome.failures[0].error,
            Error::MissingSeries(common::IndicatorKind::Smi)
        ));
        assert!(matches!(reg.phase("strong"), Some(Phase::Latched(_))));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let cfg = DetectorFileConfig::from_toml_str(
            r#"
            [[detector]]
            type = "rsi"
            name = "x"
            pair = "EURUSD"
            period = "1h"
            threshold = 0.2
            "#,
        )
        .unwrap();
        assert!(matches!(DetectorRegistry::from_config(&cfg), Err(Error::Config(_))));
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let cfg = DetectorFileConfig::from_toml_str(
            r#"
            [[detector]]
            type = "strong_candle_momentum"
            name = "x"
            pair = "EURUSD"
            period = "1h"
            threshold = 0.0
            "#,
        )
        .unwrap();
        assert!(matches!(
            DetectorRegistry::from_config(&cfg),
            Err(Error::InvalidThreshold(_))
        ));
    }

    #[test]
    fn integer_params_are_accepted() {
        let mut params = HashMap::new();
        params.insert("stoch_floor".to_string(), toml::Value::Integer(30));
        assert_eq!(param_f64(&params, "stoch_floor", 20.0), 30.0);
        assert_eq!(param_f64(&params, "overbought", 80.0), 80.0);
    }

    #[tokio::test]
    async fn run_forwards_signals_past_failed_detectors() {
        let reg = registry();
        let (bar_tx, bar_rx) = mpsc::channel(8);
        let (signal_tx, mut signal_rx) = mpsc::channel(8);
        let handle = tokio::spawn(reg.run(bar_rx, signal_tx));

        let missing_stoch = IndicatorSnapshot::default().with_candle(SignalDescriptor::new(0.1, 1.08));
        bar_tx.send(bar("GBPUSD", Period::OneHour, true, missing_stoch)).await.unwrap();
        bar_tx.send(bar("EURUSD", Period::OneHour, true, confirming())).await.unwrap();
        drop(bar_tx);

        let signal = tokio::time::timeout(std::time::Duration::from_secs(1), signal_rx.recv())
            .await
            .expect("timeout")
            .expect("channel closed");
        assert_eq!(signal.pair, "EURUSD");

        handle.await.unwrap();
        assert!(signal_rx.recv().await.is_none());
    }
}
