use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One side (bid or ask) of a closed bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// Bar whose four prices are all `price`.
    pub fn flat(price: f64) -> Self {
        Self {
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }
}

/// Current bar prices for both quote sides. Invalidation reads the bid close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentPrices {
    pub bid: Bar,
    pub ask: Bar,
}

impl CurrentPrices {
    /// Both sides flat at the given bid close, ask shifted by `spread`.
    pub fn from_bid_close(close: f64, spread: f64) -> Self {
        Self {
            bid: Bar::flat(close),
            ask: Bar::flat(close + spread),
        }
    }

    /// Bid-side close, rejected when not a finite price.
    pub fn bid_close(&self) -> Result<f64> {
        let close = self.bid.close;
        if close.is_finite() {
            Ok(close)
        } else {
            Err(Error::MalformedPrice {
                field: "bid.close",
                value: close,
            })
        }
    }
}

/// A detected bullish reversal candle pattern.
///
/// `channel_position` is the pattern's normalized location within its recent
/// trading range (lower = closer to the extreme). `pivot_level` is the price
/// that invalidates the pattern once breached against the trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalDescriptor {
    pub channel_position: f64,
    pub pivot_level: f64,
}

impl SignalDescriptor {
    pub fn new(channel_position: f64, pivot_level: f64) -> Self {
        Self {
            channel_position,
            pivot_level,
        }
    }

    fn validate(&self) -> Result<&Self> {
        if self.channel_position.is_finite() && self.pivot_level.is_finite() {
            Ok(self)
        } else {
            Err(Error::MalformedSeries {
                kind: IndicatorKind::BullishCandles,
                reason: "non-finite candle descriptor",
            })
        }
    }
}

/// The two most recent points of one oscillator line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoints {
    pub previous: f64,
    pub current: f64,
}

impl LinePoints {
    pub fn new(previous: f64, current: f64) -> Self {
        Self { previous, current }
    }

    pub fn is_rising(&self) -> bool {
        self.current > self.previous
    }

    fn is_finite(&self) -> bool {
        self.previous.is_finite() && self.current.is_finite()
    }
}

/// A fast/slow oscillator line pair (stochastic %K/%D, SMI and its signal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillator {
    pub fast: LinePoints,
    pub slow: LinePoints,
}

impl Oscillator {
    pub fn new(fast: LinePoints, slow: LinePoints) -> Self {
        Self { fast, slow }
    }

    /// Pair whose previous points equal the current ones.
    pub fn flat(fast: f64, slow: f64) -> Self {
        Self {
            fast: LinePoints::new(fast, fast),
            slow: LinePoints::new(slow, slow),
        }
    }

    fn validate(&self, kind: IndicatorKind) -> Result<&Self> {
        if self.fast.is_finite() && self.slow.is_finite() {
            Ok(self)
        } else {
            Err(Error::MalformedSeries {
                kind,
                reason: "non-finite oscillator value",
            })
        }
    }
}

/// Indicators the detectors read from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    BullishCandles,
    Stochastic,
    Smi,
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorKind::BullishCandles => write!(f, "bullish candles"),
            IndicatorKind::Stochastic => write!(f, "stochastic"),
            IndicatorKind::Smi => write!(f, "SMI"),
        }
    }
}

/// Indicator values computed on closed-bar data for one bar.
///
/// `bullish_candle` is only present on bars where a pattern fired. The
/// oscillators are expected on every bar; a detector that needs one and finds
/// it missing reports [`Error::MissingSeries`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    #[serde(default)]
    pub bullish_candle: Option<SignalDescriptor>,
    #[serde(default)]
    pub stochastic: Option<Oscillator>,
    #[serde(default)]
    pub smi: Option<Oscillator>,
}

impl IndicatorSnapshot {
    pub fn with_candle(mut self, candle: SignalDescriptor) -> Self {
        self.bullish_candle = Some(candle);
        self
    }

    pub fn with_stochastic(mut self, stochastic: Oscillator) -> Self {
        self.stochastic = Some(stochastic);
        self
    }

    pub fn with_smi(mut self, smi: Oscillator) -> Self {
        self.smi = Some(smi);
        self
    }

    /// The bar's candle pattern, if one fired. A descriptor with a
    /// non-finite channel position or pivot is malformed.
    pub fn bullish_candle(&self) -> Result<Option<SignalDescriptor>> {
        match &self.bullish_candle {
            Some(candle) => Ok(Some(*candle.validate()?)),
            None => Ok(None),
        }
    }

    pub fn stochastic(&self) -> Result<&Oscillator> {
        self.stochastic
            .as_ref()
            .ok_or(Error::MissingSeries(IndicatorKind::Stochastic))?
            .validate(IndicatorKind::Stochastic)
    }

    pub fn smi(&self) -> Result<&Oscillator> {
        self.smi
            .as_ref()
            .ok_or(Error::MissingSeries(IndicatorKind::Smi))?
            .validate(IndicatorKind::Smi)
    }
}

/// Bar period of the series a detector watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    Daily,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::OneMinute => write!(f, "1m"),
            Period::FiveMinutes => write!(f, "5m"),
            Period::FifteenMinutes => write!(f, "15m"),
            Period::ThirtyMinutes => write!(f, "30m"),
            Period::OneHour => write!(f, "1h"),
            Period::FourHours => write!(f, "4h"),
            Period::Daily => write!(f, "1d"),
        }
    }
}

/// One bar of market data together with its indicator snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarUpdate {
    pub pair: String,
    pub period: Period,
    pub timestamp: DateTime<Utc>,
    /// True when the bar has closed. Detectors only see closed bars.
    pub is_bar_closed: bool,
    pub prices: CurrentPrices,
    #[serde(default)]
    pub indicators: IndicatorSnapshot,
}

/// Entry condition confirmed on one bar, emitted by the detector registry.
///
/// Valid for the bar it was emitted on only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySignal {
    /// Name of the configured detector that fired.
    pub detector: String,
    pub pair: String,
    pub period: Period,
    pub timestamp: DateTime<Utc>,
    pub descriptor: SignalDescriptor,
}
