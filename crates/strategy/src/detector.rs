use tracing::debug;

use common::{CurrentPrices, Error, IndicatorSnapshot, Result, SignalDescriptor};

use crate::confirmation::{Confirmation, StochSmiConfirmation, StochasticConfirmation};
use crate::EntryDetector;

/// Where a detector stands in the two-stage entry check.
///
/// A confirmed phase always carries the latched candle, so momentum can never
/// be confirmed without a candle signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Waiting for a qualifying candle pattern.
    Idle,
    /// Candle latched, waiting for momentum to agree.
    Latched(SignalDescriptor),
    /// Candle latched and momentum agreeing: the entry condition holds.
    Confirmed(SignalDescriptor),
}

/// Long-side candle-and-momentum entry detector.
///
/// Entry is a two-step process. First a bullish reversal candle at the
/// channel extreme (`channel_position <= threshold`) is latched, then the
/// injected [`Confirmation`] must agree. Both can happen on the same bar.
/// A bid close below the latched pivot level drops everything, and so does a
/// confirmation that stops holding: a fresh candle is needed afterwards.
#[derive(Debug, Clone)]
pub struct CandleMomentumDetector<C> {
    threshold: f64,
    confirmation: C,
    phase: Phase,
}

/// Detector confirming with a single stochastic pair.
pub type LongCandleMomentumDetector = CandleMomentumDetector<StochasticConfirmation>;

/// Detector confirming with the stochastic pair and the SMI.
pub type LongStrongCandleMomentumDetector = CandleMomentumDetector<StochSmiConfirmation>;

impl<C: Confirmation> CandleMomentumDetector<C> {
    /// Fails with [`Error::InvalidThreshold`] unless `0 < threshold <= 100`.
    pub fn new(threshold: f64, confirmation: C) -> Result<Self> {
        if !(threshold > 0.0 && threshold <= 100.0) {
            return Err(Error::InvalidThreshold(threshold));
        }
        Ok(Self {
            threshold,
            confirmation,
            phase: Phase::Idle,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn candle_signal_appeared(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn momentum_confirmed(&self) -> bool {
        matches!(self.phase, Phase::Confirmed(_))
    }

    /// The latched candle signal, present iff `candle_signal_appeared()`.
    pub fn candle_signal(&self) -> Option<&SignalDescriptor> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Latched(candle) | Phase::Confirmed(candle) => Some(candle),
        }
    }

    pub fn check_entry(
        &mut self,
        prices: &CurrentPrices,
        indicators: &IndicatorSnapshot,
    ) -> Result<Option<SignalDescriptor>> {
        let close = prices.bid_close()?;

        if self.phase == Phase::Idle {
            if let Some(candle) = indicators.bullish_candle()? {
                if candle.channel_position <= self.threshold {
                    debug!(
                        detector = self.confirmation.name(),
                        channel_position = candle.channel_position,
                        pivot = candle.pivot_level,
                        "Candle signal latched"
                    );
                    self.phase = Phase::Latched(candle);
                }
            }
        }

        if let Phase::Latched(candle) = self.phase {
            if self.breaks_pivot(&candle, close) {
                self.reset();
            } else if self.confirmation.confirms(indicators)? {
                debug!(detector = self.confirmation.name(), close, "Momentum confirmed");
                self.phase = Phase::Confirmed(candle);
            }
        }

        // Re-tested on the confirming bar as well, so an exhausted momentum
        // reading can revoke the signal on the bar it confirmed.
        if let Phase::Confirmed(candle) = self.phase {
            if self.breaks_pivot(&candle, close) {
                self.reset();
            } else if !self.confirmation.holds(indicators)? {
                debug!(detector = self.confirmation.name(), close, "Momentum confirmation revoked");
                self.reset();
            }
        }

        Ok(match self.phase {
            Phase::Confirmed(candle) => Some(candle),
            _ => None,
        })
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    fn breaks_pivot(&self, candle: &SignalDescriptor, close: f64) -> bool {
        let broken = close < candle.pivot_level;
        if broken {
            debug!(
                detector = self.confirmation.name(),
                close,
                pivot = candle.pivot_level,
                "Candle signal invalidated below pivot"
            );
        }
        broken
    }
}

impl LongCandleMomentumDetector {
    /// Basic variant with the default stochastic floor (20) and overbought level (80).
    pub fn basic(threshold: f64) -> Result<Self> {
        Self::new(threshold, StochasticConfirmation::default())
    }
}

impl LongStrongCandleMomentumDetector {
    /// Strong variant with the default stochastic floor (20) and SMI floor (-60).
    pub fn strong(threshold: f64) -> Result<Self> {
        Self::new(threshold, StochSmiConfirmation::default())
    }
}

impl<C: Confirmation> EntryDetector for CandleMomentumDetector<C> {
    fn variant(&self) -> &'static str {
        self.confirmation.name()
    }

    fn check_entry(
        &mut self,
        prices: &CurrentPrices,
        indicators: &IndicatorSnapshot,
    ) -> Result<Option<SignalDescriptor>> {
        CandleMomentumDetector::check_entry(self, prices, indicators)
    }

    fn reset(&mut self) {
        CandleMomentumDetector::reset(self)
    }

    fn phase(&self) -> Phase {
        self.phase
    }
}
