use common::{Error, IndicatorSnapshot, Result};

use super::{check_range, stochastic_agrees, Confirmation, DEFAULT_STOCH_FLOOR};

/// Single stochastic pair confirmation.
///
/// Confirms when fast %K is above slow %D and above the floor. Once
/// confirmed, the signal is revoked if that no longer holds or if both lines
/// sit above the overbought level (exhaustion).
#[derive(Debug, Clone)]
pub struct StochasticConfirmation {
    pub floor: f64,
    pub overbought: f64,
}

impl StochasticConfirmation {
    pub const DEFAULT_OVERBOUGHT: f64 = 80.0;

    pub fn new(floor: f64, overbought: f64) -> Result<Self> {
        let floor = check_range("stoch_floor", floor, 0.0, 100.0)?;
        let overbought = check_range("overbought", overbought, 0.0, 100.0)?;
        if overbought <= floor {
            return Err(Error::InvalidParameter {
                name: "overbought",
                value: overbought,
            });
        }
        Ok(Self { floor, overbought })
    }
}

impl Default for StochasticConfirmation {
    fn default() -> Self {
        Self {
            floor: DEFAULT_STOCH_FLOOR,
            overbought: Self::DEFAULT_OVERBOUGHT,
        }
    }
}

impl Confirmation for StochasticConfirmation {
    fn name(&self) -> &'static str {
        "candle_momentum"
    }

    fn confirms(&self, indicators: &IndicatorSnapshot) -> Result<bool> {
        Ok(stochastic_agrees(indicators.stochastic()?, self.floor))
    }

    fn holds(&self, indicators: &IndicatorSnapshot) -> Result<bool> {
        let stochastic = indicators.stochastic()?;
        let overbought = stochastic.fast.current > self.overbought
            && stochastic.slow.current > self.overbought;
        Ok(stochastic_agrees(stochastic, self.floor) && !overbought)
    }
}
