use common::{IndicatorSnapshot, Oscillator, Result};

use super::{check_range, stochastic_agrees, Confirmation, DEFAULT_STOCH_FLOOR};

/// Stochastic pair plus Stochastic Momentum Index confirmation.
///
/// Both readings must agree: the stochastic cross above its floor, and an SMI
/// that is either rising on both lines or has its fast line rising, above the
/// SMI floor and above the slow line. The same predicate is re-tested on every
/// bar after confirmation; there is no separate overbought override.
#[derive(Debug, Clone)]
pub struct StochSmiConfirmation {
    pub stoch_floor: f64,
    pub smi_floor: f64,
}

impl StochSmiConfirmation {
    pub const DEFAULT_SMI_FLOOR: f64 = -60.0;

    pub fn new(stoch_floor: f64, smi_floor: f64) -> Result<Self> {
        Ok(Self {
            stoch_floor: check_range("stoch_floor", stoch_floor, 0.0, 100.0)?,
            smi_floor: check_range("smi_floor", smi_floor, -100.0, 100.0)?,
        })
    }

    fn smi_agrees(&self, smi: &Oscillator) -> bool {
        let both_rising = smi.fast.is_rising() && smi.slow.is_rising();
        let fast_leads = smi.fast.current > self.smi_floor
            && smi.fast.is_rising()
            && smi.fast.current > smi.slow.current;
        both_rising || fast_leads
    }
}

impl Default for StochSmiConfirmation {
    fn default() -> Self {
        Self {
            stoch_floor: DEFAULT_STOCH_FLOOR,
            smi_floor: Self::DEFAULT_SMI_FLOOR,
        }
    }
}

impl Confirmation for StochSmiConfirmation {
    fn name(&self) -> &'static str {
        "strong_candle_momentum"
    }

    fn confirms(&self, indicators: &IndicatorSnapshot) -> Result<bool> {
        let smi = indicators.smi()?;
        let stochastic = indicators.stochastic()?;
        Ok(stochastic_agrees(stochastic, self.stoch_floor) && self.smi_agrees(smi))
    }
}
