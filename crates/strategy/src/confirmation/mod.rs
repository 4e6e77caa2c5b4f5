pub mod stochastic;
pub mod strong;

pub use stochastic::StochasticConfirmation;
pub use strong::StochSmiConfirmation;

use common::{Error, IndicatorSnapshot, Oscillator, Result};

/// Fast stochastic floor below which a cross is not considered momentum.
pub const DEFAULT_STOCH_FLOOR: f64 = 20.0;

/// Momentum confirmation step of a candle-and-momentum detector.
///
/// `confirms` decides the first confirmation after a candle was latched;
/// `holds` is re-tested on every later bar and revokes the signal when false.
pub trait Confirmation: Send {
    fn name(&self) -> &'static str;

    fn confirms(&self, indicators: &IndicatorSnapshot) -> Result<bool>;

    fn holds(&self, indicators: &IndicatorSnapshot) -> Result<bool> {
        self.confirms(indicators)
    }
}

/// Fast stochastic above slow and above `floor` at the latest point.
pub(crate) fn stochastic_agrees(stochastic: &Oscillator, floor: f64) -> bool {
    stochastic.fast.current > stochastic.slow.current && stochastic.fast.current > floor
}

pub(crate) fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<f64> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stochastic_agreement_needs_cross_and_floor() {
        assert!(stochastic_agrees(&Oscillator::flat(25.0, 18.0), 20.0));
        assert!(!stochastic_agrees(&Oscillator::flat(15.0, 10.0), 20.0));
        assert!(!stochastic_agrees(&Oscillator::flat(40.0, 45.0), 20.0));
        assert!(!stochastic_agrees(&Oscillator::flat(20.0, 10.0), 20.0));
    }

    #[test]
    fn check_range_rejects_nan() {
        assert!(check_range("floor", f64::NAN, 0.0, 100.0).is_err());
        assert_eq!(check_range("floor", 100.0, 0.0, 100.0).unwrap(), 100.0);
    }
}
