pub mod confirmation;
pub mod config;
pub mod detector;
pub mod registry;

pub use config::{DetectorConfig, DetectorFileConfig};
pub use confirmation::{Confirmation, StochSmiConfirmation, StochasticConfirmation};
pub use detector::{
    CandleMomentumDetector, LongCandleMomentumDetector, LongStrongCandleMomentumDetector, Phase,
};
pub use registry::{BarOutcome, DetectorFailure, DetectorRegistry};

use common::{CurrentPrices, IndicatorSnapshot, Result, SignalDescriptor};

/// All entry detectors must satisfy this trait.
///
/// A detector is a long-lived, per pair/period/side object that is fed one
/// closed bar at a time in chronological order. It holds no synchronization;
/// never share one instance between concurrent evaluations.
pub trait EntryDetector: Send {
    /// Short identifier of the detector variant, used in logs.
    fn variant(&self) -> &'static str;

    /// Evaluate the latest closed bar.
    ///
    /// Returns the latched candle signal when the entry condition is confirmed
    /// on this bar, `None` otherwise. The descriptor is only valid for this bar.
    fn check_entry(
        &mut self,
        prices: &CurrentPrices,
        indicators: &IndicatorSnapshot,
    ) -> Result<Option<SignalDescriptor>>;

    /// Drop any latched or confirmed signal. Idempotent.
    fn reset(&mut self);

    /// Current position in the latch/confirm state machine.
    fn phase(&self) -> Phase;
}
