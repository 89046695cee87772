pub mod black_scholes;
pub mod payoff;

use crate::errors::EngineResult;
use crate::state::{GreeksParams, GreeksResult, OptionType};

/// Sensitivity models implement this trait.
/// greeks() must be a pure function: deterministic output from inputs only.
/// Send + Sync required for sharing across tokio tasks.
pub trait GreeksModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Per-contract Greeks for a validated parameter set.
    /// Returns finite values or an error. Never panics.
    fn greeks(&self, params: &GreeksParams, option_type: OptionType) -> EngineResult<GreeksResult>;
}

/// Rounds half away from zero to `places` decimals.
#[inline]
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}
