use crate::errors::{EngineError, EngineResult};
use crate::models::{round_to, GreeksModel};
use crate::state::{GreeksParams, GreeksResult, OptionType, DAYS_PER_YEAR};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Black-Scholes Greeks for European options, no dividends.
///
/// d1 = (ln(S/K) + (r + sigma^2/2)*T) / (sigma * sqrt(T))
/// d2 = d1 - sigma * sqrt(T)
///
/// Theta is reported per calendar day (annual / 365) and vega per one
/// volatility point (annual / 100). Outputs are rounded to display
/// precision: delta 4, gamma 6, theta 4, vega 4.
pub struct BlackScholesGreeks {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

impl BlackScholesGreeks {
    pub fn new() -> Self {
        Self { normal: Normal::standard() }
    }
}

impl Default for BlackScholesGreeks {
    fn default() -> Self {
        Self::new()
    }
}

impl GreeksModel for BlackScholesGreeks {
    #[inline]
    fn name(&self) -> &'static str {
        "Black-Scholes"
    }

    fn greeks(&self, params: &GreeksParams, option_type: OptionType) -> EngineResult<GreeksResult> {
        let d1 = (params.ln_s_k + (params.rate + params.half_sigma_sq) * params.ttl_years)
            / params.sigma_sqrt_t;
        let d2 = d1 - params.sigma_sqrt_t;

        let pdf_d1 = self.normal.pdf(d1);

        // Shared by both option types
        let gamma = pdf_d1 / (params.spot * params.sigma_sqrt_t);
        let vega_annual = params.spot * pdf_d1 * params.sqrt_t;
        let decay = -(params.spot * pdf_d1 * params.sigma) / (2.0 * params.sqrt_t);
        let carry = params.rate * params.strike * params.discount;

        let (delta, theta_annual) = match option_type {
            OptionType::Call => (self.normal.cdf(d1), decay - carry * self.normal.cdf(d2)),
            OptionType::Put => (-self.normal.cdf(-d1), decay + carry * self.normal.cdf(-d2)),
        };

        let result = GreeksResult {
            delta: round_to(delta, 4),
            gamma: round_to(gamma, 6),
            theta: round_to(theta_annual / DAYS_PER_YEAR, 4),
            vega: round_to(vega_annual / 100.0, 4),
        };

        if [result.delta, result.gamma, result.theta, result.vega]
            .iter()
            .all(|v| v.is_finite())
        {
            Ok(result)
        } else {
            Err(EngineError::Domain(format!(
                "non-finite greeks for S={} K={} T={} sigma={}",
                params.spot, params.strike, params.ttl_years, params.sigma
            )))
        }
    }
}

/// Greeks for a single option from raw inputs.
///
/// Degenerate inputs (T <= 0, sigma <= 0, non-positive spot or strike)
/// fail with `EngineError::Domain`.
pub fn compute_greeks(
    spot: f64,
    strike: f64,
    time_to_expiry_years: f64,
    risk_free_rate: f64,
    vol: f64,
    option_type: OptionType,
) -> EngineResult<GreeksResult> {
    let params = GreeksParams::new(spot, strike, time_to_expiry_years, risk_free_rate, vol)?;
    BlackScholesGreeks::new().greeks(&params, option_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T_WEEK: f64 = 7.0 / 365.0;

    #[test]
    fn test_reference_put_leg() {
        let g = compute_greeks(107_200.0, 102_000.0, T_WEEK, 0.05, 0.25, OptionType::Put).unwrap();
        assert!(g.delta < 0.0 && g.delta > -0.5, "OTM put delta={} should be small negative", g.delta);
        assert!((g.delta + 0.0693).abs() < 0.002, "put delta={} should be near -0.069", g.delta);
        assert!(g.gamma > 0.0, "gamma={}", g.gamma);
        assert!(g.vega > 0.0, "vega={}", g.vega);
        assert!(g.theta < 0.0, "long option theta={} should decay", g.theta);
    }

    #[test]
    fn test_delta_bounds() {
        for &strike in &[60_000.0, 100_000.0, 107_200.0, 114_000.0, 200_000.0] {
            let c = compute_greeks(107_200.0, strike, T_WEEK, 0.05, 0.25, OptionType::Call).unwrap();
            let p = compute_greeks(107_200.0, strike, T_WEEK, 0.05, 0.25, OptionType::Put).unwrap();
            assert!((0.0..=1.0).contains(&c.delta), "call delta={} at K={strike}", c.delta);
            assert!((-1.0..=0.0).contains(&p.delta), "put delta={} at K={strike}", p.delta);
        }
    }

    #[test]
    fn test_put_call_gamma_vega_parity() {
        for &strike in &[95_000.0, 107_200.0, 120_000.0] {
            let c = compute_greeks(107_200.0, strike, 30.0 / 365.0, 0.05, 0.6, OptionType::Call).unwrap();
            let p = compute_greeks(107_200.0, strike, 30.0 / 365.0, 0.05, 0.6, OptionType::Put).unwrap();
            assert_eq!(c.gamma, p.gamma, "gamma parity at K={strike}");
            assert_eq!(c.vega, p.vega, "vega parity at K={strike}");
        }
    }

    #[test]
    fn test_put_call_delta_relation() {
        // Unrounded: delta_call - delta_put = 1. Rounding can shift by 1e-4.
        let c = compute_greeks(100.0, 100.0, 0.5, 0.03, 0.2, OptionType::Call).unwrap();
        let p = compute_greeks(100.0, 100.0, 0.5, 0.03, 0.2, OptionType::Put).unwrap();
        assert!((c.delta - p.delta - 1.0).abs() <= 1.5e-4,"call={} put={}", c.delta, p.delta);
    }

    #[test]
    fn test_textbook_atm_call() {
        // S=K=100, T=1, r=5%, sigma=20%: delta 0.6368, vega 37.52/100, theta -6.414/365
        let g = compute_greeks(100.0, 100.0, 1.0, 0.05, 0.2, OptionType::Call).unwrap();
        assert!((g.delta - 0.6368).abs() < 1e-4, "delta={}", g.delta);
        assert!((g.vega - 0.3752).abs() < 1e-4, "vega={}", g.vega);
        assert!((g.theta - (-6.414 / 365.0)).abs() < 1e-4, "theta={}", g.theta);
        assert!((g.gamma - 0.018_762).abs() < 2e-6, "gamma={}", g.gamma);
    }

    #[test]
    fn test_zero_time_is_domain_error() {
        let err = compute_greeks(107_200.0, 102_000.0, 0.0, 0.05, 0.25, OptionType::Put).unwrap_err();
        assert!(matches!(err, EngineError::Domain(_)), "got {err}");
    }

    #[test]
    fn test_zero_vol_is_domain_error() {
        let err = compute_greeks(107_200.0, 102_000.0, T_WEEK, 0.05, 0.0, OptionType::Call).unwrap_err();
        assert!(matches!(err, EngineError::Domain(_)), "got {err}");
    }

    #[test]
    fn test_negative_time_is_domain_error() {
        assert!(compute_greeks(100.0, 100.0, -0.1, 0.05, 0.2, OptionType::Call).is_err());
    }

    #[test]
    fn test_idempotent() {
        let a = compute_greeks(107_200.0, 112_000.0, T_WEEK, 0.05, 0.25, OptionType::Call).unwrap();
        let b = compute_greeks(107_200.0, 112_000.0, T_WEEK, 0.05, 0.25, OptionType::Call).unwrap();
        assert_eq!(a.delta.to_bits(), b.delta.to_bits());
        assert_eq!(a.gamma.to_bits(), b.gamma.to_bits());
        assert_eq!(a.theta.to_bits(), b.theta.to_bits());
        assert_eq!(a.vega.to_bits(), b.vega.to_bits());
    }

    #[test]
    fn test_model_name() {
        assert_eq!(BlackScholesGreeks::new().name(), "Black-Scholes");
    }
}
