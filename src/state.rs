use crate::config::AppConfig;
use crate::errors::{EngineError, EngineResult};
use portable_atomic::{AtomicU64, Ordering};
use std::str::FromStr;
use std::sync::Arc;

/// Calendar days per year used for both T and daily theta.
pub const DAYS_PER_YEAR: f64 = 365.0;

// ── Contract Types ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

impl FromStr for OptionType {
    type Err = EngineError;

    /// Accepts "call"/"put" in any case, plus the exchange shorthand "C"/"P".
    /// Anything else is rejected rather than defaulted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(Self::Call),
            "put" | "p" => Ok(Self::Put),
            other => Err(EngineError::InvalidInput(format!(
                "invalid option type: {other:?} (expected call or put)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Position sign: +1 long, -1 short.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Self::Buy => 1.0,
            Self::Sell => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ContractLeg {
    pub strike: f64,
    pub option_type: OptionType,
    /// Quoted premium. Its economic sign comes from the leg's side.
    pub premium: f64,
}

impl ContractLeg {
    #[inline]
    pub fn put(strike: f64, premium: f64) -> Self {
        Self { strike, option_type: OptionType::Put, premium }
    }

    #[inline]
    pub fn call(strike: f64, premium: f64) -> Self {
        Self { strike, option_type: OptionType::Call, premium }
    }
}

/// The four positions of the condor, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegRole {
    PutSell,
    PutBuy,
    CallSell,
    CallBuy,
}

impl LegRole {
    pub const ALL: [LegRole; 4] = [Self::PutSell, Self::PutBuy, Self::CallSell, Self::CallBuy];

    pub fn label(self) -> &'static str {
        match self {
            Self::PutSell => "Put Sell",
            Self::PutBuy => "Put Buy",
            Self::CallSell => "Call Sell",
            Self::CallBuy => "Call Buy",
        }
    }

    #[inline]
    pub fn side(self) -> Side {
        match self {
            Self::PutSell | Self::CallSell => Side::Sell,
            Self::PutBuy | Self::CallBuy => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Condor {
    pub put_buy: ContractLeg,
    pub put_sell: ContractLeg,
    pub call_sell: ContractLeg,
    pub call_buy: ContractLeg,
}

impl Condor {
    /// Builds a condor from (strike, premium) pairs, one per leg.
    pub fn from_quotes(
        put_buy: (f64, f64),
        put_sell: (f64, f64),
        call_sell: (f64, f64),
        call_buy: (f64, f64),
    ) -> Self {
        Self {
            put_buy: ContractLeg::put(put_buy.0, put_buy.1),
            put_sell: ContractLeg::put(put_sell.0, put_sell.1),
            call_sell: ContractLeg::call(call_sell.0, call_sell.1),
            call_buy: ContractLeg::call(call_buy.0, call_buy.1),
        }
    }

    #[inline]
    pub fn leg(&self, role: LegRole) -> &ContractLeg {
        match role {
            LegRole::PutSell => &self.put_sell,
            LegRole::PutBuy => &self.put_buy,
            LegRole::CallSell => &self.call_sell,
            LegRole::CallBuy => &self.call_buy,
        }
    }
}

// ── Market Inputs ──

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct MarketParams {
    pub spot: f64,
    pub risk_free_rate: f64,
    /// Annualized, decimal (0.25 = 25%).
    pub implied_vol: f64,
    pub days_to_expiry: u32,
}

impl MarketParams {
    #[inline]
    pub fn ttl_years(&self) -> f64 {
        f64::from(self.days_to_expiry) / DAYS_PER_YEAR
    }
}

// ── Precomputed Black-Scholes inputs (stack, no alloc) ──

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct GreeksParams {
    pub spot: f64,
    pub strike: f64,
    pub ttl_years: f64,
    pub rate: f64,
    pub sigma: f64,
    // Precomputed
    pub ln_s_k: f64,
    pub sqrt_t: f64,
    pub sigma_sqrt_t: f64,
    pub half_sigma_sq: f64,
    pub discount: f64,
}

impl GreeksParams {
    /// Validates the inputs and precomputes the shared terms.
    /// Fails with a domain error instead of letting NaN/Inf through.
    pub fn new(spot: f64, strike: f64, ttl_years: f64, rate: f64, sigma: f64) -> EngineResult<Self> {
        require_positive("spot", spot)?;
        require_positive("strike", strike)?;
        require_positive("time to expiry", ttl_years)?;
        require_positive("volatility", sigma)?;
        if !rate.is_finite() {
            return Err(EngineError::Domain(format!("risk-free rate must be finite, got {rate}")));
        }

        let sqrt_t = ttl_years.sqrt();
        let sigma_sqrt_t = sigma * sqrt_t;
        Ok(Self {
            spot,
            strike,
            ttl_years,
            rate,
            sigma,
            ln_s_k: (spot / strike).ln(),
            sqrt_t,
            sigma_sqrt_t,
            half_sigma_sq: 0.5 * sigma * sigma,
            discount: (-rate * ttl_years).exp(),
        })
    }
}

fn require_positive(name: &str, value: f64) -> EngineResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::Domain(format!("{name} must be positive and finite, got {value}")))
    }
}

// ── Engine Outputs ──

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct GreeksResult {
    pub delta: f64,
    pub gamma: f64,
    /// Per calendar day.
    pub theta: f64,
    /// Per 1 percentage point of implied vol.
    pub vega: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct LegGreeks {
    pub leg: &'static str,
    pub role: LegRole,
    pub strike: f64,
    pub option_type: OptionType,
    pub greeks: GreeksResult,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PayoffSummary {
    pub total_credit: f64,
    pub put_spread_width: f64,
    pub call_spread_width: f64,
    pub max_loss: f64,
    pub break_even_low: f64,
    pub break_even_high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PayoffPoint {
    pub price: f64,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct PayoffCurve {
    pub points: Vec<PayoffPoint>,
}

impl PayoffCurve {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn min_pnl(&self) -> Option<f64> {
        self.points.iter().map(|p| p.pnl).min_by(f64::total_cmp)
    }

    pub fn max_pnl(&self) -> Option<f64> {
        self.points.iter().map(|p| p.pnl).max_by(f64::total_cmp)
    }
}

/// Non-fatal ordering violations. The payoff formulas still evaluate.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LegWarning {
    PutWingInverted { put_buy: f64, put_sell: f64 },
    CallWingInverted { call_sell: f64, call_buy: f64 },
    SpotBelowPutSell { spot: f64, put_sell: f64 },
    SpotAboveCallSell { spot: f64, call_sell: f64 },
    BodyInverted { put_sell: f64, call_sell: f64 },
}

impl std::fmt::Display for LegWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PutWingInverted { put_buy, put_sell } => {
                write!(f, "put buy strike {put_buy} is not below put sell strike {put_sell}")
            }
            Self::CallWingInverted { call_sell, call_buy } => {
                write!(f, "call buy strike {call_buy} is not above call sell strike {call_sell}")
            }
            Self::SpotBelowPutSell { spot, put_sell } => {
                write!(f, "spot {spot} is below put sell strike {put_sell}")
            }
            Self::SpotAboveCallSell { spot, call_sell } => {
                write!(f, "spot {spot} is above call sell strike {call_sell}")
            }
            Self::BodyInverted { put_sell, call_sell } => {
                write!(f, "put sell strike {put_sell} is above call sell strike {call_sell}")
            }
        }
    }
}

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub evaluations: AtomicU64,
    pub greeks_requests: AtomicU64,
    pub client_errors: AtomicU64,
    pub spot_fallbacks: AtomicU64,
    pub chain_fallbacks: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            evaluations: AtomicU64::new(0),
            greeks_requests: AtomicU64::new(0),
            client_errors: AtomicU64::new(0),
            spot_fallbacks: AtomicU64::new(0),
            chain_fallbacks: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// ── Application shared state ──

pub struct AppState {
    pub config: AppConfig,
    pub http: reqwest::Client,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .pool_max_idle_per_host(4)
            .build()
            .unwrap_or_default();

        Arc::new(Self {
            config,
            http,
            counters: PerfCounters::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_type_parsing() {
        assert_eq!("call".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!(" PUT ".parse::<OptionType>().unwrap(), OptionType::Put);
        assert_eq!("C".parse::<OptionType>().unwrap(), OptionType::Call);
        let err = "straddle".parse::<OptionType>().unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)), "got {err}");
    }

    #[test]
    fn test_leg_roles_map_to_condor_legs() {
        let condor = Condor::from_quotes(
            (100_000.0, 280.0),
            (102_000.0, 420.0),
            (112_000.0, 400.0),
            (114_000.0, 260.0),
        );
        assert_eq!(condor.leg(LegRole::PutBuy).option_type, OptionType::Put);
        assert_eq!(condor.leg(LegRole::CallBuy).option_type, OptionType::Call);
        assert_eq!(condor.leg(LegRole::PutSell).strike, 102_000.0);
        assert_eq!(LegRole::CallSell.side(), Side::Sell);
        assert_eq!(LegRole::CallBuy.side().sign(), 1.0);
    }

    #[test]
    fn test_greeks_params_guard_degenerate_inputs() {
        assert!(matches!(
            GreeksParams::new(100.0, 100.0, 0.0, 0.05, 0.2),
            Err(EngineError::Domain(_))
        ));
        assert!(matches!(
            GreeksParams::new(100.0, 100.0, 0.1, 0.05, 0.0),
            Err(EngineError::Domain(_))
        ));
        assert!(matches!(
            GreeksParams::new(-1.0, 100.0, 0.1, 0.05, 0.2),
            Err(EngineError::Domain(_))
        ));
        assert!(matches!(
            GreeksParams::new(100.0, 100.0, 0.1, f64::NAN, 0.2),
            Err(EngineError::Domain(_))
        ));
        assert!(GreeksParams::new(100.0, 100.0, 0.1, -0.01, 0.2).is_ok());
    }

    #[test]
    fn test_ttl_years_uses_calendar_days() {
        let m = MarketParams { spot: 1.0, risk_free_rate: 0.0, implied_vol: 0.2, days_to_expiry: 73 };
        assert!((m.ttl_years() - 0.2).abs() < 1e-15);
    }
}
