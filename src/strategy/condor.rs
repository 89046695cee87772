use crate::errors::EngineResult;
use crate::models::payoff;
use crate::models::{round_to, GreeksModel};
use crate::state::*;
use smallvec::SmallVec;

/// Everything the presentation layer needs for one parameter set.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CondorReport {
    pub market: MarketParams,
    pub condor: Condor,
    pub summary: PayoffSummary,
    pub curve: PayoffCurve,
    pub legs: SmallVec<[LegGreeks; 4]>,
    /// Signed sum over the legs: sold legs count -1, bought legs +1.
    pub net: GreeksResult,
    pub warnings: Vec<LegWarning>,
}

/// Greeks for the four legs in display order (Put Sell, Put Buy, Call Sell, Call Buy).
pub fn leg_greeks(
    model: &dyn GreeksModel,
    condor: &Condor,
    market: &MarketParams,
) -> EngineResult<SmallVec<[LegGreeks; 4]>> {
    let ttl_years = market.ttl_years();

    LegRole::ALL
        .iter()
        .map(|&role| -> EngineResult<LegGreeks> {
            let leg = condor.leg(role);
            let params = GreeksParams::new(
                market.spot,
                leg.strike,
                ttl_years,
                market.risk_free_rate,
                market.implied_vol,
            )?;
            Ok(LegGreeks {
                leg: role.label(),
                role,
                strike: leg.strike,
                option_type: leg.option_type,
                greeks: model.greeks(&params, leg.option_type)?,
            })
        })
        .collect()
}

/// Position Greeks of the whole structure, one contract per leg.
pub fn net_greeks(legs: &[LegGreeks]) -> GreeksResult {
    let (delta, gamma, theta, vega) = legs.iter().fold((0.0, 0.0, 0.0, 0.0), |acc, l| {
        let sign = l.role.side().sign();
        (
            acc.0 + sign * l.greeks.delta,
            acc.1 + sign * l.greeks.gamma,
            acc.2 + sign * l.greeks.theta,
            acc.3 + sign * l.greeks.vega,
        )
    });

    GreeksResult {
        delta: round_to(delta, 4),
        gamma: round_to(gamma, 6),
        theta: round_to(theta, 4),
        vega: round_to(vega, 4),
    }
}

/// Runs both engines over one parameter set.
/// Ordering problems are logged and returned as warnings; Greeks domain
/// errors propagate.
pub fn evaluate(
    model: &dyn GreeksModel,
    condor: &Condor,
    market: &MarketParams,
    prices: &[f64],
) -> EngineResult<CondorReport> {
    let summary = payoff::compute_summary(condor);
    let curve = payoff::compute_payoff_curve(condor, prices);

    let warnings = payoff::validate(condor, market.spot);
    for w in &warnings {
        tracing::warn!(warning = %w, "condor ordering violated");
    }

    let legs = leg_greeks(model, condor, market)?;
    let net = net_greeks(&legs);

    tracing::debug!(
        model = model.name(),
        credit = summary.total_credit,
        max_loss = summary.max_loss,
        points = curve.len(),
        "condor evaluated"
    );

    Ok(CondorReport {
        market: *market,
        condor: *condor,
        summary,
        curve,
        legs,
        net,
        warnings,
    })
}
