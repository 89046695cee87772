use crate::state::{Condor, LegWarning, PayoffCurve, PayoffPoint, PayoffSummary};

/// Strategy-level scalars for the condor.
///
/// credit     = (put_sell - put_buy) + (call_sell - call_buy)   [premiums]
/// max_loss   = max(put_width, call_width) - credit
/// break_even = [put_sell - credit, call_sell + credit]          [strikes]
///
/// No ordering checks here: the arithmetic stays defined for any strikes.
/// Use `validate` to find out whether the structure makes economic sense.
pub fn compute_summary(condor: &Condor) -> PayoffSummary {
    let total_credit = (condor.put_sell.premium - condor.put_buy.premium)
        + (condor.call_sell.premium - condor.call_buy.premium);
    let put_spread_width = condor.put_sell.strike - condor.put_buy.strike;
    let call_spread_width = condor.call_buy.strike - condor.call_sell.strike;

    PayoffSummary {
        total_credit,
        put_spread_width,
        call_spread_width,
        max_loss: put_spread_width.max(call_spread_width) - total_credit,
        break_even_low: condor.put_sell.strike - total_credit,
        break_even_high: condor.call_sell.strike + total_credit,
    }
}

/// Profit/loss at expiry for a single underlying price.
///
/// The spread payoffs are capped at the wing widths and the long-leg
/// intrinsic is subtracted on top, so beyond a long strike the curve rises
/// by one unit per unit of price instead of staying flat.
#[inline]
pub fn pnl_at(condor: &Condor, summary: &PayoffSummary, price: f64) -> f64 {
    let put_sell = condor.put_sell.strike;
    let put_buy = condor.put_buy.strike;
    let call_sell = condor.call_sell.strike;
    let call_buy = condor.call_buy.strike;

    let put_payoff = if price < put_sell {
        (put_sell - price).min(summary.put_spread_width)
    } else {
        0.0
    };
    let put_protection = if price < put_buy { put_buy - price } else { 0.0 };
    let call_payoff = if price > call_sell {
        (price - call_sell).min(summary.call_spread_width)
    } else {
        0.0
    };
    let call_protection = if price > call_buy { price - call_buy } else { 0.0 };

    summary.total_credit - (put_payoff - put_protection + call_payoff - call_protection)
}

/// Evaluates the expiry payoff at every price in `prices`, in order.
pub fn compute_payoff_curve(condor: &Condor, prices: &[f64]) -> PayoffCurve {
    let summary = compute_summary(condor);
    PayoffCurve {
        points: prices
            .iter()
            .map(|&price| PayoffPoint {
                price,
                pnl: pnl_at(condor, &summary, price),
            })
            .collect(),
    }
}

/// Checks put_buy < put_sell <= spot <= call_sell < call_buy.
/// Violations are reported, never raised.
pub fn validate(condor: &Condor, spot: f64) -> Vec<LegWarning> {
    let put_buy = condor.put_buy.strike;
    let put_sell = condor.put_sell.strike;
    let call_sell = condor.call_sell.strike;
    let call_buy = condor.call_buy.strike;

    let mut warnings = Vec::new();
    if put_buy >= put_sell {
        warnings.push(LegWarning::PutWingInverted { put_buy, put_sell });
    }
    if put_sell > call_sell {
        warnings.push(LegWarning::BodyInverted { put_sell, call_sell });
    }
    if call_sell >= call_buy {
        warnings.push(LegWarning::CallWingInverted { call_sell, call_buy });
    }
    if spot < put_sell {
        warnings.push(LegWarning::SpotBelowPutSell { spot, put_sell });
    }
    if spot > call_sell {
        warnings.push(LegWarning::SpotAboveCallSell { spot, call_sell });
    }
    warnings
}

/// `points` evenly spaced values over [start, end], both ends included.
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// Default chart domain: [spot - half_width, spot + half_width].
#[inline]
pub fn price_range(spot: f64, half_width: f64, points: usize) -> Vec<f64> {
    linspace(spot - half_width, spot + half_width, points)
}
