use crate::errors::{EngineError, EngineResult};
use chrono::NaiveDate;

/// Strikes for the four condor legs.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SelectedStrikes {
    pub put_buy: f64,
    pub put_sell: f64,
    pub call_sell: f64,
    pub call_buy: f64,
}

/// Caller-pinned strikes. Unset legs are picked from the listed strikes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StrikeOverrides {
    pub put_buy: Option<f64>,
    pub put_sell: Option<f64>,
    pub call_sell: Option<f64>,
    pub call_buy: Option<f64>,
}

/// Picks the default condor from a strike list.
///
/// Selection rules:
///   put_sell  = second-lowest strike
///   put_buy   = lowest strike below put_sell
///   call_sell = second-highest strike
///   call_buy  = lowest strike above call_sell
///
/// Pinned legs replace the defaults and the wings are searched relative to
/// the (possibly pinned) sell strikes.
pub fn select_strikes(listed: &[f64], pinned: StrikeOverrides) -> EngineResult<SelectedStrikes> {
    let mut strikes: Vec<f64> = listed.iter().copied().filter(|k| k.is_finite() && *k > 0.0).collect();
    strikes.sort_by(f64::total_cmp);
    strikes.dedup();

    let put_sell = match pinned.put_sell {
        Some(k) => k,
        None => *strikes
            .get(1)
            .ok_or_else(|| too_few("put sell", strikes.len()))?,
    };
    let put_buy = match pinned.put_buy {
        Some(k) => k,
        None => strikes
            .iter()
            .copied()
            .find(|k| *k < put_sell)
            .ok_or_else(|| no_wing("put buy", "below", put_sell))?,
    };
    let call_sell = match pinned.call_sell {
        Some(k) => k,
        None => *strikes
            .len()
            .checked_sub(2)
            .and_then(|i| strikes.get(i))
            .ok_or_else(|| too_few("call sell", strikes.len()))?,
    };
    let call_buy = match pinned.call_buy {
        Some(k) => k,
        None => strikes
            .iter()
            .copied()
            .find(|k| *k > call_sell)
            .ok_or_else(|| no_wing("call buy", "above", call_sell))?,
    };

    Ok(SelectedStrikes { put_buy, put_sell, call_sell, call_buy })
}

fn too_few(leg: &str, n: usize) -> EngineError {
    EngineError::InvalidInput(format!("need at least 2 listed strikes to pick {leg}, got {n}"))
}

fn no_wing(leg: &str, dir: &str, sell: f64) -> EngineError {
    EngineError::InvalidInput(format!("no listed strike {dir} {sell} for {leg}"))
}

/// Whole calendar days from `today` to `expiry`, zero if already past.
pub fn days_until(expiry: NaiveDate, today: NaiveDate) -> u32 {
    let days = (expiry - today).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}
