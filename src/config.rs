use crate::errors::{EngineError, EngineResult};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub spot_api_base_url: String,
    pub spot_asset_id: String,
    pub spot_vs_currency: String,
    pub option_chain_base_url: String,
    pub option_currency: String,
    pub fallback_spot: f64,
    pub fallback_strikes: Vec<f64>,
    pub defaults: CondorDefaults,
    pub http_timeout_secs: u64,
    pub server_port: u16,
}

/// Inputs used when a request does not override them.
#[derive(Debug, Clone, Copy)]
pub struct CondorDefaults {
    pub put_sell_premium: f64,
    pub put_buy_premium: f64,
    pub call_sell_premium: f64,
    pub call_buy_premium: f64,
    pub risk_free_rate: f64,
    /// Annualized implied vol in percent (25.0 = 25%).
    pub implied_vol_pct: f64,
    pub days_to_expiry: u32,
    pub range_half_width: f64,
    pub range_points: usize,
}

impl Default for CondorDefaults {
    fn default() -> Self {
        Self {
            put_sell_premium: 420.0,
            put_buy_premium: 280.0,
            call_sell_premium: 400.0,
            call_buy_premium: 260.0,
            risk_free_rate: 0.05,
            implied_vol_pct: 25.0,
            days_to_expiry: 7,
            range_half_width: 10_000.0,
            range_points: 500,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            spot_api_base_url: "https://api.coingecko.com/api/v3".into(),
            spot_asset_id: "bitcoin".into(),
            spot_vs_currency: "usd".into(),
            option_chain_base_url: "https://www.deribit.com/api/v2".into(),
            option_currency: "BTC".into(),
            fallback_spot: 107_200.0,
            fallback_strikes: vec![100_000.0, 102_000.0, 112_000.0, 114_000.0],
            defaults: CondorDefaults::default(),
            http_timeout_secs: 5,
            server_port: 3001,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();

        let base = Self::default();
        let d = base.defaults;

        let defaults = CondorDefaults {
            put_sell_premium: env_parse_or("PUT_SELL_PREMIUM", d.put_sell_premium)?,
            put_buy_premium: env_parse_or("PUT_BUY_PREMIUM", d.put_buy_premium)?,
            call_sell_premium: env_parse_or("CALL_SELL_PREMIUM", d.call_sell_premium)?,
            call_buy_premium: env_parse_or("CALL_BUY_PREMIUM", d.call_buy_premium)?,
            risk_free_rate: env_parse_or("RISK_FREE_RATE", d.risk_free_rate)?,
            implied_vol_pct: env_parse_or("IMPLIED_VOL_PCT", d.implied_vol_pct)?,
            days_to_expiry: env_parse_or("DEFAULT_DAYS_TO_EXPIRY", d.days_to_expiry)?,
            range_half_width: env_parse_or("PRICE_RANGE_HALF_WIDTH", d.range_half_width)?,
            range_points: env_parse_or("PRICE_RANGE_POINTS", d.range_points)?,
        };

        let fallback_strikes = match std::env::var("FALLBACK_STRIKES") {
            Ok(raw) => parse_strike_list(&raw)
                .map_err(|e| EngineError::Config(format!("FALLBACK_STRIKES: {e}")))?,
            Err(_) => base.fallback_strikes,
        };

        Ok(Self {
            spot_api_base_url: env_var_or("SPOT_API_BASE_URL", &base.spot_api_base_url),
            spot_asset_id: env_var_or("SPOT_ASSET_ID", &base.spot_asset_id),
            spot_vs_currency: env_var_or("SPOT_VS_CURRENCY", &base.spot_vs_currency),
            option_chain_base_url: env_var_or("OPTION_CHAIN_BASE_URL", &base.option_chain_base_url),
            option_currency: env_var_or("OPTION_CURRENCY", &base.option_currency),
            fallback_spot: env_parse_or("FALLBACK_SPOT", base.fallback_spot)?,
            fallback_strikes,
            defaults,
            http_timeout_secs: env_parse_or("HTTP_TIMEOUT_SECS", base.http_timeout_secs)?,
            server_port: env_parse_or("SERVER_PORT", base.server_port)?,
        })
    }
}

/// Parses a comma-separated strike list, e.g. "100000,102000,112000".
/// The result is sorted ascending.
pub fn parse_strike_list(raw: &str) -> Result<Vec<f64>, String> {
    let mut strikes = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|e| format!("{s}: {e}"))
                .and_then(|k| {
                    if k > 0.0 && k.is_finite() {
                        Ok(k)
                    } else {
                        Err(format!("strike must be positive: {s}"))
                    }
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if strikes.is_empty() {
        return Err("empty strike list".into());
    }
    strikes.sort_by(f64::total_cmp);
    Ok(strikes)
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T>(key: &str, default: T) -> EngineResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| EngineError::Config(format!("{key}: {e}"))),
        Err(_) => Ok(default),
    }
}
