use super::Sourced;
use crate::config::AppConfig;
use crate::errors::{EngineError, EngineResult};
use crate::state::OptionType;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// One listed option contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionInstrument {
    pub instrument_name: String,
    pub strike: f64,
    pub option_type: OptionType,
    pub expiration: DateTime<Utc>,
}

impl OptionInstrument {
    #[inline]
    pub fn expiry_date(&self) -> NaiveDate {
        self.expiration.date_naive()
    }
}

/// Active instruments, sorted by strike.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionChain {
    pub instruments: Vec<OptionInstrument>,
}

impl OptionChain {
    pub fn new(mut instruments: Vec<OptionInstrument>) -> Self {
        instruments.sort_by(|a, b| a.strike.total_cmp(&b.strike));
        Self { instruments }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Unique expiry dates (UTC), ascending.
    pub fn expiries(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.instruments.iter().map(|i| i.expiry_date()).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    pub fn for_expiry(&self, date: NaiveDate) -> OptionChain {
        OptionChain {
            instruments: self
                .instruments
                .iter()
                .filter(|i| i.expiry_date() == date)
                .cloned()
                .collect(),
        }
    }

    /// Unique strikes, ascending.
    pub fn strikes(&self) -> Vec<f64> {
        let mut strikes: Vec<f64> = self.instruments.iter().map(|i| i.strike).collect();
        strikes.sort_by(f64::total_cmp);
        strikes.dedup();
        strikes
    }
}

/// Deribit option chain with fallback.
/// On failure the chain is empty and tagged; callers then use the
/// configured fallback strikes.
pub async fn fetch_chain_or_fallback(client: &Client, config: &AppConfig) -> Sourced<OptionChain> {
    match fetch_chain(client, &config.option_chain_base_url, &config.option_currency).await {
        Ok(chain) => {
            tracing::debug!(
                instruments = chain.instruments.len(),
                currency = %config.option_currency,
                "option chain fetched"
            );
            Sourced::live(chain)
        }
        Err(e) => {
            tracing::warn!(error = %e, "option chain fetch failed, using fallback strikes");
            Sourced::fallback(OptionChain::default(), e.to_string())
        }
    }
}

// Deribit public/get_instruments response format (trimmed):
// {
//   "jsonrpc": "2.0",
//   "result": [
//     {
//       "instrument_name": "BTC-27JUN25-102000-P",
//       "strike": 102000.0,
//       "option_type": "put",
//       "expiration_timestamp": 1751011200000,
//       "is_active": true
//     }
//   ]
// }

#[derive(Deserialize)]
struct InstrumentsResponse {
    result: Option<Vec<RawInstrument>>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawInstrument {
    instrument_name: String,
    strike: Option<f64>,
    option_type: Option<String>,
    expiration_timestamp: Option<i64>,
    #[serde(default)]
    is_active: bool,
}

async fn fetch_chain(client: &Client, base_url: &str, currency: &str) -> EngineResult<OptionChain> {
    let url = format!("{}/public/get_instruments", base_url.trim_end_matches('/'));

    let resp = client
        .get(&url)
        .query(&[("currency", currency), ("kind", "option"), ("expired", "false")])
        .send()
        .await
        .map_err(|e| EngineError::DataUnavailable(format!("chain request failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(EngineError::DataUnavailable(format!("chain HTTP {status}: {body}")));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| EngineError::DataUnavailable(format!("chain body: {e}")))?;

    parse_chain(&body)
}

fn parse_chain(body: &str) -> EngineResult<OptionChain> {
    let data: InstrumentsResponse = serde_json::from_str(body)?;

    if let Some(err) = data.error {
        return Err(EngineError::DataUnavailable(format!("chain API error: {err}")));
    }

    let raw = data
        .result
        .ok_or_else(|| EngineError::Parse("no result in instruments response".into()))?;

    let instruments = raw
        .into_iter()
        .filter(|r| r.is_active)
        .filter_map(|r| {
            let strike = r.strike.filter(|k| *k > 0.0 && k.is_finite())?;
            let option_type = r.option_type.as_deref()?.parse::<OptionType>().ok()?;
            let expiration = DateTime::from_timestamp_millis(r.expiration_timestamp?)?;
            Some(OptionInstrument {
                instrument_name: r.instrument_name,
                strike,
                option_type,
                expiration,
            })
        })
        .collect();

    Ok(OptionChain::new(instruments))
}
