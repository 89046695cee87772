use super::Sourced;
use crate::config::AppConfig;
use crate::errors::{EngineError, EngineResult};
use reqwest::Client;
use std::collections::HashMap;

/// CoinGecko spot price with fallback.
/// Never fails: on any error the configured fallback is returned, tagged.
pub async fn fetch_spot_or_fallback(client: &Client, config: &AppConfig) -> Sourced<f64> {
    match fetch_spot(
        client,
        &config.spot_api_base_url,
        &config.spot_asset_id,
        &config.spot_vs_currency,
    )
    .await
    {
        Ok(price) => {
            tracing::debug!(price = price, asset = %config.spot_asset_id, "spot price fetched");
            Sourced::live(price)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                fallback = config.fallback_spot,
                "spot price fetch failed, using fallback"
            );
            Sourced::fallback(config.fallback_spot, e.to_string())
        }
    }
}

// CoinGecko simple/price response format:
// { "bitcoin": { "usd": 107200.0 } }

type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

async fn fetch_spot(
    client: &Client,
    base_url: &str,
    asset_id: &str,
    vs_currency: &str,
) -> EngineResult<f64> {
    let url = format!("{}/simple/price", base_url.trim_end_matches('/'));

    let resp = client
        .get(&url)
        .query(&[("ids", asset_id), ("vs_currencies", vs_currency)])
        .send()
        .await
        .map_err(|e| EngineError::DataUnavailable(format!("spot request failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(EngineError::DataUnavailable(format!("spot HTTP {status}: {body}")));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| EngineError::DataUnavailable(format!("spot body: {e}")))?;

    parse_spot(&body, asset_id, vs_currency)
}

fn parse_spot(body: &str, asset_id: &str, vs_currency: &str) -> EngineResult<f64> {
    let data: SimplePriceResponse = serde_json::from_str(body)?;

    let price = data
        .get(asset_id)
        .and_then(|quotes| quotes.get(vs_currency))
        .copied()
        .ok_or_else(|| EngineError::Parse(format!("no {asset_id}/{vs_currency} quote in response")))?;

    if price <= 0.0 || !price.is_finite() {
        return Err(EngineError::Parse(format!("invalid price: {price}")));
    }

    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spot() {
        let body = r#"{"bitcoin":{"usd":107213.5}}"#;
        assert_eq!(parse_spot(body, "bitcoin", "usd").unwrap(), 107_213.5);
    }

    #[test]
    fn test_parse_spot_missing_quote() {
        let body = r#"{"bitcoin":{"eur":99000}}"#;
        assert!(matches!(parse_spot(body, "bitcoin", "usd"), Err(EngineError::Parse(_))));
    }

    #[test]
    fn test_parse_spot_rejects_nonpositive() {
        let body = r#"{"bitcoin":{"usd":0}}"#;
        assert!(parse_spot(body, "bitcoin", "usd").is_err());
    }

    #[test]
    fn test_parse_spot_rejects_garbage() {
        assert!(matches!(parse_spot("rate limited", "bitcoin", "usd"), Err(EngineError::Parse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_source_falls_back() {
        let config = AppConfig {
            spot_api_base_url: "http://127.0.0.1:9".into(),
            http_timeout_secs: 1,
            ..AppConfig::default()
        };
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(1))
            .build()
            .unwrap();
        let spot = fetch_spot_or_fallback(&client, &config).await;
        assert!(spot.is_fallback());
        assert_eq!(spot.value, 107_200.0);
    }
}
