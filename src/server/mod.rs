pub mod routes;

use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/evaluate", get(routes::get_evaluate))
        .route("/api/report", get(routes::get_report))
        .route("/api/greeks", get(routes::get_greeks))
        .route("/api/chain", get(routes::get_chain))
        .route("/api/counters", get(routes::get_counters))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    fn app() -> Router {
        router(AppState::new(AppConfig::default()))
    }

    #[tokio::test]
    async fn test_greeks_endpoint() {
        let (status, body) = get_json(
            app(),
            "/api/greeks?spot=107200&strike=102000&days_to_expiry=7&risk_free_rate=0.05&implied_vol_pct=25&option_type=put",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let delta = body["delta"].as_f64().unwrap();
        assert!(delta < 0.0 && delta > -0.5, "delta={delta}");
        assert!(body["gamma"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_greeks_endpoint_rejects_bad_type() {
        let (status, body) = get_json(app(), "/api/greeks?spot=107200&strike=102000&option_type=swap").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().starts_with("invalid input"));
    }

    #[tokio::test]
    async fn test_greeks_endpoint_rejects_zero_vol() {
        let (status, body) =
            get_json(app(), "/api/greeks?spot=107200&strike=102000&option_type=call&implied_vol_pct=0").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().starts_with("domain error"));
    }

    #[tokio::test]
    async fn test_evaluate_with_explicit_inputs() {
        let (status, body) = get_json(
            app(),
            "/api/evaluate?spot=107200&put_buy_strike=100000&put_sell_strike=102000\
             &call_sell_strike=112000&call_buy_strike=114000&days_to_expiry=7",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["total_credit"].as_f64(), Some(280.0));
        assert_eq!(body["summary"]["max_loss"].as_f64(), Some(1_720.0));
        assert_eq!(body["legs"].as_array().unwrap().len(), 4);
        assert_eq!(body["legs"][0]["leg"], "Put Sell");
        assert_eq!(body["spot_quality"]["source"], "live");
        assert!(body["strikes_quality"].is_null());
        assert_eq!(body["curve"]["points"].as_array().unwrap().len(), 500);
        assert_eq!(body["chart"]["title"], "Payoff at Expiry");
    }

    #[tokio::test]
    async fn test_report_endpoint_renders_text() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri(
                        "/api/report?spot=107200&put_buy_strike=100000&put_sell_strike=102000\
                         &call_sell_strike=112000&call_buy_strike=114000&days_to_expiry=7",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Spot: $107200.00");
        assert!(!text.contains("Warning:"));
        assert!(lines.contains(&"Total Credit: $280.00"), "{text}");
        assert!(text.contains("Put Sell"));
    }

    #[tokio::test]
    async fn test_counters_track_requests() {
        let app = app();
        let _ = get_json(app.clone(), "/api/greeks?spot=100&strike=100&option_type=call").await;
        let _ = get_json(app.clone(), "/api/greeks?spot=100&strike=100&option_type=nope").await;
        let (status, body) = get_json(app, "/api/counters").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["greeks_requests"].as_u64(), Some(2));
        assert_eq!(body["client_errors"].as_u64(), Some(1));
    }
}
