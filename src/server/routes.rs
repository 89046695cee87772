use crate::config::CondorDefaults;
use crate::errors::{EngineError, EngineResult};
use crate::feeds::{option_chain, spot, DataQuality, Sourced};
use crate::models::black_scholes::{compute_greeks, BlackScholesGreeks};
use crate::models::payoff;
use crate::report::chart::{self, ChartSpec};
use crate::report::format;
use crate::state::{AppState, Condor, GreeksResult, MarketParams, OptionType, PerfCounters, DAYS_PER_YEAR};
use crate::strategy::condor::{self, CondorReport};
use crate::strategy::selection::{self, StrikeOverrides};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{NaiveDate, Utc};
use std::fmt::Write;
use std::sync::Arc;

/// Upper bound on curve samples per request.
const MAX_CURVE_POINTS: usize = 10_000;

type ApiError = (StatusCode, Json<serde_json::Value>);

#[derive(Debug, Default, serde::Deserialize)]
pub struct EvaluateQuery {
    pub spot: Option<f64>,
    pub put_buy_strike: Option<f64>,
    pub put_sell_strike: Option<f64>,
    pub call_sell_strike: Option<f64>,
    pub call_buy_strike: Option<f64>,
    pub put_buy_premium: Option<f64>,
    pub put_sell_premium: Option<f64>,
    pub call_sell_premium: Option<f64>,
    pub call_buy_premium: Option<f64>,
    pub risk_free_rate: Option<f64>,
    /// Percent, e.g. 25 for 25%.
    pub implied_vol_pct: Option<f64>,
    pub expiry: Option<NaiveDate>,
    pub days_to_expiry: Option<u32>,
    pub range_half_width: Option<f64>,
    pub points: Option<usize>,
}

impl EvaluateQuery {
    fn pinned_strikes(&self) -> StrikeOverrides {
        StrikeOverrides {
            put_buy: self.put_buy_strike,
            put_sell: self.put_sell_strike,
            call_sell: self.call_sell_strike,
            call_buy: self.call_buy_strike,
        }
    }

    fn all_strikes_pinned(&self) -> bool {
        let p = self.pinned_strikes();
        p.put_buy.is_some() && p.put_sell.is_some() && p.call_sell.is_some() && p.call_buy.is_some()
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct GreeksQuery {
    pub spot: f64,
    pub strike: f64,
    pub option_type: String,
    pub time_to_expiry_years: Option<f64>,
    pub days_to_expiry: Option<u32>,
    pub risk_free_rate: Option<f64>,
    pub implied_vol_pct: Option<f64>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ChainQuery {
    pub expiry: Option<NaiveDate>,
}

/// Collaborator-resolved inputs, fetched before the engines run.
#[derive(Debug, Clone)]
pub struct ResolvedInputs {
    pub spot: Sourced<f64>,
    /// None when every strike was supplied by the caller.
    pub listed_strikes: Option<Sourced<Vec<f64>>>,
    pub expiry: Option<NaiveDate>,
    pub days_to_expiry: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Evaluation {
    pub spot_quality: DataQuality,
    pub strikes_quality: Option<DataQuality>,
    pub expiry: Option<NaiveDate>,
    #[serde(flatten)]
    pub report: CondorReport,
    pub chart: ChartSpec,
    pub summary_lines: Vec<String>,
}

/// GET /api/evaluate -- full condor evaluation
pub async fn get_evaluate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EvaluateQuery>,
) -> Result<Json<Evaluation>, ApiError> {
    PerfCounters::bump(&state.counters.evaluations);
    let inputs = resolve_inputs(&state, &query).await;
    build_evaluation(&state.config.defaults, &query, inputs)
        .map(Json)
        .map_err(|e| api_error(&state, e))
}

/// GET /api/report -- plain-text summary and Greeks table
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EvaluateQuery>,
) -> Result<String, ApiError> {
    PerfCounters::bump(&state.counters.evaluations);
    let inputs = resolve_inputs(&state, &query).await;
    let eval = build_evaluation(&state.config.defaults, &query, inputs).map_err(|e| api_error(&state, e))?;

    let mut text = String::new();
    let spot = format::format_currency(eval.report.market.spot);
    match &eval.spot_quality {
        DataQuality::Fallback { reason } => {
            let _ = writeln!(text, "Spot: {spot} (fallback: {reason})");
        }
        DataQuality::Live => {
            let _ = writeln!(text, "Spot: {spot}");
        }
    }
    if let Some(DataQuality::Fallback { reason }) = &eval.strikes_quality {
        let _ = writeln!(text, "Strikes: fallback list ({reason})");
    }
    for w in &eval.report.warnings {
        let _ = writeln!(text, "Warning: {w}");
    }
    text.push('\n');
    for line in &eval.summary_lines {
        let _ = writeln!(text, "{line}");
    }
    text.push('\n');
    text.push_str(&format::greeks_table(&eval.report.legs, Some(&eval.report.net)));
    Ok(text)
}

/// GET /api/greeks -- single-option Greeks from explicit inputs
pub async fn get_greeks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GreeksQuery>,
) -> Result<Json<GreeksResult>, ApiError> {
    PerfCounters::bump(&state.counters.greeks_requests);
    single_greeks(&state.config.defaults, &query)
        .map(Json)
        .map_err(|e| api_error(&state, e))
}

/// GET /api/chain -- listed expiries and strikes for the selected expiry
pub async fn get_chain(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChainQuery>,
) -> Json<serde_json::Value> {
    let chain = option_chain::fetch_chain_or_fallback(&state.http, &state.config).await;
    let expiries = chain.value.expiries();
    let selected = query.expiry.or_else(|| expiries.first().copied());

    let strikes = listed_strikes(&state, &chain, selected);

    Json(serde_json::json!({
        "quality": chain.quality,
        "expiries": expiries,
        "selected_expiry": selected,
        "instruments": selected.map(|d| chain.value.for_expiry(d).instruments).unwrap_or_default(),
        "strikes": strikes,
    }))
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(
    State(state): State<Arc<AppState>>,
) -> Json<serde_json::Value> {
    use portable_atomic::Ordering::Relaxed;
    Json(serde_json::json!({
        "evaluations": state.counters.evaluations.load(Relaxed),
        "greeks_requests": state.counters.greeks_requests.load(Relaxed),
        "client_errors": state.counters.client_errors.load(Relaxed),
        "spot_fallbacks": state.counters.spot_fallbacks.load(Relaxed),
        "chain_fallbacks": state.counters.chain_fallbacks.load(Relaxed),
    }))
}

/// Calls the collaborators for whatever the query leaves open.
async fn resolve_inputs(state: &AppState, query: &EvaluateQuery) -> ResolvedInputs {
    let spot = match query.spot {
        Some(s) => Sourced::provided(s),
        None => {
            let s = spot::fetch_spot_or_fallback(&state.http, &state.config).await;
            if s.is_fallback() {
                PerfCounters::bump(&state.counters.spot_fallbacks);
            }
            s
        }
    };

    let today = Utc::now().date_naive();
    let mut expiry = query.expiry;
    let mut listed = None;

    if !query.all_strikes_pinned() {
        let chain = option_chain::fetch_chain_or_fallback(&state.http, &state.config).await;
        if expiry.is_none() {
            expiry = default_expiry(&chain.value.expiries(), today);
        }
        listed = Some(listed_strikes(state, &chain, expiry));
    }

    let days_to_expiry = query
        .days_to_expiry
        .or_else(|| expiry.map(|d| selection::days_until(d, today)))
        .unwrap_or(state.config.defaults.days_to_expiry);

    ResolvedInputs { spot, listed_strikes: listed, expiry, days_to_expiry }
}

/// Earliest listed expiry at least one day out; same-day expiries have T = 0.
fn default_expiry(expiries: &[NaiveDate], today: NaiveDate) -> Option<NaiveDate> {
    expiries
        .iter()
        .copied()
        .find(|d| selection::days_until(*d, today) >= 1)
}

/// Strikes for the selected expiry, or the configured fallback list.
fn listed_strikes(
    state: &AppState,
    chain: &Sourced<option_chain::OptionChain>,
    expiry: Option<NaiveDate>,
) -> Sourced<Vec<f64>> {
    let strikes = expiry
        .map(|d| chain.value.for_expiry(d).strikes())
        .unwrap_or_default();

    if !strikes.is_empty() {
        return Sourced { value: strikes, quality: chain.quality.clone() };
    }

    PerfCounters::bump(&state.counters.chain_fallbacks);
    let reason = match &chain.quality {
        DataQuality::Fallback { reason } => reason.clone(),
        DataQuality::Live => match expiry {
            Some(d) => format!("no listed strikes for {d}"),
            None => "no listed expiries".to_string(),
        },
    };
    Sourced::fallback(state.config.fallback_strikes.clone(), reason)
}

/// Pure assembly step: inputs in, evaluation out.
pub fn build_evaluation(
    defaults: &CondorDefaults,
    query: &EvaluateQuery,
    inputs: ResolvedInputs,
) -> EngineResult<Evaluation> {
    let listed: &[f64] = inputs.listed_strikes.as_ref().map(|s| s.value.as_slice()).unwrap_or(&[]);
    let strikes = selection::select_strikes(listed, query.pinned_strikes())?;

    let condor = Condor::from_quotes(
        (strikes.put_buy, query.put_buy_premium.unwrap_or(defaults.put_buy_premium)),
        (strikes.put_sell, query.put_sell_premium.unwrap_or(defaults.put_sell_premium)),
        (strikes.call_sell, query.call_sell_premium.unwrap_or(defaults.call_sell_premium)),
        (strikes.call_buy, query.call_buy_premium.unwrap_or(defaults.call_buy_premium)),
    );

    let market = MarketParams {
        spot: inputs.spot.value,
        risk_free_rate: query.risk_free_rate.unwrap_or(defaults.risk_free_rate),
        implied_vol: query.implied_vol_pct.unwrap_or(defaults.implied_vol_pct) / 100.0,
        days_to_expiry: inputs.days_to_expiry,
    };

    let half_width = query.range_half_width.unwrap_or(defaults.range_half_width);
    if !(half_width.is_finite() && half_width > 0.0) {
        return Err(EngineError::InvalidInput(format!("range_half_width must be positive, got {half_width}")));
    }
    let points = query.points.unwrap_or(defaults.range_points);
    if points == 0 || points > MAX_CURVE_POINTS {
        return Err(EngineError::InvalidInput(format!(
            "points must be in 1..={MAX_CURVE_POINTS}, got {points}"
        )));
    }
    let prices = payoff::price_range(market.spot, half_width, points);

    let report = condor::evaluate(&BlackScholesGreeks::new(), &condor, &market, &prices)?;
    let chart = chart::chart_spec(&report.curve, market.spot, &report.condor);
    let summary_lines = format::summary_lines(&report.summary);

    Ok(Evaluation {
        spot_quality: inputs.spot.quality,
        strikes_quality: inputs.listed_strikes.map(|s| s.quality),
        expiry: inputs.expiry,
        report,
        chart,
        summary_lines,
    })
}

fn single_greeks(defaults: &CondorDefaults, query: &GreeksQuery) -> EngineResult<GreeksResult> {
    let option_type: OptionType = query.option_type.parse()?;
    let ttl_years = query.time_to_expiry_years.unwrap_or_else(|| {
        f64::from(query.days_to_expiry.unwrap_or(defaults.days_to_expiry)) / DAYS_PER_YEAR
    });
    compute_greeks(
        query.spot,
        query.strike,
        ttl_years,
        query.risk_free_rate.unwrap_or(defaults.risk_free_rate),
        query.implied_vol_pct.unwrap_or(defaults.implied_vol_pct) / 100.0,
        option_type,
    )
}

fn api_error(state: &AppState, e: EngineError) -> ApiError {
    let status = if e.is_client_error() {
        PerfCounters::bump(&state.counters.client_errors);
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    tracing::warn!(error = %e, status = status.as_u16(), "request failed");
    (status, Json(serde_json::json!({ "error": e.to_string() })))
}
