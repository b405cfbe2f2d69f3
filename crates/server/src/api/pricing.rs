use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pricewise_core::domain::customer::FeatureSet;
use pricewise_core::domain::pricing::{
    DemandProfile, PricingConstraints, PricingResult, PricingWeights, RoiProjection,
};
use pricewise_core::errors::DomainError;
use pricewise_core::pricing::engine::Scenario;

use crate::state::{new_correlation_id, reject, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub customer_id: Option<Uuid>,
    pub base_price: Decimal,
    pub features: FeatureSet,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    pub customer_id: Option<Uuid>,
    #[serde(flatten)]
    pub result: PricingResult,
}

pub async fn calculate(
    State(state): State<AppState>,
    Json(request): Json<CalculateRequest>,
) -> ApiResult<CalculateResponse> {
    let correlation_id = new_correlation_id();

    let result = state
        .engine
        .calculate_dynamic_price(request.base_price, &request.features, request.timestamp)
        .map_err(|error| reject(error, &correlation_id))?;

    Ok(Json(CalculateResponse { customer_id: request.customer_id, result }))
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub base_price: Decimal,
    pub features: FeatureSet,
    pub scenarios: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub base_price: Decimal,
    pub scenarios: BTreeMap<Scenario, PricingResult>,
    pub comparison: PriceComparison,
}

#[derive(Debug, Serialize)]
pub struct PriceComparison {
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub avg_price: Decimal,
}

pub async fn simulate(
    State(state): State<AppState>,
    Json(request): Json<SimulateRequest>,
) -> ApiResult<SimulateResponse> {
    let correlation_id = new_correlation_id();

    let selected = match &request.scenarios {
        None => None,
        Some(names) => {
            if names.is_empty() {
                return Err(reject(
                    DomainError::InvariantViolation("scenario list must not be empty".to_owned()),
                    &correlation_id,
                ));
            }
            let mut parsed = Vec::with_capacity(names.len());
            for name in names {
                let scenario = Scenario::parse(name).ok_or_else(|| {
                    reject(DomainError::UnknownScenario(name.clone()), &correlation_id)
                })?;
                parsed.push(scenario);
            }
            Some(parsed)
        }
    };

    let scenarios = state
        .engine
        .simulate_pricing_scenarios(request.base_price, &request.features, selected.as_deref())
        .map_err(|error| reject(error, &correlation_id))?;

    let comparison = compare_prices(&scenarios);
    Ok(Json(SimulateResponse { base_price: request.base_price, scenarios, comparison }))
}

fn compare_prices(scenarios: &BTreeMap<Scenario, PricingResult>) -> PriceComparison {
    let prices: Vec<Decimal> = scenarios.values().map(|result| result.dynamic_price).collect();
    let min_price = prices.iter().copied().min().unwrap_or(Decimal::ZERO);
    let max_price = prices.iter().copied().max().unwrap_or(Decimal::ZERO);
    let avg_price = if prices.is_empty() {
        Decimal::ZERO
    } else {
        (prices.iter().copied().sum::<Decimal>() / Decimal::from(prices.len() as u64)).round_dp(2)
    };

    PriceComparison { min_price, max_price, avg_price }
}

#[derive(Debug, Deserialize)]
pub struct BatchCustomer {
    pub customer_id: Option<Uuid>,
    pub base_price: Decimal,
    pub features: FeatureSet,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub customers: Vec<BatchCustomer>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct BatchRow {
    pub customer_id: Option<Uuid>,
    pub base_price: Decimal,
    pub dynamic_price: Decimal,
    pub price_change_percent: f64,
    pub churn_risk: f64,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub total_customers: usize,
    pub total_base_revenue: Decimal,
    pub total_dynamic_revenue: Decimal,
    pub revenue_change: Decimal,
    pub revenue_change_percent: f64,
    pub avg_price_change_percent: f64,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchRow>,
    pub summary: BatchSummary,
}

pub async fn batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> ApiResult<BatchResponse> {
    let correlation_id = new_correlation_id();

    let features: Vec<FeatureSet> =
        request.customers.iter().map(|customer| customer.features.clone()).collect();
    let base_prices: Vec<Decimal> =
        request.customers.iter().map(|customer| customer.base_price).collect();

    let optimization = state
        .engine
        .optimize_revenue(&features, &base_prices, request.timestamp)
        .map_err(|error| reject(error, &correlation_id))?;

    let results = request
        .customers
        .iter()
        .zip(optimization.individual_results.iter())
        .map(|(customer, result)| BatchRow {
            customer_id: customer.customer_id,
            base_price: result.base_price,
            dynamic_price: result.dynamic_price,
            price_change_percent: result.price_change_percent,
            churn_risk: result.factors.churn_risk,
        })
        .collect();

    Ok(Json(BatchResponse {
        results,
        summary: BatchSummary {
            total_customers: optimization.customers_processed,
            total_base_revenue: optimization.total_base_revenue,
            total_dynamic_revenue: optimization.total_dynamic_revenue,
            revenue_change: optimization.revenue_change,
            revenue_change_percent: optimization.revenue_change_percent,
            avg_price_change_percent: optimization.avg_price_change_percent,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct RoiRequest {
    pub customers_saved: u32,
    pub avg_revenue_per_user: Decimal,
    pub avg_lifetime_months: u32,
    pub implementation_cost: Decimal,
}

pub async fn roi_projection(
    State(state): State<AppState>,
    Json(request): Json<RoiRequest>,
) -> ApiResult<RoiProjection> {
    let correlation_id = new_correlation_id();

    let projection = state
        .engine
        .calculate_roi_projection(
            request.customers_saved,
            request.avg_revenue_per_user,
            request.avg_lifetime_months,
            request.implementation_cost,
        )
        .map_err(|error| reject(error, &correlation_id))?;

    Ok(Json(projection))
}

#[derive(Debug, Serialize)]
pub struct EngineConfigResponse {
    pub weights: PricingWeights,
    pub constraints: PricingConstraints,
    pub demand_factors: DemandProfile,
    pub formula: &'static str,
}

pub async fn engine_config(State(state): State<AppState>) -> Json<EngineConfigResponse> {
    Json(EngineConfigResponse {
        weights: state.engine.weights(),
        constraints: state.engine.constraints(),
        demand_factors: state.engine.demand_profile(),
        formula: "P_dynamic = P_base * (1 + alpha*D_t - beta*E_factor - gamma*R_c)",
    })
}

#[derive(Debug, Deserialize)]
pub struct WeightsUpdateRequest {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct WeightsUpdateResponse {
    pub message: &'static str,
    pub new_weights: PricingWeights,
}

pub async fn update_weights(
    State(state): State<AppState>,
    Json(request): Json<WeightsUpdateRequest>,
) -> Json<WeightsUpdateResponse> {
    let new_weights = state.engine.update_weights(request.alpha, request.beta, request.gamma);
    Json(WeightsUpdateResponse { message: "weights updated", new_weights })
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: usize,
    pub results: Vec<PricingResult>,
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let results = state.engine.recent_history(query.limit.unwrap_or(100));
    Json(HistoryResponse { count: results.len(), results })
}

#[cfg(test)]
mod tests {
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::Json;
    use rust_decimal::Decimal;

    use pricewise_core::config::AppConfig;
    use pricewise_core::domain::customer::FeatureSet;

    use super::{
        batch, calculate, history, roi_projection, simulate, update_weights, BatchCustomer,
        BatchRequest, CalculateRequest, HistoryQuery, RoiRequest, SimulateRequest,
        WeightsUpdateRequest,
    };
    use crate::state::{build_state, AppState};

    fn test_state() -> AppState {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.artifacts.dir = dir.path().to_path_buf();
        build_state(&config)
    }

    #[tokio::test]
    async fn calculate_rejects_non_positive_base_price() {
        let response = calculate(
            State(test_state()),
            Json(CalculateRequest {
                customer_id: None,
                base_price: Decimal::ZERO,
                features: FeatureSet::new(),
                timestamp: None,
            }),
        )
        .await;

        let (status, _) = response.expect_err("zero base price must be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn calculate_returns_a_result_and_appends_history() {
        let state = test_state();

        let Json(response) = calculate(
            State(state.clone()),
            Json(CalculateRequest {
                customer_id: None,
                base_price: Decimal::from(1299),
                features: FeatureSet::new(),
                timestamp: None,
            }),
        )
        .await
        .expect("calculation should succeed");

        assert!(response.result.dynamic_price > Decimal::ZERO);

        let Json(recent) = history(State(state), Query(HistoryQuery { limit: Some(10) })).await;
        assert_eq!(recent.count, 1);
    }

    #[tokio::test]
    async fn simulate_rejects_unknown_scenario_names() {
        let response = simulate(
            State(test_state()),
            Json(SimulateRequest {
                base_price: Decimal::from(999),
                features: FeatureSet::new(),
                scenarios: Some(vec!["rainy_tuesday".to_string()]),
            }),
        )
        .await;

        let (status, body) = response.expect_err("unknown scenario must be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("rainy_tuesday"));
    }

    #[tokio::test]
    async fn simulate_covers_all_four_canonical_scenarios_by_default() {
        let Json(response) = simulate(
            State(test_state()),
            Json(SimulateRequest {
                base_price: Decimal::from(1999),
                features: FeatureSet::new(),
                scenarios: None,
            }),
        )
        .await
        .expect("simulation should succeed");

        assert_eq!(response.scenarios.len(), 4);
        assert!(response.comparison.min_price <= response.comparison.max_price);
    }

    #[tokio::test]
    async fn batch_reports_per_customer_rows_and_summary() {
        let customers = vec![
            BatchCustomer {
                customer_id: Some(uuid::Uuid::new_v4()),
                base_price: Decimal::from(499),
                features: FeatureSet::new(),
            },
            BatchCustomer {
                customer_id: None,
                base_price: Decimal::from(2999),
                features: FeatureSet::new(),
            },
        ];

        let Json(response) = batch(
            State(test_state()),
            Json(BatchRequest { customers, timestamp: None }),
        )
        .await
        .expect("batch should succeed");

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.summary.total_customers, 2);
        assert_eq!(response.summary.total_base_revenue, Decimal::from(3498));
    }

    #[tokio::test]
    async fn roi_rejects_degenerate_projections() {
        let response = roi_projection(
            State(test_state()),
            Json(RoiRequest {
                customers_saved: 0,
                avg_revenue_per_user: Decimal::from(500),
                avg_lifetime_months: 24,
                implementation_cost: Decimal::from(1_000_000),
            }),
        )
        .await;

        let (status, body) = response.expect_err("degenerate projection must be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("no revenue projected"));
    }

    #[tokio::test]
    async fn weights_update_is_partial() {
        let state = test_state();
        let before = state.engine.weights();

        let Json(response) = update_weights(
            State(state),
            Json(WeightsUpdateRequest { alpha: None, beta: Some(0.25), gamma: None }),
        )
        .await;

        assert_eq!(response.new_weights.alpha, before.alpha);
        assert_eq!(response.new_weights.beta, 0.25);
        assert_eq!(response.new_weights.gamma, before.gamma);
    }
}
