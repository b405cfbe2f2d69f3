use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pricewise_core::domain::customer::FeatureSet;
use pricewise_core::errors::ModelError;
use pricewise_core::ml::churn::ChurnPrediction;

use crate::state::{new_correlation_id, reject, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ChurnRequest {
    pub customer_id: Option<Uuid>,
    pub features: FeatureSet,
}

#[derive(Debug, Serialize)]
pub struct ChurnResponse {
    pub customer_id: Option<Uuid>,
    #[serde(flatten)]
    pub prediction: ChurnPrediction,
    pub predicted_at: DateTime<Utc>,
}

/// Direct churn endpoint. Unlike the pricing path, an absent or unfitted
/// model is surfaced as "model not ready" rather than degraded to the
/// heuristic.
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<ChurnRequest>,
) -> ApiResult<ChurnResponse> {
    let correlation_id = new_correlation_id();

    request.features.validate().map_err(|error| reject(error, &correlation_id))?;

    let model = state
        .engine
        .churn_model()
        .filter(|model| model.is_fitted())
        .ok_or_else(|| reject(ModelError::NotFitted, &correlation_id))?;

    let prediction =
        model.predict_single(&request.features).map_err(|error| reject(error, &correlation_id))?;

    Ok(Json(ChurnResponse {
        customer_id: request.customer_id,
        prediction,
        predicted_at: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;

    use pricewise_core::config::AppConfig;
    use pricewise_core::domain::customer::{feature, FeatureSet};
    use pricewise_core::ml::churn::ChurnModel;
    use pricewise_core::ml::LabeledCustomer;

    use super::{predict, ChurnRequest};
    use crate::state::{build_state, AppState};

    fn state_without_models() -> AppState {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.artifacts.dir = dir.path().to_path_buf();
        build_state(&config)
    }

    fn fitted_model() -> ChurnModel {
        let samples: Vec<LabeledCustomer> = (0..20)
            .map(|i| LabeledCustomer {
                features: FeatureSet::new()
                    .with(feature::PAYMENT_FAILURES_90D, 3.0)
                    .with(feature::NPS_SCORE, 1.0 + (i % 3) as f64),
                churned: true,
            })
            .chain((0..20).map(|i| LabeledCustomer {
                features: FeatureSet::new()
                    .with(feature::PAYMENT_FAILURES_90D, 0.0)
                    .with(feature::NPS_SCORE, 8.0 + (i % 3) as f64),
                churned: false,
            }))
            .collect();

        let mut model = ChurnModel::new("v1-test");
        model.train(&samples).expect("training should succeed");
        model
    }

    #[tokio::test]
    async fn predict_returns_service_unavailable_without_a_fitted_model() {
        let response = predict(
            State(state_without_models()),
            Json(ChurnRequest { customer_id: None, features: FeatureSet::new() }),
        )
        .await;

        let (status, body) = response.expect_err("unfitted model must be surfaced");
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.error.contains("model not ready"));
    }

    #[tokio::test]
    async fn predict_delegates_to_a_fitted_model() {
        let state = state_without_models();
        state.engine.attach_models(Some(Arc::new(fitted_model())), None);

        let Json(response) = predict(
            State(state),
            Json(ChurnRequest {
                customer_id: None,
                features: FeatureSet::new()
                    .with(feature::PAYMENT_FAILURES_90D, 3.0)
                    .with(feature::NPS_SCORE, 1.0),
            }),
        )
        .await
        .expect("prediction should succeed");

        assert!((0.0..=1.0).contains(&response.prediction.churn_probability));
        assert_eq!(response.prediction.churn_prediction, 1);
    }
}
