use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pricewise_core::domain::customer::FeatureSet;
use pricewise_core::domain::segment::{SegmentKind, SegmentPrediction};
use pricewise_core::errors::ModelError;

use crate::state::{new_correlation_id, reject, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct SegmentationRequest {
    pub customer_id: Option<Uuid>,
    pub features: FeatureSet,
}

#[derive(Debug, Serialize)]
pub struct SegmentationResponse {
    pub customer_id: Option<Uuid>,
    #[serde(flatten)]
    pub prediction: SegmentPrediction,
    pub predicted_at: DateTime<Utc>,
}

/// Direct segmentation endpoint; same "model not ready" gating as the
/// churn endpoint.
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<SegmentationRequest>,
) -> ApiResult<SegmentationResponse> {
    let correlation_id = new_correlation_id();

    request.features.validate().map_err(|error| reject(error, &correlation_id))?;

    let model = state
        .engine
        .segmentation_model()
        .filter(|model| model.is_fitted())
        .ok_or_else(|| reject(ModelError::NotFitted, &correlation_id))?;

    let prediction =
        model.predict_single(&request.features).map_err(|error| reject(error, &correlation_id))?;

    Ok(Json(SegmentationResponse {
        customer_id: request.customer_id,
        prediction,
        predicted_at: Utc::now(),
    }))
}

#[derive(Debug, Serialize)]
pub struct SegmentInfo {
    pub segment_id: u32,
    pub name: &'static str,
    pub population_share: f64,
    pub price_elasticity: f64,
    pub pricing_strategy: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SegmentsResponse {
    pub segments: Vec<SegmentInfo>,
}

/// Canonical segment catalog; available whether or not a model is fitted.
pub async fn segments() -> Json<SegmentsResponse> {
    let segments = SegmentKind::ALL
        .iter()
        .map(|segment| SegmentInfo {
            segment_id: segment.id(),
            name: segment.name(),
            population_share: segment.population_share(),
            price_elasticity: segment.price_elasticity(),
            pricing_strategy: segment.pricing_strategy(),
        })
        .collect();

    Json(SegmentsResponse { segments })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;

    use pricewise_core::config::AppConfig;
    use pricewise_core::domain::customer::FeatureSet;
    use pricewise_core::ml::dataset::{generate, DatasetConfig};
    use pricewise_core::ml::segmentation::SegmentationModel;

    use super::{predict, segments, SegmentationRequest};
    use crate::state::{build_state, AppState};

    fn state_without_models() -> AppState {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.artifacts.dir = dir.path().to_path_buf();
        build_state(&config)
    }

    #[tokio::test]
    async fn predict_returns_service_unavailable_without_a_fitted_model() {
        let response = predict(
            State(state_without_models()),
            Json(SegmentationRequest { customer_id: None, features: FeatureSet::new() }),
        )
        .await;

        let (status, _) = response.expect_err("unfitted model must be surfaced");
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn predict_delegates_to_a_fitted_model() {
        let customers = generate(&DatasetConfig { n_samples: 80, seed: 13 });
        let features: Vec<FeatureSet> =
            customers.into_iter().map(|customer| customer.features).collect();

        let mut model = SegmentationModel::new("v1-test");
        model.train(&features).expect("training should succeed");

        let state = state_without_models();
        state.engine.attach_models(None, Some(Arc::new(model)));

        let Json(response) = predict(
            State(state),
            Json(SegmentationRequest { customer_id: None, features: features[0].clone() }),
        )
        .await
        .expect("prediction should succeed");

        assert!(response.prediction.confidence > 0.0);
        assert!((-2.5..=-0.2).contains(&response.prediction.price_elasticity));
    }

    #[tokio::test]
    async fn segment_catalog_lists_all_five_segments() {
        let Json(response) = segments().await;
        assert_eq!(response.segments.len(), 5);

        let shares: f64 = response.segments.iter().map(|s| s.population_share).sum();
        assert!((shares - 1.0).abs() < 1e-9);
    }
}
