use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use pricewise_core::config::AppConfig;
use pricewise_core::errors::{ApplicationError, InterfaceError, ModelError};
use pricewise_core::ml::churn::ChurnModel;
use pricewise_core::ml::segmentation::SegmentationModel;
use pricewise_core::pricing::engine::PricingEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PricingEngine>,
}

/// Builds the shared engine and attaches whatever model artifacts are on
/// disk. A missing or corrupt artifact leaves the heuristic path active;
/// it never prevents startup.
pub fn build_state(config: &AppConfig) -> AppState {
    let engine = Arc::new(PricingEngine::new(config.engine.clone()));

    let churn = load_model(
        &config.artifacts.dir.join("churn_model.json"),
        ChurnModel::from_json,
        "churn",
    );
    let segmentation = load_model(
        &config.artifacts.dir.join("segmentation_model.json"),
        SegmentationModel::from_json,
        "segmentation",
    );
    engine.attach_models(churn, segmentation);

    AppState { engine }
}

fn load_model<T>(
    path: &Path,
    parse: impl Fn(&str) -> Result<T, ModelError>,
    kind: &str,
) -> Option<Arc<T>> {
    match fs::read_to_string(path) {
        Ok(raw) => match parse(&raw) {
            Ok(model) => {
                info!(
                    event_name = "system.model.loaded",
                    model = kind,
                    path = %path.display(),
                    "model artifact loaded"
                );
                Some(Arc::new(model))
            }
            Err(error) => {
                warn!(
                    event_name = "system.model.corrupt",
                    model = kind,
                    path = %path.display(),
                    error = %error,
                    "model artifact unreadable, heuristic path stays active"
                );
                None
            }
        },
        Err(_) => {
            info!(
                event_name = "system.model.absent",
                model = kind,
                path = %path.display(),
                "no model artifact, heuristic path stays active"
            );
            None
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Maps the error taxonomy onto HTTP: domain rejections are 400, an
/// unfitted model is 503, configuration faults are 500.
pub fn reject(
    error: impl Into<ApplicationError>,
    correlation_id: &str,
) -> (StatusCode, Json<ApiError>) {
    let interface = error.into().into_interface(correlation_id);
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ApiError { error: interface.to_string(), correlation_id: correlation_id.to_string() }),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rust_decimal::Decimal;

    use pricewise_core::errors::{DomainError, ModelError};

    use super::{build_state, reject};
    use pricewise_core::config::AppConfig;

    #[test]
    fn domain_errors_map_to_bad_request() {
        let (status, body) = reject(DomainError::InvalidBasePrice(Decimal::ZERO), "req-1");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.correlation_id, "req-1");
    }

    #[test]
    fn unfitted_model_maps_to_service_unavailable() {
        let (status, body) = reject(ModelError::NotFitted, "req-2");
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.error.contains("model not ready"));
    }

    #[test]
    fn missing_artifacts_leave_the_heuristic_path_active() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.artifacts.dir = dir.path().to_path_buf();

        let state = build_state(&config);
        assert!(state.engine.churn_model().is_none());
        assert!(state.engine.segmentation_model().is_none());
    }
}
