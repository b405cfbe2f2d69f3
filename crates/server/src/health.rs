use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub churn_model: &'static str,
    pub segmentation_model: &'static str,
    pub checked_at: String,
}

/// The engine always serves (heuristics cover absent models), so the
/// service itself is ready whenever the process is up; the per-model
/// fields report which delegated paths are live.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let churn_ready =
        state.engine.churn_model().is_some_and(|model| model.is_fitted());
    let segmentation_ready =
        state.engine.segmentation_model().is_some_and(|model| model.is_fitted());

    let payload = HealthResponse {
        status: "ready",
        churn_model: if churn_ready { "fitted" } else { "heuristic_fallback" },
        segmentation_model: if segmentation_ready { "fitted" } else { "heuristic_fallback" },
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};

    use pricewise_core::config::AppConfig;

    use crate::health::health;
    use crate::state::build_state;

    #[tokio::test]
    async fn health_reports_heuristic_fallback_without_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.artifacts.dir = dir.path().to_path_buf();

        let (status, Json(payload)) = health(State(build_state(&config))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.churn_model, "heuristic_fallback");
        assert_eq!(payload.segmentation_model, "heuristic_fallback");
    }
}
