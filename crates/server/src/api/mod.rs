pub mod churn;
pub mod pricing;
pub mod segmentation;

use axum::routing::{get, post, put};
use axum::Router;

use crate::health;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/pricing/calculate", post(pricing::calculate))
        .route("/pricing/simulate", post(pricing::simulate))
        .route("/pricing/batch", post(pricing::batch))
        .route("/pricing/roi-projection", post(pricing::roi_projection))
        .route("/pricing/config", get(pricing::engine_config))
        .route("/pricing/weights", put(pricing::update_weights))
        .route("/pricing/history", get(pricing::history))
        .route("/churn/predict", post(churn::predict))
        .route("/segmentation/predict", post(segmentation::predict))
        .route("/segmentation/segments", get(segmentation::segments))
        .route("/health", get(health::health))
        .with_state(state)
}
