pub mod config;
pub mod price;
pub mod roi;
pub mod simulate;
pub mod train;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use pricewise_core::config::AppConfig;
use pricewise_core::domain::customer::FeatureSet;
use pricewise_core::ml::churn::ChurnModel;
use pricewise_core::ml::segmentation::SegmentationModel;
use pricewise_core::pricing::engine::PricingEngine;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            details: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_details(command: &str, message: impl Into<String>, details: Value) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            details: Some(details),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            details: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Engine with whatever model artifacts the configured artifacts dir
/// holds; a missing or unreadable artifact leaves the heuristic active.
pub(crate) fn build_engine(config: &AppConfig) -> PricingEngine {
    let engine = PricingEngine::new(config.engine.clone());

    let churn = fs::read_to_string(config.artifacts.dir.join("churn_model.json"))
        .ok()
        .and_then(|raw| ChurnModel::from_json(&raw).ok())
        .map(Arc::new);
    let segmentation = fs::read_to_string(config.artifacts.dir.join("segmentation_model.json"))
        .ok()
        .and_then(|raw| SegmentationModel::from_json(&raw).ok())
        .map(Arc::new);

    engine.attach_models(churn, segmentation);
    engine
}

/// Customer features from a JSON file, or an empty set (heuristic
/// defaults apply) when no path is given.
pub(crate) fn load_features(path: Option<&Path>) -> Result<FeatureSet, String> {
    let Some(path) = path else {
        return Ok(FeatureSet::new());
    };

    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read features file `{}`: {error}", path.display()))?;
    let features: FeatureSet = serde_json::from_str(&raw)
        .map_err(|error| format!("could not parse features file `{}`: {error}", path.display()))?;
    features.validate().map_err(|error| error.to_string())?;
    Ok(features)
}
