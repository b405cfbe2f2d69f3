use std::fs;

use serde_json::json;

use pricewise_core::config::{AppConfig, LoadOptions};
use pricewise_core::domain::customer::FeatureSet;
use pricewise_core::ml::churn::ChurnModel;
use pricewise_core::ml::dataset::{generate, train_test_split, DatasetConfig};
use pricewise_core::ml::segmentation::SegmentationModel;

use crate::commands::CommandResult;

/// Generates a seeded synthetic dataset, fits both models, and writes the
/// JSON artifacts plus the durable engine configuration to the artifacts
/// directory.
pub fn run(samples: usize, seed: u64) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "train",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let customers = generate(&DatasetConfig { n_samples: samples, seed });
    let (train_set, test_set) = train_test_split(&customers, 0.2, seed);
    let version = format!("v1-seed{seed}-n{samples}");

    let mut churn = ChurnModel::new(&version);
    if let Err(error) = churn.train(&train_set) {
        return CommandResult::failure("train", "churn_training", error.to_string(), 3);
    }
    let metrics = match churn.evaluate(&test_set) {
        Ok(metrics) => metrics,
        Err(error) => {
            return CommandResult::failure("train", "churn_evaluation", error.to_string(), 3);
        }
    };

    let features: Vec<FeatureSet> =
        customers.iter().map(|customer| customer.features.clone()).collect();
    let mut segmentation = SegmentationModel::new(&version);
    if let Err(error) = segmentation.train(&features) {
        return CommandResult::failure("train", "segmentation_training", error.to_string(), 3);
    }

    if let Err(error) = fs::create_dir_all(&config.artifacts.dir) {
        return CommandResult::failure(
            "train",
            "artifact_io",
            format!("could not create artifacts dir: {error}"),
            4,
        );
    }

    let churn_path = config.artifacts.dir.join("churn_model.json");
    let segmentation_path = config.artifacts.dir.join("segmentation_model.json");
    let engine_path = config.artifacts.dir.join("engine_config.toml");

    let write_result = churn
        .to_json()
        .map_err(|error| error.to_string())
        .and_then(|json| fs::write(&churn_path, json).map_err(|error| error.to_string()))
        .and_then(|_| segmentation.to_json().map_err(|error| error.to_string()))
        .and_then(|json| fs::write(&segmentation_path, json).map_err(|error| error.to_string()))
        .and_then(|_| config.engine.save_to(&engine_path).map_err(|error| error.to_string()));

    if let Err(message) = write_result {
        return CommandResult::failure("train", "artifact_io", message, 4);
    }

    CommandResult::success_with_details(
        "train",
        format!(
            "trained churn (accuracy {:.2}) and segmentation models on {samples} samples",
            metrics.accuracy
        ),
        json!({
            "version": version,
            "samples": samples,
            "seed": seed,
            "churn_metrics": {
                "accuracy": metrics.accuracy,
                "precision": metrics.precision,
                "recall": metrics.recall,
                "f1_score": metrics.f1_score,
                "holdout_samples": metrics.sample_count,
            },
            "churn_features": ChurnModel::feature_names(),
            "segmentation": {
                "training_samples": segmentation.training_samples,
                "inertia": segmentation.inertia,
                "features": SegmentationModel::feature_names(),
            },
            "artifacts": [
                churn_path.display().to_string(),
                segmentation_path.display().to_string(),
                engine_path.display().to_string(),
            ],
        }),
    )
}
