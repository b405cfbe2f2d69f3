//! In-process models backing the pricing engine's delegated paths.
//!
//! Both models are deterministic and auditable: training uses fixed seeds
//! and fixed iteration counts, and fitted models round-trip through JSON
//! so a serving process can load the exact artifact that was trained.

use serde::{Deserialize, Serialize};

use crate::domain::customer::FeatureSet;

pub mod churn;
pub mod dataset;
pub mod segmentation;

/// One labeled training example for the churn classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledCustomer {
    pub features: FeatureSet,
    pub churned: bool,
}

/// Classification quality on a held-out set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub sample_count: usize,
}

impl ModelMetrics {
    pub fn empty() -> Self {
        Self { accuracy: 0.0, precision: 0.0, recall: 0.0, f1_score: 0.0, sample_count: 0 }
    }
}
