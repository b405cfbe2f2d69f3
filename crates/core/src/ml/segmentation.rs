use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::domain::customer::{feature, FeatureSet};
use crate::domain::segment::{SegmentKind, SegmentPrediction};
use crate::errors::ModelError;

/// Fixed feature order for the clustering space.
const SEGMENT_FEATURES: [&str; 8] = [
    feature::AVG_MONTHLY_USAGE_GB,
    feature::PLAN_PRICE,
    feature::TOTAL_REVENUE,
    feature::CONTRACT_AGE_MONTHS,
    feature::NPS_SCORE,
    feature::SUPPORT_TICKETS,
    feature::SESSION_COUNT_30D,
    feature::USAGE_CHANGE_30D,
];

const CLUSTERS: usize = 5;
const MAX_ITERATIONS: usize = 300;
const INIT_SEED: u64 = 42;

/// Per-feature standardization fitted on the training set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    fn fit(rows: &[Vec<f64>]) -> Self {
        let dims = rows.first().map_or(0, Vec::len);
        let n = rows.len() as f64;

        let mut means = vec![0.0; dims];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row.iter()) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut stds = vec![0.0; dims];
        for row in rows {
            for ((std, value), mean) in stds.iter_mut().zip(row.iter()).zip(means.iter()) {
                *std += (value - mean).powi(2);
            }
        }
        for std in &mut stds {
            *std = (*std / n).sqrt();
            // Constant features scale by 1 instead of dividing by zero.
            if *std == 0.0 {
                *std = 1.0;
            }
        }

        Self { means, stds }
    }

    fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(value, (mean, std))| (value - mean) / std)
            .collect()
    }
}

/// Deterministic k-means customer segmentation. Clusters are mapped onto
/// the five canonical segments by their characteristics, so each cluster
/// carries a representative elasticity and pricing strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentationModel {
    pub version: String,
    pub trained_at: DateTime<Utc>,
    scaler: StandardScaler,
    centroids: Vec<Vec<f64>>,
    cluster_segments: Vec<SegmentKind>,
    pub inertia: f64,
    pub training_samples: usize,
    is_fitted: bool,
}

impl SegmentationModel {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            trained_at: Utc::now(),
            scaler: StandardScaler::default(),
            centroids: Vec::new(),
            cluster_segments: Vec::new(),
            inertia: 0.0,
            training_samples: 0,
            is_fitted: false,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn feature_names() -> Vec<&'static str> {
        SEGMENT_FEATURES.to_vec()
    }

    fn feature_row(features: &FeatureSet) -> Vec<f64> {
        SEGMENT_FEATURES.iter().map(|name| features.get_or(name, 0.0)).collect()
    }

    /// Fits the scaler and runs k-means with a seeded initialization, then
    /// maps each cluster onto its canonical segment.
    pub fn train(&mut self, customers: &[FeatureSet]) -> Result<(), ModelError> {
        if customers.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if customers.len() < CLUSTERS {
            return Err(ModelError::InsufficientSamples {
                required: CLUSTERS,
                actual: customers.len(),
            });
        }

        let raw_rows: Vec<Vec<f64>> = customers.iter().map(Self::feature_row).collect();
        let scaler = StandardScaler::fit(&raw_rows);
        let rows: Vec<Vec<f64>> = raw_rows.iter().map(|row| scaler.transform(row)).collect();

        let mut rng = StdRng::seed_from_u64(INIT_SEED);
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        indices.shuffle(&mut rng);
        let mut centroids: Vec<Vec<f64>> =
            indices.iter().take(CLUSTERS).map(|&i| rows[i].clone()).collect();

        let mut assignments = vec![0usize; rows.len()];
        for _ in 0..MAX_ITERATIONS {
            let next: Vec<usize> = rows.iter().map(|row| nearest(row, &centroids).0).collect();
            let converged = next == assignments;
            assignments = next;

            for (cluster, centroid) in centroids.iter_mut().enumerate() {
                let members: Vec<&Vec<f64>> = rows
                    .iter()
                    .zip(assignments.iter())
                    .filter(|(_, &a)| a == cluster)
                    .map(|(row, _)| row)
                    .collect();
                // An empty cluster keeps its previous centroid.
                if members.is_empty() {
                    continue;
                }
                for (dim, value) in centroid.iter_mut().enumerate() {
                    *value = members.iter().map(|row| row[dim]).sum::<f64>()
                        / members.len() as f64;
                }
            }

            if converged {
                break;
            }
        }

        self.inertia = rows
            .iter()
            .zip(assignments.iter())
            .map(|(row, &a)| squared_distance(row, &centroids[a]))
            .sum();
        self.cluster_segments =
            assign_segments(&raw_rows, &assignments, CLUSTERS);
        self.scaler = scaler;
        self.centroids = centroids;
        self.training_samples = customers.len();
        self.trained_at = Utc::now();
        self.is_fitted = true;
        Ok(())
    }

    /// Segment prediction for one customer, with a confidence derived from
    /// relative centroid distances.
    pub fn predict_single(
        &self,
        features: &FeatureSet,
    ) -> Result<SegmentPrediction, ModelError> {
        if !self.is_fitted {
            return Err(ModelError::NotFitted);
        }

        let row = self.scaler.transform(&Self::feature_row(features));
        let distances: Vec<f64> =
            self.centroids.iter().map(|c| squared_distance(&row, c).sqrt()).collect();
        let (cluster, nearest_distance) = distances
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(index, distance)| (index, *distance))
            .unwrap_or((0, 0.0));

        let total: f64 = distances.iter().sum();
        let confidence = if total > 0.0 { 1.0 - nearest_distance / total } else { 1.0 };

        let segment = self.cluster_segments[cluster];
        Ok(SegmentPrediction::from_segment(
            segment,
            (confidence * 10_000.0).round() / 10_000.0,
        ))
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| ModelError::Serialization(e.to_string()))?;
        if model.is_fitted
            && (model.centroids.len() != CLUSTERS
                || model.cluster_segments.len() != CLUSTERS)
        {
            return Err(ModelError::Serialization(format!(
                "expected {CLUSTERS} centroids, got {}",
                model.centroids.len()
            )));
        }
        Ok(model)
    }
}

fn nearest(row: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0usize, f64::INFINITY);
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(row, centroid);
        if distance < best.1 {
            best = (index, distance);
        }
    }
    best
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Maps each cluster onto a canonical segment from its mean plan price,
/// usage, and NPS in the original feature scale.
fn assign_segments(
    raw_rows: &[Vec<f64>],
    assignments: &[usize],
    clusters: usize,
) -> Vec<SegmentKind> {
    let usage_dim = 0;
    let price_dim = 1;
    let nps_dim = 4;

    (0..clusters)
        .map(|cluster| {
            let members: Vec<&Vec<f64>> = raw_rows
                .iter()
                .zip(assignments.iter())
                .filter(|(_, &a)| a == cluster)
                .map(|(row, _)| row)
                .collect();
            if members.is_empty() {
                return SegmentKind::ValueSeekers;
            }

            let n = members.len() as f64;
            let avg_usage = members.iter().map(|r| r[usage_dim]).sum::<f64>() / n;
            let avg_price = members.iter().map(|r| r[price_dim]).sum::<f64>() / n;
            let avg_nps = members.iter().map(|r| r[nps_dim]).sum::<f64>() / n;

            if avg_price > 1500.0 && avg_usage > 400.0 && avg_nps > 7.0 {
                SegmentKind::PremiumPowerUsers
            } else if avg_price < 700.0 && avg_nps < 6.0 {
                SegmentKind::BudgetUsers
            } else if avg_price > 1200.0 && avg_usage < 200.0 {
                SegmentKind::CasualPremium
            } else if avg_nps < 5.0 {
                SegmentKind::PriceConscious
            } else {
                SegmentKind::ValueSeekers
            }
        })
        .collect()
}
