use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::customer::{feature, FeatureSet};
use crate::errors::ModelError;

use super::{LabeledCustomer, ModelMetrics};

/// Fixed feature order with reference ranges used for min-max scaling.
/// Prediction and training must agree on this order exactly.
const FEATURE_RANGES: [(&str, f64, f64); 14] = [
    (feature::USAGE_CHANGE_30D, -50.0, 30.0),
    (feature::DAYS_SINCE_LOGIN, 0.0, 60.0),
    (feature::PAYMENT_FAILURES_90D, 0.0, 5.0),
    (feature::SUPPORT_TICKETS, 0.0, 10.0),
    (feature::CONTRACT_AGE_MONTHS, 0.0, 60.0),
    (feature::AVG_MONTHLY_USAGE_GB, 0.0, 2000.0),
    (feature::PLAN_PRICE, 0.0, 3000.0),
    (feature::LATE_PAYMENTS_COUNT, 0.0, 8.0),
    (feature::NPS_SCORE, 0.0, 10.0),
    (feature::COMPLAINTS_COUNT, 0.0, 10.0),
    (feature::SESSION_COUNT_30D, 0.0, 150.0),
    (feature::AVG_SPEED_MBPS, 0.0, 1000.0),
    (feature::BILLING_CYCLE_MONTHLY, 0.0, 1.0),
    (feature::ACCOUNT_TYPE_BUSINESS, 0.0, 1.0),
];

/// Churn risk band derived from the predicted probability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            Self::Low
        } else if probability < 0.6 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Single-customer churn prediction payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChurnPrediction {
    pub churn_probability: f64,
    pub churn_prediction: u8,
    pub risk_level: RiskLevel,
    pub recommendation: String,
}

/// Deterministic logistic-regression churn classifier. Trained with batch
/// gradient descent and L2 regularization over a fixed epoch count, so the
/// same training set always yields the same weights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChurnModel {
    pub version: String,
    pub trained_at: DateTime<Utc>,
    weights: Vec<f64>,
    pub accuracy: f64,
    pub training_samples: usize,
    is_fitted: bool,
}

impl ChurnModel {
    /// Feature dimension including the bias term.
    pub const FEATURE_DIM: usize = FEATURE_RANGES.len() + 1;

    const LEARNING_RATE: f64 = 0.1;
    const EPOCHS: usize = 1000;
    const REGULARIZATION: f64 = 0.01;

    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            trained_at: Utc::now(),
            weights: vec![0.0; Self::FEATURE_DIM],
            accuracy: 0.0,
            training_samples: 0,
            is_fitted: false,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn feature_names() -> Vec<&'static str> {
        FEATURE_RANGES.iter().map(|(name, _, _)| *name).collect()
    }

    fn sigmoid(z: f64) -> f64 {
        let z = z.clamp(-500.0, 500.0);
        1.0 / (1.0 + (-z).exp())
    }

    /// Min-max scaled feature vector with a leading bias term. Missing
    /// features read as zero, matching the serving-side contract.
    fn normalized_vector(features: &FeatureSet) -> Vec<f64> {
        let mut vector = Vec::with_capacity(Self::FEATURE_DIM);
        vector.push(1.0);
        for (name, min, max) in FEATURE_RANGES {
            let value = features.get_or(name, 0.0);
            vector.push(((value - min) / (max - min)).clamp(0.0, 1.0));
        }
        vector
    }

    fn raw_score(&self, x: &[f64]) -> f64 {
        self.weights.iter().zip(x.iter()).map(|(w, xi)| w * xi).sum()
    }

    /// Trains on labeled outcomes and returns training accuracy.
    pub fn train(&mut self, samples: &[LabeledCustomer]) -> Result<f64, ModelError> {
        if samples.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let n = samples.len() as f64;
        let x: Vec<Vec<f64>> =
            samples.iter().map(|s| Self::normalized_vector(&s.features)).collect();
        let y: Vec<f64> = samples.iter().map(|s| if s.churned { 1.0 } else { 0.0 }).collect();

        for _ in 0..Self::EPOCHS {
            let mut gradients = vec![0.0; Self::FEATURE_DIM];

            for (xi, yi) in x.iter().zip(y.iter()) {
                let error = Self::sigmoid(self.raw_score(xi)) - yi;
                for (gradient, value) in gradients.iter_mut().zip(xi.iter()) {
                    *gradient += error * value;
                }
            }

            for (j, gradient) in gradients.iter_mut().enumerate() {
                *gradient /= n;
                // The bias term is not regularized.
                if j > 0 {
                    *gradient += Self::REGULARIZATION * self.weights[j];
                }
            }

            for (weight, gradient) in self.weights.iter_mut().zip(gradients.iter()) {
                *weight -= Self::LEARNING_RATE * gradient;
            }
        }

        self.training_samples = samples.len();
        self.is_fitted = true;
        self.trained_at = Utc::now();
        self.accuracy = self.classification_accuracy(&x, &y);
        Ok(self.accuracy)
    }

    fn classification_accuracy(&self, x: &[Vec<f64>], y: &[f64]) -> f64 {
        if x.is_empty() {
            return 0.0;
        }
        let correct = x
            .iter()
            .zip(y.iter())
            .filter(|(xi, yi)| (Self::sigmoid(self.raw_score(xi)) >= 0.5) == (**yi >= 0.5))
            .count();
        correct as f64 / x.len() as f64
    }

    /// Churn probability for one customer, in [0, 1].
    pub fn predict_probability(&self, features: &FeatureSet) -> Result<f64, ModelError> {
        if !self.is_fitted {
            return Err(ModelError::NotFitted);
        }
        let x = Self::normalized_vector(features);
        Ok(Self::sigmoid(self.raw_score(&x)))
    }

    pub fn predict_single(&self, features: &FeatureSet) -> Result<ChurnPrediction, ModelError> {
        let probability = self.predict_probability(features)?;
        let rounded = (probability * 10_000.0).round() / 10_000.0;

        Ok(ChurnPrediction {
            churn_probability: rounded,
            churn_prediction: u8::from(probability >= 0.5),
            risk_level: RiskLevel::from_probability(probability),
            recommendation: retention_recommendation(probability, features),
        })
    }

    /// Evaluates on a held-out set. An empty set yields empty metrics.
    pub fn evaluate(&self, samples: &[LabeledCustomer]) -> Result<ModelMetrics, ModelError> {
        if !self.is_fitted {
            return Err(ModelError::NotFitted);
        }
        if samples.is_empty() {
            return Ok(ModelMetrics::empty());
        }

        let mut correct = 0usize;
        let mut true_positives = 0usize;
        let mut false_positives = 0usize;
        let mut false_negatives = 0usize;

        for sample in samples {
            let x = Self::normalized_vector(&sample.features);
            let predicted = Self::sigmoid(self.raw_score(&x)) >= 0.5;
            let actual = sample.churned;

            if predicted == actual {
                correct += 1;
            }
            match (predicted, actual) {
                (true, true) => true_positives += 1,
                (true, false) => false_positives += 1,
                (false, true) => false_negatives += 1,
                (false, false) => {}
            }
        }

        let precision = if true_positives + false_positives > 0 {
            true_positives as f64 / (true_positives + false_positives) as f64
        } else {
            0.0
        };
        let recall = if true_positives + false_negatives > 0 {
            true_positives as f64 / (true_positives + false_negatives) as f64
        } else {
            0.0
        };
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Ok(ModelMetrics {
            accuracy: correct as f64 / samples.len() as f64,
            precision,
            recall,
            f1_score,
            sample_count: samples.len(),
        })
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| ModelError::Serialization(e.to_string()))?;
        if model.weights.len() != Self::FEATURE_DIM {
            return Err(ModelError::Serialization(format!(
                "expected {} weights, got {}",
                Self::FEATURE_DIM,
                model.weights.len()
            )));
        }
        Ok(model)
    }
}

fn retention_recommendation(probability: f64, features: &FeatureSet) -> String {
    if probability < 0.3 {
        return "Customer is stable. Continue standard engagement.".to_string();
    }

    let mut risk_factors = Vec::new();
    if features.get_or(feature::USAGE_CHANGE_30D, 0.0) < -10.0 {
        risk_factors.push("declining usage");
    }
    if features.get_or(feature::DAYS_SINCE_LOGIN, 0.0) > 14.0 {
        risk_factors.push("low engagement");
    }
    if features.get_or(feature::PAYMENT_FAILURES_90D, 0.0) > 0.0 {
        risk_factors.push("payment issues");
    }
    if features.get_or(feature::SUPPORT_TICKETS, 0.0) > 3.0 {
        risk_factors.push("frequent support requests");
    }
    if features.get_or(feature::NPS_SCORE, 5.0) < 5.0 {
        risk_factors.push("low satisfaction");
    }

    let action = if probability >= 0.6 {
        "URGENT: Immediate intervention required"
    } else {
        "Proactive retention outreach recommended"
    };

    if risk_factors.is_empty() {
        format!("{action}.")
    } else {
        format!("{action}. Key risk factors: {}.", risk_factors.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::{ChurnModel, RiskLevel};
    use crate::domain::customer::{feature, FeatureSet};
    use crate::errors::ModelError;
    use crate::ml::LabeledCustomer;

    fn churner(index: usize) -> LabeledCustomer {
        LabeledCustomer {
            features: FeatureSet::new()
                .with(feature::USAGE_CHANGE_30D, -25.0 - (index % 5) as f64)
                .with(feature::DAYS_SINCE_LOGIN, 25.0 + (index % 4) as f64)
                .with(feature::PAYMENT_FAILURES_90D, 3.0)
                .with(feature::SUPPORT_TICKETS, 5.0)
                .with(feature::NPS_SCORE, 2.0),
            churned: true,
        }
    }

    fn stayer(index: usize) -> LabeledCustomer {
        LabeledCustomer {
            features: FeatureSet::new()
                .with(feature::USAGE_CHANGE_30D, 5.0 + (index % 5) as f64)
                .with(feature::DAYS_SINCE_LOGIN, 1.0)
                .with(feature::PAYMENT_FAILURES_90D, 0.0)
                .with(feature::SUPPORT_TICKETS, 0.0)
                .with(feature::NPS_SCORE, 9.0),
            churned: false,
        }
    }

    fn training_set() -> Vec<LabeledCustomer> {
        (0..30).map(churner).chain((0..30).map(stayer)).collect()
    }

    #[test]
    fn sigmoid_behaves_at_the_extremes() {
        assert!((ChurnModel::sigmoid(0.0) - 0.5).abs() < 1e-9);
        assert!(ChurnModel::sigmoid(10.0) > 0.99);
        assert!(ChurnModel::sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn unfitted_model_refuses_to_predict() {
        let model = ChurnModel::new("v0-test");
        assert_eq!(model.predict_probability(&FeatureSet::new()), Err(ModelError::NotFitted));
        assert_eq!(
            model.predict_single(&FeatureSet::new()).map(|_| ()),
            Err(ModelError::NotFitted)
        );
    }

    #[test]
    fn training_on_an_empty_set_is_rejected() {
        let mut model = ChurnModel::new("v0-test");
        assert_eq!(model.train(&[]), Err(ModelError::EmptyTrainingSet));
    }

    #[test]
    fn training_separates_a_separable_set() {
        let mut model = ChurnModel::new("v1-test");
        let accuracy = model.train(&training_set()).expect("training should succeed");

        assert!(model.is_fitted());
        assert!(accuracy >= 0.7, "accuracy {accuracy} should be >= 0.7");
    }

    #[test]
    fn predictions_stay_in_unit_interval_and_rank_risk_correctly() {
        let mut model = ChurnModel::new("v1-test");
        model.train(&training_set()).expect("training should succeed");

        let risky = model
            .predict_probability(&churner(0).features)
            .expect("prediction should succeed");
        let safe =
            model.predict_probability(&stayer(0).features).expect("prediction should succeed");

        assert!((0.0..=1.0).contains(&risky));
        assert!((0.0..=1.0).contains(&safe));
        assert!(risky > safe);
    }

    #[test]
    fn single_prediction_carries_risk_level_and_recommendation() {
        let mut model = ChurnModel::new("v1-test");
        model.train(&training_set()).expect("training should succeed");

        let prediction =
            model.predict_single(&churner(0).features).expect("prediction should succeed");
        assert_eq!(prediction.risk_level, RiskLevel::High);
        assert_eq!(prediction.churn_prediction, 1);
        assert!(prediction.recommendation.contains("URGENT"));
        assert!(prediction.recommendation.contains("declining usage"));

        let prediction =
            model.predict_single(&stayer(0).features).expect("prediction should succeed");
        assert_eq!(prediction.risk_level, RiskLevel::Low);
        assert_eq!(prediction.churn_prediction, 0);
    }

    #[test]
    fn evaluation_reports_sensible_metrics() {
        let mut model = ChurnModel::new("v1-test");
        model.train(&training_set()).expect("training should succeed");

        let holdout: Vec<_> = (30..40).map(churner).chain((30..40).map(stayer)).collect();
        let metrics = model.evaluate(&holdout).expect("evaluation should succeed");

        assert_eq!(metrics.sample_count, 20);
        assert!(metrics.accuracy >= 0.7);
        assert!(metrics.f1_score > 0.0);
    }

    #[test]
    fn fitted_model_round_trips_through_json() {
        let mut model = ChurnModel::new("v1-test");
        model.train(&training_set()).expect("training should succeed");

        let json = model.to_json().expect("serialization should succeed");
        let restored = ChurnModel::from_json(&json).expect("deserialization should succeed");

        assert_eq!(restored, model);
        assert!(restored.is_fitted());

        let features = churner(0).features;
        assert_eq!(
            restored.predict_probability(&features),
            model.predict_probability(&features)
        );
    }

    #[test]
    fn corrupted_weight_vector_is_rejected_on_load() {
        let mut model = ChurnModel::new("v1-test");
        model.train(&training_set()).expect("training should succeed");

        let json = model.to_json().expect("serialization should succeed");
        let truncated = json.replace("[", "[9.9,");

        assert!(matches!(
            ChurnModel::from_json(&truncated),
            Err(ModelError::Serialization(_))
        ));
    }

    #[test]
    fn risk_levels_band_the_probability_scale() {
        assert_eq!(RiskLevel::from_probability(0.1), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.6), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(0.95), RiskLevel::High);
    }
}
