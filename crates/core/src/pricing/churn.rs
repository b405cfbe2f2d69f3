use std::sync::Arc;

use tracing::warn;

use crate::domain::customer::{feature, FeatureSet};
use crate::ml::churn::ChurnModel;

use super::round_to;

// Fixed reference ranges for min-max normalization of the risk indicators.
const USAGE_DECLINE_RANGE: (f64, f64) = (0.0, 30.0);
const INACTIVITY_RANGE: (f64, f64) = (0.0, 30.0);
const PAYMENT_FAILURE_RANGE: (f64, f64) = (0.0, 3.0);
const SUPPORT_TICKET_RANGE: (f64, f64) = (0.0, 5.0);

// Indicator weights; they sum to 1.0 so the combined risk stays in [0, 1].
const USAGE_DECLINE_WEIGHT: f64 = 0.25;
const INACTIVITY_WEIGHT: f64 = 0.20;
const PAYMENT_FAILURE_WEIGHT: f64 = 0.20;
const SUPPORT_TICKET_WEIGHT: f64 = 0.15;
const NPS_WEIGHT: f64 = 0.20;

/// Churn-risk source, resolved once per calculation: a fitted classifier
/// when one is attached, the indicator heuristic otherwise. Both paths are
/// directionally consistent and live on the same [0, 1] scale.
#[derive(Clone, Debug)]
pub enum ChurnSignal {
    Model(Arc<ChurnModel>),
    Heuristic,
}

impl ChurnSignal {
    pub fn estimate(&self, features: &FeatureSet) -> f64 {
        match self {
            Self::Model(model) => match model.predict_single(features) {
                Ok(prediction) => prediction.churn_probability,
                Err(error) => {
                    warn!(
                        event_name = "pricing.churn.fallback",
                        error = %error,
                        "churn delegate failed, using indicator heuristic"
                    );
                    heuristic_churn_risk(features)
                }
            },
            Self::Heuristic => heuristic_churn_risk(features),
        }
    }
}

/// Weighted combination of normalized risk indicators.
pub fn heuristic_churn_risk(features: &FeatureSet) -> f64 {
    let usage_decline = -features.get_or(feature::USAGE_CHANGE_30D, 0.0);
    let days_inactive = features.get_or(feature::DAYS_SINCE_LOGIN, 0.0);
    let payment_issues = features.get_or(feature::PAYMENT_FAILURES_90D, 0.0);
    let support_tickets = features.get_or(feature::SUPPORT_TICKETS, 0.0);
    let nps = features.get_or(feature::NPS_SCORE, 5.0);

    let risk = USAGE_DECLINE_WEIGHT * normalize(usage_decline, USAGE_DECLINE_RANGE)
        + INACTIVITY_WEIGHT * normalize(days_inactive, INACTIVITY_RANGE)
        + PAYMENT_FAILURE_WEIGHT * normalize(payment_issues, PAYMENT_FAILURE_RANGE)
        + SUPPORT_TICKET_WEIGHT * normalize(support_tickets, SUPPORT_TICKET_RANGE)
        + NPS_WEIGHT * (1.0 - nps / 10.0).clamp(0.0, 1.0);

    round_to(risk.clamp(0.0, 1.0), 4)
}

fn normalize(value: f64, (min, max): (f64, f64)) -> f64 {
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::heuristic_churn_risk;
    use crate::domain::customer::{feature, FeatureSet};

    #[test]
    fn default_features_carry_only_the_nps_term() {
        // All indicators at zero, nps 5: risk = 0.20 * (1 - 0.5) = 0.10
        assert_eq!(heuristic_churn_risk(&FeatureSet::new()), 0.10);
    }

    #[test]
    fn saturated_indicators_produce_maximum_risk() {
        let features = FeatureSet::new()
            .with(feature::USAGE_CHANGE_30D, -30.0)
            .with(feature::DAYS_SINCE_LOGIN, 30.0)
            .with(feature::PAYMENT_FAILURES_90D, 3.0)
            .with(feature::SUPPORT_TICKETS, 5.0)
            .with(feature::NPS_SCORE, 0.0);

        assert_eq!(heuristic_churn_risk(&features), 1.0);
    }

    #[test]
    fn risk_is_directionally_consistent() {
        let calm = FeatureSet::new().with(feature::NPS_SCORE, 9.0);
        let worried = FeatureSet::new()
            .with(feature::NPS_SCORE, 9.0)
            .with(feature::PAYMENT_FAILURES_90D, 2.0)
            .with(feature::DAYS_SINCE_LOGIN, 20.0);

        assert!(heuristic_churn_risk(&worried) > heuristic_churn_risk(&calm));
    }

    #[test]
    fn risk_stays_in_unit_interval_for_out_of_range_inputs() {
        let features = FeatureSet::new()
            .with(feature::USAGE_CHANGE_30D, -500.0)
            .with(feature::DAYS_SINCE_LOGIN, 400.0)
            .with(feature::PAYMENT_FAILURES_90D, 50.0)
            .with(feature::SUPPORT_TICKETS, 99.0)
            .with(feature::NPS_SCORE, -4.0);

        let risk = heuristic_churn_risk(&features);
        assert!((0.0..=1.0).contains(&risk));

        let negative_indicators = FeatureSet::new()
            .with(feature::USAGE_CHANGE_30D, 80.0)
            .with(feature::NPS_SCORE, 15.0);
        let risk = heuristic_churn_risk(&negative_indicators);
        assert!((0.0..=1.0).contains(&risk));
    }
}
