use std::sync::Arc;

use tracing::warn;

use crate::domain::customer::{feature, FeatureSet};
use crate::ml::segmentation::SegmentationModel;

use super::round_to;

/// Bounds of the elasticity scale shared by both estimation paths.
pub const ELASTICITY_FLOOR: f64 = -2.5;
pub const ELASTICITY_CEILING: f64 = -0.2;

// Mapping of the elasticity scale onto discount intensity. Empirically
// chosen constants, kept as configuration rather than re-derived.
const DISCOUNT_INTENSITY_SHIFT: f64 = 0.2;
const DISCOUNT_INTENSITY_SPAN: f64 = 2.3;

const NPS_WEIGHT: f64 = 0.7;
const PRICE_WEIGHT: f64 = 0.5;
const USAGE_WEIGHT: f64 = 0.3;
const PRICE_SCALE_CAP: f64 = 2000.0;
const USAGE_SCALE_CAP_GB: f64 = 500.0;

/// Elasticity source, resolved once per calculation: a fitted segmentation
/// model when one is attached, the feature heuristic otherwise. Both paths
/// return values on the same scale so downstream blending never needs to
/// know which one ran.
#[derive(Clone, Debug)]
pub enum ElasticitySignal {
    Segments(Arc<SegmentationModel>),
    Heuristic,
}

impl ElasticitySignal {
    pub fn estimate(&self, features: &FeatureSet) -> f64 {
        match self {
            Self::Segments(model) => match model.predict_single(features) {
                Ok(prediction) => prediction.price_elasticity,
                Err(error) => {
                    warn!(
                        event_name = "pricing.elasticity.fallback",
                        error = %error,
                        "segmentation delegate failed, using feature heuristic"
                    );
                    heuristic_elasticity(features)
                }
            },
            Self::Heuristic => heuristic_elasticity(features),
        }
    }
}

/// Satisfied, high-spend, high-usage customers are modeled as the least
/// price-sensitive.
pub fn heuristic_elasticity(features: &FeatureSet) -> f64 {
    let nps = features.get_or(feature::NPS_SCORE, 5.0);
    let plan_price = features.get_or(feature::PLAN_PRICE, 1000.0);
    let usage = features.get_or(feature::AVG_MONTHLY_USAGE_GB, 200.0);

    let nps_factor = nps / 10.0;
    let price_factor = (plan_price / PRICE_SCALE_CAP).min(1.0);
    let usage_factor = (usage / USAGE_SCALE_CAP_GB).min(1.0);

    let elasticity = -2.0
        + NPS_WEIGHT * nps_factor
        + PRICE_WEIGHT * price_factor
        + USAGE_WEIGHT * usage_factor;

    round_to(elasticity.clamp(ELASTICITY_FLOOR, ELASTICITY_CEILING), 2)
}

/// Maps [-2.5, -0.2] onto a 0-1 discount intensity; more price-sensitive
/// customers produce a larger factor.
pub fn discount_intensity(elasticity: f64) -> f64 {
    ((-elasticity - DISCOUNT_INTENSITY_SHIFT) / DISCOUNT_INTENSITY_SPAN).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::{discount_intensity, heuristic_elasticity, ELASTICITY_CEILING, ELASTICITY_FLOOR};
    use crate::domain::customer::{feature, FeatureSet};

    #[test]
    fn default_features_land_mid_scale() {
        // nps 5, plan price 1000, usage 200GB:
        // -2.0 + 0.7*0.5 + 0.5*0.5 + 0.3*0.4 = -1.28
        assert_eq!(heuristic_elasticity(&FeatureSet::new()), -1.28);
    }

    #[test]
    fn satisfied_heavy_users_are_least_sensitive() {
        let features = FeatureSet::new()
            .with(feature::NPS_SCORE, 10.0)
            .with(feature::PLAN_PRICE, 2999.0)
            .with(feature::AVG_MONTHLY_USAGE_GB, 800.0);

        assert_eq!(heuristic_elasticity(&features), -0.5);
    }

    #[test]
    fn heuristic_output_stays_in_range_for_extreme_inputs() {
        let extremes = [
            FeatureSet::new().with(feature::NPS_SCORE, 0.0).with(feature::PLAN_PRICE, 0.0),
            FeatureSet::new()
                .with(feature::NPS_SCORE, 10.0)
                .with(feature::PLAN_PRICE, 1e9)
                .with(feature::AVG_MONTHLY_USAGE_GB, 1e9),
            FeatureSet::new().with(feature::NPS_SCORE, -3.0),
        ];

        for features in &extremes {
            let elasticity = heuristic_elasticity(features);
            assert!((ELASTICITY_FLOOR..=ELASTICITY_CEILING).contains(&elasticity));
        }
    }

    #[test]
    fn discount_intensity_spans_the_unit_interval() {
        assert_eq!(discount_intensity(-2.5), 1.0);
        assert_eq!(discount_intensity(-0.2), 0.0);

        let mid = discount_intensity(-1.35);
        assert!((mid - 0.5).abs() < 1e-9);

        // Out-of-range elasticities are clamped, never amplified.
        assert_eq!(discount_intensity(-5.0), 1.0);
        assert_eq!(discount_intensity(0.0), 0.0);
    }
}
