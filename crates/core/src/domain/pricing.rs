use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Weight parameters for the adjustment formula. Independent multipliers;
/// they are not required to sum to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingWeights {
    /// Demand factor weight (alpha).
    pub alpha: f64,
    /// Elasticity weight (beta).
    pub beta: f64,
    /// Churn risk weight (gamma).
    pub gamma: f64,
}

impl Default for PricingWeights {
    fn default() -> Self {
        Self { alpha: 0.15, beta: 0.10, gamma: 0.20 }
    }
}

/// Hard business constraints on the final adjustment.
/// Invariant: `min_discount < 0 <= max_premium`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingConstraints {
    pub min_discount: f64,
    pub max_premium: f64,
    pub churn_threshold: f64,
}

impl Default for PricingConstraints {
    fn default() -> Self {
        Self { min_discount: -0.30, max_premium: 0.20, churn_threshold: 0.70 }
    }
}

/// Time-of-day/week demand table, static per engine instance. The peak
/// window is inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemandProfile {
    pub peak_hour_start: u32,
    pub peak_hour_end: u32,
    pub peak_multiplier: f64,
    pub offpeak_multiplier: f64,
    pub weekend_multiplier: f64,
}

impl Default for DemandProfile {
    fn default() -> Self {
        Self {
            peak_hour_start: 18,
            peak_hour_end: 22,
            peak_multiplier: 0.15,
            offpeak_multiplier: -0.10,
            weekend_multiplier: 0.05,
        }
    }
}

/// The three signals behind one price, plus the elasticity-to-discount
/// intensity mapping actually used in the blend.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub demand_factor: f64,
    pub elasticity: f64,
    pub elasticity_factor: f64,
    pub churn_risk: f64,
}

/// Recommendation band derived from the percentage price change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    MaxRetentionDiscount,
    PromotionalDiscount,
    SmallIncentive,
    Standard,
    PremiumAcceptable,
}

impl Recommendation {
    pub fn from_price_change_percent(change_pct: f64) -> Self {
        if change_pct < -20.0 {
            Self::MaxRetentionDiscount
        } else if change_pct < -10.0 {
            Self::PromotionalDiscount
        } else if change_pct < 0.0 {
            Self::SmallIncentive
        } else if change_pct <= 10.0 {
            Self::Standard
        } else {
            Self::PremiumAcceptable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxRetentionDiscount => "max_retention_discount",
            Self::PromotionalDiscount => "promotional_discount",
            Self::SmallIncentive => "small_incentive",
            Self::Standard => "standard",
            Self::PremiumAcceptable => "premium_acceptable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "max_retention_discount" => Some(Self::MaxRetentionDiscount),
            "promotional_discount" => Some(Self::PromotionalDiscount),
            "small_incentive" => Some(Self::SmallIncentive),
            "standard" => Some(Self::Standard),
            "premium_acceptable" => Some(Self::PremiumAcceptable),
            _ => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::MaxRetentionDiscount => {
                "High retention risk. Apply maximum discount with loyalty offer."
            }
            Self::PromotionalDiscount => "Moderate retention risk. Offer promotional discount.",
            Self::SmallIncentive => {
                "Slight concern. Consider small incentive to maintain engagement."
            }
            Self::Standard => "Customer is stable. Standard pricing applies.",
            Self::PremiumAcceptable => "High-value customer. Premium pricing acceptable.",
        }
    }
}

/// One computed price. Created once per calculation, immutable after
/// construction, appended to the engine's history buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub base_price: Decimal,
    pub dynamic_price: Decimal,
    pub price_change: Decimal,
    pub price_change_percent: f64,
    pub factors: FactorBreakdown,
    /// Snapshot of the weights used for this calculation.
    pub weights: PricingWeights,
    pub adjustment: f64,
    pub recommendation: Recommendation,
    pub computed_at: DateTime<Utc>,
}

/// Aggregate of a batch pricing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevenueOptimization {
    pub total_base_revenue: Decimal,
    pub total_dynamic_revenue: Decimal,
    pub revenue_change: Decimal,
    pub revenue_change_percent: f64,
    pub customers_processed: usize,
    pub avg_price_change_percent: f64,
    pub individual_results: Vec<PricingResult>,
}

/// Projected return on a retention program.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiProjection {
    pub customers_saved: u32,
    pub revenue_saved: Decimal,
    pub implementation_cost: Decimal,
    pub net_benefit: Decimal,
    pub roi_percent: f64,
    pub payback_months: f64,
}

#[cfg(test)]
mod tests {
    use super::{PricingConstraints, PricingWeights, Recommendation};

    #[test]
    fn default_weights_match_the_calibrated_values() {
        let weights = PricingWeights::default();
        assert_eq!((weights.alpha, weights.beta, weights.gamma), (0.15, 0.10, 0.20));
    }

    #[test]
    fn default_constraints_keep_the_discount_premium_ordering() {
        let constraints = PricingConstraints::default();
        assert!(constraints.min_discount < 0.0);
        assert!(constraints.max_premium >= 0.0);
    }

    #[test]
    fn recommendation_bands_cover_the_thresholds() {
        assert_eq!(
            Recommendation::from_price_change_percent(-25.0),
            Recommendation::MaxRetentionDiscount
        );
        assert_eq!(
            Recommendation::from_price_change_percent(-15.0),
            Recommendation::PromotionalDiscount
        );
        assert_eq!(Recommendation::from_price_change_percent(-5.0), Recommendation::SmallIncentive);
        assert_eq!(Recommendation::from_price_change_percent(0.0), Recommendation::Standard);
        assert_eq!(Recommendation::from_price_change_percent(10.0), Recommendation::Standard);
        assert_eq!(
            Recommendation::from_price_change_percent(10.1),
            Recommendation::PremiumAcceptable
        );
    }

    #[test]
    fn recommendation_round_trips() {
        let all = [
            Recommendation::MaxRetentionDiscount,
            Recommendation::PromotionalDiscount,
            Recommendation::SmallIncentive,
            Recommendation::Standard,
            Recommendation::PremiumAcceptable,
        ];

        for recommendation in all {
            assert_eq!(Recommendation::parse(recommendation.as_str()), Some(recommendation));
        }
    }
}
