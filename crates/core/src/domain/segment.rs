use serde::{Deserialize, Serialize};

/// The five canonical price-sensitivity segments. Each carries a
/// representative elasticity coefficient and a pricing strategy used when
/// the segmentation model delegates elasticity estimation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    PremiumPowerUsers,
    PriceConscious,
    ValueSeekers,
    BudgetUsers,
    CasualPremium,
}

impl SegmentKind {
    pub const ALL: [SegmentKind; 5] = [
        Self::PremiumPowerUsers,
        Self::PriceConscious,
        Self::ValueSeekers,
        Self::BudgetUsers,
        Self::CasualPremium,
    ];

    pub fn id(&self) -> u32 {
        match self {
            Self::PremiumPowerUsers => 0,
            Self::PriceConscious => 1,
            Self::ValueSeekers => 2,
            Self::BudgetUsers => 3,
            Self::CasualPremium => 4,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|segment| segment.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PremiumPowerUsers => "Premium Power Users",
            Self::PriceConscious => "Price-Conscious",
            Self::ValueSeekers => "Value-Seekers",
            Self::BudgetUsers => "Budget Users",
            Self::CasualPremium => "Casual Premium",
        }
    }

    /// Expected share of the customer base.
    pub fn population_share(&self) -> f64 {
        match self {
            Self::PremiumPowerUsers => 0.15,
            Self::PriceConscious => 0.25,
            Self::ValueSeekers => 0.30,
            Self::BudgetUsers => 0.20,
            Self::CasualPremium => 0.10,
        }
    }

    /// Representative price elasticity; more negative means more
    /// price-sensitive.
    pub fn price_elasticity(&self) -> f64 {
        match self {
            Self::PremiumPowerUsers => -0.3,
            Self::PriceConscious => -1.8,
            Self::ValueSeekers => -1.2,
            Self::BudgetUsers => -2.0,
            Self::CasualPremium => -0.5,
        }
    }

    pub fn pricing_strategy(&self) -> &'static str {
        match self {
            Self::PremiumPowerUsers => {
                "Focus on loyalty rewards and exclusive features. Low price sensitivity."
            }
            Self::PriceConscious => {
                "Offer dynamic discounts and promotional pricing. High price sensitivity."
            }
            Self::ValueSeekers => "Emphasize value-for-money with tiered pricing options.",
            Self::BudgetUsers => "Off-peak offers and basic plans with flexibility.",
            Self::CasualPremium => "Convenience pricing with simple premium options.",
        }
    }
}

/// Single-customer segmentation output, as exposed to callers and to the
/// pricing engine's elasticity path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentPrediction {
    pub segment_id: u32,
    pub segment_name: String,
    pub price_elasticity: f64,
    pub pricing_strategy: String,
    pub confidence: f64,
}

impl SegmentPrediction {
    pub fn from_segment(segment: SegmentKind, confidence: f64) -> Self {
        Self {
            segment_id: segment.id(),
            segment_name: segment.name().to_string(),
            price_elasticity: segment.price_elasticity(),
            pricing_strategy: segment.pricing_strategy().to_string(),
            confidence,
        }
    }
}
