use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::domain::customer::FeatureSet;
use crate::domain::pricing::{
    DemandProfile, FactorBreakdown, PricingConstraints, PricingResult, PricingWeights,
    Recommendation, RevenueOptimization, RoiProjection,
};
use crate::errors::DomainError;
use crate::ml::churn::ChurnModel;
use crate::ml::segmentation::SegmentationModel;

use super::churn::ChurnSignal;
use super::elasticity::{discount_intensity, ElasticitySignal};
use super::history::PricingHistory;
use super::round_to;

/// Canonical simulation scenarios with fixed timestamps. Unrecognized
/// scenario names die at the parse boundary; there is no "current time"
/// fallback.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    PeakWeekday,
    OffpeakWeekday,
    PeakWeekend,
    OffpeakWeekend,
}

impl Scenario {
    pub const ALL: [Scenario; 4] =
        [Self::PeakWeekday, Self::OffpeakWeekday, Self::PeakWeekend, Self::OffpeakWeekend];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PeakWeekday => "peak_weekday",
            Self::OffpeakWeekday => "offpeak_weekday",
            Self::PeakWeekend => "peak_weekend",
            Self::OffpeakWeekend => "offpeak_weekend",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "peak_weekday" => Some(Self::PeakWeekday),
            "offpeak_weekday" => Some(Self::OffpeakWeekday),
            "peak_weekend" => Some(Self::PeakWeekend),
            "offpeak_weekend" => Some(Self::OffpeakWeekend),
            _ => None,
        }
    }

    /// Fixed timestamp so simulations are reproducible: Monday 2024-01-15
    /// and Saturday 2024-01-20, at 20:00 (peak) or 10:00 (off-peak).
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::PeakWeekday => canonical(2024, 1, 15, 20),
            Self::OffpeakWeekday => canonical(2024, 1, 15, 10),
            Self::PeakWeekend => canonical(2024, 1, 20, 20),
            Self::OffpeakWeekend => canonical(2024, 1, 20, 10),
        }
    }
}

fn canonical(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).single().unwrap_or_default()
}

/// Multi-factor pricing engine. Blends the demand, elasticity, and churn
/// signals into a bounded adjustment:
///
/// `adjustment = alpha * D_t - beta * E_factor - gamma * R_c`
///
/// Demand may push the price either way; elasticity and churn risk only
/// ever pull it down. Configuration is injected at construction; weight
/// updates go through an exclusive writer lock and each calculation reads
/// a single consistent snapshot.
pub struct PricingEngine {
    weights: RwLock<PricingWeights>,
    constraints: PricingConstraints,
    demand: DemandProfile,
    history: Mutex<PricingHistory>,
    churn_model: RwLock<Option<Arc<ChurnModel>>>,
    segmentation_model: RwLock<Option<Arc<SegmentationModel>>>,
}

impl PricingEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            weights: RwLock::new(config.weights),
            constraints: config.constraints,
            demand: config.demand,
            history: Mutex::new(PricingHistory::new(config.history_capacity)),
            churn_model: RwLock::new(None),
            segmentation_model: RwLock::new(None),
        }
    }

    /// Attaches the optional model collaborators. The engine does not own
    /// their training lifecycle; either may be absent or unfitted, in
    /// which case the matching heuristic runs instead.
    pub fn attach_models(
        &self,
        churn: Option<Arc<ChurnModel>>,
        segmentation: Option<Arc<SegmentationModel>>,
    ) {
        let churn_fitted = churn.as_ref().is_some_and(|model| model.is_fitted());
        let segmentation_fitted = segmentation.as_ref().is_some_and(|model| model.is_fitted());

        *write(&self.churn_model) = churn;
        *write(&self.segmentation_model) = segmentation;

        info!(
            event_name = "pricing.models.attached",
            churn_fitted, segmentation_fitted, "model collaborators attached to pricing engine"
        );
    }

    pub fn churn_model(&self) -> Option<Arc<ChurnModel>> {
        read(&self.churn_model).clone()
    }

    pub fn segmentation_model(&self) -> Option<Arc<SegmentationModel>> {
        read(&self.segmentation_model).clone()
    }

    pub fn weights(&self) -> PricingWeights {
        *read(&self.weights)
    }

    pub fn constraints(&self) -> PricingConstraints {
        self.constraints
    }

    pub fn demand_profile(&self) -> DemandProfile {
        self.demand
    }

    fn churn_signal(&self) -> ChurnSignal {
        match self.churn_model() {
            Some(model) if model.is_fitted() => ChurnSignal::Model(model),
            _ => ChurnSignal::Heuristic,
        }
    }

    fn elasticity_signal(&self) -> ElasticitySignal {
        match self.segmentation_model() {
            Some(model) if model.is_fitted() => ElasticitySignal::Segments(model),
            _ => ElasticitySignal::Heuristic,
        }
    }

    /// Computes the dynamic price for one customer and appends the result
    /// to the history buffer.
    ///
    /// Callers needing determinism (simulation, batch comparisons) must
    /// pass an explicit timestamp; `None` falls back to the current time.
    pub fn calculate_dynamic_price(
        &self,
        base_price: Decimal,
        features: &FeatureSet,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<PricingResult, DomainError> {
        if base_price <= Decimal::ZERO {
            return Err(DomainError::InvalidBasePrice(base_price));
        }
        features.validate()?;

        let at = timestamp.unwrap_or_else(Utc::now);
        let weights = self.weights();

        let demand_factor = self.demand.demand_factor(at);
        let elasticity = self.elasticity_signal().estimate(features);
        let churn_risk = self.churn_signal().estimate(features);
        let elasticity_factor = round_to(discount_intensity(elasticity), 4);

        let adjustment = round_to(
            blend_adjustment(
                &weights,
                &self.constraints,
                demand_factor,
                elasticity_factor,
                churn_risk,
            ),
            4,
        );

        let dynamic_price = apply_adjustment(base_price, adjustment);
        let price_change = dynamic_price - base_price;
        let change_ratio: f64 = (price_change / base_price).try_into().unwrap_or(0.0);
        // Derived from the floored price, so it may exceed the nominal
        // adjustment bounds when the floor engages.
        let price_change_percent = round_to(change_ratio * 100.0, 2);

        let result = PricingResult {
            base_price,
            dynamic_price,
            price_change,
            price_change_percent,
            factors: FactorBreakdown { demand_factor, elasticity, elasticity_factor, churn_risk },
            weights,
            adjustment,
            recommendation: Recommendation::from_price_change_percent(price_change_percent),
            computed_at: at,
        };

        debug!(
            event_name = "pricing.calculated",
            adjustment, price_change_percent, "dynamic price computed"
        );

        lock(&self.history).push(result.clone());
        Ok(result)
    }

    /// Prices one customer under each requested scenario (all four when
    /// none are named). Deterministic: every scenario uses its canonical
    /// timestamp, so repeated runs and any iteration order agree.
    pub fn simulate_pricing_scenarios(
        &self,
        base_price: Decimal,
        features: &FeatureSet,
        scenarios: Option<&[Scenario]>,
    ) -> Result<BTreeMap<Scenario, PricingResult>, DomainError> {
        let selected = scenarios.unwrap_or(&Scenario::ALL);

        let mut results = BTreeMap::new();
        for scenario in selected {
            let result =
                self.calculate_dynamic_price(base_price, features, Some(scenario.timestamp()))?;
            results.insert(*scenario, result);
        }
        Ok(results)
    }

    /// Prices an index-aligned batch of customers and aggregates revenue.
    /// There is no cross-customer interaction: the dynamic total equals
    /// the sum of the individual results.
    pub fn optimize_revenue(
        &self,
        customers: &[FeatureSet],
        base_prices: &[Decimal],
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<RevenueOptimization, DomainError> {
        if customers.len() != base_prices.len() {
            return Err(DomainError::BatchLengthMismatch {
                customers: customers.len(),
                prices: base_prices.len(),
            });
        }
        if customers.is_empty() {
            return Err(DomainError::EmptyBatch);
        }

        let mut individual_results = Vec::with_capacity(customers.len());
        let mut total_base = Decimal::ZERO;
        let mut total_dynamic = Decimal::ZERO;
        let mut percent_sum = 0.0;

        for (features, base_price) in customers.iter().zip(base_prices) {
            let result = self.calculate_dynamic_price(*base_price, features, timestamp)?;
            total_base += *base_price;
            total_dynamic += result.dynamic_price;
            percent_sum += result.price_change_percent;
            individual_results.push(result);
        }

        let revenue_change = total_dynamic - total_base;
        let change_ratio: f64 = (revenue_change / total_base).try_into().unwrap_or(0.0);

        Ok(RevenueOptimization {
            total_base_revenue: total_base.round_dp(2),
            total_dynamic_revenue: total_dynamic.round_dp(2),
            revenue_change: revenue_change.round_dp(2),
            revenue_change_percent: round_to(change_ratio * 100.0, 2),
            customers_processed: customers.len(),
            avg_price_change_percent: round_to(percent_sum / customers.len() as f64, 2),
            individual_results,
        })
    }

    /// Partial weight update: `None` leaves that weight unchanged. No
    /// bounds validation; the clamped adjustment is the safety net.
    pub fn update_weights(
        &self,
        alpha: Option<f64>,
        beta: Option<f64>,
        gamma: Option<f64>,
    ) -> PricingWeights {
        let updated = {
            let mut weights = write(&self.weights);
            if let Some(alpha) = alpha {
                weights.alpha = alpha;
            }
            if let Some(beta) = beta {
                weights.beta = beta;
            }
            if let Some(gamma) = gamma {
                weights.gamma = gamma;
            }
            *weights
        };

        info!(
            event_name = "pricing.weights.updated",
            alpha = updated.alpha,
            beta = updated.beta,
            gamma = updated.gamma,
            "pricing weights updated"
        );
        updated
    }

    /// Projected return on a retention program:
    /// `revenue_saved = customers * arpu * lifetime_months`.
    pub fn calculate_roi_projection(
        &self,
        customers_saved: u32,
        avg_revenue_per_user: Decimal,
        avg_lifetime_months: u32,
        implementation_cost: Decimal,
    ) -> Result<RoiProjection, DomainError> {
        let revenue_saved = avg_revenue_per_user
            * Decimal::from(customers_saved)
            * Decimal::from(avg_lifetime_months);

        if revenue_saved <= Decimal::ZERO {
            return Err(DomainError::DegenerateRoi("no revenue projected".to_owned()));
        }
        if implementation_cost <= Decimal::ZERO {
            return Err(DomainError::DegenerateRoi(
                "implementation cost must be positive".to_owned(),
            ));
        }

        let net_benefit = revenue_saved - implementation_cost;
        let roi_ratio: f64 = (net_benefit / implementation_cost).try_into().unwrap_or(0.0);
        let monthly_revenue = revenue_saved / Decimal::from(avg_lifetime_months);
        let payback_ratio: f64 = (implementation_cost / monthly_revenue).try_into().unwrap_or(0.0);

        Ok(RoiProjection {
            customers_saved,
            revenue_saved: revenue_saved.round_dp(2),
            implementation_cost,
            net_benefit: net_benefit.round_dp(2),
            roi_percent: round_to(roi_ratio * 100.0, 2),
            payback_months: round_to(payback_ratio, 1),
        })
    }

    /// Most recent `limit` pricing results, oldest first.
    pub fn recent_history(&self, limit: usize) -> Vec<PricingResult> {
        lock(&self.history).recent(limit)
    }

    pub fn history_len(&self) -> usize {
        lock(&self.history).len()
    }
}

/// Weighted blend of the three signals, clamped into the constraint
/// window. A non-finite blend (malformed weights) degrades to zero
/// adjustment instead of propagating.
pub fn blend_adjustment(
    weights: &PricingWeights,
    constraints: &PricingConstraints,
    demand_factor: f64,
    elasticity_factor: f64,
    churn_risk: f64,
) -> f64 {
    let raw = weights.alpha * demand_factor
        - weights.beta * elasticity_factor
        - weights.gamma * churn_risk;

    if !raw.is_finite() {
        return 0.0;
    }
    raw.clamp(constraints.min_discount, constraints.max_premium)
}

/// Applies the adjustment to the base price, with the 0.5x absolute floor.
fn apply_adjustment(base_price: Decimal, adjustment: f64) -> Decimal {
    let factor = Decimal::from_f64_retain(1.0 + adjustment).unwrap_or(Decimal::ONE);
    let dynamic_price = (base_price * factor).round_dp(2);
    let floor = (base_price / Decimal::TWO).round_dp(2);

    if dynamic_price < floor {
        floor
    } else {
        dynamic_price
    }
}

// Lock guards hold plain data; recover the inner value on poison.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
