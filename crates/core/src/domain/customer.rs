use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Canonical feature names shared by the estimators, the models, and the
/// synthetic dataset generator. Callers may supply any subset; every read
/// goes through a default.
pub mod feature {
    pub const USAGE_CHANGE_30D: &str = "usage_change_30d";
    pub const DAYS_SINCE_LOGIN: &str = "days_since_login";
    pub const PAYMENT_FAILURES_90D: &str = "payment_failures_90d";
    pub const SUPPORT_TICKETS: &str = "support_tickets";
    pub const CONTRACT_AGE_MONTHS: &str = "contract_age_months";
    pub const AVG_MONTHLY_USAGE_GB: &str = "avg_monthly_usage_gb";
    pub const PLAN_PRICE: &str = "plan_price";
    pub const LATE_PAYMENTS_COUNT: &str = "late_payments_count";
    pub const NPS_SCORE: &str = "nps_score";
    pub const COMPLAINTS_COUNT: &str = "complaints_count";
    pub const SESSION_COUNT_30D: &str = "session_count_30d";
    pub const AVG_SPEED_MBPS: &str = "avg_speed_mbps";
    pub const BILLING_CYCLE_MONTHLY: &str = "billing_cycle_monthly";
    pub const ACCOUNT_TYPE_BUSINESS: &str = "account_type_business";
    pub const TOTAL_REVENUE: &str = "total_revenue";
}

/// Named numeric features describing one customer. Immutable per pricing
/// call; no key is required.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeMap<String, f64>);

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Builder-style insert, convenient for constructing fixtures.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.0.get(name).copied().unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Rejects non-finite values before any estimator runs on them.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in &self.0 {
            if !value.is_finite() {
                return Err(DomainError::NonFiniteFeature { name: name.clone() });
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, f64)> for FeatureSet {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{feature, FeatureSet};
    use crate::errors::DomainError;

    #[test]
    fn missing_features_fall_back_to_the_supplied_default() {
        let features = FeatureSet::new().with(feature::NPS_SCORE, 8.0);

        assert_eq!(features.get_or(feature::NPS_SCORE, 5.0), 8.0);
        assert_eq!(features.get_or(feature::PLAN_PRICE, 1000.0), 1000.0);
    }

    #[test]
    fn validate_rejects_non_finite_values() {
        let features = FeatureSet::new()
            .with(feature::NPS_SCORE, 7.0)
            .with(feature::PLAN_PRICE, f64::NAN);

        assert_eq!(
            features.validate(),
            Err(DomainError::NonFiniteFeature { name: feature::PLAN_PRICE.to_string() })
        );
    }

    #[test]
    fn serializes_as_a_plain_map() {
        let features = FeatureSet::new().with(feature::SUPPORT_TICKETS, 2.0);
        let json = serde_json::to_string(&features).expect("serialize");

        assert_eq!(json, r#"{"support_tickets":2.0}"#);

        let back: FeatureSet = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, features);
    }
}
