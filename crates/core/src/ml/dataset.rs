//! Seeded synthetic customer data for model training and fixtures.
//!
//! Distributions are plan-correlated: heavier plans imply heavier usage
//! and revenue, and the churn label is drawn from the same risk
//! indicators the serving-side heuristic reads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::customer::{feature, CustomerId, FeatureSet};

use super::LabeledCustomer;

/// Subscription plan catalog: name, monthly price, advertised speed.
const PLANS: [(&str, f64, f64); 5] = [
    ("Basic", 499.0, 50.0),
    ("Standard", 799.0, 100.0),
    ("Premium", 1299.0, 200.0),
    ("Ultra", 1999.0, 500.0),
    ("Business", 2999.0, 1000.0),
];

const PLAN_SHARES: [f64; 5] = [0.20, 0.30, 0.25, 0.15, 0.10];

#[derive(Clone, Copy, Debug)]
pub struct DatasetConfig {
    pub n_samples: usize,
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self { n_samples: 10_000, seed: 42 }
    }
}

#[derive(Clone, Debug)]
pub struct SyntheticCustomer {
    pub id: CustomerId,
    pub plan_name: &'static str,
    pub features: FeatureSet,
    pub churned: bool,
}

impl SyntheticCustomer {
    pub fn to_labeled(&self) -> LabeledCustomer {
        LabeledCustomer { features: self.features.clone(), churned: self.churned }
    }
}

/// Generates `n_samples` customers. Same config, same output.
pub fn generate(config: &DatasetConfig) -> Vec<SyntheticCustomer> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..config.n_samples).map(|_| generate_one(&mut rng)).collect()
}

/// Deterministic shuffle-split into (train, test) labeled sets.
pub fn train_test_split(
    customers: &[SyntheticCustomer],
    test_ratio: f64,
    seed: u64,
) -> (Vec<LabeledCustomer>, Vec<LabeledCustomer>) {
    use rand::seq::SliceRandom;

    let mut indices: Vec<usize> = (0..customers.len()).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let test_len = ((customers.len() as f64) * test_ratio.clamp(0.0, 1.0)).round() as usize;
    let (test_idx, train_idx) = indices.split_at(test_len.min(customers.len()));

    let collect = |idx: &[usize]| idx.iter().map(|&i| customers[i].to_labeled()).collect();
    (collect(train_idx), collect(test_idx))
}

fn generate_one(rng: &mut StdRng) -> SyntheticCustomer {
    let (plan_name, plan_price, plan_speed) = pick_plan(rng);

    let contract_age = sample_exponential(rng, 18.0).clamp(1.0, 60.0).round();
    let usage =
        (plan_speed * 3.0 + sample_normal(rng, 0.0, 50.0)).clamp(10.0, 2000.0);
    let avg_speed = plan_speed * rng.gen_range(0.7..0.95);
    let sessions = sample_normal(rng, 45.0, 15.0).clamp(5.0, 150.0).round();
    let usage_change = sample_normal(rng, -2.0, 15.0).clamp(-50.0, 30.0);
    let days_since_login = sample_exponential(rng, 5.0).clamp(0.0, 60.0).round();
    let payment_failures = skewed_count(rng, &[0.75, 0.92, 0.98]);
    let late_payments = skewed_count(rng, &[0.65, 0.85, 0.94, 0.98]);
    let support_tickets = skewed_count(rng, &[0.55, 0.78, 0.90, 0.96, 0.99]);
    let complaints = skewed_count(rng, &[0.80, 0.94, 0.99]);
    let nps = sample_normal(rng, 6.5, 2.5).clamp(0.0, 10.0).round();
    let billing_monthly = rng.gen_bool(0.70);
    let business = rng.gen_bool(0.15);
    let total_revenue = plan_price * contract_age * rng.gen_range(0.9..1.1);

    let features = FeatureSet::new()
        .with(feature::USAGE_CHANGE_30D, round2(usage_change))
        .with(feature::DAYS_SINCE_LOGIN, days_since_login)
        .with(feature::PAYMENT_FAILURES_90D, payment_failures)
        .with(feature::SUPPORT_TICKETS, support_tickets)
        .with(feature::CONTRACT_AGE_MONTHS, contract_age)
        .with(feature::AVG_MONTHLY_USAGE_GB, round2(usage))
        .with(feature::PLAN_PRICE, plan_price)
        .with(feature::LATE_PAYMENTS_COUNT, late_payments)
        .with(feature::NPS_SCORE, nps)
        .with(feature::COMPLAINTS_COUNT, complaints)
        .with(feature::SESSION_COUNT_30D, sessions)
        .with(feature::AVG_SPEED_MBPS, round2(avg_speed))
        .with(feature::BILLING_CYCLE_MONTHLY, if billing_monthly { 1.0 } else { 0.0 })
        .with(feature::ACCOUNT_TYPE_BUSINESS, if business { 1.0 } else { 0.0 })
        .with(feature::TOTAL_REVENUE, round2(total_revenue));

    let churned = rng.gen::<f64>() < churn_probability(&features);

    SyntheticCustomer { id: CustomerId::random(), plan_name, features, churned }
}

fn pick_plan(rng: &mut StdRng) -> (&'static str, f64, f64) {
    let roll: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (plan, share) in PLANS.iter().zip(PLAN_SHARES.iter()) {
        cumulative += share;
        if roll < cumulative {
            return *plan;
        }
    }
    PLANS[PLANS.len() - 1]
}

/// Churn label probability driven by the same indicators the serving-side
/// heuristic reads; long-tenured customers are slightly stickier.
fn churn_probability(features: &FeatureSet) -> f64 {
    let norm = |value: f64, max: f64| (value / max).clamp(0.0, 1.0);

    let usage_decline = -features.get_or(feature::USAGE_CHANGE_30D, 0.0);
    let inactivity = features.get_or(feature::DAYS_SINCE_LOGIN, 0.0);
    let failures = features.get_or(feature::PAYMENT_FAILURES_90D, 0.0);
    let tickets = features.get_or(feature::SUPPORT_TICKETS, 0.0);
    let nps = features.get_or(feature::NPS_SCORE, 5.0);
    let tenure = features.get_or(feature::CONTRACT_AGE_MONTHS, 0.0);

    let risk = 0.05
        + 0.30 * norm(usage_decline, 30.0)
        + 0.20 * norm(inactivity, 30.0)
        + 0.20 * norm(failures, 3.0)
        + 0.15 * norm(tickets, 5.0)
        + 0.20 * (1.0 - nps / 10.0).clamp(0.0, 1.0)
        - 0.10 * norm(tenure, 60.0);

    risk.clamp(0.02, 0.95)
}

/// Box-Muller transform.
fn sample_normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    mean + std_dev * z
}

fn sample_exponential(rng: &mut StdRng, mean: f64) -> f64 {
    let u: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    -mean * u.ln()
}

/// Draws a small count from cumulative thresholds: a roll below
/// `thresholds[i]` yields `i`, anything above yields `thresholds.len()`.
fn skewed_count(rng: &mut StdRng, thresholds: &[f64]) -> f64 {
    let roll: f64 = rng.gen();
    for (count, threshold) in thresholds.iter().enumerate() {
        if roll < *threshold {
            return count as f64;
        }
    }
    thresholds.len() as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{generate, train_test_split, DatasetConfig};
    use crate::domain::customer::feature;

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let config = DatasetConfig { n_samples: 50, seed: 9 };
        let first = generate(&config);
        let second = generate(&config);

        assert_eq!(first.len(), 50);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.features, b.features);
            assert_eq!(a.churned, b.churned);
        }
    }

    #[test]
    fn generated_features_stay_in_realistic_ranges() {
        let customers = generate(&DatasetConfig { n_samples: 200, seed: 4 });

        for customer in &customers {
            let f = &customer.features;
            f.validate().expect("all features must be finite");

            let nps = f.get_or(feature::NPS_SCORE, -1.0);
            assert!((0.0..=10.0).contains(&nps));

            let usage = f.get_or(feature::AVG_MONTHLY_USAGE_GB, -1.0);
            assert!((10.0..=2000.0).contains(&usage));

            let price = f.get_or(feature::PLAN_PRICE, 0.0);
            assert!([499.0, 799.0, 1299.0, 1999.0, 2999.0].contains(&price));
        }
    }

    #[test]
    fn churn_rate_lands_in_a_plausible_band() {
        let customers = generate(&DatasetConfig { n_samples: 2000, seed: 42 });
        let churned = customers.iter().filter(|c| c.churned).count() as f64;
        let rate = churned / customers.len() as f64;

        assert!((0.05..=0.60).contains(&rate), "churn rate {rate} out of band");
    }

    #[test]
    fn split_partitions_without_overlap() {
        let customers = generate(&DatasetConfig { n_samples: 100, seed: 2 });
        let (train, test) = train_test_split(&customers, 0.2, 7);

        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
    }
}
