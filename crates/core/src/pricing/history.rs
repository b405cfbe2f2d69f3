use std::collections::VecDeque;

use crate::domain::pricing::PricingResult;

/// Bounded, append-only record of computed prices. The oldest entry is
/// evicted once capacity is reached; reads are capped by `recent`.
#[derive(Debug)]
pub struct PricingHistory {
    entries: VecDeque<PricingResult>,
    capacity: usize,
}

impl PricingHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, result: PricingResult) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(result);
    }

    /// Most recent `limit` entries in chronological order.
    pub fn recent(&self, limit: usize) -> Vec<PricingResult> {
        let take = limit.min(self.entries.len());
        self.entries.iter().skip(self.entries.len() - take).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::PricingHistory;
    use crate::domain::pricing::{
        FactorBreakdown, PricingResult, PricingWeights, Recommendation,
    };

    fn result_with_price(price: i64) -> PricingResult {
        PricingResult {
            base_price: Decimal::from(price),
            dynamic_price: Decimal::from(price),
            price_change: Decimal::ZERO,
            price_change_percent: 0.0,
            factors: FactorBreakdown {
                demand_factor: 0.0,
                elasticity: -1.0,
                elasticity_factor: 0.0,
                churn_risk: 0.0,
            },
            weights: PricingWeights::default(),
            adjustment: 0.0,
            recommendation: Recommendation::Standard,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn oldest_entries_are_evicted_at_capacity() {
        let mut history = PricingHistory::new(3);
        for price in 1..=5 {
            history.push(result_with_price(price));
        }

        assert_eq!(history.len(), 3);
        let recent = history.recent(10);
        let prices: Vec<_> = recent.iter().map(|r| r.base_price).collect();
        assert_eq!(prices, vec![Decimal::from(3), Decimal::from(4), Decimal::from(5)]);
    }

    #[test]
    fn recent_is_capped_by_the_limit() {
        let mut history = PricingHistory::new(10);
        for price in 1..=6 {
            history.push(result_with_price(price));
        }

        let recent = history.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].base_price, Decimal::from(5));
        assert_eq!(recent[1].base_price, Decimal::from(6));
    }

    #[test]
    fn zero_capacity_is_promoted_to_one() {
        let mut history = PricingHistory::new(0);
        history.push(result_with_price(1));
        history.push(result_with_price(2));

        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.recent(5)[0].base_price, Decimal::from(2));
    }
}
