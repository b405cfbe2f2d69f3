pub mod churn;
pub mod demand;
pub mod elasticity;
pub mod engine;
pub mod history;

/// Rounds to a fixed number of decimal places; result payloads carry
/// factors at 4 places and percentages at 2.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::round_to;

    #[test]
    fn round_to_keeps_the_requested_precision() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(-1.284, 2), -1.28);
        assert_eq!(round_to(2.857142, 1), 2.9);
    }
}
