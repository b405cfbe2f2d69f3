use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use crate::domain::pricing::DemandProfile;

use super::round_to;

impl DemandProfile {
    /// Demand factor for a point in time. Pure and total: the same
    /// timestamp always yields the same factor.
    ///
    /// The peak window is inclusive on both ends; Saturday and Sunday add
    /// the weekend multiplier on top of whichever window applies.
    pub fn demand_factor(&self, timestamp: DateTime<Utc>) -> f64 {
        let hour = timestamp.hour();

        let mut demand = if (self.peak_hour_start..=self.peak_hour_end).contains(&hour) {
            self.peak_multiplier
        } else {
            self.offpeak_multiplier
        };

        if matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun) {
            demand += self.weekend_multiplier;
        }

        round_to(demand, 4)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::domain::pricing::DemandProfile;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        // January 2024: the 15th is a Monday, the 20th a Saturday.
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).single().expect("valid timestamp")
    }

    #[test]
    fn weekday_peak_uses_the_peak_multiplier_alone() {
        let profile = DemandProfile::default();
        assert_eq!(profile.demand_factor(at(15, 20)), 0.15);
    }

    #[test]
    fn weekday_offpeak_uses_the_offpeak_multiplier() {
        let profile = DemandProfile::default();
        assert_eq!(profile.demand_factor(at(15, 10)), -0.10);
    }

    #[test]
    fn weekend_adds_the_weekend_multiplier_on_top() {
        let profile = DemandProfile::default();
        assert_eq!(profile.demand_factor(at(20, 20)), 0.20);
        assert_eq!(profile.demand_factor(at(20, 10)), -0.05);
    }

    #[test]
    fn peak_window_is_inclusive_on_both_ends() {
        let profile = DemandProfile::default();
        assert_eq!(profile.demand_factor(at(15, 18)), 0.15);
        assert_eq!(profile.demand_factor(at(15, 22)), 0.15);
        assert_eq!(profile.demand_factor(at(15, 23)), -0.10);
        assert_eq!(profile.demand_factor(at(15, 17)), -0.10);
    }

    #[test]
    fn same_timestamp_always_yields_the_same_factor() {
        let profile = DemandProfile::default();
        let timestamp = at(15, 20);

        let first = profile.demand_factor(timestamp);
        for _ in 0..10 {
            assert_eq!(profile.demand_factor(timestamp), first);
        }
    }
}
