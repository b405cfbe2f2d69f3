use rust_decimal::Decimal;

use pricewise_core::config::{AppConfig, LoadOptions};
use pricewise_core::pricing::engine::PricingEngine;

use crate::commands::CommandResult;

pub fn run(
    customers_saved: u32,
    avg_revenue_per_user: Decimal,
    avg_lifetime_months: u32,
    implementation_cost: Decimal,
) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "roi",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let engine = PricingEngine::new(config.engine);
    match engine.calculate_roi_projection(
        customers_saved,
        avg_revenue_per_user,
        avg_lifetime_months,
        implementation_cost,
    ) {
        Ok(projection) => {
            let message = format!(
                "roi {}% with payback in {} months",
                projection.roi_percent, projection.payback_months
            );
            match serde_json::to_value(&projection) {
                Ok(details) => CommandResult::success_with_details("roi", message, details),
                Err(error) => CommandResult::failure("roi", "serialization", error.to_string(), 4),
            }
        }
        Err(error) => CommandResult::failure("roi", "domain_validation", error.to_string(), 3),
    }
}
