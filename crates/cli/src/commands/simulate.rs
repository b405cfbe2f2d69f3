use std::path::Path;

use rust_decimal::Decimal;
use serde_json::json;

use pricewise_core::config::{AppConfig, LoadOptions};

use crate::commands::{build_engine, load_features, CommandResult};

pub fn run(base_price: Decimal, features_path: Option<&Path>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "simulate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let features = match load_features(features_path) {
        Ok(features) => features,
        Err(message) => return CommandResult::failure("simulate", "feature_input", message, 2),
    };

    let engine = build_engine(&config);
    let scenarios = match engine.simulate_pricing_scenarios(base_price, &features, None) {
        Ok(scenarios) => scenarios,
        Err(error) => {
            return CommandResult::failure("simulate", "domain_validation", error.to_string(), 3);
        }
    };

    let rows: Vec<_> = scenarios
        .iter()
        .map(|(scenario, result)| {
            json!({
                "scenario": scenario.as_str(),
                "dynamic_price": result.dynamic_price,
                "price_change_percent": result.price_change_percent,
                "demand_factor": result.factors.demand_factor,
                "recommendation": result.recommendation.message(),
            })
        })
        .collect();

    CommandResult::success_with_details(
        "simulate",
        format!("priced {} scenarios for base price {base_price}", rows.len()),
        json!({ "base_price": base_price, "scenarios": rows }),
    )
}
