use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use pricewise_core::config::{AppConfig, LoadOptions};

use crate::commands::{build_engine, load_features, CommandResult};

pub fn run(
    base_price: Decimal,
    features_path: Option<&Path>,
    timestamp: Option<&str>,
) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "price",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let features = match load_features(features_path) {
        Ok(features) => features,
        Err(message) => return CommandResult::failure("price", "feature_input", message, 2),
    };

    let timestamp = match timestamp {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(error) => {
                return CommandResult::failure(
                    "price",
                    "timestamp_input",
                    format!("invalid RFC 3339 timestamp `{raw}`: {error}"),
                    2,
                );
            }
        },
        None => None,
    };

    let engine = build_engine(&config);
    match engine.calculate_dynamic_price(base_price, &features, timestamp) {
        Ok(result) => {
            let message = format!(
                "dynamic price {} ({}{}%)",
                result.dynamic_price,
                if result.price_change_percent >= 0.0 { "+" } else { "" },
                result.price_change_percent
            );
            match serde_json::to_value(&result) {
                Ok(details) => CommandResult::success_with_details("price", message, details),
                Err(error) => {
                    CommandResult::failure("price", "serialization", error.to_string(), 4)
                }
            }
        }
        Err(error) => {
            CommandResult::failure("price", "domain_validation", error.to_string(), 3)
        }
    }
}
