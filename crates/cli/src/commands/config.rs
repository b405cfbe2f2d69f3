use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use pricewise_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "PRICEWISE_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "PRICEWISE_SERVER_PORT"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "PRICEWISE_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "PRICEWISE_LOGGING_FORMAT"),
    ));

    lines.push(render_line(
        "engine.weights.alpha",
        &config.engine.weights.alpha.to_string(),
        source("engine.weights.alpha", "PRICEWISE_ENGINE_ALPHA"),
    ));
    lines.push(render_line(
        "engine.weights.beta",
        &config.engine.weights.beta.to_string(),
        source("engine.weights.beta", "PRICEWISE_ENGINE_BETA"),
    ));
    lines.push(render_line(
        "engine.weights.gamma",
        &config.engine.weights.gamma.to_string(),
        source("engine.weights.gamma", "PRICEWISE_ENGINE_GAMMA"),
    ));

    lines.push(render_line(
        "engine.constraints.min_discount",
        &config.engine.constraints.min_discount.to_string(),
        source("engine.constraints.min_discount", "PRICEWISE_ENGINE_MIN_DISCOUNT"),
    ));
    lines.push(render_line(
        "engine.constraints.max_premium",
        &config.engine.constraints.max_premium.to_string(),
        source("engine.constraints.max_premium", "PRICEWISE_ENGINE_MAX_PREMIUM"),
    ));
    lines.push(render_line(
        "engine.constraints.churn_threshold",
        &config.engine.constraints.churn_threshold.to_string(),
        source("engine.constraints.churn_threshold", "PRICEWISE_ENGINE_CHURN_THRESHOLD"),
    ));

    lines.push(render_line(
        "engine.history_capacity",
        &config.engine.history_capacity.to_string(),
        source("engine.history_capacity", "PRICEWISE_ENGINE_HISTORY_CAPACITY"),
    ));
    lines.push(render_line(
        "artifacts.dir",
        &config.artifacts.dir.display().to_string(),
        source("artifacts.dir", "PRICEWISE_ARTIFACTS_DIR"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("pricewise.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/pricewise.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
