use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::pricing::{DemandProfile, PricingConstraints, PricingWeights};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
    pub artifacts: ArtifactsConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Durable engine state: weights, constraints, and the demand table are
/// the only configuration that must survive a process restart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub weights: PricingWeights,
    pub constraints: PricingConstraints,
    pub demand: DemandProfile,
    pub history_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: PricingWeights::default(),
            constraints: PricingConstraints::default(),
            demand: DemandProfile::default(),
            history_capacity: 1000,
        }
    }
}

impl EngineConfig {
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let rendered = toml::to_string_pretty(self)
            .map_err(|error| ConfigError::Validation(error.to_string()))?;
        fs::write(path, rendered)
            .map_err(|source| ConfigError::WriteFile { path: path.to_path_buf(), source })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        toml::from_str(&raw)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }
}

#[derive(Clone, Debug)]
pub struct ArtifactsConfig {
    pub dir: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub artifacts_dir: Option<PathBuf>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    pub history_capacity: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not write config file `{path}`: {source}")]
    WriteFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            engine: EngineConfig::default(),
            artifacts: ArtifactsConfig { dir: PathBuf::from("artifacts") },
        }
    }
}

impl AppConfig {
    /// Load precedence: programmatic overrides > env > file > defaults.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("pricewise.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(engine) = patch.engine {
            if let Some(weights) = engine.weights {
                if let Some(alpha) = weights.alpha {
                    self.engine.weights.alpha = alpha;
                }
                if let Some(beta) = weights.beta {
                    self.engine.weights.beta = beta;
                }
                if let Some(gamma) = weights.gamma {
                    self.engine.weights.gamma = gamma;
                }
            }
            if let Some(constraints) = engine.constraints {
                if let Some(min_discount) = constraints.min_discount {
                    self.engine.constraints.min_discount = min_discount;
                }
                if let Some(max_premium) = constraints.max_premium {
                    self.engine.constraints.max_premium = max_premium;
                }
                if let Some(churn_threshold) = constraints.churn_threshold {
                    self.engine.constraints.churn_threshold = churn_threshold;
                }
            }
            if let Some(demand) = engine.demand {
                if let Some(peak_hour_start) = demand.peak_hour_start {
                    self.engine.demand.peak_hour_start = peak_hour_start;
                }
                if let Some(peak_hour_end) = demand.peak_hour_end {
                    self.engine.demand.peak_hour_end = peak_hour_end;
                }
                if let Some(peak_multiplier) = demand.peak_multiplier {
                    self.engine.demand.peak_multiplier = peak_multiplier;
                }
                if let Some(offpeak_multiplier) = demand.offpeak_multiplier {
                    self.engine.demand.offpeak_multiplier = offpeak_multiplier;
                }
                if let Some(weekend_multiplier) = demand.weekend_multiplier {
                    self.engine.demand.weekend_multiplier = weekend_multiplier;
                }
            }
            if let Some(history_capacity) = engine.history_capacity {
                self.engine.history_capacity = history_capacity;
            }
        }

        if let Some(artifacts) = patch.artifacts {
            if let Some(dir) = artifacts.dir {
                self.artifacts.dir = dir;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PRICEWISE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PRICEWISE_SERVER_PORT") {
            self.server.port = parse_env("PRICEWISE_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("PRICEWISE_LOGGING_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("PRICEWISE_LOGGING_FORMAT") {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("PRICEWISE_ENGINE_ALPHA") {
            self.engine.weights.alpha = parse_env("PRICEWISE_ENGINE_ALPHA", &value)?;
        }
        if let Some(value) = read_env("PRICEWISE_ENGINE_BETA") {
            self.engine.weights.beta = parse_env("PRICEWISE_ENGINE_BETA", &value)?;
        }
        if let Some(value) = read_env("PRICEWISE_ENGINE_GAMMA") {
            self.engine.weights.gamma = parse_env("PRICEWISE_ENGINE_GAMMA", &value)?;
        }
        if let Some(value) = read_env("PRICEWISE_ENGINE_MIN_DISCOUNT") {
            self.engine.constraints.min_discount = parse_env("PRICEWISE_ENGINE_MIN_DISCOUNT", &value)?;
        }
        if let Some(value) = read_env("PRICEWISE_ENGINE_MAX_PREMIUM") {
            self.engine.constraints.max_premium = parse_env("PRICEWISE_ENGINE_MAX_PREMIUM", &value)?;
        }
        if let Some(value) = read_env("PRICEWISE_ENGINE_CHURN_THRESHOLD") {
            self.engine.constraints.churn_threshold =
                parse_env("PRICEWISE_ENGINE_CHURN_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("PRICEWISE_ENGINE_HISTORY_CAPACITY") {
            self.engine.history_capacity =
                parse_env("PRICEWISE_ENGINE_HISTORY_CAPACITY", &value)?;
        }

        if let Some(value) = read_env("PRICEWISE_ARTIFACTS_DIR") {
            self.artifacts.dir = PathBuf::from(value);
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(artifacts_dir) = overrides.artifacts_dir {
            self.artifacts.dir = artifacts_dir;
        }
        if let Some(alpha) = overrides.alpha {
            self.engine.weights.alpha = alpha;
        }
        if let Some(beta) = overrides.beta {
            self.engine.weights.beta = beta;
        }
        if let Some(gamma) = overrides.gamma {
            self.engine.weights.gamma = gamma;
        }
        if let Some(history_capacity) = overrides.history_capacity {
            self.engine.history_capacity = history_capacity;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let constraints = &self.engine.constraints;
        if constraints.min_discount >= 0.0 {
            return Err(ConfigError::Validation(format!(
                "min_discount must be negative, got {}",
                constraints.min_discount
            )));
        }
        if constraints.max_premium < 0.0 {
            return Err(ConfigError::Validation(format!(
                "max_premium must be non-negative, got {}",
                constraints.max_premium
            )));
        }
        if !(0.0..=1.0).contains(&constraints.churn_threshold) {
            return Err(ConfigError::Validation(format!(
                "churn_threshold must be within [0, 1], got {}",
                constraints.churn_threshold
            )));
        }

        let weights = &self.engine.weights;
        for (name, value) in
            [("alpha", weights.alpha), ("beta", weights.beta), ("gamma", weights.gamma)]
        {
            if !value.is_finite() {
                return Err(ConfigError::Validation(format!("weight {name} must be finite")));
            }
        }

        let demand = &self.engine.demand;
        if demand.peak_hour_start > demand.peak_hour_end || demand.peak_hour_end > 23 {
            return Err(ConfigError::Validation(format!(
                "peak window {}..={} is not a valid hour range",
                demand.peak_hour_start, demand.peak_hour_end
            )));
        }

        if self.engine.history_capacity == 0 {
            return Err(ConfigError::Validation(
                "history_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
    engine: Option<EnginePatch>,
    artifacts: Option<ArtifactsPatch>,
}

#[derive(Debug, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Deserialize)]
struct EnginePatch {
    weights: Option<WeightsPatch>,
    constraints: Option<ConstraintsPatch>,
    demand: Option<DemandPatch>,
    history_capacity: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct WeightsPatch {
    alpha: Option<f64>,
    beta: Option<f64>,
    gamma: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ConstraintsPatch {
    min_discount: Option<f64>,
    max_premium: Option<f64>,
    churn_threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DemandPatch {
    peak_hour_start: Option<u32>,
    peak_hour_end: Option<u32>,
    peak_multiplier: Option<f64>,
    offpeak_multiplier: Option<f64>,
    weekend_multiplier: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ArtifactsPatch {
    dir: Option<PathBuf>,
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

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

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}
