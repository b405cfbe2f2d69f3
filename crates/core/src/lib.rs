pub mod config;
pub mod domain;
pub mod errors;
pub mod ml;
pub mod pricing;

pub use config::{AppConfig, ConfigError, EngineConfig, LoadOptions};
pub use domain::customer::{CustomerId, FeatureSet};
pub use domain::pricing::{
    DemandProfile, FactorBreakdown, PricingConstraints, PricingResult, PricingWeights,
    Recommendation, RevenueOptimization, RoiProjection,
};
pub use domain::segment::{SegmentKind, SegmentPrediction};
pub use errors::{ApplicationError, DomainError, InterfaceError, ModelError};
pub use ml::churn::{ChurnModel, ChurnPrediction, RiskLevel};
pub use ml::segmentation::SegmentationModel;
pub use ml::{LabeledCustomer, ModelMetrics};
pub use pricing::engine::{PricingEngine, Scenario};
