//! Kubernetes workload cost estimation library
//!
//! This crate provides the core functionality for:
//! - Decoding workload, autoscaler and volume claim manifests
//! - Resolving container requests and limits
//! - Monthly cost ranges per kind, and diffs between two estimates
//! - Unit prices from configuration or the GCP billing catalog
//! - Metrics and structured logging

pub mod config;
pub mod error;
pub mod estimator;
pub mod manifest;
pub mod models;
pub mod observability;
pub mod pricing;
pub mod resources;

pub use config::{EstimatorConfig, MachineFamily, ResolvedConfig};
pub use error::{ConfigError, ManifestError, PriceError, QuantityError, Result};
pub use estimator::{diff, estimate, estimate_cost, Cost, CostDiff, CostEstimate, Estimator, PriceDiff};
pub use manifest::Manifests;
pub use models::*;
pub use observability::{EstimatorMetrics, StructuredLogger};
pub use pricing::{GcpPriceCatalog, PriceCatalog, StaticPriceCatalog};
