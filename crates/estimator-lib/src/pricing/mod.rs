//! Unit price catalogs
//!
//! The estimator only needs three monthly rates. They are resolved before
//! estimation starts, either from configuration or from the GCP Cloud
//! Billing catalog.

mod gcp;

pub use gcp::{
    monthly_price, GcpPriceCatalog, GcpPriceResolver, ListSkusResponse, Money, PricingExpression,
    PricingInfo, Sku, TierRate, COMPUTE_ENGINE_SERVICE,
};

use crate::config::PricingConfig;
use crate::error::PriceError;

/// Bytes in one GiB
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Trait for price catalog implementations
pub trait PriceCatalog: Send + Sync {
    /// USD per CPU core per month
    fn cpu_monthly_price(&self) -> f64;

    /// USD per byte of memory per month
    fn memory_monthly_price(&self) -> f64;

    /// USD per byte of standard persistent disk per month
    fn storage_monthly_price(&self) -> f64;
}

/// Fixed rates, typically from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticPriceCatalog {
    cpu: f64,
    memory: f64,
    storage: f64,
}

impl StaticPriceCatalog {
    /// Rates per core-month, per byte-month and per byte-month
    pub fn new(cpu: f64, memory: f64, storage: f64) -> Self {
        Self {
            cpu,
            memory,
            storage,
        }
    }

    /// Build from configured per core-month and per GiB-month prices
    pub fn from_config(config: &PricingConfig) -> Result<Self, PriceError> {
        let mut missing = Vec::new();
        if config.cpu_monthly_price.is_none() {
            missing.push("pricing.cpu_monthly_price");
        }
        if config.memory_gib_monthly_price.is_none() {
            missing.push("pricing.memory_gib_monthly_price");
        }
        if config.storage_gib_monthly_price.is_none() {
            missing.push("pricing.storage_gib_monthly_price");
        }

        match (
            config.cpu_monthly_price,
            config.memory_gib_monthly_price,
            config.storage_gib_monthly_price,
        ) {
            (Some(cpu), Some(memory), Some(storage)) => {
                Ok(Self::new(cpu, memory / GIB, storage / GIB))
            }
            _ => Err(PriceError::MissingPrices {
                machine_family: config.machine_family.to_string(),
                region: config.region.clone(),
                missing: missing.join(", "),
            }),
        }
    }
}

impl PriceCatalog for StaticPriceCatalog {
    fn cpu_monthly_price(&self) -> f64 {
        self.cpu
    }

    fn memory_monthly_price(&self) -> f64 {
        self.memory
    }

    fn storage_monthly_price(&self) -> f64 {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_catalog_from_config_converts_gib() {
        let config = PricingConfig {
            cpu_monthly_price: Some(16.0),
            memory_gib_monthly_price: Some(2.0),
            storage_gib_monthly_price: Some(0.04),
            ..PricingConfig::default()
        };
        let catalog = StaticPriceCatalog::from_config(&config).unwrap();
        assert_eq!(catalog.cpu_monthly_price(), 16.0);
        assert_eq!(catalog.memory_monthly_price() * GIB, 2.0);
        assert!((catalog.storage_monthly_price() * GIB - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_static_catalog_requires_all_prices() {
        let config = PricingConfig {
            cpu_monthly_price: Some(16.0),
            ..PricingConfig::default()
        };
        let error = StaticPriceCatalog::from_config(&config).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("pricing.memory_gib_monthly_price"));
        assert!(message.contains("pricing.storage_gib_monthly_price"));
        assert!(!message.contains("pricing.cpu_monthly_price"));
    }
}
