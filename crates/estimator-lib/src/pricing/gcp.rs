//! GCP Cloud Billing catalog prices
//!
//! SKUs are matched by description prefix and service region. Only the
//! first tier rate of the first pricing info is used.

use super::{PriceCatalog, GIB};
use crate::config::{MachineFamily, PricingConfig};
use crate::error::PriceError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Compute Engine service id in the Cloud Billing catalog
pub const COMPUTE_ENGINE_SERVICE: &str = "6F81-5844-456A";

const HOURS_PER_MONTH: f64 = 24.0 * 31.0;
const STANDARD_PD_PREFIX: &str = "Regional Storage PD Capacity";

/// One page of `services/{id}/skus`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSkusResponse {
    #[serde(default)]
    pub skus: Vec<Sku>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    #[serde(default)]
    pub sku_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub service_regions: Vec<String>,
    #[serde(default)]
    pub pricing_info: Vec<PricingInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInfo {
    #[serde(default)]
    pub pricing_expression: PricingExpression,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingExpression {
    #[serde(default)]
    pub usage_unit: String,
    #[serde(default)]
    pub tiered_rates: Vec<TierRate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRate {
    #[serde(default)]
    pub unit_price: Money,
}

/// Google `Money`; `units` is an int64 encoded as a JSON string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    #[serde(default)]
    pub currency_code: String,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub nanos: i64,
}

impl Money {
    pub fn amount(&self) -> Result<f64, PriceError> {
        let units = if self.units.is_empty() {
            0
        } else {
            self.units
                .parse::<i64>()
                .map_err(|_| PriceError::InvalidUnitPrice(self.units.clone()))?
        };
        Ok(units as f64 + self.nanos as f64 / 1_000_000_000.0)
    }
}

/// Monthly price of one unit (core, or byte) for a pricing expression
pub fn monthly_price(expression: &PricingExpression, sku_id: &str) -> Result<f64, PriceError> {
    let rate = expression
        .tiered_rates
        .first()
        .ok_or_else(|| PriceError::EmptyPricing(sku_id.to_string()))?;
    let price = rate.unit_price.amount()?;

    match expression.usage_unit.as_str() {
        "h" => Ok(price * HOURS_PER_MONTH),
        "GiBy.h" => Ok(price / GIB * HOURS_PER_MONTH),
        "GiBy.mo" => Ok(price / GIB),
        other => Err(PriceError::UnsupportedUnit(other.to_string())),
    }
}

fn cpu_prefix(family: MachineFamily) -> &'static str {
    match family {
        MachineFamily::E2 => "E2 Instance Core",
        MachineFamily::N1 => "N1 Predefined Instance Core",
        MachineFamily::N2 => "N2 Instance Core",
        MachineFamily::N2D => "N2D AMD Custom Instance Core",
    }
}

fn memory_prefix(family: MachineFamily) -> &'static str {
    match family {
        MachineFamily::E2 => "E2 Instance Ram",
        MachineFamily::N1 => "N1 Predefined Instance Ram",
        MachineFamily::N2 => "N2 Instance Ram",
        MachineFamily::N2D => "N2D AMD Instance Ram",
    }
}

/// Collects matching SKUs while the catalog is paged through
#[derive(Debug, Clone)]
pub struct GcpPriceResolver {
    machine_family: MachineFamily,
    region: String,
    cpu: Option<Sku>,
    memory: Option<Sku>,
    storage: Option<Sku>,
}

impl GcpPriceResolver {
    pub fn new(config: &PricingConfig) -> Self {
        Self {
            machine_family: config.machine_family,
            region: config.region.clone(),
            cpu: None,
            memory: None,
            storage: None,
        }
    }

    /// Offer a SKU; the first match per resource is kept.
    ///
    /// A SKU fills at most one slot.
    pub fn offer(&mut self, sku: &Sku) {
        if self.cpu.is_none() && self.matches(sku, cpu_prefix(self.machine_family)) {
            debug!(sku_id = %sku.sku_id, description = %sku.description, "Matched CPU SKU");
            self.cpu = Some(sku.clone());
        } else if self.memory.is_none() && self.matches(sku, memory_prefix(self.machine_family)) {
            debug!(sku_id = %sku.sku_id, description = %sku.description, "Matched memory SKU");
            self.memory = Some(sku.clone());
        } else if self.storage.is_none() && self.matches(sku, STANDARD_PD_PREFIX) {
            debug!(sku_id = %sku.sku_id, description = %sku.description, "Matched storage SKU");
            self.storage = Some(sku.clone());
        }
    }

    pub fn is_complete(&self) -> bool {
        self.cpu.is_some() && self.memory.is_some() && self.storage.is_some()
    }

    pub fn finish(self) -> Result<GcpPriceCatalog, PriceError> {
        let mut missing = Vec::new();
        if self.cpu.is_none() {
            missing.push("cpu");
        }
        if self.memory.is_none() {
            missing.push("memory");
        }
        if self.storage.is_none() {
            missing.push("storage");
        }

        match (self.cpu, self.memory, self.storage) {
            (Some(cpu), Some(memory), Some(storage)) => Ok(GcpPriceCatalog {
                cpu: sku_monthly_price(&cpu)?,
                memory: sku_monthly_price(&memory)?,
                storage: sku_monthly_price(&storage)?,
            }),
            _ => Err(PriceError::MissingPrices {
                machine_family: self.machine_family.to_string(),
                region: self.region,
                missing: missing.join(", "),
            }),
        }
    }

    fn matches(&self, sku: &Sku, prefix: &str) -> bool {
        sku.description.starts_with(prefix)
            && sku
                .service_regions
                .iter()
                .any(|region| region.eq_ignore_ascii_case(&self.region))
    }
}

fn sku_monthly_price(sku: &Sku) -> Result<f64, PriceError> {
    let info = sku
        .pricing_info
        .first()
        .ok_or_else(|| PriceError::EmptyPricing(sku.sku_id.clone()))?;
    monthly_price(&info.pricing_expression, &sku.sku_id)
}

/// Monthly rates resolved from Cloud Billing SKUs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GcpPriceCatalog {
    cpu: f64,
    memory: f64,
    storage: f64,
}

impl GcpPriceCatalog {
    pub fn from_skus<'a, I>(config: &PricingConfig, skus: I) -> Result<Self, PriceError>
    where
        I: IntoIterator<Item = &'a Sku>,
    {
        let mut resolver = GcpPriceResolver::new(config);
        for sku in skus {
            resolver.offer(sku);
            if resolver.is_complete() {
                break;
            }
        }
        resolver.finish()
    }
}

impl PriceCatalog for GcpPriceCatalog {
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

    fn sku(id: &str, description: &str, region: &str, unit: &str, units: &str, nanos: i64) -> Sku {
        Sku {
            sku_id: id.to_string(),
            description: description.to_string(),
            service_regions: vec![region.to_string()],
            pricing_info: vec![PricingInfo {
                pricing_expression: PricingExpression {
                    usage_unit: unit.to_string(),
                    tiered_rates: vec![TierRate {
                        unit_price: Money {
                            currency_code: "USD".to_string(),
                            units: units.to_string(),
                            nanos,
                        },
                    }],
                },
            }],
        }
    }

    fn catalog_skus() -> Vec<Sku> {
        vec![
            sku("A", "E2 Instance Core running in Americas", "europe-west1", "h", "0", 1),
            sku("B", "E2 Instance Core running in Americas", "us-central1", "h", "0", 21_811_590),
            sku("C", "E2 Instance Ram running in Americas", "US-CENTRAL1", "GiBy.h", "0", 2_923_530),
            sku("D", "Regional Storage PD Capacity in Iowa", "us-central1", "GiBy.mo", "0", 80_000_000),
        ]
    }

    #[test]
    fn test_monthly_price_units() {
        let hourly = sku("x", "d", "r", "h", "1", 500_000_000);
        let price = monthly_price(&hourly.pricing_info[0].pricing_expression, "x").unwrap();
        assert!((price - 1.5 * 744.0).abs() < 1e-9);

        let gib_hourly = sku("x", "d", "r", "GiBy.h", "1", 0);
        let price = monthly_price(&gib_hourly.pricing_info[0].pricing_expression, "x").unwrap();
        assert!((price * GIB - 744.0).abs() < 1e-6);

        let gib_monthly = sku("x", "d", "r", "GiBy.mo", "2", 0);
        let price = monthly_price(&gib_monthly.pricing_info[0].pricing_expression, "x").unwrap();
        assert!((price * GIB - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_unit() {
        let odd = sku("x", "d", "r", "By.s", "1", 0);
        let error = monthly_price(&odd.pricing_info[0].pricing_expression, "x").unwrap_err();
        assert!(matches!(error, PriceError::UnsupportedUnit(unit) if unit == "By.s"));
    }

    #[test]
    fn test_invalid_units_string() {
        let bad = sku("x", "d", "r", "h", "abc", 0);
        let error = monthly_price(&bad.pricing_info[0].pricing_expression, "x").unwrap_err();
        assert!(matches!(error, PriceError::InvalidUnitPrice(_)));
    }

    #[test]
    fn test_from_skus_matches_region_case_insensitively() {
        let skus = catalog_skus();
        let catalog = GcpPriceCatalog::from_skus(&PricingConfig::default(), &skus).unwrap();
        assert!((catalog.cpu_monthly_price() - 0.02181159 * 744.0).abs() < 1e-9);
        assert!((catalog.memory_monthly_price() * GIB - 0.00292353 * 744.0).abs() < 1e-9);
        assert!((catalog.storage_monthly_price() * GIB - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_from_skus_reports_missing() {
        let skus: Vec<Sku> = catalog_skus().into_iter().take(2).collect();
        let error = GcpPriceCatalog::from_skus(&PricingConfig::default(), &skus).unwrap_err();
        match error {
            PriceError::MissingPrices {
                machine_family,
                region,
                missing,
            } => {
                assert_eq!(machine_family, "E2");
                assert_eq!(region, "us-central1");
                assert_eq!(missing, "memory, storage");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_deserialize_billing_page() {
        let json = r#"{
            "skus": [{
                "skuId": "CP-1",
                "description": "N2 Instance Core running in Iowa",
                "serviceRegions": ["us-central1"],
                "pricingInfo": [{
                    "pricingExpression": {
                        "usageUnit": "h",
                        "tieredRates": [{"unitPrice": {"currencyCode": "USD", "units": "0", "nanos": 31611000}}]
                    }
                }]
            }],
            "nextPageToken": "abc"
        }"#;
        let page: ListSkusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
        assert_eq!(page.skus[0].sku_id, "CP-1");
        assert_eq!(
            page.skus[0].pricing_info[0].pricing_expression.tiered_rates[0]
                .unit_price
                .nanos,
            31_611_000
        );
    }
}
