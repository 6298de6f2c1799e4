//! Estimator configuration
//!
//! Caller overrides are explicit `Option`s that are merged onto built-in
//! defaults once per run. A present but zero/empty value never overrides a
//! default.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CPU_MILLICORES: i64 = 250;
pub const DEFAULT_MEMORY_BYTES: i64 = 64_000_000;
pub const DEFAULT_UNBOUNDED_LIMIT_BUFFER_PERCENT: i64 = 200;
pub const DEFAULT_STORAGE_BYTES: i64 = 0;
pub const DEFAULT_NODES_COUNT: i32 = 3;
pub const DEFAULT_REGION: &str = "us-central1";

/// GCE machine families with known billing SKUs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MachineFamily {
    #[default]
    E2,
    N1,
    N2,
    N2D,
}

impl MachineFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineFamily::E2 => "E2",
            MachineFamily::N1 => "N1",
            MachineFamily::N2 => "N2",
            MachineFamily::N2D => "N2D",
        }
    }
}

impl fmt::Display for MachineFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MachineFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "E2" => Ok(MachineFamily::E2),
            "N1" => Ok(MachineFamily::N1),
            "N2" => Ok(MachineFamily::N2),
            "N2D" => Ok(MachineFamily::N2D),
            _ => Err(ConfigError::UnknownMachineFamily(s.to_string())),
        }
    }
}

/// Defaulting policy for container resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkloadResourceConfig {
    pub default_cpu_millicores: i64,
    pub default_memory_bytes: i64,
    /// Extra headroom given to a limit that the manifest leaves unbounded
    pub unbounded_limit_buffer_percent: i64,
    /// Size assumed for a volume claim that declares no storage at all
    pub default_storage_bytes: i64,
}

impl Default for WorkloadResourceConfig {
    fn default() -> Self {
        Self {
            default_cpu_millicores: DEFAULT_CPU_MILLICORES,
            default_memory_bytes: DEFAULT_MEMORY_BYTES,
            unbounded_limit_buffer_percent: DEFAULT_UNBOUNDED_LIMIT_BUFFER_PERCENT,
            default_storage_bytes: DEFAULT_STORAGE_BYTES,
        }
    }
}

/// Cluster shape used for node-bound workloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterConfig {
    pub nodes_count: i32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nodes_count: DEFAULT_NODES_COUNT,
        }
    }
}

/// Where unit prices come from.
///
/// Static prices are USD per core-month and per GiB-month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingConfig {
    pub machine_family: MachineFamily,
    pub region: String,
    pub cpu_monthly_price: Option<f64>,
    pub memory_gib_monthly_price: Option<f64>,
    pub storage_gib_monthly_price: Option<f64>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            machine_family: MachineFamily::default(),
            region: DEFAULT_REGION.to_string(),
            cpu_monthly_price: None,
            memory_gib_monthly_price: None,
            storage_gib_monthly_price: None,
        }
    }
}

/// Fully resolved configuration, immutable for the rest of the run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub resources: WorkloadResourceConfig,
    pub cluster: ClusterConfig,
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceOverrides {
    pub default_cpu_millis: Option<i64>,
    pub default_memory_bytes: Option<i64>,
    pub unbounded_limit_buffer_percent: Option<i64>,
    pub default_storage_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOverrides {
    pub nodes_count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingOverrides {
    pub machine_family: Option<MachineFamily>,
    pub region: Option<String>,
    pub cpu_monthly_price: Option<f64>,
    pub memory_gib_monthly_price: Option<f64>,
    pub storage_gib_monthly_price: Option<f64>,
}

/// Caller supplied configuration, as read from a file or the environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub resources: ResourceOverrides,
    pub cluster: ClusterOverrides,
    pub pricing: PricingOverrides,
}

impl EstimatorConfig {
    /// Merge the overrides onto the built-in defaults
    pub fn resolve(&self) -> ResolvedConfig {
        let defaults = ResolvedConfig::default();

        ResolvedConfig {
            resources: WorkloadResourceConfig {
                default_cpu_millicores: non_zero(
                    self.resources.default_cpu_millis,
                    defaults.resources.default_cpu_millicores,
                ),
                default_memory_bytes: non_zero(
                    self.resources.default_memory_bytes,
                    defaults.resources.default_memory_bytes,
                ),
                unbounded_limit_buffer_percent: non_zero(
                    self.resources.unbounded_limit_buffer_percent,
                    defaults.resources.unbounded_limit_buffer_percent,
                ),
                default_storage_bytes: non_zero(
                    self.resources.default_storage_bytes,
                    defaults.resources.default_storage_bytes,
                ),
            },
            cluster: ClusterConfig {
                nodes_count: non_zero(self.cluster.nodes_count, defaults.cluster.nodes_count),
            },
            pricing: PricingConfig {
                machine_family: self
                    .pricing
                    .machine_family
                    .unwrap_or(defaults.pricing.machine_family),
                region: self
                    .pricing
                    .region
                    .clone()
                    .filter(|region| !region.trim().is_empty())
                    .unwrap_or(defaults.pricing.region),
                cpu_monthly_price: self.pricing.cpu_monthly_price.filter(|p| *p != 0.0),
                memory_gib_monthly_price: self
                    .pricing
                    .memory_gib_monthly_price
                    .filter(|p| *p != 0.0),
                storage_gib_monthly_price: self
                    .pricing
                    .storage_gib_monthly_price
                    .filter(|p| *p != 0.0),
            },
        }
    }
}

fn non_zero<T: PartialEq + Default + Copy>(value: Option<T>, default: T) -> T {
    match value {
        Some(v) if v != T::default() => v,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_resolves_to_defaults() {
        let resolved = EstimatorConfig::default().resolve();
        assert_eq!(resolved.resources.default_cpu_millicores, 250);
        assert_eq!(resolved.resources.default_memory_bytes, 64_000_000);
        assert_eq!(resolved.resources.unbounded_limit_buffer_percent, 200);
        assert_eq!(resolved.cluster.nodes_count, 3);
        assert_eq!(resolved.pricing.machine_family, MachineFamily::E2);
        assert_eq!(resolved.pricing.region, "us-central1");
        assert!(resolved.pricing.cpu_monthly_price.is_none());
    }

    #[test]
    fn test_overrides_win_when_non_zero() {
        let config = EstimatorConfig {
            resources: ResourceOverrides {
                default_cpu_millis: Some(100),
                default_memory_bytes: None,
                unbounded_limit_buffer_percent: Some(50),
                default_storage_bytes: Some(1_073_741_824),
            },
            cluster: ClusterOverrides {
                nodes_count: Some(10),
            },
            pricing: PricingOverrides {
                machine_family: Some(MachineFamily::N2D),
                region: Some("europe-west1".to_string()),
                ..PricingOverrides::default()
            },
        };
        let resolved = config.resolve();
        assert_eq!(resolved.resources.default_cpu_millicores, 100);
        assert_eq!(resolved.resources.default_memory_bytes, 64_000_000);
        assert_eq!(resolved.resources.unbounded_limit_buffer_percent, 50);
        assert_eq!(resolved.resources.default_storage_bytes, 1_073_741_824);
        assert_eq!(resolved.cluster.nodes_count, 10);
        assert_eq!(resolved.pricing.machine_family, MachineFamily::N2D);
        assert_eq!(resolved.pricing.region, "europe-west1");
    }

    #[test]
    fn test_zero_and_empty_never_override() {
        let config = EstimatorConfig {
            resources: ResourceOverrides {
                default_cpu_millis: Some(0),
                default_memory_bytes: Some(0),
                unbounded_limit_buffer_percent: Some(0),
                default_storage_bytes: Some(0),
            },
            cluster: ClusterOverrides {
                nodes_count: Some(0),
            },
            pricing: PricingOverrides {
                region: Some(String::new()),
                cpu_monthly_price: Some(0.0),
                ..PricingOverrides::default()
            },
        };
        assert_eq!(config.resolve(), ResolvedConfig::default());
    }

    #[test]
    fn test_machine_family_parsing() {
        assert_eq!("n2d".parse::<MachineFamily>().unwrap(), MachineFamily::N2D);
        assert_eq!("E2".parse::<MachineFamily>().unwrap(), MachineFamily::E2);
        assert!("C3".parse::<MachineFamily>().is_err());
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let yaml = "resources:\n  default_cpu_millis: 500\npricing:\n  machine_family: N1\n";
        let config: EstimatorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.resources.default_cpu_millis, Some(500));
        assert_eq!(config.pricing.machine_family, Some(MachineFamily::N1));
        assert_eq!(config.cluster.nodes_count, None);
    }
}
