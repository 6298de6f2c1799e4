//! Cost estimation
//!
//! Binding, per-workload ranges, per-kind aggregation and diffs. Everything
//! here is pure except [`Estimator`], which adds metrics and structured
//! logging around the same computation.

mod aggregate;
mod binder;
mod diff;
mod range;

pub use aggregate::{sum_ranges, Cost};
pub use binder::{bind_scaling_policies, Binding, BindingReport, Override};
pub use diff::{
    diff, CostChange, CostDiff, CostField, PercentageRange, PriceDetails, PriceDiff,
    PriceMaxDiff, PriceSummary, RangeDiff,
};
pub use range::{estimate_range, estimate_volume_claim, estimate_workload};

use crate::models::{
    CostRange, ScalingPolicy, VolumeClaim, Workload, WorkloadKind, STANDARD_STORAGE_CLASS,
    VOLUME_CLAIM_KIND,
};
use crate::observability::{EstimatorMetrics, StructuredLogger};
use crate::pricing::PriceCatalog;
use std::time::Instant;

/// Result of one estimation pass
#[derive(Debug, Clone, PartialEq)]
pub struct CostEstimate {
    pub cost: Cost,
    pub binding: BindingReport,
    pub workloads_estimated: usize,
    pub volume_claims_estimated: usize,
}

/// Bind policies, then price every workload and claim.
///
/// Kinds appear in the order Deployment, ReplicaSet, StatefulSet, DaemonSet,
/// PersistentVolumeClaim, and only when at least one object of that kind
/// exists.
pub fn estimate(
    workloads: &mut [Workload],
    policies: &[ScalingPolicy],
    claims: &[VolumeClaim],
    catalog: &dyn PriceCatalog,
) -> CostEstimate {
    let binding = bind_scaling_policies(workloads, policies);

    let mut monthly_ranges = Vec::new();
    for kind in WorkloadKind::ALL {
        let ranges: Vec<CostRange> = workloads
            .iter()
            .filter(|workload| workload.kind == kind)
            .map(|workload| estimate_workload(workload, catalog))
            .collect();
        if !ranges.is_empty() {
            monthly_ranges.push(sum_ranges(kind.as_str(), &ranges));
        }
    }

    if !claims.is_empty() {
        let ranges: Vec<CostRange> = claims
            .iter()
            .map(|claim| estimate_volume_claim(claim, catalog))
            .collect();
        monthly_ranges.push(sum_ranges(VOLUME_CLAIM_KIND, &ranges));
    }

    CostEstimate {
        cost: Cost::new(monthly_ranges),
        binding,
        workloads_estimated: workloads.len(),
        volume_claims_estimated: claims.len(),
    }
}

/// Convenience wrapper returning only the cost
pub fn estimate_cost(
    workloads: &mut [Workload],
    policies: &[ScalingPolicy],
    claims: &[VolumeClaim],
    catalog: &dyn PriceCatalog,
) -> Cost {
    estimate(workloads, policies, claims, catalog).cost
}

/// Estimation with metrics and structured event logging
pub struct Estimator<'a> {
    catalog: &'a dyn PriceCatalog,
    metrics: EstimatorMetrics,
    logger: StructuredLogger,
}

impl<'a> Estimator<'a> {
    pub fn new(catalog: &'a dyn PriceCatalog, source: impl Into<String>) -> Self {
        Self {
            catalog,
            metrics: EstimatorMetrics::new(),
            logger: StructuredLogger::new(source),
        }
    }

    pub fn estimate(
        &self,
        workloads: &mut [Workload],
        policies: &[ScalingPolicy],
        claims: &[VolumeClaim],
    ) -> CostEstimate {
        let start = Instant::now();
        let estimate = estimate(workloads, policies, claims, self.catalog);
        let elapsed = start.elapsed();

        for binding in &estimate.binding.bound {
            self.logger
                .log_policy_bound(&binding.policy, &binding.workload, binding.relaxed);
        }
        for policy in &estimate.binding.unmatched {
            self.logger
                .log_policy_unmatched(&policy.identity, &policy.target_identity);
        }
        for overridden in &estimate.binding.overridden {
            self.logger.log_policy_overridden(
                &overridden.workload,
                &overridden.previous,
                &overridden.current,
            );
        }
        for claim in claims {
            if claim.storage_class != STANDARD_STORAGE_CLASS {
                self.logger
                    .log_unsupported_storage_class(&claim.identity, &claim.storage_class);
            }
        }

        self.metrics.observe_estimation_latency(elapsed.as_secs_f64());
        self.metrics.add_workloads_estimated(estimate.workloads_estimated);
        self.metrics
            .add_volume_claims_estimated(estimate.volume_claims_estimated);
        self.metrics
            .add_scaling_policies_bound(estimate.binding.bound.len());
        self.metrics
            .add_scaling_policies_unmatched(estimate.binding.unmatched.len());

        self.logger.log_estimate(
            estimate.workloads_estimated,
            estimate.volume_claims_estimated,
            estimate.cost.monthly_ranges.len(),
            elapsed.as_secs_f64() * 1000.0,
        );

        estimate
    }

    pub fn diff(&self, current: &Cost, previous: &Cost) -> CostDiff {
        let cost_diff = diff(current, previous);
        let price_diff = cost_diff.to_price_diff();
        self.logger.log_diff(
            &cost_diff.summary,
            price_diff.summary.possibly_cost_increase,
            price_diff.summary.max_diff.usd,
        );
        cost_diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContainerResources, ReplicaPolicy, ResourceAmount, DAEMON_SET_KIND};
    use crate::pricing::StaticPriceCatalog;

    fn catalog() -> StaticPriceCatalog {
        StaticPriceCatalog::new(10.0, 1e-9, 1e-10)
    }

    fn workload(kind: WorkloadKind, name: &str, cpu: i64) -> Workload {
        let replicas = match kind {
            WorkloadKind::DaemonSet => ReplicaPolicy::NodeBound { node_count: 3 },
            _ => ReplicaPolicy::FixedReplica { replicas: 2 },
        };
        Workload {
            identity: format!("apps/v1|{}|default|{}", kind, name),
            kind,
            replicas,
            containers: vec![ContainerResources {
                requests: ResourceAmount::new(cpu, 0),
                limits: ResourceAmount::new(cpu * 2, 0),
            }],
            scaling_policy: None,
        }
    }

    #[test]
    fn test_ranges_grouped_by_kind_in_order() {
        let mut workloads = vec![
            workload(WorkloadKind::DaemonSet, "agent", 100),
            workload(WorkloadKind::Deployment, "web", 1000),
            workload(WorkloadKind::Deployment, "api", 500),
        ];
        let cost = estimate_cost(&mut workloads, &[], &[], &catalog());

        let kinds: Vec<&str> = cost.monthly_ranges.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Deployment", DAEMON_SET_KIND]);

        let deployments = cost.range("Deployment").unwrap();
        assert!((deployments.min_requested - 2.0 * 15.0).abs() < 1e-9);
        let daemons = cost.range(DAEMON_SET_KIND).unwrap();
        assert!((daemons.min_requested - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_grand_total_is_sum_of_kinds() {
        let mut workloads = vec![
            workload(WorkloadKind::StatefulSet, "db", 2000),
            workload(WorkloadKind::ReplicaSet, "rs", 250),
        ];
        let cost = estimate_cost(&mut workloads, &[], &[], &catalog());
        let total = cost.monthly_total();

        let expected: f64 = cost.monthly_ranges.iter().map(|r| r.max_limited).sum();
        assert_eq!(total.max_limited, expected);
        assert_eq!(cost.monthly_ranges.len(), 2);
    }

    #[test]
    fn test_volume_claims_priced_as_standard() {
        let claims = vec![VolumeClaim {
            identity: "v1|PersistentVolumeClaim|default|data".to_string(),
            storage_class: "premium-rwo".to_string(),
            requests: ResourceAmount::storage(10_000_000_000),
            limits: ResourceAmount::storage(10_000_000_000),
        }];
        let estimator_catalog = catalog();
        let estimator = Estimator::new(&estimator_catalog, "test");
        let estimate = estimator.estimate(&mut [], &[], &claims);

        let range = estimate.cost.range(VOLUME_CLAIM_KIND).unwrap();
        assert!((range.min_requested - 1.0).abs() < 1e-9);
        assert_eq!(estimate.volume_claims_estimated, 1);
    }

    #[test]
    fn test_estimator_binds_before_pricing() {
        let mut workloads = vec![workload(WorkloadKind::Deployment, "web", 1000)];
        let policies = vec![ScalingPolicy {
            identity: "autoscaling/v1|HorizontalPodAutoscaler|default|web".to_string(),
            target_identity: "apps/v1|Deployment|default|web".to_string(),
            min_replicas: 10,
            max_replicas: 20,
            target_cpu_utilization_percent: 60,
        }];
        let estimator_catalog = catalog();
        let estimator = Estimator::new(&estimator_catalog, "test");
        let estimate = estimator.estimate(&mut workloads, &policies, &[]);

        let range = estimate.cost.range("Deployment").unwrap();
        assert_eq!(range.min_requested, 10.0 * 10.0);
        assert_eq!(range.hpa_buffer, 14.0 * 10.0);
        assert_eq!(range.max_requested, 20.0 * 10.0);
        assert_eq!(estimate.binding.bound.len(), 1);
    }

    #[test]
    fn test_estimator_diff() {
        let estimator_catalog = catalog();
        let estimator = Estimator::new(&estimator_catalog, "test");
        let mut current = vec![workload(WorkloadKind::Deployment, "web", 2000)];
        let mut previous = vec![workload(WorkloadKind::Deployment, "web", 1000)];

        let current = estimator.estimate(&mut current, &[], &[]).cost;
        let previous = estimator.estimate(&mut previous, &[], &[]).cost;
        let cost_diff = estimator.diff(&current, &previous);

        assert_eq!(cost_diff.change, CostChange::Increased);
        assert_eq!(cost_diff.monthly.percentage.min_requested, Some(100.0));
    }
}
