//! Monthly cost range of a single workload or volume claim

use crate::models::{CostRange, ReplicaPolicy, ScalingPolicy, VolumeClaim, Workload, VOLUME_CLAIM_KIND};
use crate::pricing::PriceCatalog;
use crate::resources::{total_containers, WorkloadTotals};

/// Price a workload from its container totals.
///
/// Without a scaling policy every field is computed at the fixed replica or
/// node count. With one, requested and limited costs span
/// `[min_replicas, max_replicas]` and the HPA buffer assumes the autoscaler
/// keeps `100 - target` percent of CPU headroom above `min_replicas`.
pub fn estimate_range(
    kind: &str,
    totals: &WorkloadTotals,
    replicas: ReplicaPolicy,
    policy: Option<&ScalingPolicy>,
    catalog: &dyn PriceCatalog,
) -> CostRange {
    let cpu_price = catalog.cpu_monthly_price();
    let memory_price = catalog.memory_monthly_price();

    let requested = totals.cpu_request_cores * cpu_price + totals.memory_request_bytes * memory_price;
    let limited = totals.cpu_limit_cores * cpu_price + totals.memory_limit_bytes * memory_price;

    let range = match policy {
        Some(policy) => {
            let min_replicas = f64::from(policy.min_replicas);
            let max_replicas = f64::from(policy.max_replicas);
            let buffered_replicas = hpa_buffered_replicas(policy);

            CostRange {
                kind: kind.to_string(),
                min_requested: min_replicas * requested,
                max_requested: max_replicas * requested,
                hpa_buffer: buffered_replicas * requested,
                min_limited: min_replicas * limited,
                max_limited: max_replicas * limited,
            }
        }
        None => {
            let count = f64::from(replicas.count());
            let requested = count * requested;
            let limited = count * limited;

            CostRange {
                kind: kind.to_string(),
                min_requested: requested,
                max_requested: requested,
                hpa_buffer: requested,
                min_limited: limited,
                max_limited: limited,
            }
        }
    };

    clamp_limits(range)
}

/// Effective replica count used for the HPA buffer
fn hpa_buffered_replicas(policy: &ScalingPolicy) -> f64 {
    let min_replicas = f64::from(policy.min_replicas);
    if policy.target_cpu_utilization_percent > 0 {
        let headroom = f64::from(100 - policy.target_cpu_utilization_percent) / 100.0;
        min_replicas + headroom * min_replicas
    } else {
        min_replicas
    }
}

pub fn estimate_workload(workload: &Workload, catalog: &dyn PriceCatalog) -> CostRange {
    let totals = total_containers(&workload.containers);
    estimate_range(
        workload.kind.as_str(),
        &totals,
        workload.replicas,
        workload.scaling_policy.as_ref(),
        catalog,
    )
}

/// Price a claim as standard persistent disk, whatever its storage class
pub fn estimate_volume_claim(claim: &VolumeClaim, catalog: &dyn PriceCatalog) -> CostRange {
    let storage_price = catalog.storage_monthly_price();
    let requested = claim.requests.storage_bytes as f64 * storage_price;
    let limited = claim.limits.storage_bytes as f64 * storage_price;

    clamp_limits(CostRange {
        kind: VOLUME_CLAIM_KIND.to_string(),
        min_requested: requested,
        max_requested: requested,
        hpa_buffer: requested,
        min_limited: limited,
        max_limited: limited,
    })
}

/// Limits never price out cheaper than requests
fn clamp_limits(mut range: CostRange) -> CostRange {
    if range.min_limited < range.min_requested {
        range.min_limited = range.min_requested;
    }
    if range.max_limited < range.max_requested {
        range.max_limited = range.max_requested;
    }
    range
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContainerResources, ResourceAmount, WorkloadKind};
    use crate::pricing::StaticPriceCatalog;

    fn catalog() -> StaticPriceCatalog {
        // $10 per core, $1 per GB, $0.5 per GB of disk
        StaticPriceCatalog::new(10.0, 1e-9, 5e-10)
    }

    fn container(req_cpu: i64, req_mem: i64, lim_cpu: i64, lim_mem: i64) -> ContainerResources {
        ContainerResources {
            requests: ResourceAmount::new(req_cpu, req_mem),
            limits: ResourceAmount::new(lim_cpu, lim_mem),
        }
    }

    fn deployment(containers: Vec<ContainerResources>, replicas: i32) -> Workload {
        Workload {
            identity: "apps/v1|Deployment|default|web".to_string(),
            kind: WorkloadKind::Deployment,
            replicas: ReplicaPolicy::FixedReplica { replicas },
            containers,
            scaling_policy: None,
        }
    }

    fn policy(min: i32, max: i32, target: i32) -> ScalingPolicy {
        ScalingPolicy {
            identity: "autoscaling/v2|HorizontalPodAutoscaler|default|web".to_string(),
            target_identity: "apps/v1|Deployment|default|web".to_string(),
            min_replicas: min,
            max_replicas: max,
            target_cpu_utilization_percent: target,
        }
    }

    #[test]
    fn test_fixed_replicas_collapse_range() {
        let workload = deployment(vec![container(500, 1_000_000_000, 1000, 2_000_000_000)], 3);
        let range = estimate_workload(&workload, &catalog());

        assert_eq!(range.kind, "Deployment");
        assert!((range.min_requested - 3.0 * 6.0).abs() < 1e-9);
        assert_eq!(range.min_requested, range.max_requested);
        assert_eq!(range.min_requested, range.hpa_buffer);
        assert!((range.min_limited - 3.0 * 12.0).abs() < 1e-9);
        assert_eq!(range.min_limited, range.max_limited);
    }

    #[test]
    fn test_hpa_buffer_is_fourteen_replicas() {
        let mut workload = deployment(vec![container(1000, 0, 2000, 0)], 1);
        let per_replica = estimate_workload(&workload, &catalog()).min_requested;

        workload.scaling_policy = Some(policy(10, 20, 60));
        let range = estimate_workload(&workload, &catalog());

        assert_eq!(range.min_requested, 10.0 * per_replica);
        assert_eq!(range.max_requested, 20.0 * per_replica);
        assert_eq!(range.hpa_buffer, 14.0 * per_replica);
        assert_eq!(range.min_limited, 10.0 * 2.0 * per_replica);
        assert_eq!(range.max_limited, 20.0 * 2.0 * per_replica);
    }

    #[test]
    fn test_hpa_without_target_has_no_buffer() {
        let mut workload = deployment(vec![container(1000, 0, 2000, 0)], 1);
        workload.scaling_policy = Some(policy(4, 8, 0));
        let range = estimate_workload(&workload, &catalog());
        assert_eq!(range.hpa_buffer, range.min_requested);
    }

    #[test]
    fn test_daemonset_defaults_on_three_nodes() {
        // defaults {250m, 64MB} with a 200% buffer
        let workload = Workload {
            identity: "apps/v1|DaemonSet|kube-system|agent".to_string(),
            kind: WorkloadKind::DaemonSet,
            replicas: ReplicaPolicy::NodeBound { node_count: 3 },
            containers: vec![container(250, 64_000_000, 750, 192_000_000)],
            scaling_policy: None,
        };
        let range = estimate_workload(&workload, &catalog());

        let basis = 0.25 * 10.0 + 64_000_000.0 * 1e-9;
        assert_eq!(range.kind, "DaemonSet");
        assert!((range.min_requested - 3.0 * basis).abs() < 1e-9);
        assert!((range.max_requested - 3.0 * basis).abs() < 1e-9);
        assert!((range.min_limited - 3.0 * 3.0 * basis).abs() < 1e-9);
        assert!((range.max_limited - 3.0 * 3.0 * basis).abs() < 1e-9);
    }

    #[test]
    fn test_limits_clamped_to_requests() {
        // declared limit below request
        let workload = deployment(vec![container(1000, 67_108_864, 500, 64_000_000)], 2);
        let range = estimate_workload(&workload, &catalog());
        assert_eq!(range.min_limited, range.min_requested);
        assert_eq!(range.max_limited, range.max_requested);

        let mut scaled = workload.clone();
        scaled.scaling_policy = Some(policy(5, 1, 50));
        let range = estimate_workload(&scaled, &catalog());
        assert!(range.min_limited >= range.min_requested);
        assert!(range.max_limited >= range.max_requested);
    }

    #[test]
    fn test_zero_containers_cost_nothing() {
        let range = estimate_workload(&deployment(vec![], 5), &catalog());
        assert_eq!(range, CostRange::zero("Deployment"));
    }

    #[test]
    fn test_volume_claim_range() {
        let claim = VolumeClaim {
            identity: "v1|PersistentVolumeClaim|default|data".to_string(),
            storage_class: "standard".to_string(),
            requests: ResourceAmount::storage(10_000_000_000),
            limits: ResourceAmount::storage(20_000_000_000),
        };
        let range = estimate_volume_claim(&claim, &catalog());
        assert_eq!(range.kind, "PersistentVolumeClaim");
        assert!((range.min_requested - 5.0).abs() < 1e-9);
        assert_eq!(range.hpa_buffer, range.min_requested);
        assert!((range.max_limited - 10.0).abs() < 1e-9);
    }
}
