//! Attach autoscalers to the workloads they target

use crate::models::{relaxed_identity, ScalingPolicy, Workload};
use serde::Serialize;
use std::collections::HashMap;

/// One successful attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub policy: String,
    pub workload: String,
    /// Matched on `kind|namespace|name` only
    pub relaxed: bool,
}

/// An autoscaler replaced by a later one on the same workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Override {
    pub workload: String,
    pub previous: String,
    pub current: String,
}

/// Outcome of a binding pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BindingReport {
    /// Every attachment, in policy order (overridden ones included)
    pub bound: Vec<Binding>,
    /// Policies whose target matched no workload
    pub unmatched: Vec<ScalingPolicy>,
    pub overridden: Vec<Override>,
}

/// Bind each policy to at most one workload.
///
/// The full `apiVersion|kind|namespace|name` identity is tried first, then
/// the relaxed `kind|namespace|name` one. Policies are applied in order so a
/// later policy on the same workload wins. When several workloads share an
/// identity the last one loaded is the target. Node-bound workloads never
/// take an autoscaler.
pub fn bind_scaling_policies(workloads: &mut [Workload], policies: &[ScalingPolicy]) -> BindingReport {
    let mut by_identity: HashMap<String, usize> = HashMap::new();
    let mut by_relaxed: HashMap<String, usize> = HashMap::new();

    for (index, workload) in workloads.iter().enumerate() {
        if workload.replicas.is_node_bound() {
            continue;
        }
        // a later workload with the same identity shadows an earlier one
        by_identity.insert(workload.identity.clone(), index);
        by_relaxed.insert(workload.relaxed_identity().to_string(), index);
    }

    let mut report = BindingReport::default();

    for policy in policies {
        let target = policy.target_identity.as_str();
        let found = match by_identity.get(target) {
            Some(index) => Some((*index, false)),
            None => by_relaxed
                .get(relaxed_identity(target))
                .map(|index| (*index, true)),
        };

        let Some((index, relaxed)) = found else {
            report.unmatched.push(policy.clone());
            continue;
        };

        let workload = &mut workloads[index];
        if let Some(previous) = workload.scaling_policy.replace(policy.clone()) {
            report.overridden.push(Override {
                workload: workload.identity.clone(),
                previous: previous.identity,
                current: policy.identity.clone(),
            });
        }
        report.bound.push(Binding {
            policy: policy.identity.clone(),
            workload: workload.identity.clone(),
            relaxed,
        });
    }

    report
}
