//! Core data models for the cost estimator

use serde::{Deserialize, Serialize};
use std::fmt;

pub const HPA_KIND: &str = "HorizontalPodAutoscaler";
pub const DEPLOYMENT_KIND: &str = "Deployment";
pub const REPLICA_SET_KIND: &str = "ReplicaSet";
pub const STATEFUL_SET_KIND: &str = "StatefulSet";
pub const DAEMON_SET_KIND: &str = "DaemonSet";
pub const VOLUME_CLAIM_KIND: &str = "PersistentVolumeClaim";

/// Storage class priced as GCE regional standard persistent disk
pub const STANDARD_STORAGE_CLASS: &str = "standard";

/// Label used for the grand total across kinds
pub const MONTHLY_TOTAL_KIND: &str = "MonthlyTotal";

/// Every kind the decoder understands
pub const SUPPORTED_KINDS: &[&str] = &[
    HPA_KIND,
    DEPLOYMENT_KIND,
    REPLICA_SET_KIND,
    STATEFUL_SET_KIND,
    DAEMON_SET_KIND,
    VOLUME_CLAIM_KIND,
];

/// Amount of compute and storage, always non-negative.
///
/// CPU is kept in millicores (1000 = 1 vCPU) until the final aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAmount {
    pub cpu_millicores: i64,
    pub memory_bytes: i64,
    pub storage_bytes: i64,
}

impl ResourceAmount {
    pub fn new(cpu_millicores: i64, memory_bytes: i64) -> Self {
        Self {
            cpu_millicores,
            memory_bytes,
            storage_bytes: 0,
        }
    }

    pub fn storage(storage_bytes: i64) -> Self {
        Self {
            storage_bytes,
            ..Self::default()
        }
    }
}

/// Effective request/limit pair of one container after defaulting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerResources {
    pub requests: ResourceAmount,
    pub limits: ResourceAmount,
}

/// Autoscaler bounds bound to a workload (HPA equivalent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    /// Identity of the policy object itself
    pub identity: String,
    /// Identity of the workload the policy scales
    pub target_identity: String,
    pub min_replicas: i32,
    pub max_replicas: i32,
    /// 0 means no CPU utilization target is configured
    pub target_cpu_utilization_percent: i32,
}

/// Workload kinds that run pods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkloadKind {
    Deployment,
    ReplicaSet,
    StatefulSet,
    DaemonSet,
}

impl WorkloadKind {
    /// Reporting order of per-kind cost ranges
    pub const ALL: [WorkloadKind; 4] = [
        WorkloadKind::Deployment,
        WorkloadKind::ReplicaSet,
        WorkloadKind::StatefulSet,
        WorkloadKind::DaemonSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => DEPLOYMENT_KIND,
            WorkloadKind::ReplicaSet => REPLICA_SET_KIND,
            WorkloadKind::StatefulSet => STATEFUL_SET_KIND,
            WorkloadKind::DaemonSet => DAEMON_SET_KIND,
        }
    }

    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            DEPLOYMENT_KIND => Some(WorkloadKind::Deployment),
            REPLICA_SET_KIND => Some(WorkloadKind::ReplicaSet),
            STATEFUL_SET_KIND => Some(WorkloadKind::StatefulSet),
            DAEMON_SET_KIND => Some(WorkloadKind::DaemonSet),
            _ => None,
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many pod copies a workload runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicaPolicy {
    /// Deployment, ReplicaSet and StatefulSet: declared replica count
    FixedReplica { replicas: i32 },
    /// DaemonSet: one pod per cluster node
    NodeBound { node_count: i32 },
}

impl ReplicaPolicy {
    pub fn count(&self) -> i32 {
        match self {
            ReplicaPolicy::FixedReplica { replicas } => *replicas,
            ReplicaPolicy::NodeBound { node_count } => *node_count,
        }
    }

    pub fn is_node_bound(&self) -> bool {
        matches!(self, ReplicaPolicy::NodeBound { .. })
    }
}

/// A normalized pod-running workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    /// Composite key `apiVersion|kind|namespace|name`
    pub identity: String,
    pub kind: WorkloadKind,
    pub replicas: ReplicaPolicy,
    pub containers: Vec<ContainerResources>,
    /// Attached once during binding, before estimation
    pub scaling_policy: Option<ScalingPolicy>,
}

impl Workload {
    /// Identity with the apiVersion dropped: `kind|namespace|name`
    pub fn relaxed_identity(&self) -> &str {
        relaxed_identity(&self.identity)
    }
}

/// A normalized PersistentVolumeClaim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeClaim {
    pub identity: String,
    pub storage_class: String,
    pub requests: ResourceAmount,
    pub limits: ResourceAmount,
}

/// Estimated monthly cost range of one workload, one kind or the grand total
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRange {
    pub kind: String,
    pub min_requested: f64,
    pub max_requested: f64,
    /// Cost at requests with the autoscaler keeping CPU headroom
    pub hpa_buffer: f64,
    pub min_limited: f64,
    pub max_limited: f64,
}

impl CostRange {
    pub fn zero(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Field values in reporting order
    pub fn values(&self) -> [f64; 5] {
        [
            self.min_requested,
            self.hpa_buffer,
            self.max_requested,
            self.min_limited,
            self.max_limited,
        ]
    }
}

/// Build the composite identity `apiVersion|kind|namespace|name`
pub fn build_identity(api_version: &str, kind: &str, namespace: Option<&str>, name: &str) -> String {
    let namespace = match namespace {
        Some(ns) if !ns.is_empty() => ns,
        _ => "default",
    };
    format!("{}|{}|{}|{}", api_version, kind, namespace, name)
}

/// Drop the apiVersion segment of a composite identity
pub fn relaxed_identity(identity: &str) -> &str {
    match identity.find('|') {
        Some(index) => &identity[index + 1..],
        None => identity,
    }
}
