//! Per-workload resource totals

use crate::models::ContainerResources;
use serde::Serialize;

/// Summed container resources of one pod template
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WorkloadTotals {
    pub cpu_request_cores: f64,
    pub cpu_limit_cores: f64,
    pub memory_request_bytes: f64,
    pub memory_limit_bytes: f64,
}

impl WorkloadTotals {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Sum the steady-state containers of a workload.
///
/// Sums are exact integers; millicores are converted to cores once at the end.
pub fn total_containers(containers: &[ContainerResources]) -> WorkloadTotals {
    let mut cpu_request: i128 = 0;
    let mut cpu_limit: i128 = 0;
    let mut memory_request: i128 = 0;
    let mut memory_limit: i128 = 0;

    for container in containers {
        cpu_request += i128::from(container.requests.cpu_millicores);
        cpu_limit += i128::from(container.limits.cpu_millicores);
        memory_request += i128::from(container.requests.memory_bytes);
        memory_limit += i128::from(container.limits.memory_bytes);
    }

    WorkloadTotals {
        cpu_request_cores: cpu_request as f64 / 1000.0,
        cpu_limit_cores: cpu_limit as f64 / 1000.0,
        memory_request_bytes: memory_request as f64,
        memory_limit_bytes: memory_limit as f64,
    }
}
