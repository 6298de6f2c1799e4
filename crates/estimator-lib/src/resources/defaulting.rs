//! Effective request/limit resolution for a single container
//!
//! Per dimension (CPU, memory), independently:
//! 1. a declared non-zero request is used as is;
//! 2. otherwise a declared non-zero limit becomes the request;
//! 3. otherwise the configured default is used.
//!
//! A declared non-zero limit is kept. An unbounded limit is set to the
//! request plus `unbounded_limit_buffer_percent` of it.

use crate::config::WorkloadResourceConfig;
use crate::models::{ContainerResources, ResourceAmount};

/// Raw values of one side (requests or limits), each possibly absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclaredAmount {
    pub cpu_millicores: Option<i64>,
    pub memory_bytes: Option<i64>,
}

/// Raw declared resources of one container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclaredResources {
    pub requests: DeclaredAmount,
    pub limits: DeclaredAmount,
}

/// Resolve a container's effective resources
pub fn resolve_container(
    declared: &DeclaredResources,
    config: &WorkloadResourceConfig,
) -> ContainerResources {
    let buffer = config.unbounded_limit_buffer_percent;
    let (cpu_request, cpu_limit) = resolve_dimension(
        declared.requests.cpu_millicores,
        declared.limits.cpu_millicores,
        config.default_cpu_millicores,
        buffer,
    );
    let (memory_request, memory_limit) = resolve_dimension(
        declared.requests.memory_bytes,
        declared.limits.memory_bytes,
        config.default_memory_bytes,
        buffer,
    );

    ContainerResources {
        requests: ResourceAmount::new(cpu_request, memory_request),
        limits: ResourceAmount::new(cpu_limit, memory_limit),
    }
}

fn resolve_dimension(
    request: Option<i64>,
    limit: Option<i64>,
    default: i64,
    buffer_percent: i64,
) -> (i64, i64) {
    let request = declared(request);
    let limit = declared(limit);

    let effective_request = request.or(limit).unwrap_or(default);
    let effective_limit = limit.unwrap_or_else(|| buffered(effective_request, buffer_percent));

    (effective_request, effective_limit)
}

/// Zero counts as not declared
fn declared(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v > 0)
}

fn buffered(request: i64, buffer_percent: i64) -> i64 {
    request.saturating_add(buffer_percent.saturating_mul(request) / 100)
}
