//! Deployment, ReplicaSet, StatefulSet and DaemonSet adapter
//!
//! All apps versions share the pod template shape, so one adapter serves
//! them all.

use super::storage::{build_claim, ClaimTemplate};
use super::{DecodedObject, Manifest, RawQuantity, ResourceList, ResourceRequirements, TypeMeta};
use crate::config::ResolvedConfig;
use crate::error::{ManifestError, QuantityError, Result};
use crate::models::{build_identity, ReplicaPolicy, Workload, WorkloadKind, VOLUME_CLAIM_KIND};
use crate::resources::{resolve_container, DeclaredAmount, DeclaredResources};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WorkloadSpec {
    replicas: Option<i32>,
    template: PodTemplate,
    volume_claim_templates: Vec<ClaimTemplate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PodTemplate {
    spec: PodSpec,
}

/// Only steady-state containers; `initContainers` never run alongside them
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PodSpec {
    containers: Vec<ContainerSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ContainerSpec {
    resources: ResourceRequirements,
}

pub(super) fn decode(document: serde_yaml::Value, meta: &TypeMeta, config: &ResolvedConfig) -> Result<DecodedObject> {
    let kind = WorkloadKind::from_kind(&meta.kind).ok_or_else(|| {
        ManifestError::decode(&meta.api_version, &meta.kind, "not a workload kind")
    })?;
    let manifest: Manifest<WorkloadSpec> = Manifest::from_value(document, meta)?;
    let spec = &manifest.spec;

    let containers = spec
        .template
        .spec
        .containers
        .iter()
        .map(|container| {
            declared_resources(&container.resources)
                .map(|declared| resolve_container(&declared, &config.resources))
        })
        .collect::<std::result::Result<Vec<_>, QuantityError>>()?;

    let replicas = match kind {
        WorkloadKind::DaemonSet => ReplicaPolicy::NodeBound {
            node_count: config.cluster.nodes_count,
        },
        _ => ReplicaPolicy::FixedReplica {
            replicas: spec.replicas.unwrap_or(1),
        },
    };

    let mut volume_claims = Vec::new();
    if kind == WorkloadKind::StatefulSet {
        for template in &spec.volume_claim_templates {
            let namespace = template
                .metadata
                .namespace
                .as_deref()
                .or(manifest.namespace());
            let identity = build_identity(
                "v1",
                VOLUME_CLAIM_KIND,
                namespace,
                template.metadata.name.as_deref().unwrap_or_default(),
            );
            volume_claims.push(build_claim(identity, &template.spec, config)?);
        }
    }

    let workload = Workload {
        identity: build_identity(&meta.api_version, &meta.kind, manifest.namespace(), manifest.name()),
        kind,
        replicas,
        containers,
        scaling_policy: None,
    };

    Ok(DecodedObject::Workload {
        workload,
        volume_claims,
    })
}

fn declared_resources(resources: &ResourceRequirements) -> std::result::Result<DeclaredResources, QuantityError> {
    Ok(DeclaredResources {
        requests: declared_amount(&resources.requests)?,
        limits: declared_amount(&resources.limits)?,
    })
}

fn declared_amount(list: &ResourceList) -> std::result::Result<DeclaredAmount, QuantityError> {
    Ok(DeclaredAmount {
        cpu_millicores: list.get("cpu").map(RawQuantity::milli_value).transpose()?,
        memory_bytes: list.get("memory").map(RawQuantity::value).transpose()?,
    })
}
