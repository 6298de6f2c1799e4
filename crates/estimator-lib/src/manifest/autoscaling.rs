//! HorizontalPodAutoscaler adapters

use super::{DecodedObject, Manifest, TypeMeta};
use crate::config::ResolvedConfig;
use crate::error::Result;
use crate::models::{build_identity, ScalingPolicy};
use k8s_openapi::api::autoscaling::{v1, v2};
use serde::Deserialize;

const CPU_RESOURCE: &str = "cpu";
const RESOURCE_METRIC: &str = "Resource";

/// `autoscaling/v2beta1` spec; the target sits directly on the resource source
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct V2beta1Spec {
    scale_target_ref: TargetRef,
    min_replicas: Option<i32>,
    max_replicas: i32,
    metrics: Vec<V2beta1Metric>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TargetRef {
    api_version: Option<String>,
    kind: String,
    name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct V2beta1Metric {
    #[serde(rename = "type")]
    type_: String,
    resource: Option<V2beta1ResourceSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct V2beta1ResourceSource {
    name: String,
    target_average_utilization: Option<i32>,
}

/// Version independent view of an autoscaler
struct PolicyParts<'a> {
    target_api_version: Option<&'a str>,
    target_kind: &'a str,
    target_name: &'a str,
    min_replicas: Option<i32>,
    max_replicas: i32,
    target_cpu_utilization_percent: Option<i32>,
}

fn build_policy<S>(manifest: &Manifest<S>, meta: &TypeMeta, parts: PolicyParts<'_>) -> DecodedObject {
    let namespace = manifest.namespace();
    DecodedObject::ScalingPolicy(ScalingPolicy {
        identity: build_identity(&meta.api_version, &meta.kind, namespace, manifest.name()),
        target_identity: build_identity(
            parts.target_api_version.unwrap_or_default(),
            parts.target_kind,
            namespace,
            parts.target_name,
        ),
        min_replicas: parts.min_replicas.unwrap_or(1),
        max_replicas: parts.max_replicas,
        target_cpu_utilization_percent: parts.target_cpu_utilization_percent.unwrap_or(0),
    })
}

pub(super) fn decode_v1(document: serde_yaml::Value, meta: &TypeMeta, _config: &ResolvedConfig) -> Result<DecodedObject> {
    let manifest: Manifest<v1::HorizontalPodAutoscalerSpec> = Manifest::from_value(document, meta)?;
    let spec = &manifest.spec;
    let parts = PolicyParts {
        target_api_version: spec.scale_target_ref.api_version.as_deref(),
        target_kind: &spec.scale_target_ref.kind,
        target_name: &spec.scale_target_ref.name,
        min_replicas: spec.min_replicas,
        max_replicas: spec.max_replicas,
        target_cpu_utilization_percent: spec.target_cpu_utilization_percentage,
    };
    Ok(build_policy(&manifest, meta, parts))
}

pub(super) fn decode_v2beta1(document: serde_yaml::Value, meta: &TypeMeta, _config: &ResolvedConfig) -> Result<DecodedObject> {
    let manifest: Manifest<V2beta1Spec> = Manifest::from_value(document, meta)?;
    let spec = &manifest.spec;

    // last cpu metric wins
    let target = spec
        .metrics
        .iter()
        .filter(|metric| metric.type_ == RESOURCE_METRIC)
        .filter_map(|metric| metric.resource.as_ref())
        .filter(|resource| resource.name == CPU_RESOURCE)
        .filter_map(|resource| resource.target_average_utilization)
        .last();

    let parts = PolicyParts {
        target_api_version: spec.scale_target_ref.api_version.as_deref(),
        target_kind: &spec.scale_target_ref.kind,
        target_name: &spec.scale_target_ref.name,
        min_replicas: spec.min_replicas,
        max_replicas: spec.max_replicas,
        target_cpu_utilization_percent: target,
    };
    Ok(build_policy(&manifest, meta, parts))
}

/// `autoscaling/v2` and `autoscaling/v2beta2` share one schema
pub(super) fn decode_v2(document: serde_yaml::Value, meta: &TypeMeta, _config: &ResolvedConfig) -> Result<DecodedObject> {
    let manifest: Manifest<v2::HorizontalPodAutoscalerSpec> = Manifest::from_value(document, meta)?;
    let spec = &manifest.spec;

    let target = spec
        .metrics
        .iter()
        .flatten()
        .filter(|metric| metric.type_ == RESOURCE_METRIC)
        .filter_map(|metric| metric.resource.as_ref())
        .filter(|resource| resource.name == CPU_RESOURCE)
        .filter_map(|resource| resource.target.average_utilization)
        .last();

    let parts = PolicyParts {
        target_api_version: spec.scale_target_ref.api_version.as_deref(),
        target_kind: &spec.scale_target_ref.kind,
        target_name: &spec.scale_target_ref.name,
        min_replicas: spec.min_replicas,
        max_replicas: spec.max_replicas,
        target_cpu_utilization_percent: target,
    };
    Ok(build_policy(&manifest, meta, parts))
}
