//! Manifest decoding
//!
//! Every supported `(apiVersion, kind)` pair maps to an adapter that turns
//! the document into one normalized entity. Nothing downstream of this
//! module looks at API versions again.

mod autoscaling;
mod loader;
mod storage;
mod workloads;

pub use loader::{LoadStats, Manifests};

use crate::config::ResolvedConfig;
use crate::error::{ManifestError, QuantityError, Result};
use crate::models::{ScalingPolicy, VolumeClaim, Workload, SUPPORTED_KINDS};
use crate::resources::{parse_bytes, parse_cpu_millicores};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

/// A decoded manifest document
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedObject {
    /// A pod-running workload plus any claims it templates (StatefulSet)
    Workload {
        workload: Workload,
        volume_claims: Vec<VolumeClaim>,
    },
    ScalingPolicy(ScalingPolicy),
    VolumeClaim(VolumeClaim),
}

/// `apiVersion` and `kind` of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMeta {
    pub api_version: String,
    pub kind: String,
}

type Adapter = fn(Value, &TypeMeta, &ResolvedConfig) -> Result<DecodedObject>;

const APPS_VERSIONS: &[&str] = &[
    "apps/v1",
    "apps/v1beta1",
    "apps/v1beta2",
    "extensions/v1beta1",
];

/// Supported versions per kind, with their adapter
fn adapter_for(meta: &TypeMeta) -> Option<Adapter> {
    let version = meta.api_version.as_str();
    match meta.kind.as_str() {
        "Deployment" | "ReplicaSet" | "StatefulSet" | "DaemonSet"
            if APPS_VERSIONS.contains(&version) =>
        {
            Some(workloads::decode as Adapter)
        }
        "HorizontalPodAutoscaler" => match version {
            "autoscaling/v1" => Some(autoscaling::decode_v1 as Adapter),
            "autoscaling/v2beta1" => Some(autoscaling::decode_v2beta1 as Adapter),
            "autoscaling/v2beta2" | "autoscaling/v2" => Some(autoscaling::decode_v2 as Adapter),
            _ => None,
        },
        "PersistentVolumeClaim" if version == "v1" => Some(storage::decode as Adapter),
        _ => None,
    }
}

/// Read `apiVersion` and `kind` without decoding the rest
pub fn type_meta(document: &Value) -> Option<TypeMeta> {
    let kind = document.get("kind")?.as_str()?;
    let api_version = document
        .get("apiVersion")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(TypeMeta {
        api_version: api_version.to_string(),
        kind: kind.to_string(),
    })
}

/// Decode one YAML document.
///
/// Returns `Ok(None)` when the document is not of a supported kind. A
/// supported kind with an unknown apiVersion is an error.
pub fn decode_document(document: Value, config: &ResolvedConfig) -> Result<Option<DecodedObject>> {
    let Some(meta) = type_meta(&document) else {
        return Ok(None);
    };
    if !SUPPORTED_KINDS.contains(&meta.kind.as_str()) {
        return Ok(None);
    }

    let adapter = adapter_for(&meta).ok_or_else(|| {
        ManifestError::decode(&meta.api_version, &meta.kind, "apiVersion not supported for this kind")
    })?;
    adapter(document, &meta, config).map(Some)
}

/// Common envelope: metadata plus a kind-specific spec
#[derive(Debug, Deserialize)]
struct Manifest<S> {
    #[serde(default)]
    metadata: ObjectMeta,
    spec: S,
}

impl<S: DeserializeOwned> Manifest<S> {
    fn from_value(document: Value, meta: &TypeMeta) -> Result<Self> {
        serde_yaml::from_value(document)
            .map_err(|e| ManifestError::decode(&meta.api_version, &meta.kind, e.to_string()))
    }
}

impl<S> Manifest<S> {
    fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }
}

/// Quantities may be written as YAML numbers as well as strings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawQuantity {
    fn to_text(&self) -> String {
        match self {
            RawQuantity::Integer(value) => value.to_string(),
            RawQuantity::Float(value) => value.to_string(),
            RawQuantity::Text(value) => value.clone(),
        }
    }

    fn milli_value(&self) -> std::result::Result<i64, QuantityError> {
        parse_cpu_millicores(&self.to_text())
    }

    fn value(&self) -> std::result::Result<i64, QuantityError> {
        parse_bytes(&self.to_text())
    }
}

/// `requests`/`limits` map as declared in a manifest
type ResourceList = BTreeMap<String, RawQuantity>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ResourceRequirements {
    requests: ResourceList,
    limits: ResourceList,
}
