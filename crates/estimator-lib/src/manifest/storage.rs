//! PersistentVolumeClaim adapter

use super::{DecodedObject, Manifest, ResourceRequirements, TypeMeta};
use crate::config::ResolvedConfig;
use crate::error::{QuantityError, Result};
use crate::models::{build_identity, ResourceAmount, VolumeClaim, STANDARD_STORAGE_CLASS, VOLUME_CLAIM_KIND};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(super) struct ClaimSpec {
    storage_class_name: Option<String>,
    resources: ResourceRequirements,
}

/// Entry of a StatefulSet's `volumeClaimTemplates`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct ClaimTemplate {
    pub(super) metadata: ObjectMeta,
    pub(super) spec: ClaimSpec,
}

pub(super) fn decode(document: serde_yaml::Value, meta: &TypeMeta, config: &ResolvedConfig) -> Result<DecodedObject> {
    let manifest: Manifest<ClaimSpec> = Manifest::from_value(document, meta)?;
    let identity = build_identity(
        &meta.api_version,
        VOLUME_CLAIM_KIND,
        manifest.namespace(),
        manifest.name(),
    );
    let claim = build_claim(identity, &manifest.spec, config)?;
    Ok(DecodedObject::VolumeClaim(claim))
}

/// Requests and limits fall back to each other, then to the configured default
pub(super) fn build_claim(
    identity: String,
    spec: &ClaimSpec,
    config: &ResolvedConfig,
) -> std::result::Result<VolumeClaim, QuantityError> {
    let storage_class = spec
        .storage_class_name
        .as_deref()
        .filter(|class| !class.is_empty())
        .unwrap_or(STANDARD_STORAGE_CLASS)
        .to_string();

    let declared = |list: &super::ResourceList| -> std::result::Result<i64, QuantityError> {
        match list.get("storage") {
            Some(quantity) => quantity.value(),
            None => Ok(0),
        }
    };
    let mut requests = declared(&spec.resources.requests)?;
    let mut limits = declared(&spec.resources.limits)?;

    if requests == 0 {
        requests = limits;
    }
    if limits == 0 {
        limits = requests;
    }
    if requests == 0 {
        requests = config.resources.default_storage_bytes;
        limits = config.resources.default_storage_bytes;
    }

    Ok(VolumeClaim {
        identity,
        storage_class,
        requests: ResourceAmount::storage(requests),
        limits: ResourceAmount::storage(limits),
    })
}
