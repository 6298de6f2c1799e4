//! Loading manifest files and directories

use super::{decode_document, DecodedObject};
use crate::config::ResolvedConfig;
use crate::error::{ManifestError, Result};
use crate::estimator::{estimate, Cost, CostEstimate, Estimator};
use crate::models::{ScalingPolicy, VolumeClaim, Workload};
use crate::observability::EstimatorMetrics;
use crate::pricing::PriceCatalog;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Counters for one loading session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub files: usize,
    pub documents: usize,
    pub skipped: usize,
}

/// Normalized objects of one manifest set, in load order
#[derive(Debug, Clone, Default)]
pub struct Manifests {
    pub workloads: Vec<Workload>,
    pub scaling_policies: Vec<ScalingPolicy>,
    pub volume_claims: Vec<VolumeClaim>,
    pub stats: LoadStats,
}

impl Manifests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a file or every `.yaml`/`.yml` file under a directory
    pub fn from_path(path: impl AsRef<Path>, config: &ResolvedConfig) -> Result<Self> {
        let mut manifests = Self::new();
        manifests.load_path(path, config)?;
        Ok(manifests)
    }

    /// Walk `path` in file-name order; the first failing file aborts the load
    pub fn load_path(&mut self, path: impl AsRef<Path>, config: &ResolvedConfig) -> Result<()> {
        for entry in WalkDir::new(path.as_ref()).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let file = entry.path();
            let is_yaml = matches!(
                file.extension().and_then(|ext| ext.to_str()),
                Some("yaml") | Some("yml")
            );
            if !is_yaml {
                trace!(path = %file.display(), "Skipping non yaml file");
                continue;
            }

            trace!(path = %file.display(), "Loading yaml file");
            let data = std::fs::read_to_string(file).map_err(|source| ManifestError::Io {
                path: file.display().to_string(),
                source,
            })?;
            self.load_objects(&data, config)
                .map_err(|e| e.in_file(file.display().to_string()))?;
            self.stats.files += 1;
        }
        Ok(())
    }

    /// Decode every YAML document of a buffer, in order
    pub fn load_objects(&mut self, data: &str, config: &ResolvedConfig) -> Result<()> {
        let metrics = EstimatorMetrics::new();

        for document in serde_yaml::Deserializer::from_str(data) {
            let value = serde_yaml::Value::deserialize(document).map_err(|e| {
                metrics.inc_decode_errors();
                ManifestError::from(e)
            })?;
            if value.is_null() {
                continue;
            }
            self.stats.documents += 1;

            let decoded = decode_document(value, config).map_err(|e| {
                metrics.inc_decode_errors();
                e
            })?;

            match decoded {
                Some(object) => {
                    metrics.inc_documents_decoded();
                    self.push(object);
                }
                None => {
                    metrics.inc_documents_skipped();
                    self.stats.skipped += 1;
                    debug!("Skipping unsupported k8s object");
                }
            }
        }
        Ok(())
    }

    fn push(&mut self, object: DecodedObject) {
        match object {
            DecodedObject::Workload {
                workload,
                volume_claims,
            } => {
                self.workloads.push(workload);
                self.volume_claims.extend(volume_claims);
            }
            DecodedObject::ScalingPolicy(policy) => self.scaling_policies.push(policy),
            DecodedObject::VolumeClaim(claim) => self.volume_claims.push(claim),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty() && self.scaling_policies.is_empty() && self.volume_claims.is_empty()
    }

    /// Estimate through an instrumented [`Estimator`]; `self` is left unbound
    pub fn estimate(&self, estimator: &Estimator<'_>) -> CostEstimate {
        let mut workloads = self.workloads.clone();
        estimator.estimate(&mut workloads, &self.scaling_policies, &self.volume_claims)
    }

    pub fn estimate_cost(&self, catalog: &dyn PriceCatalog) -> Cost {
        let mut workloads = self.workloads.clone();
        estimate(&mut workloads, &self.scaling_policies, &self.volume_claims, catalog).cost
    }
}
