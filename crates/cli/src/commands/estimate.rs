//! `kce estimate`

use anyhow::Result;
use estimator_lib::{Estimator, PriceCatalog, ResolvedConfig};
use std::path::Path;

use super::load_manifests;
use crate::output::{emit, print_warning, render_cost, OutputFormat};

/// Estimate the monthly cost of the manifests under `k8s`
pub fn run(
    k8s: &Path,
    config: &ResolvedConfig,
    catalog: &dyn PriceCatalog,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let manifests = load_manifests(k8s, config)?;

    let estimator = Estimator::new(catalog, k8s.display().to_string());
    let estimate = manifests.estimate(&estimator);

    for policy in &estimate.binding.unmatched {
        print_warning(&format!(
            "HPA {} targets {} which is not part of the manifests",
            policy.identity, policy.target_identity
        ));
    }

    emit(&render_cost(&estimate.cost, format)?, output)
}
