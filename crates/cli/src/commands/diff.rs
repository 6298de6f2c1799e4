//! `kce diff`

use anyhow::Result;
use estimator_lib::{Estimator, PriceCatalog, ResolvedConfig};
use std::path::Path;

use super::load_manifests;
use crate::output::{emit, print_info, print_warning, render_diff, OutputFormat};

/// Compare the cost of `k8s` against `k8s_prev`
pub fn run(
    k8s: &Path,
    k8s_prev: &Path,
    config: &ResolvedConfig,
    catalog: &dyn PriceCatalog,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let current = load_manifests(k8s, config)?;
    let previous = load_manifests(k8s_prev, config)?;

    let estimator = Estimator::new(catalog, k8s.display().to_string());
    let current_cost = current.estimate(&estimator).cost;
    let previous_cost = previous.estimate(&estimator).cost;

    let cost_diff = estimator.diff(&current_cost, &previous_cost);
    if cost_diff.possibly_cost_increase() {
        print_warning(&cost_diff.summary);
    } else {
        print_info(&cost_diff.summary);
    }

    emit(&render_diff(&cost_diff, format)?, output)
}
