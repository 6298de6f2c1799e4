//! CLI subcommands

pub mod diff;
pub mod estimate;

use anyhow::{Context, Result};
use estimator_lib::{Manifests, ResolvedConfig};
use std::path::Path;
use tracing::info;

use crate::output::print_warning;

/// Load one manifest tree, warning when nothing estimable was found
pub(crate) fn load_manifests(path: &Path, config: &ResolvedConfig) -> Result<Manifests> {
    let manifests = Manifests::from_path(path, config)
        .with_context(|| format!("Failed to load manifests from '{}'", path.display()))?;

    info!(
        path = %path.display(),
        files = manifests.stats.files,
        documents = manifests.stats.documents,
        skipped = manifests.stats.skipped,
        "Manifests loaded"
    );
    if manifests.is_empty() {
        print_warning(&format!(
            "No supported Kubernetes objects found in {}",
            path.display()
        ));
    }
    Ok(manifests)
}
