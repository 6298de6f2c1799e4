//! Error types for manifest decoding, quantity parsing and price lookup

use thiserror::Error;

/// Errors raised while turning manifests into normalized entities
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Error Decoding. Check if your apiVersion and kind are supported ({api_version}, {kind}). Root cause: {reason}")]
    Decode {
        api_version: String,
        kind: String,
        reason: String,
    },

    #[error("Error Decoding. Invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Error Decoding. Invalid quantity: {0}")]
    Quantity(#[from] QuantityError),

    #[error("Failed to read manifests from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk manifest directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Any of the above, tagged with the file it came from
    #[error("{source} (in '{path}')")]
    File {
        path: String,
        source: Box<ManifestError>,
    },
}

impl ManifestError {
    pub fn decode(api_version: &str, kind: &str, reason: impl Into<String>) -> Self {
        ManifestError::Decode {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }

    pub fn in_file(self, path: impl Into<String>) -> Self {
        ManifestError::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

/// Errors raised while parsing a Kubernetes quantity string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("'{0}' is not a valid quantity")]
    Malformed(String),

    #[error("'{0}' is negative")]
    Negative(String),

    #[error("'{0}' is too large")]
    Overflow(String),
}

/// Errors raised while resolving unit prices
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("Couldn't find all price infos for machine family {machine_family} in region {region} (missing: {missing})")]
    MissingPrices {
        machine_family: String,
        region: String,
        missing: String,
    },

    #[error("Price usage unit not implemented: {0}")]
    UnsupportedUnit(String),

    #[error("SKU '{0}' has no pricing information")]
    EmptyPricing(String),

    #[error("Invalid unit price '{0}'")]
    InvalidUnitPrice(String),
}

/// Errors raised while resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown machine family '{0}' (expected one of E2, N1, N2, N2D)")]
    UnknownMachineFamily(String),
}

pub type Result<T> = std::result::Result<T, ManifestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_prefix() {
        let error = ManifestError::decode("apps/v9", "Deployment", "unsupported apiVersion");
        assert!(error.to_string().starts_with("Error Decoding."));
        assert!(error.to_string().contains("apps/v9"));
    }

    #[test]
    fn test_file_context_keeps_prefix() {
        let error = ManifestError::decode("v2", "PersistentVolumeClaim", "bad").in_file("pvc.yaml");
        let message = error.to_string();
        assert!(message.starts_with("Error Decoding."));
        assert!(message.ends_with("(in 'pvc.yaml')"));
    }

    #[test]
    fn test_quantity_error_wraps_as_decode_error() {
        let error: ManifestError = QuantityError::Malformed("12x".to_string()).into();
        assert!(error.to_string().starts_with("Error Decoding."));
    }
}
