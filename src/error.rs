//! Typed failures for the risk engine
//!
//! Every rejected input surfaces as a structured error, never as a silent
//! default score. Batch entry points isolate per-item errors instead of
//! aborting; single-item entry points propagate them to the caller.

use thiserror::Error;

/// Errors that can occur while scoring or correlating
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    /// A value falls outside its documented range, or an enum tag is unknown.
    /// The affected asset or edge is rejected, not partially scored.
    #[error("validation failed for {subject}: {field} = {value} outside [{min}, {max}]")]
    Validation {
        subject: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A structurally invalid dependency edge, rejected at graph-build time
    #[error("graph rejected: asset {asset_id} declares a dependency on itself")]
    SelfReferentialEdge { asset_id: String },

    /// A reference the supplied snapshot cannot resolve
    #[error("lookup failed: {kind} {id} is not present in the snapshot")]
    Lookup { kind: &'static str, id: String },
}

impl RiskError {
    /// Builder for range violations
    pub fn out_of_range(
        subject: impl Into<String>,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Self {
        RiskError::Validation {
            subject: subject.into(),
            field,
            value,
            min,
            max,
        }
    }

    /// Builder for unresolved asset references
    pub fn unknown_asset(id: impl Into<String>) -> Self {
        RiskError::Lookup {
            kind: "asset",
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RiskError::out_of_range("asset-01", "sectoral_factor", 4.2, 0.1, 3.0);
        let message = err.to_string();
        assert!(message.contains("asset-01"));
        assert!(message.contains("sectoral_factor"));

        let err = RiskError::SelfReferentialEdge {
            asset_id: "asset-07".to_string(),
        };
        assert!(err.to_string().contains("asset-07"));

        let err = RiskError::unknown_asset("ghost");
        assert!(err.to_string().contains("ghost"));
    }
}
