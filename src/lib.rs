//! riskgraph: graph-powered asset risk engine
//!
//! Computes per-asset criticality from a multi-dimensional security
//! valuation, propagates risk across a directed dependency graph of
//! organizational assets, correlates vulnerability descriptors against
//! asset technical metadata, and grades valuation records against a
//! compliance checklist.
//!
//! Every entry point is a pure function over a caller-supplied snapshot:
//! nothing is persisted, nothing is fetched, and identical inputs always
//! produce identical outputs. Persistence, feeds, rendering, and the
//! remediation workflow are external collaborators exchanging the plain
//! data structures defined in [`models`].
//!
//! # Example
//!
//! ```
//! use riskgraph::config::EngineConfig;
//! use riskgraph::engine::RiskEngine;
//! use riskgraph::models::{Asset, SecurityValuation};
//!
//! let engine = RiskEngine::new(EngineConfig::builtin());
//! let assets = vec![Asset {
//!     id: "db-01".to_string(),
//!     valuation: SecurityValuation {
//!         availability: 9.0,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! }];
//!
//! let analysis = engine.analyze_organization(&assets);
//! assert_eq!(analysis.analyses.len(), 1);
//! assert_eq!(analysis.analyses[0].criticality.score, 9.0);
//! ```

pub mod compliance;
pub mod config;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod graph;
pub mod models;
pub mod propagation;
pub mod reports;
pub mod valuation;

pub use compliance::{ComplianceReport, ComplianceScorer};
pub use config::EngineConfig;
pub use correlation::VulnerabilityCorrelator;
pub use engine::{BatchLease, CorrelationBatch, OrganizationAnalysis, RiskEngine};
pub use error::{Result, RiskError};
pub use graph::DependencyGraph;
pub use models::{
    Asset, DependencyEdge, OrganizationalImpact, VulnerabilityRecord,
};
pub use propagation::DependencyPropagator;
pub use valuation::ValuationEngine;
