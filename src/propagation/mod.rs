//! Dependency risk propagation
//!
//! Consumes the dependency graph plus per-node criticality scores to
//! compute pairwise impact, network metrics, topology patterns, and
//! bidirectional cascade risk.
//!
//! Every function here examines immediate neighbors only (single hop in
//! both directions). This is a documented contract, not an optimization:
//! the graph may contain cycles, and transitive closure is intentionally
//! not computed.

use crate::error::{Result, RiskError};
use crate::graph::DependencyGraph;
use crate::models::{CriticalityLevel, DependencyEdge, DependencyType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Attenuation applied to risk received from dependents
const UPSTREAM_ATTENUATION: f64 = 0.6;
/// Attenuation applied to risk imposed on dependencies
const DOWNSTREAM_ATTENUATION: f64 = 0.8;
/// Share of the target's own score folded into pairwise cascade risk
const TARGET_CONTRIBUTION: f64 = 0.3;
/// Ceiling for aggregated risk figures
const RISK_CAP: f64 = 10.0;

/// Remediation urgency for a dependency pair
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MitigationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl MitigationPriority {
    /// Priority from the combined weighted score of both endpoints
    fn from_combined(combined: f64) -> Self {
        match combined {
            c if c >= 15.0 => MitigationPriority::Urgent,
            c if c >= 12.0 => MitigationPriority::High,
            c if c >= 8.0 => MitigationPriority::Medium,
            _ => MitigationPriority::Low,
        }
    }
}

impl std::fmt::Display for MitigationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MitigationPriority::Low => write!(f, "low"),
            MitigationPriority::Medium => write!(f, "medium"),
            MitigationPriority::High => write!(f, "high"),
            MitigationPriority::Urgent => write!(f, "urgent"),
        }
    }
}

/// How hard it would be to isolate an asset from its neighborhood
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IsolationDifficulty {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Aggregated cascade risk band
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CascadeLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl CascadeLevel {
    fn from_total(total: f64) -> Self {
        match total {
            t if t >= 8.0 => CascadeLevel::Critical,
            t if t >= 6.0 => CascadeLevel::High,
            t if t >= 4.0 => CascadeLevel::Medium,
            _ => CascadeLevel::Low,
        }
    }
}

/// Topology patterns an asset can participate in; several may co-occur
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TopologyPattern {
    Hub,
    Chain,
    Isolated,
    CriticalPath,
}

/// Impact assessment for one dependency edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairwiseImpact {
    pub source_asset_id: String,
    pub target_asset_id: String,
    pub dependency_type: DependencyType,
    /// source score × type weight × impact factor
    pub direct_impact: f64,
    /// Direct impact plus the target's own contribution, capped at 10
    pub cascade_risk: f64,
    pub risk_level: CriticalityLevel,
    pub mitigation_priority: MitigationPriority,
}

/// Degree-based connectivity metrics for one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub fan_out: usize,
    pub fan_in: usize,
    pub connectivity_score: f64,
    pub complexity: f64,
    pub isolation_difficulty: IsolationDifficulty,
}

/// Bidirectional single-hop cascade assessment for one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeAssessment {
    /// Risk received from dependents over incoming edges
    pub upstream_risk: f64,
    /// Risk imposed on dependencies over outgoing edges
    pub downstream_risk: f64,
    pub total_risk: f64,
    pub level: CascadeLevel,
    /// Total risk relative to the asset's own score
    pub propagation_factor: f64,
}

/// Full single-asset dependency analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    pub asset_id: String,
    pub criticality_score: f64,
    pub metrics: NetworkMetrics,
    pub patterns: BTreeSet<TopologyPattern>,
    pub cascade: CascadeAssessment,
    pub outgoing_impacts: Vec<PairwiseImpact>,
}

/// Propagates criticality across the dependency graph.
///
/// Borrows the graph and a score per node; does not own or mutate either.
pub struct DependencyPropagator<'a> {
    graph: &'a DependencyGraph,
    scores: &'a FxHashMap<String, f64>,
}

impl<'a> DependencyPropagator<'a> {
    pub fn new(graph: &'a DependencyGraph, scores: &'a FxHashMap<String, f64>) -> Self {
        Self { graph, scores }
    }

    fn score(&self, asset_id: &str) -> Result<f64> {
        self.scores
            .get(asset_id)
            .copied()
            .ok_or_else(|| RiskError::unknown_asset(asset_id))
    }

    /// Impact the source asset imposes on the target over one edge
    pub fn pairwise_impact(&self, edge: &DependencyEdge) -> Result<PairwiseImpact> {
        let source_score = self.score(&edge.source_asset_id)?;
        let target_score = self.score(&edge.target_asset_id)?;
        let weight = edge.dependency_type.weight();

        let direct_impact = source_score * weight * edge.impact_factor;
        let cascade_risk = (direct_impact + target_score * TARGET_CONTRIBUTION).min(RISK_CAP);
        let risk_level = CriticalityLevel::from_score(cascade_risk);

        let combined = (source_score + target_score) * weight;
        let mitigation_priority = MitigationPriority::from_combined(combined);

        Ok(PairwiseImpact {
            source_asset_id: edge.source_asset_id.clone(),
            target_asset_id: edge.target_asset_id.clone(),
            dependency_type: edge.dependency_type,
            direct_impact,
            cascade_risk,
            risk_level,
            mitigation_priority,
        })
    }

    /// Degree-based connectivity metrics for one asset
    pub fn network_metrics(&self, asset_id: &str) -> Result<NetworkMetrics> {
        let outgoing = self.graph.outgoing(asset_id)?;
        let incoming = self.graph.incoming(asset_id)?;

        let fan_out = outgoing.len();
        let fan_in = incoming.len();
        let connectivity_score = ((fan_out + fan_in) as f64 * 0.5).min(RISK_CAP);

        let outgoing_weight: f64 = outgoing
            .iter()
            .map(|e| e.dependency_type.complexity_weight())
            .sum();
        let complexity = (outgoing_weight + fan_in as f64 * 0.5).min(RISK_CAP);

        let essential_out = count_essential(&outgoing);
        let isolation_difficulty = if essential_out >= 3 || fan_in >= 5 {
            IsolationDifficulty::VeryHigh
        } else if essential_out >= 2 || fan_in >= 3 {
            IsolationDifficulty::High
        } else if essential_out >= 1 || fan_in >= 1 {
            IsolationDifficulty::Medium
        } else {
            IsolationDifficulty::Low
        };

        Ok(NetworkMetrics {
            fan_out,
            fan_in,
            connectivity_score,
            complexity,
            isolation_difficulty,
        })
    }

    /// Topology patterns the asset participates in.
    ///
    /// The chain length is the degree heuristic `fan_out + 1`, not a real
    /// path traversal; the graph may be cyclic and patterns stay single-hop.
    pub fn detect_patterns(&self, asset_id: &str) -> Result<BTreeSet<TopologyPattern>> {
        let outgoing = self.graph.outgoing(asset_id)?;
        let incoming = self.graph.incoming(asset_id)?;

        let fan_out = outgoing.len();
        let fan_in = incoming.len();
        let mut patterns = BTreeSet::new();

        if fan_in >= 5 {
            patterns.insert(TopologyPattern::Hub);
        }
        let chain_length = if fan_out > 0 { fan_out + 1 } else { 0 };
        if chain_length >= 3 {
            patterns.insert(TopologyPattern::Chain);
        }
        if fan_out == 0 && fan_in == 0 {
            patterns.insert(TopologyPattern::Isolated);
        }
        if count_essential(&outgoing) >= 2 {
            patterns.insert(TopologyPattern::CriticalPath);
        }

        Ok(patterns)
    }

    /// Bidirectional cascade risk for one asset, single hop each way
    pub fn cascade_risk(&self, asset_id: &str) -> Result<CascadeAssessment> {
        let asset_score = self.score(asset_id)?;
        let outgoing = self.graph.outgoing(asset_id)?;
        let incoming = self.graph.incoming(asset_id)?;

        let mut upstream_risk = 0.0;
        for edge in &incoming {
            upstream_risk += asset_score * edge.dependency_type.weight() * UPSTREAM_ATTENUATION;
        }

        let mut downstream_risk = 0.0;
        for edge in &outgoing {
            let target_score = self.score(&edge.target_asset_id)?;
            downstream_risk +=
                target_score * edge.dependency_type.weight() * DOWNSTREAM_ATTENUATION;
        }

        let total_risk = (upstream_risk + downstream_risk).min(RISK_CAP);
        let level = CascadeLevel::from_total(total_risk);
        let propagation_factor = total_risk / asset_score.max(1.0);

        Ok(CascadeAssessment {
            upstream_risk,
            downstream_risk,
            total_risk,
            level,
            propagation_factor,
        })
    }

    /// Full dependency analysis for one asset: metrics, patterns, cascade,
    /// and the pairwise impact of every outgoing edge
    pub fn analyze(&self, asset_id: &str) -> Result<DependencyAnalysis> {
        let criticality_score = self.score(asset_id)?;
        let metrics = self.network_metrics(asset_id)?;
        let patterns = self.detect_patterns(asset_id)?;
        let cascade = self.cascade_risk(asset_id)?;

        let mut outgoing_impacts = Vec::new();
        for edge in self.graph.outgoing(asset_id)? {
            outgoing_impacts.push(self.pairwise_impact(edge)?);
        }

        debug!(
            "Dependency analysis for {}: fan_out={}, fan_in={}, cascade={:.2} ({:?})",
            asset_id, metrics.fan_out, metrics.fan_in, cascade.total_risk, patterns
        );

        Ok(DependencyAnalysis {
            asset_id: asset_id.to_string(),
            criticality_score,
            metrics,
            patterns,
            cascade,
            outgoing_impacts,
        })
    }
}

fn count_essential(edges: &[&DependencyEdge]) -> usize {
    edges
        .iter()
        .filter(|e| e.dependency_type == DependencyType::Essential)
        .count()
}
