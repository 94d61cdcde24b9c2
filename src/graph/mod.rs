//! In-memory dependency graph over organizational assets
//!
//! Pure data holder built from an asset snapshot: arena-style petgraph
//! storage with stable node indices and an id lookup map, so cyclic
//! dependency structures are representable without any risk of unbounded
//! recursion through object references. All risk arithmetic lives in the
//! propagation module; this one only answers neighbor queries.

use crate::error::{Result, RiskError};
use crate::models::{Asset, DependencyEdge};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Bounds for the per-edge impact factor
pub const IMPACT_FACTOR_MIN: f64 = 0.1;
pub const IMPACT_FACTOR_MAX: f64 = 2.0;

/// Directed graph of asset dependencies.
///
/// Node weights are asset ids; edge weights carry the full dependency
/// record. Cycles are legal and expected.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<String, DependencyEdge>,
    index: FxHashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build a graph from an asset snapshot, rejecting the whole snapshot
    /// on the first invalid edge.
    ///
    /// Used by single-asset analysis, where a bad edge must propagate to
    /// the caller rather than be silently dropped.
    pub fn build(assets: &[Asset]) -> Result<Self> {
        let mut graph = Self::with_nodes(assets);
        for asset in assets {
            for edge in &asset.dependencies {
                graph.insert_edge(edge)?;
            }
        }
        debug!(
            "Dependency graph built: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Build a graph from an asset snapshot, isolating invalid edges.
    ///
    /// Each rejected edge is reported keyed by its source asset id; the
    /// rest of the graph stands. Used by batch analysis, where a single
    /// bad record must never abort the run.
    pub fn build_partial(assets: &[Asset]) -> (Self, Vec<(String, RiskError)>) {
        let mut graph = Self::with_nodes(assets);
        let mut errors = Vec::new();
        for asset in assets {
            for edge in &asset.dependencies {
                if let Err(e) = graph.insert_edge(edge) {
                    debug!("Isolated bad edge from {}: {}", asset.id, e);
                    errors.push((asset.id.clone(), e));
                }
            }
        }
        (graph, errors)
    }

    fn with_nodes(assets: &[Asset]) -> Self {
        let mut graph = DiGraph::new();
        let mut index = FxHashMap::default();
        for asset in assets {
            if index.contains_key(&asset.id) {
                debug!("Duplicate asset id {} in snapshot, keeping first", asset.id);
                continue;
            }
            let node = graph.add_node(asset.id.clone());
            index.insert(asset.id.clone(), node);
        }
        Self { graph, index }
    }

    fn insert_edge(&mut self, edge: &DependencyEdge) -> Result<()> {
        if edge.source_asset_id == edge.target_asset_id {
            return Err(RiskError::SelfReferentialEdge {
                asset_id: edge.source_asset_id.clone(),
            });
        }
        if !(IMPACT_FACTOR_MIN..=IMPACT_FACTOR_MAX).contains(&edge.impact_factor) {
            return Err(RiskError::out_of_range(
                format!("{} -> {}", edge.source_asset_id, edge.target_asset_id),
                "impact_factor",
                edge.impact_factor,
                IMPACT_FACTOR_MIN,
                IMPACT_FACTOR_MAX,
            ));
        }
        let source = *self
            .index
            .get(&edge.source_asset_id)
            .ok_or_else(|| RiskError::unknown_asset(&edge.source_asset_id))?;
        let target = *self
            .index
            .get(&edge.target_asset_id)
            .ok_or_else(|| RiskError::unknown_asset(&edge.target_asset_id))?;
        self.graph.add_edge(source, target, edge.clone());
        Ok(())
    }

    /// Whether the snapshot contains the asset
    pub fn contains(&self, asset_id: &str) -> bool {
        self.index.contains_key(asset_id)
    }

    /// Edges where the asset is the source (it depends on the targets)
    pub fn outgoing(&self, asset_id: &str) -> Result<Vec<&DependencyEdge>> {
        self.neighbors(asset_id, Direction::Outgoing)
    }

    /// Edges where the asset is the target (its dependents)
    pub fn incoming(&self, asset_id: &str) -> Result<Vec<&DependencyEdge>> {
        self.neighbors(asset_id, Direction::Incoming)
    }

    fn neighbors(&self, asset_id: &str, direction: Direction) -> Result<Vec<&DependencyEdge>> {
        let node = *self
            .index
            .get(asset_id)
            .ok_or_else(|| RiskError::unknown_asset(asset_id))?;
        Ok(self
            .graph
            .edges_directed(node, direction)
            .map(|e| e.weight())
            .collect())
    }

    /// All asset ids in the graph
    pub fn asset_ids(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|id| id.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DependencyType;

    fn asset(id: &str, deps: Vec<DependencyEdge>) -> Asset {
        Asset {
            id: id.to_string(),
            dependencies: deps,
            ..Default::default()
        }
    }

    fn edge(source: &str, target: &str) -> DependencyEdge {
        DependencyEdge {
            source_asset_id: source.to_string(),
            target_asset_id: target.to_string(),
            dependency_type: DependencyType::Normal,
            impact_factor: 1.0,
        }
    }

    #[test]
    fn test_build_and_lookup() {
        let assets = vec![
            asset("a", vec![edge("a", "b"), edge("a", "c")]),
            asset("b", vec![edge("b", "c")]),
            asset("c", vec![]),
        ];
        let graph = DependencyGraph::build(&assets).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.outgoing("a").unwrap().len(), 2);
        assert_eq!(graph.incoming("c").unwrap().len(), 2);
        assert!(graph.outgoing("c").unwrap().is_empty());
    }

    #[test]
    fn test_cycles_are_legal() {
        let assets = vec![
            asset("a", vec![edge("a", "b")]),
            asset("b", vec![edge("b", "a")]),
        ];
        let graph = DependencyGraph::build(&assets).unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.outgoing("a").unwrap().len(), 1);
        assert_eq!(graph.incoming("a").unwrap().len(), 1);
    }

    #[test]
    fn test_self_edge_rejected() {
        let assets = vec![asset("a", vec![edge("a", "a")])];
        let err = DependencyGraph::build(&assets).unwrap_err();
        assert!(matches!(err, RiskError::SelfReferentialEdge { .. }));
    }

    #[test]
    fn test_impact_factor_out_of_range_rejected() {
        let mut bad = edge("a", "b");
        bad.impact_factor = 2.5;
        let assets = vec![asset("a", vec![bad]), asset("b", vec![])];
        let err = DependencyGraph::build(&assets).unwrap_err();
        assert!(matches!(err, RiskError::Validation { .. }));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let assets = vec![asset("a", vec![edge("a", "ghost")])];
        let err = DependencyGraph::build(&assets).unwrap_err();
        assert_eq!(err, RiskError::unknown_asset("ghost"));
    }

    #[test]
    fn test_build_partial_isolates_bad_edges() {
        let mut bad = edge("b", "a");
        bad.impact_factor = 0.0;
        let assets = vec![
            asset("a", vec![edge("a", "ghost"), edge("a", "b")]),
            asset("b", vec![bad]),
        ];
        let (graph, errors) = DependencyGraph::build_partial(&assets);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].0, "a");
        assert_eq!(errors[1].0, "b");
    }

    #[test]
    fn test_unknown_asset_lookup() {
        let graph = DependencyGraph::build(&[asset("a", vec![])]).unwrap();
        assert!(graph.outgoing("ghost").is_err());
    }
}
