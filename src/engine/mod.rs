//! Batch risk evaluation engine
//!
//! Orchestrates the scoring components over whole snapshots:
//! - Organization analysis: valuation + propagation + compliance per asset
//! - Batch correlation: N vulnerabilities × M assets candidate evaluation
//!
//! Both entry points run on a rayon worker pool and isolate per-item
//! failures into an error list keyed by item identity; a single bad
//! record never aborts a batch. Cancellation is cooperative through an
//! explicit [`BatchLease`] handed in by the caller: each worker checks
//! the lease before starting an item, so a cancelled batch stops after
//! the in-flight items and still returns partial results with recorded
//! skip markers.

use crate::compliance::{ComplianceReport, ComplianceScorer};
use crate::config::EngineConfig;
use crate::correlation::VulnerabilityCorrelator;
use crate::error::RiskError;
use crate::graph::DependencyGraph;
use crate::models::{Asset, ImpactSummary, OrganizationalImpact, VulnerabilityRecord};
use crate::propagation::{DependencyAnalysis, DependencyPropagator};
use crate::valuation::{Criticality, EconomicExposure, ValuationEngine};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Progress callback: (item label, completed, total)
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Cooperative cancellation handle for a batch run.
///
/// Cloned into the batch; the caller keeps one clone and cancels it when
/// needed. Items already in flight finish, everything not yet started is
/// recorded as skipped.
#[derive(Debug, Clone, Default)]
pub struct BatchLease {
    cancelled: Arc<AtomicBool>,
}

impl BatchLease {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Identity of one (vulnerability, asset) candidate pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub vulnerability_id: String,
    pub asset_id: String,
}

/// Outcome of one batch correlation run
#[derive(Debug)]
pub struct CorrelationBatch {
    pub run_id: String,
    /// Draft impacts for every retained candidate pair
    pub impacts: Vec<OrganizationalImpact>,
    /// Pairs not evaluated because the lease was cancelled
    pub skipped: Vec<PairKey>,
    /// Pairs rejected with a typed error, keyed by identity
    pub errors: Vec<(PairKey, RiskError)>,
    pub summary: ImpactSummary,
}

/// Full analysis result for one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetAnalysis {
    pub asset_id: String,
    pub criticality: Criticality,
    pub economic_exposure: EconomicExposure,
    pub dependency: DependencyAnalysis,
    pub compliance: ComplianceReport,
}

/// Outcome of one organization analysis run
#[derive(Debug)]
pub struct OrganizationAnalysis {
    pub run_id: String,
    pub analyses: Vec<AssetAnalysis>,
    /// Per-asset failures, keyed by asset id
    pub errors: Vec<(String, RiskError)>,
}

/// Orchestrates scoring across whole snapshots
pub struct RiskEngine {
    config: EngineConfig,
    valuation: ValuationEngine,
    correlator: VulnerabilityCorrelator,
    compliance: ComplianceScorer,
    workers: usize,
    progress_callback: Option<ProgressCallback>,
}

impl RiskEngine {
    /// Create an engine from configuration.
    ///
    /// Worker count 0 auto-detects available parallelism, capped at 16.
    pub fn new(config: EngineConfig) -> Self {
        let workers = resolve_workers(config.batch.workers);
        let correlator = VulnerabilityCorrelator::new()
            .with_threshold(config.correlation.relevance_threshold);
        Self {
            config,
            valuation: ValuationEngine::new(),
            correlator,
            compliance: ComplianceScorer::new(),
            workers,
            progress_callback: None,
        }
    }

    /// Override the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = resolve_workers(workers);
        self
    }

    /// Set a progress callback
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Analyze a whole organization snapshot: criticality, economic
    /// exposure, dependency propagation, and compliance per asset.
    ///
    /// Invalid assets and invalid edges are isolated into the error list;
    /// the rest of the snapshot is analyzed.
    pub fn analyze_organization(&self, assets: &[Asset]) -> OrganizationAnalysis {
        let run_id = Uuid::new_v4().to_string();
        info!(
            "Organization analysis {}: {} assets on {} workers",
            run_id,
            assets.len(),
            self.workers
        );

        let (graph, mut errors) = DependencyGraph::build_partial(assets);

        // Score every valid asset first; the propagator needs the full map.
        let mut scores: FxHashMap<String, f64> = FxHashMap::default();
        let mut criticalities: FxHashMap<String, Criticality> = FxHashMap::default();
        for asset in assets {
            match self.valuation.criticality(asset) {
                Ok(criticality) => {
                    scores.insert(asset.id.clone(), criticality.score);
                    criticalities.insert(asset.id.clone(), criticality);
                }
                Err(e) => {
                    debug!("Isolated invalid asset {}: {}", asset.id, e);
                    errors.push((asset.id.clone(), e));
                }
            }
        }

        let propagator = DependencyPropagator::new(&graph, &scores);
        let completed = Arc::new(AtomicUsize::new(0));
        let total = assets.len();

        let results: Vec<Result<AssetAnalysis, (String, RiskError)>> = self.install(|| {
            assets
                .par_iter()
                .filter(|asset| criticalities.contains_key(&asset.id))
                .map(|asset| {
                    let analysis = self.analyze_single(asset, &propagator, &criticalities);

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(&asset.id, done, total);
                    }

                    analysis
                })
                .collect()
        });

        let mut analyses = Vec::new();
        for result in results {
            match result {
                Ok(analysis) => analyses.push(analysis),
                Err((asset_id, e)) => {
                    warn!("Analysis failed for {}: {}", asset_id, e);
                    errors.push((asset_id, e));
                }
            }
        }

        info!(
            "Organization analysis {} done: {} analyzed, {} errors",
            run_id,
            analyses.len(),
            errors.len()
        );

        OrganizationAnalysis {
            run_id,
            analyses,
            errors,
        }
    }

    fn analyze_single(
        &self,
        asset: &Asset,
        propagator: &DependencyPropagator<'_>,
        criticalities: &FxHashMap<String, Criticality>,
    ) -> Result<AssetAnalysis, (String, RiskError)> {
        let fail = |e: RiskError| (asset.id.clone(), e);

        let criticality = criticalities
            .get(&asset.id)
            .cloned()
            .ok_or_else(|| fail(RiskError::unknown_asset(&asset.id)))?;
        let economic_exposure = self
            .valuation
            .economic_exposure(asset, &self.config)
            .map_err(fail)?;
        let dependency = propagator.analyze(&asset.id).map_err(fail)?;
        let compliance = self.compliance.score(asset);

        Ok(AssetAnalysis {
            asset_id: asset.id.clone(),
            criticality,
            economic_exposure,
            dependency,
            compliance,
        })
    }

    /// Correlate every (vulnerability, asset) candidate pair.
    ///
    /// Pairs are independent and evaluated in parallel. The lease is
    /// checked before each pair: once cancelled, remaining pairs are
    /// recorded as skipped and the partial result is returned.
    pub fn correlate_batch(
        &self,
        vulns: &[VulnerabilityRecord],
        assets: &[Asset],
        now: DateTime<Utc>,
        lease: &BatchLease,
    ) -> CorrelationBatch {
        let run_id = Uuid::new_v4().to_string();
        let total = vulns.len() * assets.len();
        info!(
            "Correlation batch {}: {} vulnerabilities x {} assets ({} pairs) on {} workers",
            run_id,
            vulns.len(),
            assets.len(),
            total,
            self.workers
        );

        let completed = Arc::new(AtomicUsize::new(0));

        enum PairOutcome {
            Retained(OrganizationalImpact),
            Dropped,
            Skipped(PairKey),
            Failed(PairKey, RiskError),
        }

        let outcomes: Vec<PairOutcome> = self.install(|| {
            vulns
                .par_iter()
                .flat_map(|vuln| assets.par_iter().map(move |asset| (vuln, asset)))
                .map(|(vuln, asset)| {
                    let key = PairKey {
                        vulnerability_id: vuln.id.clone(),
                        asset_id: asset.id.clone(),
                    };

                    // Per-item checkpoint: nothing new starts once the
                    // caller pulls the lease.
                    if lease.is_cancelled() {
                        return PairOutcome::Skipped(key);
                    }

                    let outcome = match self.correlator.correlate(vuln, asset, now) {
                        Ok(Some(impact)) => PairOutcome::Retained(impact),
                        Ok(None) => PairOutcome::Dropped,
                        Err(e) => PairOutcome::Failed(key, e),
                    };

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(&vuln.id, done, total);
                    }

                    outcome
                })
                .collect()
        });

        let mut impacts = Vec::new();
        let mut skipped = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                PairOutcome::Retained(impact) => impacts.push(impact),
                PairOutcome::Dropped => {}
                PairOutcome::Skipped(key) => skipped.push(key),
                PairOutcome::Failed(key, e) => {
                    warn!(
                        "Correlation failed for {} x {}: {}",
                        key.vulnerability_id, key.asset_id, e
                    );
                    errors.push((key, e));
                }
            }
        }

        let summary = ImpactSummary::from_impacts(&impacts);
        info!(
            "Correlation batch {} done: {} retained, {} skipped, {} errors",
            run_id,
            impacts.len(),
            skipped.len(),
            errors.len()
        );

        CorrelationBatch {
            run_id,
            impacts,
            skipped,
            errors,
            summary,
        }
    }

    /// Run a closure on the engine's worker pool, falling back to the
    /// global pool if a dedicated one cannot be built
    fn install<T: Send>(&self, op: impl FnOnce() -> T + Send) -> T {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool.install(op),
            Err(e) => {
                warn!("Failed to build worker pool ({}), using the global pool", e);
                op()
            }
        }
    }
}

fn resolve_workers(workers: usize) -> usize {
    if workers == 0 {
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4)
            .min(16)
    } else {
        workers
    }
}
