//! Structured analysis payloads
//!
//! Assembles the results of an organization analysis into the report
//! payloads handed to the external rendering collaborator. The core never
//! formats documents itself; the only serialization offered here is plain
//! JSON of the payload structs.

use crate::compliance::ComplianceReport;
use crate::engine::OrganizationAnalysis;
use crate::models::ComplianceLevel;
use crate::propagation::{DependencyAnalysis, TopologyPattern};
use crate::valuation::{Criticality, EconomicExposure};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One asset's valuation figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationReportEntry {
    pub asset_id: String,
    pub criticality: Criticality,
    pub economic_exposure: EconomicExposure,
}

/// Valuation report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationReport {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<ValuationReportEntry>,
}

impl ValuationReport {
    pub fn from_analysis(analysis: &OrganizationAnalysis, generated_at: DateTime<Utc>) -> Self {
        let entries = analysis
            .analyses
            .iter()
            .map(|a| ValuationReportEntry {
                asset_id: a.asset_id.clone(),
                criticality: a.criticality.clone(),
                economic_exposure: a.economic_exposure.clone(),
            })
            .collect();
        Self {
            generated_at,
            entries,
        }
    }
}

/// Pattern occurrence counts across the analyzed assets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternTotals {
    pub hubs: usize,
    pub chains: usize,
    pub isolated: usize,
    pub critical_paths: usize,
}

/// Dependency analysis report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyAnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub assets: Vec<DependencyAnalysis>,
    pub totals: PatternTotals,
}

impl DependencyAnalysisReport {
    pub fn from_analysis(analysis: &OrganizationAnalysis, generated_at: DateTime<Utc>) -> Self {
        let assets: Vec<DependencyAnalysis> = analysis
            .analyses
            .iter()
            .map(|a| a.dependency.clone())
            .collect();

        let mut totals = PatternTotals::default();
        for dependency in &assets {
            for pattern in &dependency.patterns {
                match pattern {
                    TopologyPattern::Hub => totals.hubs += 1,
                    TopologyPattern::Chain => totals.chains += 1,
                    TopologyPattern::Isolated => totals.isolated += 1,
                    TopologyPattern::CriticalPath => totals.critical_paths += 1,
                }
            }
        }

        Self {
            generated_at,
            assets,
            totals,
        }
    }
}

/// Compliance counts per level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplianceLevelCounts {
    pub fully_compliant: usize,
    pub mostly_compliant: usize,
    pub partially_compliant: usize,
    pub non_compliant: usize,
}

/// Compliance overview payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceOverview {
    pub generated_at: DateTime<Utc>,
    pub reports: Vec<ComplianceReport>,
    pub average_score: f64,
    pub level_counts: ComplianceLevelCounts,
}

impl ComplianceOverview {
    pub fn from_analysis(analysis: &OrganizationAnalysis, generated_at: DateTime<Utc>) -> Self {
        let reports: Vec<ComplianceReport> = analysis
            .analyses
            .iter()
            .map(|a| a.compliance.clone())
            .collect();

        let average_score = if reports.is_empty() {
            0.0
        } else {
            reports.iter().map(|r| r.score as f64).sum::<f64>() / reports.len() as f64
        };

        let mut level_counts = ComplianceLevelCounts::default();
        for report in &reports {
            match report.level {
                ComplianceLevel::FullyCompliant => level_counts.fully_compliant += 1,
                ComplianceLevel::MostlyCompliant => level_counts.mostly_compliant += 1,
                ComplianceLevel::PartiallyCompliant => level_counts.partially_compliant += 1,
                ComplianceLevel::NonCompliant => level_counts.non_compliant += 1,
            }
        }

        Self {
            generated_at,
            reports,
            average_score,
            level_counts,
        }
    }
}

/// Render any payload as pretty-printed JSON
pub fn render_json<T: Serialize>(payload: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(payload)
}

/// Render any payload as compact JSON (single line)
pub fn render_json_compact<T: Serialize>(payload: &T) -> serde_json::Result<String> {
    serde_json::to_string(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::RiskEngine;
    use crate::models::{Asset, DependencyEdge, DependencyType, SecurityValuation};
    use chrono::TimeZone;

    fn analysis() -> OrganizationAnalysis {
        let assets = vec![
            Asset {
                id: "app".to_string(),
                valuation: SecurityValuation {
                    availability: 8.0,
                    ..Default::default()
                },
                economic_value: 50_000.0,
                dependencies: vec![DependencyEdge {
                    source_asset_id: "app".to_string(),
                    target_asset_id: "db".to_string(),
                    dependency_type: DependencyType::Essential,
                    impact_factor: 1.0,
                }],
                ..Default::default()
            },
            Asset {
                id: "db".to_string(),
                valuation: SecurityValuation {
                    integrity: 9.0,
                    ..Default::default()
                },
                ..Default::default()
            },
        ];
        RiskEngine::new(EngineConfig::builtin())
            .with_workers(2)
            .analyze_organization(&assets)
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_valuation_report() {
        let report = ValuationReport::from_analysis(&analysis(), stamp());
        assert_eq!(report.entries.len(), 2);
        let app = report.entries.iter().find(|e| e.asset_id == "app").unwrap();
        assert!((app.criticality.score - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_dependency_report_totals() {
        let report = DependencyAnalysisReport::from_analysis(&analysis(), stamp());
        assert_eq!(report.assets.len(), 2);
        // Neither asset is isolated and there is no hub in this snapshot
        assert_eq!(report.totals.hubs, 0);
        assert_eq!(report.totals.isolated, 0);
    }

    #[test]
    fn test_compliance_overview() {
        let overview = ComplianceOverview::from_analysis(&analysis(), stamp());
        assert_eq!(overview.reports.len(), 2);
        assert!(overview.average_score > 0.0);
        assert_eq!(overview.level_counts.non_compliant, 2);
    }

    #[test]
    fn test_render_json_roundtrips() {
        let report = ValuationReport::from_analysis(&analysis(), stamp());
        let rendered = render_json(&report).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&rendered).expect("parse JSON");
        assert_eq!(parsed["entries"].as_array().expect("entries array").len(), 2);

        let compact = render_json_compact(&report).expect("render compact JSON");
        assert!(!compact.contains('\n'));
    }
}
