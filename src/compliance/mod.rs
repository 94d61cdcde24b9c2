//! Valuation record compliance scoring
//!
//! Grades the completeness and quality of an asset's valuation record
//! against a fixed 100-point checklist. Every failed check yields one
//! issue paired with one recommendation; the caller renders them, this
//! module only produces the structured result.

use crate::models::{Asset, ComplianceLevel};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Points per checklist item
const POINTS_IDENTIFICATION: u32 = 20;
const POINTS_TAXONOMY: u32 = 15;
const POINTS_VALUATION: u32 = 25;
const POINTS_OWNER: u32 = 15;
const POINTS_METADATA: u32 = 10;
const POINTS_SECTORAL: u32 = 10;
const POINTS_DEPENDENCIES: u32 = 5;

/// One failed checklist item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceIssue {
    pub description: String,
    pub recommendation: String,
}

/// Compliance verdict for one asset record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub asset_id: String,
    /// 0-100 checklist score
    pub score: u32,
    pub level: ComplianceLevel,
    /// One entry per failed check, recommendation paired 1:1
    pub issues: Vec<ComplianceIssue>,
}

/// Scores asset records against the completeness checklist
#[derive(Debug, Default)]
pub struct ComplianceScorer;

impl ComplianceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the checklist for one asset record
    pub fn score(&self, asset: &Asset) -> ComplianceReport {
        let mut score = 0;
        let mut issues = Vec::new();

        if !asset.name.trim().is_empty()
            && !asset.code.trim().is_empty()
            && !asset.description.trim().is_empty()
        {
            score += POINTS_IDENTIFICATION;
        } else {
            issues.push(ComplianceIssue {
                description: "Basic identification fields are incomplete".to_string(),
                recommendation: "Fill in name, inventory code, and description".to_string(),
            });
        }

        let taxonomy_valid = match (asset.asset_type, asset.asset_subtype.as_deref()) {
            (Some(kind), Some(subtype)) => kind.accepts_subtype(subtype),
            _ => false,
        };
        if taxonomy_valid {
            score += POINTS_TAXONOMY;
        } else {
            issues.push(ComplianceIssue {
                description: "Asset type/subtype pairing is missing or invalid".to_string(),
                recommendation: "Classify the asset with a type and one of its valid subtypes"
                    .to_string(),
            });
        }

        let all_dimensions_set = asset
            .valuation
            .dimensions()
            .iter()
            .all(|(_, value)| *value > 0.0);
        if all_dimensions_set {
            score += POINTS_VALUATION;
        } else {
            issues.push(ComplianceIssue {
                description: "Security valuation dimensions are not fully populated".to_string(),
                recommendation:
                    "Rate all five dimensions (confidentiality, integrity, availability, \
                     authenticity, traceability) above zero"
                        .to_string(),
            });
        }

        if asset.owner.as_deref().is_some_and(|o| !o.trim().is_empty()) {
            score += POINTS_OWNER;
        } else {
            issues.push(ComplianceIssue {
                description: "No owner is assigned".to_string(),
                recommendation: "Assign a responsible owner for the asset".to_string(),
            });
        }

        if !asset.metadata.is_empty() {
            score += POINTS_METADATA;
        } else {
            issues.push(ComplianceIssue {
                description: "Metadata bag is empty".to_string(),
                recommendation: "Record at least location or environment metadata".to_string(),
            });
        }

        if asset.sectoral_factor.is_some_and(|f| f != 1.0) {
            score += POINTS_SECTORAL;
        } else {
            issues.push(ComplianceIssue {
                description: "Sectoral factor is left at the neutral default".to_string(),
                recommendation: "Review and customize the sectoral factor for the organization"
                    .to_string(),
            });
        }

        if !asset.dependencies.is_empty() {
            score += POINTS_DEPENDENCIES;
        } else {
            issues.push(ComplianceIssue {
                description: "No dependencies are documented".to_string(),
                recommendation: "Map at least one dependency to another asset".to_string(),
            });
        }

        let level = ComplianceLevel::from_score(score);
        debug!(
            "Compliance for {}: score={} ({}), {} issues",
            asset.id,
            score,
            level,
            issues.len()
        );

        ComplianceReport {
            asset_id: asset.id.clone(),
            score,
            level,
            issues,
        }
    }
}
