//! Core data models for riskgraph
//!
//! These models are used throughout the crate for representing
//! organizational assets, dependency edges, vulnerability descriptors,
//! and correlation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Generate a deterministic impact ID based on content hash.
///
/// This ensures impact drafts have stable IDs across runs, enabling:
/// - Upsert semantics at the persistence collaborator
/// - Tracking a (vulnerability, asset) pair over time
/// - Reliable deduplication when batches are re-run
///
/// The ID is a 16-character hex string derived from hashing the
/// vulnerability id and the asset id.
pub fn deterministic_impact_id(vulnerability_id: &str, asset_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(vulnerability_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(asset_id.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..16].to_string()
}

/// Criticality levels derived from a valuation score
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityLevel {
    #[default]
    VeryLow,
    Low,
    Medium,
    High,
    Critical,
}

impl CriticalityLevel {
    /// Map a criticality score onto its level band.
    ///
    /// The score is not clamped to [0,10]; sector adjustment can push it
    /// past the nominal valuation range and the bands apply to the raw value.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 9.0 => CriticalityLevel::Critical,
            s if s >= 7.0 => CriticalityLevel::High,
            s if s >= 5.0 => CriticalityLevel::Medium,
            s if s >= 3.0 => CriticalityLevel::Low,
            _ => CriticalityLevel::VeryLow,
        }
    }
}

impl std::fmt::Display for CriticalityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriticalityLevel::VeryLow => write!(f, "very_low"),
            CriticalityLevel::Low => write!(f, "low"),
            CriticalityLevel::Medium => write!(f, "medium"),
            CriticalityLevel::High => write!(f, "high"),
            CriticalityLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Strength category of a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Essential,
    Important,
    Normal,
    Weak,
}

impl DependencyType {
    /// Propagation weight used for impact and cascade arithmetic
    pub fn weight(&self) -> f64 {
        match self {
            DependencyType::Essential => 1.0,
            DependencyType::Important => 0.7,
            DependencyType::Normal => 0.5,
            DependencyType::Weak => 0.3,
        }
    }

    /// Weight used for the network complexity metric
    pub fn complexity_weight(&self) -> f64 {
        match self {
            DependencyType::Essential => 3.0,
            DependencyType::Important => 2.0,
            DependencyType::Normal => 1.0,
            DependencyType::Weak => 0.5,
        }
    }
}

impl std::fmt::Display for DependencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyType::Essential => write!(f, "essential"),
            DependencyType::Important => write!(f, "important"),
            DependencyType::Normal => write!(f, "normal"),
            DependencyType::Weak => write!(f, "weak"),
        }
    }
}

fn default_impact_factor() -> f64 {
    1.0
}

/// Directed dependency: the source asset's operation depends on the target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source_asset_id: String,
    pub target_asset_id: String,
    pub dependency_type: DependencyType,
    /// Multiplier in [0.1, 2.0] applied on top of the type weight
    #[serde(default = "default_impact_factor")]
    pub impact_factor: f64,
}

/// The five security valuation dimensions, each in [0, 10]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SecurityValuation {
    #[serde(default)]
    pub confidentiality: f64,
    #[serde(default)]
    pub integrity: f64,
    #[serde(default)]
    pub availability: f64,
    #[serde(default)]
    pub authenticity: f64,
    #[serde(default)]
    pub traceability: f64,
}

impl SecurityValuation {
    /// Worst-case dimension value
    pub fn max_dimension(&self) -> f64 {
        self.confidentiality
            .max(self.integrity)
            .max(self.availability)
            .max(self.authenticity)
            .max(self.traceability)
    }

    /// Named dimension values, in canonical order
    pub fn dimensions(&self) -> [(&'static str, f64); 5] {
        [
            ("confidentiality", self.confidentiality),
            ("integrity", self.integrity),
            ("availability", self.availability),
            ("authenticity", self.authenticity),
            ("traceability", self.traceability),
        ]
    }
}

/// Network placement of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NetworkExposure {
    InternetFacing,
    InternalNetwork,
    Isolated,
    #[default]
    Unknown,
}

/// Asset taxonomy: top-level type with a fixed set of valid subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Hardware,
    Software,
    Data,
    Service,
    Network,
    Personnel,
    Facility,
}

impl AssetType {
    /// Valid subtype identifiers for this type
    pub fn valid_subtypes(&self) -> &'static [&'static str] {
        match self {
            AssetType::Hardware => &["server", "workstation", "appliance", "mobile_device", "iot"],
            AssetType::Software => &["application", "operating_system", "middleware", "firmware"],
            AssetType::Data => &["database", "document_store", "backup", "archive"],
            AssetType::Service => &["internal_service", "external_service", "cloud_service"],
            AssetType::Network => &["router", "switch", "firewall", "vpn_gateway", "segment"],
            AssetType::Personnel => &["role", "team", "external_provider"],
            AssetType::Facility => &["datacenter", "office", "plant"],
        }
    }

    /// Whether the given subtype is a valid pairing for this type
    pub fn accepts_subtype(&self, subtype: &str) -> bool {
        self.valid_subtypes().contains(&subtype)
    }
}

/// Technical metadata used for vulnerability matching
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalProfile {
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub software_components: Vec<String>,
    #[serde(default)]
    pub operating_system: Option<String>,
}

/// Open-ended metadata bag: well-known keys plus an extension map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetMetadata {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub business_unit: Option<String>,
    #[serde(default)]
    pub custodian: Option<String>,
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

impl AssetMetadata {
    /// True when no well-known key is set and the extension map is empty
    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.environment.is_none()
            && self.business_unit.is_none()
            && self.custodian.is_none()
            && self.extra.is_empty()
    }
}

/// An organizational asset snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub asset_type: Option<AssetType>,
    #[serde(default)]
    pub asset_subtype: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub valuation: SecurityValuation,
    /// Sector adjustment in [0.1, 3.0]; absent means the neutral 1.0
    #[serde(default)]
    pub sectoral_factor: Option<f64>,
    #[serde(default)]
    pub economic_value: f64,
    /// Organization sector, used for the economic factor table lookup
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub technical: TechnicalProfile,
    #[serde(default)]
    pub network_exposure: NetworkExposure,
    #[serde(default)]
    pub metadata: AssetMetadata,
    /// Outgoing dependency edges (this asset depends on the targets)
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,
}

impl Asset {
    /// Sector adjustment with the neutral default applied
    pub fn sectoral_adjustment(&self) -> f64 {
        self.sectoral_factor.unwrap_or(1.0)
    }

    /// Worst-case valuation dimension
    pub fn max_dimension(&self) -> f64 {
        self.valuation.max_dimension()
    }
}

/// Reachability of a vulnerability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackVector {
    Network,
    Adjacent,
    Local,
    Physical,
}

/// Maturity of a known exploit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExploitMaturity {
    Poc,
    Functional,
    Commercial,
}

/// A product descriptor a vulnerability claims to affect
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffectedProduct {
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product: String,
    /// Version bound where the vulnerability was introduced, if published
    #[serde(default)]
    pub introduced: Option<String>,
    /// First fixed version, if published
    #[serde(default)]
    pub fixed: Option<String>,
}

/// Externally-sourced vulnerability descriptor snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub id: String,
    /// Base severity score in [0, 10]
    pub base_severity: f64,
    pub attack_vector: AttackVector,
    #[serde(default)]
    pub known_exploit: bool,
    #[serde(default)]
    pub exploit_maturity: Option<ExploitMaturity>,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trending: bool,
    #[serde(default)]
    pub patch_available: bool,
    #[serde(default)]
    pub affected_products: Vec<AffectedProduct>,
}

impl VulnerabilityRecord {
    /// Whole days elapsed since publication, measured against the supplied
    /// clock so scoring stays reproducible
    pub fn age_in_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.published.map(|p| (now - p).num_days())
    }
}

/// Exposure / business impact magnitude
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImpactLevel::None => write!(f, "none"),
            ImpactLevel::Low => write!(f, "low"),
            ImpactLevel::Medium => write!(f, "medium"),
            ImpactLevel::High => write!(f, "high"),
            ImpactLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Remediation priority for a correlated (vulnerability, asset) pair
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorityLevel::Low => write!(f, "low"),
            PriorityLevel::Medium => write!(f, "medium"),
            PriorityLevel::High => write!(f, "high"),
            PriorityLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Completeness grade of an asset's valuation record
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceLevel {
    #[default]
    NonCompliant,
    PartiallyCompliant,
    MostlyCompliant,
    FullyCompliant,
}

impl ComplianceLevel {
    /// Map a 0-100 checklist score onto its band
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 90 => ComplianceLevel::FullyCompliant,
            s if s >= 70 => ComplianceLevel::MostlyCompliant,
            s if s >= 50 => ComplianceLevel::PartiallyCompliant,
            _ => ComplianceLevel::NonCompliant,
        }
    }
}

impl std::fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplianceLevel::NonCompliant => write!(f, "non_compliant"),
            ComplianceLevel::PartiallyCompliant => write!(f, "partially_compliant"),
            ComplianceLevel::MostlyCompliant => write!(f, "mostly_compliant"),
            ComplianceLevel::FullyCompliant => write!(f, "fully_compliant"),
        }
    }
}

/// Workflow state of an impact record, owned by the external ticketing
/// collaborator after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    RiskAccepted,
    NotApplicable,
}

impl RemediationStatus {
    /// Terminal states are never re-opened by the workflow
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RemediationStatus::Completed
                | RemediationStatus::RiskAccepted
                | RemediationStatus::NotApplicable
        )
    }
}

/// Correlation verdict for one (vulnerability, asset) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationalImpact {
    pub id: String,
    pub vulnerability_id: String,
    pub asset_id: String,
    /// Matching confidence in [0, 1]
    pub relevance_score: f64,
    pub exposure_level: ImpactLevel,
    pub business_impact: ImpactLevel,
    pub priority: PriorityLevel,
    pub remediation_status: RemediationStatus,
    /// Urgency multiplier in [1.0, 2.0]
    pub temporal_risk_factor: f64,
}

/// Summary of impact drafts by priority
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl ImpactSummary {
    pub fn from_impacts(impacts: &[OrganizationalImpact]) -> Self {
        let mut summary = Self::default();
        for impact in impacts {
            match impact.priority {
                PriorityLevel::Critical => summary.critical += 1,
                PriorityLevel::High => summary.high += 1,
                PriorityLevel::Medium => summary.medium += 1,
                PriorityLevel::Low => summary.low += 1,
            }
            summary.total += 1;
        }
        summary
    }
}
