//! Vulnerability correlation
//!
//! Matches externally-sourced vulnerability descriptors against asset
//! technical metadata to produce per-(vulnerability, asset) relevance,
//! exposure, business impact, and remediation priority. Matching is
//! deliberately fuzzy: vendor and product names in feeds rarely agree
//! with inventory spellings, so exact and substring matches score
//! differently instead of gating on equality.

use crate::error::{Result, RiskError};
use crate::models::{
    deterministic_impact_id, AffectedProduct, Asset, AttackVector, ExploitMaturity, ImpactLevel,
    NetworkExposure, OrganizationalImpact, PriorityLevel, RemediationStatus, VulnerabilityRecord,
};
use crate::valuation::validate_valuation;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Relevance contributions
const VENDOR_EXACT: f64 = 0.4;
const VENDOR_PARTIAL: f64 = 0.2;
const PRODUCT_EXACT: f64 = 0.4;
const PRODUCT_PARTIAL: f64 = 0.2;
const COMPONENT_MATCH: f64 = 0.3;
const HIGH_VALUE_BONUS: f64 = 0.2;
const MID_VALUE_BONUS: f64 = 0.1;

/// Ceiling for the temporal urgency multiplier
const TEMPORAL_CAP: f64 = 2.0;

/// Default candidate retention threshold (exclusive)
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.3;

/// Correlates vulnerability descriptors against asset metadata
#[derive(Debug, Clone)]
pub struct VulnerabilityCorrelator {
    relevance_threshold: f64,
}

impl Default for VulnerabilityCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl VulnerabilityCorrelator {
    pub fn new() -> Self {
        Self {
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }

    /// Override the retention threshold (still exclusive)
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    pub fn relevance_threshold(&self) -> f64 {
        self.relevance_threshold
    }

    /// Relevance of one affected-product descriptor against one asset,
    /// accumulated then clamped to [0, 1]
    pub fn relevance_for_product(&self, product: &AffectedProduct, asset: &Asset) -> f64 {
        let mut score = 0.0;

        if let Some(vendor) = asset.technical.vendor.as_deref() {
            if exact_match(&product.vendor, vendor) {
                score += VENDOR_EXACT;
            } else if partial_match(&product.vendor, vendor) {
                score += VENDOR_PARTIAL;
            }
        }

        if let Some(asset_product) = asset.technical.product.as_deref() {
            if exact_match(&product.product, asset_product) {
                score += PRODUCT_EXACT;
            } else if partial_match(&product.product, asset_product) {
                score += PRODUCT_PARTIAL;
            }
        }

        if asset
            .technical
            .software_components
            .iter()
            .any(|c| exact_match(&product.product, c) || partial_match(&product.product, c))
        {
            score += COMPONENT_MATCH;
        }

        let max_dimension = asset.max_dimension();
        if max_dimension >= 8.0 {
            score += HIGH_VALUE_BONUS;
        } else if max_dimension >= 6.0 {
            score += MID_VALUE_BONUS;
        }

        score.clamp(0.0, 1.0)
    }

    /// Relevance of a whole vulnerability against one asset: the best
    /// match across its affected products
    pub fn relevance(&self, vuln: &VulnerabilityRecord, asset: &Asset) -> f64 {
        vuln.affected_products
            .iter()
            .map(|p| self.relevance_for_product(p, asset))
            .fold(0.0, f64::max)
    }

    /// Exposure keyed on the attack vector and the asset's network placement
    pub fn exposure_level(&self, vuln: &VulnerabilityRecord, asset: &Asset) -> ImpactLevel {
        match vuln.attack_vector {
            AttackVector::Network => match asset.network_exposure {
                NetworkExposure::InternetFacing => ImpactLevel::Critical,
                NetworkExposure::InternalNetwork => ImpactLevel::High,
                _ => ImpactLevel::Medium,
            },
            AttackVector::Adjacent => ImpactLevel::Medium,
            AttackVector::Local => ImpactLevel::Low,
            AttackVector::Physical => ImpactLevel::Low,
        }
    }

    /// Business impact from severity combined with the value of the
    /// affected assets; no affected assets means no impact
    pub fn business_impact(&self, vuln: &VulnerabilityRecord, affected: &[&Asset]) -> ImpactLevel {
        if affected.is_empty() {
            return ImpactLevel::None;
        }
        let max_dimension = affected
            .iter()
            .map(|a| a.max_dimension())
            .fold(f64::NEG_INFINITY, f64::max);

        let combined = (vuln.base_severity + max_dimension) / 2.0;
        match combined {
            c if c >= 8.5 => ImpactLevel::Critical,
            c if c >= 7.0 => ImpactLevel::High,
            c if c >= 5.0 => ImpactLevel::Medium,
            c if c >= 3.0 => ImpactLevel::Low,
            _ => ImpactLevel::None,
        }
    }

    /// Remediation priority: the stronger of the severity tier and the
    /// business-impact tier, escalated for exploitation signals
    pub fn priority(
        &self,
        base_severity: f64,
        business_impact: ImpactLevel,
        known_exploit: bool,
        trending: bool,
    ) -> PriorityLevel {
        let severity_tier = severity_to_priority(base_severity);
        let impact_tier = impact_to_priority(business_impact);
        let mut priority = severity_tier.max(impact_tier);

        if known_exploit && priority != PriorityLevel::Critical {
            priority = escalate(priority);
        }
        if trending && priority == PriorityLevel::Low {
            priority = PriorityLevel::Medium;
        }

        priority
    }

    /// Temporal urgency multiplier in [1.0, 2.0].
    ///
    /// Age brackets are mutually exclusive: only the matching one applies.
    pub fn temporal_risk_factor(&self, vuln: &VulnerabilityRecord, now: DateTime<Utc>) -> f64 {
        let mut factor: f64 = 1.0;

        if let Some(age) = vuln.age_in_days(now) {
            if age <= 7 {
                factor += 0.3;
            } else if age <= 30 {
                factor += 0.2;
            } else if age <= 90 {
                factor += 0.1;
            }
        }

        if vuln.known_exploit {
            factor += 0.4;
            if matches!(
                vuln.exploit_maturity,
                Some(ExploitMaturity::Functional) | Some(ExploitMaturity::Commercial)
            ) {
                factor += 0.2;
            }
        }

        if vuln.trending {
            factor += 0.2;
        }
        if !vuln.patch_available {
            factor += 0.1;
        }

        factor.min(TEMPORAL_CAP)
    }

    /// Correlate one (vulnerability, asset) pair into a draft impact.
    ///
    /// Returns `Ok(None)` when the pair does not clear the relevance
    /// threshold; validation failures are typed errors, never a zero score.
    pub fn correlate(
        &self,
        vuln: &VulnerabilityRecord,
        asset: &Asset,
        now: DateTime<Utc>,
    ) -> Result<Option<OrganizationalImpact>> {
        validate_valuation(asset)?;
        if !(0.0..=10.0).contains(&vuln.base_severity) {
            return Err(RiskError::out_of_range(
                vuln.id.clone(),
                "base_severity",
                vuln.base_severity,
                0.0,
                10.0,
            ));
        }

        let relevance_score = self.relevance(vuln, asset);
        if relevance_score <= self.relevance_threshold {
            return Ok(None);
        }

        // Pairs are evaluated independently, so the affected set for the
        // per-pair business impact is this asset alone.
        let exposure_level = self.exposure_level(vuln, asset);
        let business_impact = self.business_impact(vuln, &[asset]);
        let priority = self.priority(
            vuln.base_severity,
            business_impact,
            vuln.known_exploit,
            vuln.trending,
        );
        let temporal_risk_factor = self.temporal_risk_factor(vuln, now);

        debug!(
            "Correlated {} x {}: relevance={:.2}, exposure={}, impact={}, priority={}",
            vuln.id, asset.id, relevance_score, exposure_level, business_impact, priority
        );

        Ok(Some(OrganizationalImpact {
            id: deterministic_impact_id(&vuln.id, &asset.id),
            vulnerability_id: vuln.id.clone(),
            asset_id: asset.id.clone(),
            relevance_score,
            exposure_level,
            business_impact,
            priority,
            remediation_status: RemediationStatus::Pending,
            temporal_risk_factor,
        }))
    }
}

/// CVSS-style severity bands mapped onto priority tiers
fn severity_to_priority(severity: f64) -> PriorityLevel {
    match severity {
        s if s >= 9.0 => PriorityLevel::Critical,
        s if s >= 7.0 => PriorityLevel::High,
        s if s >= 4.0 => PriorityLevel::Medium,
        _ => PriorityLevel::Low,
    }
}

fn impact_to_priority(impact: ImpactLevel) -> PriorityLevel {
    match impact {
        ImpactLevel::Critical => PriorityLevel::Critical,
        ImpactLevel::High => PriorityLevel::High,
        ImpactLevel::Medium => PriorityLevel::Medium,
        ImpactLevel::Low | ImpactLevel::None => PriorityLevel::Low,
    }
}

fn escalate(priority: PriorityLevel) -> PriorityLevel {
    match priority {
        PriorityLevel::Low => PriorityLevel::Medium,
        PriorityLevel::Medium => PriorityLevel::High,
        PriorityLevel::High | PriorityLevel::Critical => PriorityLevel::Critical,
    }
}

/// Case-insensitive equality; empty strings never match
fn exact_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.is_empty() && !b.is_empty() && a.eq_ignore_ascii_case(b)
}

/// Case-insensitive containment in either direction; empty strings never match
fn partial_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim().to_lowercase(), b.trim().to_lowercase());
    !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SecurityValuation, TechnicalProfile};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn vuln(severity: f64) -> VulnerabilityRecord {
        VulnerabilityRecord {
            id: "CVE-2026-1111".to_string(),
            base_severity: severity,
            attack_vector: AttackVector::Network,
            known_exploit: false,
            exploit_maturity: None,
            published: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
            trending: false,
            patch_available: true,
            affected_products: vec![AffectedProduct {
                vendor: "Siemens".to_string(),
                product: "SIMATIC S7".to_string(),
                introduced: None,
                fixed: None,
            }],
        }
    }

    fn matching_asset() -> Asset {
        Asset {
            id: "plc-01".to_string(),
            valuation: SecurityValuation {
                availability: 8.0,
                integrity: 7.0,
                ..Default::default()
            },
            technical: TechnicalProfile {
                vendor: Some("Siemens".to_string()),
                product: Some("SIMATIC S7".to_string()),
                software_components: vec![],
                operating_system: None,
            },
            network_exposure: NetworkExposure::InternetFacing,
            ..Default::default()
        }
    }

    #[test]
    fn test_relevance_exact_matches_with_bonus() {
        let correlator = VulnerabilityCorrelator::new();
        let asset = matching_asset();
        // vendor 0.4 + product 0.4 + high-value bonus 0.2, clamped at 1.0
        let relevance = correlator.relevance(&vuln(9.0), &asset);
        assert!((relevance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_partial_matches() {
        let correlator = VulnerabilityCorrelator::new();
        let mut asset = matching_asset();
        asset.technical.vendor = Some("Siemens AG".to_string());
        asset.technical.product = Some("Other".to_string());
        asset.valuation = SecurityValuation {
            confidentiality: 5.0,
            ..Default::default()
        };
        // vendor partial 0.2, product none, no value bonus
        let relevance = correlator.relevance(&vuln(9.0), &asset);
        assert!((relevance - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_component_match() {
        let correlator = VulnerabilityCorrelator::new();
        let mut asset = matching_asset();
        asset.technical.vendor = None;
        asset.technical.product = None;
        asset.technical.software_components = vec!["simatic s7 runtime".to_string()];
        asset.valuation = SecurityValuation {
            integrity: 6.0,
            ..Default::default()
        };
        // component 0.3 + mid-value bonus 0.1
        let relevance = correlator.relevance(&vuln(9.0), &asset);
        assert!((relevance - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_empty_fields_never_match() {
        let correlator = VulnerabilityCorrelator::new();
        let mut asset = matching_asset();
        asset.technical.vendor = Some("".to_string());
        asset.technical.product = Some("  ".to_string());
        asset.valuation = SecurityValuation::default();
        let mut record = vuln(9.0);
        record.affected_products[0].vendor = "".to_string();
        record.affected_products[0].product = "".to_string();
        assert_eq!(correlator.relevance(&record, &asset), 0.0);
    }

    #[test]
    fn test_relevance_takes_best_product() {
        let correlator = VulnerabilityCorrelator::new();
        let mut record = vuln(9.0);
        record.affected_products.insert(
            0,
            AffectedProduct {
                vendor: "Unrelated".to_string(),
                product: "Nothing".to_string(),
                introduced: None,
                fixed: None,
            },
        );
        let relevance = correlator.relevance(&record, &matching_asset());
        assert!((relevance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_exposure_table() {
        let correlator = VulnerabilityCorrelator::new();
        let mut asset = matching_asset();
        let mut record = vuln(9.0);

        assert_eq!(
            correlator.exposure_level(&record, &asset),
            ImpactLevel::Critical
        );

        asset.network_exposure = NetworkExposure::InternalNetwork;
        assert_eq!(correlator.exposure_level(&record, &asset), ImpactLevel::High);

        asset.network_exposure = NetworkExposure::Isolated;
        assert_eq!(
            correlator.exposure_level(&record, &asset),
            ImpactLevel::Medium
        );

        record.attack_vector = AttackVector::Adjacent;
        assert_eq!(
            correlator.exposure_level(&record, &asset),
            ImpactLevel::Medium
        );

        record.attack_vector = AttackVector::Local;
        assert_eq!(correlator.exposure_level(&record, &asset), ImpactLevel::Low);

        record.attack_vector = AttackVector::Physical;
        assert_eq!(correlator.exposure_level(&record, &asset), ImpactLevel::Low);
    }

    #[test]
    fn test_business_impact_bands() {
        let correlator = VulnerabilityCorrelator::new();
        let asset = matching_asset(); // max dimension 8.0

        // (9.0 + 8.0)/2 = 8.5 -> critical
        assert_eq!(
            correlator.business_impact(&vuln(9.0), &[&asset]),
            ImpactLevel::Critical
        );
        // (6.0 + 8.0)/2 = 7.0 -> high
        assert_eq!(
            correlator.business_impact(&vuln(6.0), &[&asset]),
            ImpactLevel::High
        );
        // (2.0 + 8.0)/2 = 5.0 -> medium
        assert_eq!(
            correlator.business_impact(&vuln(2.0), &[&asset]),
            ImpactLevel::Medium
        );
        // No affected assets -> none
        assert_eq!(correlator.business_impact(&vuln(10.0), &[]), ImpactLevel::None);
    }

    #[test]
    fn test_priority_base_tiers() {
        let correlator = VulnerabilityCorrelator::new();
        assert_eq!(
            correlator.priority(9.5, ImpactLevel::Low, false, false),
            PriorityLevel::Critical
        );
        assert_eq!(
            correlator.priority(7.5, ImpactLevel::Low, false, false),
            PriorityLevel::High
        );
        // business impact outranks a low severity
        assert_eq!(
            correlator.priority(2.0, ImpactLevel::High, false, false),
            PriorityLevel::High
        );
        assert_eq!(
            correlator.priority(2.0, ImpactLevel::None, false, false),
            PriorityLevel::Low
        );
    }

    #[test]
    fn test_priority_exploit_escalation() {
        let correlator = VulnerabilityCorrelator::new();
        // medium escalates to high
        assert_eq!(
            correlator.priority(5.0, ImpactLevel::None, true, false),
            PriorityLevel::High
        );
        // critical stays critical
        assert_eq!(
            correlator.priority(9.5, ImpactLevel::None, true, false),
            PriorityLevel::Critical
        );
        // high escalates to critical, never past it
        assert_eq!(
            correlator.priority(7.5, ImpactLevel::None, true, true),
            PriorityLevel::Critical
        );
    }

    #[test]
    fn test_priority_trending_lifts_low() {
        let correlator = VulnerabilityCorrelator::new();
        assert_eq!(
            correlator.priority(2.0, ImpactLevel::None, false, true),
            PriorityLevel::Medium
        );
        // trending does not touch medium
        assert_eq!(
            correlator.priority(5.0, ImpactLevel::None, false, true),
            PriorityLevel::Medium
        );
    }

    #[test]
    fn test_temporal_brackets_are_exclusive() {
        let correlator = VulnerabilityCorrelator::new();
        let reference = now();
        let mut record = vuln(7.0);

        record.published = Some(reference - chrono::Duration::days(3));
        assert!((correlator.temporal_risk_factor(&record, reference) - 1.3).abs() < 1e-9);

        record.published = Some(reference - chrono::Duration::days(20));
        assert!((correlator.temporal_risk_factor(&record, reference) - 1.2).abs() < 1e-9);

        record.published = Some(reference - chrono::Duration::days(60));
        assert!((correlator.temporal_risk_factor(&record, reference) - 1.1).abs() < 1e-9);

        record.published = Some(reference - chrono::Duration::days(400));
        assert!((correlator.temporal_risk_factor(&record, reference) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_temporal_exploit_and_cap() {
        let correlator = VulnerabilityCorrelator::new();
        let reference = now();
        let mut record = vuln(7.0);
        record.published = Some(reference - chrono::Duration::days(2));
        record.known_exploit = true;
        record.exploit_maturity = Some(ExploitMaturity::Commercial);
        record.trending = true;
        record.patch_available = false;

        // 1.0 + 0.3 + 0.4 + 0.2 + 0.2 + 0.1 = 2.2, capped
        let factor = correlator.temporal_risk_factor(&record, reference);
        assert!((factor - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_temporal_stays_in_range() {
        let correlator = VulnerabilityCorrelator::new();
        let record = VulnerabilityRecord {
            published: None,
            ..vuln(1.0)
        };
        let factor = correlator.temporal_risk_factor(&record, now());
        assert!((1.0..=2.0).contains(&factor));
    }

    #[test]
    fn test_correlate_emits_pending_draft() {
        let correlator = VulnerabilityCorrelator::new();
        let record = vuln(9.0);
        let asset = matching_asset();

        let impact = correlator
            .correlate(&record, &asset, now())
            .unwrap()
            .expect("pair should clear the threshold");

        assert_eq!(impact.vulnerability_id, "CVE-2026-1111");
        assert_eq!(impact.asset_id, "plc-01");
        assert_eq!(impact.remediation_status, RemediationStatus::Pending);
        assert_eq!(impact.exposure_level, ImpactLevel::Critical);
        // (9.0 + 8.0)/2 = 8.5
        assert_eq!(impact.business_impact, ImpactLevel::Critical);
        assert_eq!(impact.priority, PriorityLevel::Critical);
        assert_eq!(impact.id, deterministic_impact_id("CVE-2026-1111", "plc-01"));
    }

    #[test]
    fn test_correlate_threshold_is_exclusive() {
        // Exactly 0.3 relevance is not retained
        let correlator = VulnerabilityCorrelator::new();
        let mut asset = matching_asset();
        asset.technical.vendor = None;
        asset.technical.product = None;
        asset.technical.software_components = vec!["simatic s7".to_string()];
        asset.valuation = SecurityValuation {
            confidentiality: 3.0,
            ..Default::default()
        };
        let record = vuln(9.0);
        assert!((correlator.relevance(&record, &asset) - 0.3).abs() < 1e-9);
        assert!(correlator.correlate(&record, &asset, now()).unwrap().is_none());
    }

    #[test]
    fn test_correlate_rejects_invalid_asset() {
        let correlator = VulnerabilityCorrelator::new();
        let mut asset = matching_asset();
        asset.valuation.integrity = 11.0;
        let err = correlator.correlate(&vuln(9.0), &asset, now()).unwrap_err();
        assert!(matches!(err, RiskError::Validation { .. }));
    }

    #[test]
    fn test_correlate_rejects_invalid_severity() {
        let correlator = VulnerabilityCorrelator::new();
        let err = correlator
            .correlate(&vuln(12.0), &matching_asset(), now())
            .unwrap_err();
        assert!(matches!(err, RiskError::Validation { .. }));
    }
}
