//! Asset valuation scoring
//!
//! Pure scoring of a single asset's security valuation into a criticality
//! score and level, plus the economic-exposure figures derived from the
//! asset's declared economic value. Both calls operate on the supplied
//! snapshot only and are idempotent.

use crate::config::EngineConfig;
use crate::error::{Result, RiskError};
use crate::models::{Asset, CriticalityLevel};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bounds for each valuation dimension
pub const DIMENSION_MIN: f64 = 0.0;
pub const DIMENSION_MAX: f64 = 10.0;

/// Bounds for the sector adjustment factor
pub const SECTORAL_FACTOR_MIN: f64 = 0.1;
pub const SECTORAL_FACTOR_MAX: f64 = 3.0;

/// Loss percent per valuation point, per dimension
const CONFIDENTIALITY_LOSS_PCT_PER_POINT: f64 = 10.0;
const INTEGRITY_LOSS_PCT_PER_POINT: f64 = 15.0;
const AVAILABILITY_LOSS_PCT_PER_POINT: f64 = 20.0;

/// Daily-impact weights per dimension loss
const DAILY_WEIGHT_CONFIDENTIALITY: f64 = 0.1;
const DAILY_WEIGHT_INTEGRITY: f64 = 0.8;
const DAILY_WEIGHT_AVAILABILITY: f64 = 1.0;

/// Fixed annual incident probability used for the annualized risk figure
const ANNUAL_INCIDENT_PROBABILITY: f64 = 0.3;

/// Criticality verdict for one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criticality {
    /// `max_dimension × sectoral_adjustment`, deliberately unclamped:
    /// sector adjustment can push it past the nominal [0,10] range
    pub score: f64,
    pub level: CriticalityLevel,
    pub max_dimension: f64,
    pub sectoral_adjustment: f64,
}

/// Economic exposure figures for one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicExposure {
    /// Economic value after the sector table factor
    pub adjusted_value: f64,
    pub confidentiality_loss: f64,
    pub integrity_loss: f64,
    pub availability_loss: f64,
    /// Weighted daily operational impact across the three loss figures
    pub daily_impact: f64,
    /// Annualized risk: adjusted value × (max dimension / 10) × incident probability
    pub annual_risk: f64,
}

/// Pure scorer for asset valuations
#[derive(Debug, Default)]
pub struct ValuationEngine;

impl ValuationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute the criticality score and level for an asset.
    ///
    /// Rejects the asset when any valuation dimension or the sectoral
    /// factor is out of range; no partial score is produced.
    pub fn criticality(&self, asset: &Asset) -> Result<Criticality> {
        validate_valuation(asset)?;

        let max_dimension = asset.max_dimension();
        let sectoral_adjustment = asset.sectoral_adjustment();
        let score = max_dimension * sectoral_adjustment;
        let level = CriticalityLevel::from_score(score);

        debug!(
            "Criticality for {}: max_dim={:.1}, sector={:.2}, score={:.2} ({})",
            asset.id, max_dimension, sectoral_adjustment, score, level
        );

        Ok(Criticality {
            score,
            level,
            max_dimension,
            sectoral_adjustment,
        })
    }

    /// Compute the economic exposure figures for an asset.
    ///
    /// The organization sector selects a factor from the configured table
    /// (neutral 1.0 when the sector is absent or unlisted).
    pub fn economic_exposure(&self, asset: &Asset, config: &EngineConfig) -> Result<EconomicExposure> {
        validate_valuation(asset)?;

        let adjusted_value = asset.economic_value * config.sector_factor(asset.sector.as_deref());

        let confidentiality_pct =
            (asset.valuation.confidentiality * CONFIDENTIALITY_LOSS_PCT_PER_POINT).min(100.0);
        let integrity_pct = (asset.valuation.integrity * INTEGRITY_LOSS_PCT_PER_POINT).min(100.0);
        let availability_pct =
            (asset.valuation.availability * AVAILABILITY_LOSS_PCT_PER_POINT).min(100.0);

        let confidentiality_loss = adjusted_value * confidentiality_pct / 100.0;
        let integrity_loss = adjusted_value * integrity_pct / 100.0;
        let availability_loss = adjusted_value * availability_pct / 100.0;

        let daily_impact = confidentiality_loss * DAILY_WEIGHT_CONFIDENTIALITY
            + integrity_loss * DAILY_WEIGHT_INTEGRITY
            + availability_loss * DAILY_WEIGHT_AVAILABILITY;

        let annual_risk =
            adjusted_value * (asset.max_dimension() / DIMENSION_MAX) * ANNUAL_INCIDENT_PROBABILITY;

        Ok(EconomicExposure {
            adjusted_value,
            confidentiality_loss,
            integrity_loss,
            availability_loss,
            daily_impact,
            annual_risk,
        })
    }
}

/// Validate the five dimensions and the sectoral factor for one asset
pub fn validate_valuation(asset: &Asset) -> Result<()> {
    for (name, value) in asset.valuation.dimensions() {
        if !(DIMENSION_MIN..=DIMENSION_MAX).contains(&value) {
            return Err(RiskError::Validation {
                subject: asset.id.clone(),
                field: name,
                value,
                min: DIMENSION_MIN,
                max: DIMENSION_MAX,
            });
        }
    }
    if let Some(factor) = asset.sectoral_factor {
        if !(SECTORAL_FACTOR_MIN..=SECTORAL_FACTOR_MAX).contains(&factor) {
            return Err(RiskError::out_of_range(
                asset.id.clone(),
                "sectoral_factor",
                factor,
                SECTORAL_FACTOR_MIN,
                SECTORAL_FACTOR_MAX,
            ));
        }
    }
    Ok(())
}
