//! TLX-feedback recalibration.
//!
//! Every third NASA-TLX entry nudges the user's three fatigue weights.
//! A user who keeps reporting high mental demand and effort has a more
//! sensitive fatigue response: the accumulation weights rise and the
//! force-break threshold falls, so breaks trigger earlier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::FatigueWeights;
use crate::error::ValidationError;

/// How often (in entries) recalibration runs.
const RECALIBRATE_EVERY: usize = 3;
/// How many trailing entries feed the averages.
const WINDOW: usize = 6;
/// Learning rate for the accumulation weights.
const ALPHA: f64 = 0.05;
/// Learning rate for the force-break threshold.
const BETA: f64 = 0.05;
/// Neutral point of the normalized 1-7 scale.
const BASELINE: f64 = 0.5;

const WEIGHT_MIN: f64 = 0.05;
const WEIGHT_MAX: f64 = 0.60;
const FORCE_MIN: f64 = 0.40;
const FORCE_MAX: f64 = 0.90;

/// One NASA-TLX response for a completed block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlxEntry {
    pub block_index: i64,
    /// 1-7
    pub mental_demand: u8,
    /// 1-7
    pub effort: u8,
    pub timestamp: DateTime<Utc>,
}

impl TlxEntry {
    pub fn new(
        block_index: i64,
        mental_demand: u8,
        effort: u8,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if block_index < 0 {
            return Err(ValidationError::InvalidValue {
                field: "block_index".to_string(),
                message: format!("must be non-negative, got {block_index}"),
            });
        }
        if !(1..=7).contains(&mental_demand) {
            return Err(ValidationError::InvalidValue {
                field: "mental_demand".to_string(),
                message: format!("must be within 1-7, got {mental_demand}"),
            });
        }
        if !(1..=7).contains(&effort) {
            return Err(ValidationError::InvalidValue {
                field: "effort".to_string(),
                message: format!("must be within 1-7, got {effort}"),
            });
        }
        Ok(Self {
            block_index,
            mental_demand,
            effort,
            timestamp,
        })
    }
}

/// Map a 1-7 response onto [0, 1].
fn normalize(value: u8) -> f64 {
    f64::from(value - 1) / 6.0
}

/// Recalibrate the weights from the full entry log.
///
/// Returns `None` when the log length is not a multiple of the cadence;
/// the caller keeps the previous weights in that case.
pub fn recalibrate(entries: &[TlxEntry], weights: &FatigueWeights) -> Option<FatigueWeights> {
    if entries.is_empty() || entries.len() % RECALIBRATE_EVERY != 0 {
        return None;
    }

    let window = &entries[entries.len().saturating_sub(WINDOW)..];
    let n = window.len() as f64;
    let md = window.iter().map(|e| normalize(e.mental_demand)).sum::<f64>() / n;
    let ef = window.iter().map(|e| normalize(e.effort)).sum::<f64>() / n;

    Some(FatigueWeights {
        fatigue_consec_weight: (weights.fatigue_consec_weight + ALPHA * (md - BASELINE))
            .clamp(WEIGHT_MIN, WEIGHT_MAX),
        fatigue_total_weight: (weights.fatigue_total_weight + ALPHA * (ef - BASELINE))
            .clamp(WEIGHT_MIN, WEIGHT_MAX),
        fatigue_force_break: (weights.fatigue_force_break
            - BETA * ((md + ef) / 2.0 - BASELINE))
            .clamp(FORCE_MIN, FORCE_MAX),
    })
}
