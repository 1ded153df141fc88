//! Engine configuration.
//!
//! Every tunable coefficient of the scheduler lives in `CogConfig`. The
//! process keeps one base config; per-user recalibrated fatigue weights are
//! merged on top at the start of each scheduling call, so the engine always
//! works on an isolated value snapshot.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ConfigError;

/// The three per-user weights the TLX recalibrator adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueWeights {
    pub fatigue_consec_weight: f64,
    pub fatigue_total_weight: f64,
    pub fatigue_force_break: f64,
}

impl Default for FatigueWeights {
    fn default() -> Self {
        Self {
            fatigue_consec_weight: default_fatigue_consec_weight(),
            fatigue_total_weight: default_fatigue_total_weight(),
            fatigue_force_break: default_fatigue_force_break(),
        }
    }
}

/// Scheduler configuration snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CogConfig {
    /// Hours of sleep treated as fully rested.
    #[serde(default = "default_sleep_baseline")]
    pub sleep_baseline: f64,
    /// Weight of consecutive deep-work minutes in the fatigue formula.
    #[serde(default = "default_fatigue_consec_weight")]
    pub fatigue_consec_weight: f64,
    /// Weight of total deep-work minutes in the fatigue formula.
    #[serde(default = "default_fatigue_total_weight")]
    pub fatigue_total_weight: f64,
    /// Normalizer for the consecutive term (minutes).
    #[serde(default = "default_consec_threshold_min")]
    pub consec_threshold_min: u32,
    /// Normalizer for the total term; also the long-break cutover (minutes).
    #[serde(default = "default_total_deep_threshold_min")]
    pub total_deep_threshold_min: u32,
    /// Consecutive deep minutes that force a break regardless of fatigue.
    #[serde(default = "default_short_break_trigger_min")]
    pub short_break_trigger_min: u32,
    #[serde(default = "default_short_break_duration")]
    pub short_break_duration: u32,
    #[serde(default = "default_long_break_duration")]
    pub long_break_duration: u32,
    /// Fatigue level that forces a break.
    #[serde(default = "default_fatigue_force_break")]
    pub fatigue_force_break: f64,
    /// Stress level at which the load cap kicks in.
    #[serde(default = "default_stress_cap_threshold")]
    pub stress_cap_threshold: u8,
    #[serde(default = "default_max_load_under_stress")]
    pub max_load_under_stress: f64,
    /// Residual load added per lecture already attended today.
    #[serde(default = "default_lecture_penalty_per")]
    pub lecture_penalty_per: f64,
    /// Fraction of fatigue removed by a full-length break.
    #[serde(default = "default_break_recovery_factor")]
    pub break_recovery_factor: f64,
    /// Minimum indivisible work unit (minutes).
    #[serde(default = "default_quantum_min")]
    pub quantum_min: u32,
    /// Cognitive load at or above which a block counts as deep work.
    #[serde(default = "default_deep_work_load_threshold")]
    pub deep_work_load_threshold: f64,
    /// Category → difficulty multiplier for the load estimator.
    #[serde(default = "default_category_weights")]
    pub category_weights: HashMap<String, f64>,
}

fn default_sleep_baseline() -> f64 {
    7.5
}
fn default_fatigue_consec_weight() -> f64 {
    0.4
}
fn default_fatigue_total_weight() -> f64 {
    0.3
}
fn default_consec_threshold_min() -> u32 {
    90
}
fn default_total_deep_threshold_min() -> u32 {
    180
}
fn default_short_break_trigger_min() -> u32 {
    90
}
fn default_short_break_duration() -> u32 {
    10
}
fn default_long_break_duration() -> u32 {
    15
}
fn default_fatigue_force_break() -> f64 {
    0.75
}
fn default_stress_cap_threshold() -> u8 {
    4
}
fn default_max_load_under_stress() -> f64 {
    6.0
}
fn default_lecture_penalty_per() -> f64 {
    0.05
}
fn default_break_recovery_factor() -> f64 {
    0.4
}
fn default_quantum_min() -> u32 {
    25
}
fn default_deep_work_load_threshold() -> f64 {
    6.0
}

fn default_category_weights() -> HashMap<String, f64> {
    let mut weights = HashMap::new();
    weights.insert("math".to_string(), 1.3);
    weights.insert("programming".to_string(), 1.25);
    weights.insert("science".to_string(), 1.15);
    weights.insert("writing".to_string(), 1.0);
    weights.insert("general".to_string(), 1.0);
    weights.insert("reading".to_string(), 0.8);
    weights.insert("review".to_string(), 0.75);
    weights
}

impl Default for CogConfig {
    fn default() -> Self {
        Self {
            sleep_baseline: default_sleep_baseline(),
            fatigue_consec_weight: default_fatigue_consec_weight(),
            fatigue_total_weight: default_fatigue_total_weight(),
            consec_threshold_min: default_consec_threshold_min(),
            total_deep_threshold_min: default_total_deep_threshold_min(),
            short_break_trigger_min: default_short_break_trigger_min(),
            short_break_duration: default_short_break_duration(),
            long_break_duration: default_long_break_duration(),
            fatigue_force_break: default_fatigue_force_break(),
            stress_cap_threshold: default_stress_cap_threshold(),
            max_load_under_stress: default_max_load_under_stress(),
            lecture_penalty_per: default_lecture_penalty_per(),
            break_recovery_factor: default_break_recovery_factor(),
            quantum_min: default_quantum_min(),
            deep_work_load_threshold: default_deep_work_load_threshold(),
            category_weights: default_category_weights(),
        }
    }
}

impl CogConfig {
    /// Look up the load multiplier for a free-form category name.
    /// Unknown categories fall back to 1.0.
    pub fn category_weight(&self, category: &str) -> f64 {
        self.category_weights
            .get(&category.trim().to_lowercase())
            .copied()
            .unwrap_or(1.0)
    }

    /// The recalibratable subset of this config.
    pub fn weights(&self) -> FatigueWeights {
        FatigueWeights {
            fatigue_consec_weight: self.fatigue_consec_weight,
            fatigue_total_weight: self.fatigue_total_weight,
            fatigue_force_break: self.fatigue_force_break,
        }
    }

    /// Merge per-user recalibrated weights into a fresh snapshot.
    pub fn with_weights(&self, weights: &FatigueWeights) -> CogConfig {
        let mut merged = self.clone();
        merged.fatigue_consec_weight = weights.fatigue_consec_weight;
        merged.fatigue_total_weight = weights.fatigue_total_weight;
        merged.fatigue_force_break = weights.fatigue_force_break;
        merged
    }

    /// Apply a partial update from JSON. The whole update is validated
    /// before anything is written, so an unknown key or a mistyped value
    /// leaves the config untouched.
    pub fn apply_updates(
        &mut self,
        updates: &serde_json::Map<String, Value>,
    ) -> Result<(), ConfigError> {
        let mut staged = self.clone();
        for (key, value) in updates {
            match key.as_str() {
                "sleep_baseline" => staged.sleep_baseline = as_f64(key, value)?,
                "fatigue_consec_weight" => staged.fatigue_consec_weight = as_f64(key, value)?,
                "fatigue_total_weight" => staged.fatigue_total_weight = as_f64(key, value)?,
                "consec_threshold_min" => staged.consec_threshold_min = as_u32(key, value)?,
                "total_deep_threshold_min" => {
                    staged.total_deep_threshold_min = as_u32(key, value)?
                }
                "short_break_trigger_min" => staged.short_break_trigger_min = as_u32(key, value)?,
                "short_break_duration" => staged.short_break_duration = as_u32(key, value)?,
                "long_break_duration" => staged.long_break_duration = as_u32(key, value)?,
                "fatigue_force_break" => staged.fatigue_force_break = as_f64(key, value)?,
                "stress_cap_threshold" => staged.stress_cap_threshold = as_u8(key, value)?,
                "max_load_under_stress" => staged.max_load_under_stress = as_f64(key, value)?,
                "lecture_penalty_per" => staged.lecture_penalty_per = as_f64(key, value)?,
                "break_recovery_factor" => staged.break_recovery_factor = as_f64(key, value)?,
                "quantum_min" => {
                    let q = as_u32(key, value)?;
                    if q == 0 {
                        return Err(ConfigError::InvalidValue {
                            key: key.clone(),
                            message: "quantum must be at least 1 minute".to_string(),
                        });
                    }
                    staged.quantum_min = q;
                }
                "deep_work_load_threshold" => {
                    staged.deep_work_load_threshold = as_f64(key, value)?
                }
                other => return Err(ConfigError::UnknownKey(other.to_string())),
            }
        }
        *self = staged;
        Ok(())
    }
}

fn as_f64(key: &str, value: &Value) -> Result<f64, ConfigError> {
    value.as_f64().ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected a number, got {value}"),
    })
}

fn as_u32(key: &str, value: &Value) -> Result<u32, ConfigError> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a non-negative integer, got {value}"),
        })
}

fn as_u8(key: &str, value: &Value) -> Result<u8, ConfigError> {
    value
        .as_u64()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a small integer, got {value}"),
        })
}
