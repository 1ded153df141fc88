//! Energy model.
//!
//! `E(t) = clamp(0, 1, S x C(t) - stress_decay)` where `C` is a chronotype-
//! shaped circadian baseline in [0.4, 1.0] and `S` is a sleep-debt scale.
//! The model is a pure function of the profile and config snapshot; the
//! same inputs always produce the same curve.

use serde::{Deserialize, Serialize};

use crate::clock::{format_hhmm, TimeRange};
use crate::config::CogConfig;
use crate::profile::{Chronotype, Profile};

/// Sampling cadence for the exported energy/fatigue curves.
pub const CURVE_CADENCE_MIN: u32 = 15;

/// One sample of an exported curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// `HH:MM`
    pub time: String,
    pub value: f64,
}

/// Per-call energy model, captured from a profile snapshot.
#[derive(Debug, Clone)]
pub struct EnergyModel {
    chronotype: Chronotype,
    sleep_scale: f64,
    stress_decay: f64,
}

impl EnergyModel {
    pub fn new(profile: &Profile, cfg: &CogConfig) -> Self {
        let sleep_scale = (profile.sleep_hours / cfg.sleep_baseline).clamp(0.6, 1.1);
        let stress_decay = 0.03 * f64::from(profile.stress_level.saturating_sub(1));
        Self {
            chronotype: profile.chronotype,
            sleep_scale,
            stress_decay,
        }
    }

    /// Circadian baseline in [0.4, 1.0]: a Gaussian peak at the chronotype
    /// hour, an afternoon dip for morning types, and a 04:00 trough.
    fn circadian(&self, hour: f64) -> f64 {
        let gauss = |center: f64, width: f64| -> f64 {
            let d = hour - center;
            (-(d * d) / (2.0 * width * width)).exp()
        };
        let mut value = 0.55 + 0.45 * gauss(self.chronotype.peak_hour(), 3.2);
        if self.chronotype.has_afternoon_dip() {
            value -= 0.18 * gauss(14.5, 1.1);
        }
        value -= 0.25 * gauss(4.0, 2.2);
        value.clamp(0.4, 1.0)
    }

    /// Energy at a minute of the day, in [0, 1].
    pub fn energy_at(&self, minute: u32) -> f64 {
        let hour = f64::from(minute) / 60.0;
        (self.sleep_scale * self.circadian(hour) - self.stress_decay).clamp(0.0, 1.0)
    }

    /// Sample the energy curve across a window at the fixed cadence.
    pub fn sample(&self, window: &TimeRange) -> Vec<CurvePoint> {
        let mut points = Vec::new();
        let mut t = window.start_min;
        while t <= window.end_min {
            points.push(CurvePoint {
                time: format_hhmm(t),
                value: round3(self.energy_at(t)),
            });
            t += CURVE_CADENCE_MIN;
        }
        points
    }
}

pub(crate) fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
