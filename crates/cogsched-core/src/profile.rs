//! User profile types.
//!
//! A `Profile` is immutable within one scheduling call; the engine reads a
//! snapshot and never writes it back.

use serde::{Deserialize, Serialize};

/// What the user does for a living. Only used for display and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Professional,
    Researcher,
}

/// Diurnal preference. Drives where the circadian peak sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chronotype {
    Early,
    Normal,
    Late,
}

impl Chronotype {
    /// Hour of the day where the energy curve peaks.
    pub fn peak_hour(&self) -> f64 {
        match self {
            Chronotype::Early => 10.0,
            Chronotype::Normal => 11.0,
            Chronotype::Late => 15.0,
        }
    }

    /// Morning types get a post-lunch dip; late types do not.
    pub fn has_afternoon_dip(&self) -> bool {
        !matches!(self, Chronotype::Late)
    }
}

/// User profile record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default = "default_chronotype")]
    pub chronotype: Chronotype,
    #[serde(default = "default_wake_time")]
    pub wake_time: String,
    #[serde(default = "default_sleep_time")]
    pub sleep_time: String,
    #[serde(default = "default_sleep_hours")]
    pub sleep_hours: f64,
    #[serde(default = "default_stress_level")]
    pub stress_level: u8,
    /// Fixed commitments, each `"HH:MM-HH:MM label"` (label optional).
    #[serde(default)]
    pub daily_commitments: Vec<String>,
    /// Preferred break windows, each `"HH:MM-HH:MM"`.
    #[serde(default)]
    pub break_preferences: Vec<String>,
    #[serde(default)]
    pub lectures_today: u32,
    #[serde(default)]
    pub meetings_today: u32,
}

fn default_role() -> Role {
    Role::Student
}
fn default_chronotype() -> Chronotype {
    Chronotype::Normal
}
fn default_wake_time() -> String {
    "07:00".to_string()
}
fn default_sleep_time() -> String {
    "23:00".to_string()
}
fn default_sleep_hours() -> f64 {
    7.0
}
fn default_stress_level() -> u8 {
    2
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: String::new(),
            role: default_role(),
            chronotype: default_chronotype(),
            wake_time: default_wake_time(),
            sleep_time: default_sleep_time(),
            sleep_hours: default_sleep_hours(),
            stress_level: default_stress_level(),
            daily_commitments: Vec::new(),
            break_preferences: Vec::new(),
            lectures_today: 0,
            meetings_today: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_serialization_round_trip() {
        let profile = Profile {
            name: "Mika".to_string(),
            role: Role::Researcher,
            chronotype: Chronotype::Late,
            daily_commitments: vec!["10:00-11:00 Lab meeting".to_string()],
            ..Profile::default()
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"researcher\""));
        assert!(json.contains("\"late\""));
        let decoded: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.chronotype, Chronotype::Late);
        assert_eq!(decoded.daily_commitments.len(), 1);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let decoded: Profile = serde_json::from_str("{}").unwrap();
        assert_eq!(decoded.wake_time, "07:00");
        assert_eq!(decoded.stress_level, 2);
        assert_eq!(decoded.chronotype, Chronotype::Normal);
    }

    #[test]
    fn chronotype_peaks() {
        assert_eq!(Chronotype::Early.peak_hour(), 10.0);
        assert_eq!(Chronotype::Normal.peak_hour(), 11.0);
        assert_eq!(Chronotype::Late.peak_hour(), 15.0);
        assert!(!Chronotype::Late.has_afternoon_dip());
    }
}
