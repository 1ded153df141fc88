//! Human-readable plan warnings.
//!
//! Derived from the profile and the placement outcome, ordered by severity,
//! capped at six. The strings are UI copy but part of the output contract.

use crate::config::CogConfig;
use crate::profile::Profile;
use crate::scheduler::ScheduleOutcome;

/// Hard cap on the number of derived warnings.
pub const MAX_WARNINGS: usize = 6;

/// Derive the severity-ordered warning list for a produced plan.
///
/// A plan with zero tasks gets no warnings.
pub fn derive_warnings(
    profile: &Profile,
    outcome: &ScheduleOutcome,
    cfg: &CogConfig,
) -> Vec<String> {
    if outcome.blocks.is_empty() && !outcome.truncated {
        return Vec::new();
    }

    let deep_minutes: u32 = outcome
        .blocks
        .iter()
        .filter(|b| !b.is_break && b.load >= cfg.deep_work_load_threshold)
        .map(|b| b.duration_min())
        .sum();
    let has_deep = deep_minutes > 0;

    let mut warnings = Vec::new();

    // 1. Severe sleep debt (inclusive: five hours already warrants it)
    if profile.sleep_hours <= 5.0 {
        warnings.push(format!(
            "Only {:.1}h of sleep — burnout risk, consider a lighter day",
            profile.sleep_hours
        ));
    }

    // 2. Maximum stress with deep work scheduled
    if profile.stress_level == 5 && has_deep {
        warnings.push(
            "Stress at maximum with deep work scheduled — consider deferring the hardest task"
                .to_string(),
        );
    }

    // 3. Truncation
    if outcome.truncated {
        warnings.push(format!(
            "Not enough time for all tasks: {} min requested but only {} min free — plan truncated",
            outcome.requested_minutes, outcome.free_minutes
        ));
    }

    // 4. A deep run outlasted the break trigger. The placement loop makes
    // this impossible; if it ever fires the scheduler has a bug.
    if has_unbroken_deep_run(outcome, cfg) {
        debug_assert!(false, "deep run exceeded the break trigger");
        warnings.push(
            "Internal inconsistency: a deep-work run exceeded the break trigger".to_string(),
        );
    }

    // 5. Stress cap exceeded
    for (title, load) in &outcome.capped_tasks {
        warnings.push(format!(
            "'{title}' (load {load:.1}) exceeds the stress-capped maximum of {:.1}",
            cfg.max_load_under_stress
        ));
    }

    // 6. Long deep day without any requested breaks
    if profile.break_preferences.is_empty() && deep_minutes > 120 {
        warnings.push(format!(
            "{deep_minutes} min of deep work with no breaks requested — recovery breaks were inserted"
        ));
    }

    warnings.truncate(MAX_WARNINGS);
    warnings
}

/// Scan for two or more consecutive deep blocks whose combined length
/// exceeds the short-break trigger without an intervening break.
fn has_unbroken_deep_run(outcome: &ScheduleOutcome, cfg: &CogConfig) -> bool {
    let mut run = 0u32;
    for block in &outcome.blocks {
        if block.is_break {
            run = 0;
        } else if block.load >= cfg.deep_work_load_threshold {
            run += block.duration_min();
            if run > cfg.short_break_trigger_min {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::PlacedBlock;

    fn block(start: u32, end: u32, load: f64, is_break: bool) -> PlacedBlock {
        PlacedBlock {
            title: "T".to_string(),
            start_min: start,
            end_min: end,
            load,
            energy_at_start: 0.5,
            fatigue_at_start: 0.1,
            is_break,
            explanation: String::new(),
        }
    }

    fn outcome(blocks: Vec<PlacedBlock>) -> ScheduleOutcome {
        ScheduleOutcome {
            blocks,
            truncated: false,
            deadline_hit: false,
            forced_breaks: 0,
            capped_tasks: Vec::new(),
            requested_minutes: 0,
            free_minutes: 0,
        }
    }

    #[test]
    fn empty_plan_no_warnings() {
        let profile = Profile {
            sleep_hours: 3.0,
            ..Profile::default()
        };
        let warnings = derive_warnings(&profile, &outcome(vec![]), &CogConfig::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn sleep_warning_comes_first() {
        let profile = Profile {
            sleep_hours: 4.0,
            stress_level: 5,
            ..Profile::default()
        };
        let out = outcome(vec![block(540, 565, 8.0, false)]);
        let warnings = derive_warnings(&profile, &out, &CogConfig::default());
        assert!(warnings[0].contains("burnout"));
        assert!(warnings[1].contains("Stress at maximum"));
    }

    #[test]
    fn truncation_warning_carries_minutes() {
        let profile = Profile::default();
        let mut out = outcome(vec![block(540, 565, 3.0, false)]);
        out.truncated = true;
        out.requested_minutes = 900;
        out.free_minutes = 120;
        let warnings = derive_warnings(&profile, &out, &CogConfig::default());
        assert!(warnings.iter().any(|w| w.contains("900") && w.contains("120")));
    }

    #[test]
    fn stress_cap_warning_names_task() {
        let profile = Profile {
            stress_level: 5,
            ..Profile::default()
        };
        let mut out = outcome(vec![block(540, 565, 9.0, false)]);
        out.capped_tasks.push(("Hard Task".to_string(), 9.0));
        let warnings = derive_warnings(&profile, &out, &CogConfig::default());
        assert!(warnings.iter().any(|w| w.contains("Hard Task")));
    }

    #[test]
    fn no_break_deep_day_warning() {
        let profile = Profile::default(); // no break preferences
        let out = outcome(vec![
            block(540, 615, 8.0, false),
            block(615, 625, 0.0, true),
            block(625, 700, 8.0, false),
        ]);
        let warnings = derive_warnings(&profile, &out, &CogConfig::default());
        assert!(warnings.iter().any(|w| w.contains("recovery breaks")));
    }

    #[test]
    fn warning_count_capped_at_six() {
        let profile = Profile {
            sleep_hours: 4.0,
            stress_level: 5,
            ..Profile::default()
        };
        let mut out = outcome(vec![block(540, 615, 9.0, false)]);
        out.truncated = true;
        for i in 0..8 {
            out.capped_tasks.push((format!("Task {i}"), 9.0));
        }
        let warnings = derive_warnings(&profile, &out, &CogConfig::default());
        assert_eq!(warnings.len(), MAX_WARNINGS);
    }
}
