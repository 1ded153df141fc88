//! Gamification scoring.
//!
//! XP, level, streak, and badges are derived deterministically from the
//! produced block list plus the per-user streak counter carried over from
//! the previously stored plan.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::CogConfig;
use crate::scheduler::PlacedBlock;

const XP_PER_TASK_BLOCK: i64 = 5;
const XP_PER_DEEP_BLOCK: i64 = 10;
const XP_PER_BREAK: i64 = 2;
const XP_TRUNCATION_PENALTY: i64 = 5;

/// Level thresholds, lowest first.
const LEVELS: [(i64, &str); 4] = [
    (0, "Student"),
    (200, "Scholar"),
    (600, "Genius"),
    (1200, "Mastermind"),
];

/// Gamification snapshot returned with every plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gamification {
    pub xp: i64,
    pub level: String,
    pub streak: u32,
    pub badges: Vec<String>,
}

/// What the storage layer knows about the previously saved plan.
#[derive(Debug, Clone)]
pub struct PriorPlan {
    pub created_on: NaiveDate,
    pub had_deep_work: bool,
    pub streak: u32,
}

fn level_for_xp(xp: i64) -> &'static str {
    let mut level = LEVELS[0].1;
    for (threshold, name) in LEVELS {
        if xp >= threshold {
            level = name;
        }
    }
    level
}

/// Compute the gamification snapshot for a produced plan.
pub fn compute(
    blocks: &[PlacedBlock],
    truncated: bool,
    stress_level: u8,
    prior: Option<&PriorPlan>,
    today: NaiveDate,
    cfg: &CogConfig,
) -> Gamification {
    let mut xp: i64 = 0;
    let mut task_blocks = 0u32;
    let mut break_blocks = 0u32;
    let mut has_deep = false;

    for block in blocks {
        if block.is_break {
            break_blocks += 1;
            xp += XP_PER_BREAK;
        } else {
            task_blocks += 1;
            xp += XP_PER_TASK_BLOCK;
            if block.load >= cfg.deep_work_load_threshold {
                has_deep = true;
                xp += XP_PER_DEEP_BLOCK;
            }
        }
    }
    if truncated {
        xp -= XP_TRUNCATION_PENALTY;
    }
    let xp = xp.max(0);

    let streak = match prior {
        Some(p) if p.had_deep_work && is_yesterday(p.created_on, today) => p.streak + 1,
        _ => u32::from(has_deep),
    };

    let mut badges = Vec::new();
    if deepest_run(blocks, cfg) >= 3 {
        badges.push("Deep Diver".to_string());
    }
    if break_blocks >= 2 && task_blocks >= 3 {
        badges.push("Balanced".to_string());
    }
    if stress_level >= 4 && !truncated && task_blocks > 0 {
        badges.push("Stress-Proof".to_string());
    }

    Gamification {
        xp,
        level: level_for_xp(xp).to_string(),
        streak,
        badges,
    }
}

fn is_yesterday(prior: NaiveDate, today: NaiveDate) -> bool {
    prior.succ_opt() == Some(today)
}

/// Longest run of deep blocks separated only by breaks.
fn deepest_run(blocks: &[PlacedBlock], cfg: &CogConfig) -> u32 {
    let mut run = 0u32;
    let mut best = 0u32;
    for block in blocks {
        if block.is_break {
            continue; // breaks keep the run alive
        }
        if block.load >= cfg.deep_work_load_threshold {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(load: f64, is_break: bool) -> PlacedBlock {
        PlacedBlock {
            title: "T".to_string(),
            start_min: 0,
            end_min: 25,
            load,
            energy_at_start: 0.5,
            fatigue_at_start: 0.1,
            is_break,
            explanation: String::new(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn xp_sums_per_block() {
        let cfg = CogConfig::default();
        let blocks = vec![
            block(8.0, false), // 5 + 10
            block(3.0, false), // 5
            block(0.0, true),  // 2
        ];
        let g = compute(&blocks, false, 2, None, date(2026, 8, 2), &cfg);
        assert_eq!(g.xp, 22);
        assert_eq!(g.level, "Student");
    }

    #[test]
    fn truncation_penalty_applies_once_and_floors_at_zero() {
        let cfg = CogConfig::default();
        let g = compute(&[], true, 2, None, date(2026, 8, 2), &cfg);
        assert_eq!(g.xp, 0);
    }

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(level_for_xp(0), "Student");
        assert_eq!(level_for_xp(199), "Student");
        assert_eq!(level_for_xp(200), "Scholar");
        assert_eq!(level_for_xp(600), "Genius");
        assert_eq!(level_for_xp(5000), "Mastermind");
    }

    #[test]
    fn streak_increments_from_yesterday() {
        let cfg = CogConfig::default();
        let prior = PriorPlan {
            created_on: date(2026, 8, 1),
            had_deep_work: true,
            streak: 4,
        };
        let g = compute(
            &[block(8.0, false)],
            false,
            2,
            Some(&prior),
            date(2026, 8, 2),
            &cfg,
        );
        assert_eq!(g.streak, 5);
    }

    #[test]
    fn streak_resets_after_a_gap() {
        let cfg = CogConfig::default();
        let prior = PriorPlan {
            created_on: date(2026, 7, 28),
            had_deep_work: true,
            streak: 4,
        };
        let g = compute(
            &[block(8.0, false)],
            false,
            2,
            Some(&prior),
            date(2026, 8, 2),
            &cfg,
        );
        assert_eq!(g.streak, 1);
        // and zero when today has no deep work at all
        let g = compute(
            &[block(3.0, false)],
            false,
            2,
            Some(&prior),
            date(2026, 8, 2),
            &cfg,
        );
        assert_eq!(g.streak, 0);
    }

    #[test]
    fn deep_diver_needs_three_deep_blocks_across_breaks() {
        let cfg = CogConfig::default();
        let blocks = vec![
            block(8.0, false),
            block(0.0, true),
            block(8.0, false),
            block(0.0, true),
            block(8.0, false),
        ];
        let g = compute(&blocks, false, 2, None, date(2026, 8, 2), &cfg);
        assert!(g.badges.contains(&"Deep Diver".to_string()));
    }

    #[test]
    fn light_block_breaks_the_deep_run() {
        let cfg = CogConfig::default();
        let blocks = vec![
            block(8.0, false),
            block(3.0, false),
            block(8.0, false),
            block(8.0, false),
        ];
        let g = compute(&blocks, false, 2, None, date(2026, 8, 2), &cfg);
        assert!(!g.badges.contains(&"Deep Diver".to_string()));
    }

    #[test]
    fn balanced_and_stress_proof_badges() {
        let cfg = CogConfig::default();
        let blocks = vec![
            block(3.0, false),
            block(3.0, false),
            block(3.0, false),
            block(0.0, true),
            block(0.0, true),
        ];
        let g = compute(&blocks, false, 4, None, date(2026, 8, 2), &cfg);
        assert!(g.badges.contains(&"Balanced".to_string()));
        assert!(g.badges.contains(&"Stress-Proof".to_string()));
    }
}
