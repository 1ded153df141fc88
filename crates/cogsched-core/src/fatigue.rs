//! Fatigue accumulator.
//!
//! A stateful scan over the blocks placed so far. Work quanta push the
//! fatigue scalar up through two normalized terms (consecutive deep minutes
//! and total deep minutes); breaks reset the consecutive counter and decay
//! the scalar in proportion to their length.

use crate::config::CogConfig;

/// Which break the accumulator is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    Short,
    Long,
}

/// Running fatigue state during placement.
#[derive(Debug, Clone)]
pub struct FatigueAccumulator {
    consec_deep_min: u32,
    total_deep_min: u32,
    fatigue: f64,
    consec_weight: f64,
    total_weight: f64,
    consec_norm_min: f64,
    total_norm_min: f64,
    force_threshold: f64,
    trigger_min: u32,
    total_deep_threshold_min: u32,
    recovery_factor: f64,
    long_break_min: f64,
    deep_load_threshold: f64,
}

impl FatigueAccumulator {
    pub fn new(cfg: &CogConfig) -> Self {
        Self {
            consec_deep_min: 0,
            total_deep_min: 0,
            fatigue: 0.0,
            consec_weight: cfg.fatigue_consec_weight,
            total_weight: cfg.fatigue_total_weight,
            consec_norm_min: f64::from(cfg.consec_threshold_min.max(1)),
            total_norm_min: f64::from(cfg.total_deep_threshold_min.max(1)),
            force_threshold: cfg.fatigue_force_break,
            trigger_min: cfg.short_break_trigger_min,
            total_deep_threshold_min: cfg.total_deep_threshold_min,
            recovery_factor: cfg.break_recovery_factor,
            long_break_min: f64::from(cfg.long_break_duration.max(1)),
            deep_load_threshold: cfg.deep_work_load_threshold,
        }
    }

    /// Current fatigue scalar in [0, 1].
    pub fn value(&self) -> f64 {
        self.fatigue
    }

    pub fn consec_deep_min(&self) -> u32 {
        self.consec_deep_min
    }

    pub fn total_deep_min(&self) -> u32 {
        self.total_deep_min
    }

    fn is_deep(&self, load: f64) -> bool {
        load >= self.deep_load_threshold
    }

    /// Account for a placed work quantum.
    pub fn on_work(&mut self, minutes: u32, load: f64) {
        if self.is_deep(load) {
            self.consec_deep_min += minutes;
            self.total_deep_min += minutes;
        } else {
            self.consec_deep_min = 0;
        }
        self.fatigue = (self.consec_weight * f64::from(self.consec_deep_min)
            / self.consec_norm_min
            + self.total_weight * f64::from(self.total_deep_min) / self.total_norm_min)
            .clamp(0.0, 1.0);
    }

    /// Account for any break-like block (engine break, preferred break,
    /// or commitment). Recovery scales with break length up to one full
    /// long break.
    pub fn on_break(&mut self, minutes: u32) {
        self.consec_deep_min = 0;
        let portion = (f64::from(minutes) / self.long_break_min).min(1.0);
        self.fatigue = (self.fatigue * (1.0 - self.recovery_factor * portion)).max(0.0);
    }

    /// Would placing this quantum require a break first?
    ///
    /// The consecutive-minutes trigger is checked against the quantum
    /// about to be placed, so a deep run can never exceed the trigger.
    pub fn needs_break_before(&self, minutes: u32, load: f64) -> bool {
        if self.fatigue >= self.force_threshold {
            return true;
        }
        if self.consec_deep_min >= self.trigger_min {
            return true;
        }
        self.is_deep(load) && self.consec_deep_min + minutes > self.trigger_min
    }

    /// Long break once the day's deep total has crossed its threshold,
    /// short break otherwise.
    pub fn recommended_break(&self) -> BreakKind {
        if self.total_deep_min >= self.total_deep_threshold_min {
            BreakKind::Long
        } else {
            BreakKind::Short
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_work_accumulates_both_counters() {
        let cfg = CogConfig::default();
        let mut fat = FatigueAccumulator::new(&cfg);
        fat.on_work(25, 8.0);
        fat.on_work(25, 8.0);
        assert_eq!(fat.consec_deep_min(), 50);
        assert_eq!(fat.total_deep_min(), 50);
        // 0.4 * 50/90 + 0.3 * 50/180
        let expected = 0.4 * 50.0 / 90.0 + 0.3 * 50.0 / 180.0;
        assert!((fat.value() - expected).abs() < 1e-9);
    }

    #[test]
    fn light_work_resets_consecutive_only() {
        let cfg = CogConfig::default();
        let mut fat = FatigueAccumulator::new(&cfg);
        fat.on_work(25, 8.0);
        fat.on_work(25, 3.0);
        assert_eq!(fat.consec_deep_min(), 0);
        assert_eq!(fat.total_deep_min(), 25);
    }

    #[test]
    fn break_resets_consec_and_decays_fatigue() {
        let cfg = CogConfig::default();
        let mut fat = FatigueAccumulator::new(&cfg);
        for _ in 0..3 {
            fat.on_work(25, 8.0);
        }
        let before = fat.value();
        fat.on_break(15); // full long break
        assert_eq!(fat.consec_deep_min(), 0);
        assert!((fat.value() - before * (1.0 - 0.4)).abs() < 1e-9);
    }

    #[test]
    fn short_break_recovers_proportionally() {
        let cfg = CogConfig::default();
        let mut fat = FatigueAccumulator::new(&cfg);
        fat.on_work(50, 8.0);
        let before = fat.value();
        fat.on_break(10); // 10/15 of a long break
        let expected = before * (1.0 - 0.4 * (10.0 / 15.0));
        assert!((fat.value() - expected).abs() < 1e-9);
    }

    #[test]
    fn force_break_is_forward_looking() {
        let cfg = CogConfig::default();
        let mut fat = FatigueAccumulator::new(&cfg);
        // 75 consecutive deep minutes: another 25 would cross the 90-minute
        // trigger, so the accumulator demands a break first.
        for _ in 0..3 {
            fat.on_work(25, 8.0);
        }
        assert_eq!(fat.consec_deep_min(), 75);
        assert!(fat.needs_break_before(25, 8.0));
        // A light quantum is still fine
        assert!(!fat.needs_break_before(25, 3.0));
    }

    #[test]
    fn fatigue_threshold_forces_break() {
        let mut cfg = CogConfig::default();
        cfg.fatigue_force_break = 0.1;
        let mut fat = FatigueAccumulator::new(&cfg);
        fat.on_work(25, 8.0);
        assert!(fat.value() >= 0.1);
        assert!(fat.needs_break_before(25, 3.0));
    }

    #[test]
    fn long_break_after_total_threshold() {
        let cfg = CogConfig::default();
        let mut fat = FatigueAccumulator::new(&cfg);
        fat.on_work(100, 8.0);
        assert_eq!(fat.recommended_break(), BreakKind::Short);
        fat.on_work(100, 8.0);
        assert!(fat.total_deep_min() >= 180);
        assert_eq!(fat.recommended_break(), BreakKind::Long);
    }
}
