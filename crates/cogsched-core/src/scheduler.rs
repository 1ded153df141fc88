//! Block placement.
//!
//! The scheduler walks a cursor through the day's free intervals and
//! assigns work quanta in load order, inserting recovery breaks when the
//! fatigue accumulator demands one and interleaving fixed commitments and
//! preferred breaks verbatim. The accumulator and the growing block list
//! travel together in a single `PlanBuilder`.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::availability::{Availability, FixedKind, FixedSegment};
use crate::clock::{format_hhmm, TimeRange};
use crate::config::CogConfig;
use crate::energy::{round3, CurvePoint, EnergyModel, CURVE_CADENCE_MIN};
use crate::engine::CancelToken;
use crate::error::ScheduleError;
use crate::fatigue::{BreakKind, FatigueAccumulator};
use crate::profile::Profile;
use crate::task::{order_for_placement, split_into_quanta, Quantum, Task};

/// A placed block, still in minutes-since-midnight form.
#[derive(Debug, Clone)]
pub struct PlacedBlock {
    pub title: String,
    pub start_min: u32,
    pub end_min: u32,
    pub load: f64,
    pub energy_at_start: f64,
    pub fatigue_at_start: f64,
    pub is_break: bool,
    pub explanation: String,
}

impl PlacedBlock {
    pub fn duration_min(&self) -> u32 {
        self.end_min - self.start_min
    }

    /// Render to the wire shape with `HH:MM` times.
    pub fn render(&self) -> Block {
        Block {
            task_title: self.title.clone(),
            start_time: format_hhmm(self.start_min),
            end_time: format_hhmm(self.end_min),
            cognitive_load: self.load,
            energy_at_start: round3(self.energy_at_start),
            fatigue_at_start: round3(self.fatigue_at_start),
            is_break: self.is_break,
            explanation: self.explanation.clone(),
        }
    }
}

/// One block of the output plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub task_title: String,
    pub start_time: String,
    pub end_time: String,
    pub cognitive_load: f64,
    pub energy_at_start: f64,
    pub fatigue_at_start: f64,
    pub is_break: bool,
    pub explanation: String,
}

/// Everything the placement pass produces, consumed by the warnings and
/// gamification layers before rendering.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub blocks: Vec<PlacedBlock>,
    /// Some quanta did not fit in the remaining free time.
    pub truncated: bool,
    /// The soft deadline fired before all quanta were tried.
    pub deadline_hit: bool,
    pub forced_breaks: u32,
    /// Tasks whose load exceeds the stress cap, with their loads.
    pub capped_tasks: Vec<(String, f64)>,
    pub requested_minutes: u32,
    pub free_minutes: u32,
}

/// Place tasks into the availability, producing the ordered block list.
///
/// Pure apart from the cancellation token and deadline checks between
/// quanta; identical inputs yield an identical plan.
pub fn place(
    tasks: &[Task],
    profile: &Profile,
    cfg: &CogConfig,
    availability: &Availability,
    energy: &EnergyModel,
    cancel: &CancelToken,
    deadline: Option<Instant>,
) -> Result<ScheduleOutcome, ScheduleError> {
    for task in tasks {
        task.validate()?;
    }

    let free_minutes = availability.free_minutes();
    let requested_minutes: u32 = tasks
        .iter()
        .map(|t| t.duration_minutes.max(0) as u32)
        .sum();

    let mut outcome = ScheduleOutcome {
        blocks: Vec::new(),
        truncated: false,
        deadline_hit: false,
        forced_breaks: 0,
        capped_tasks: Vec::new(),
        requested_minutes,
        free_minutes,
    };

    // Zero tasks: empty plan, curves handled by the caller.
    if tasks.is_empty() {
        return Ok(outcome);
    }

    let ordered = order_for_placement(tasks, profile, cfg);

    // Stress cap: tag, never drop.
    if profile.stress_level >= cfg.stress_cap_threshold {
        for (task, load) in &ordered {
            if *load > cfg.max_load_under_stress {
                outcome.capped_tasks.push((task.title.clone(), *load));
            }
        }
    }

    let quanta = split_into_quanta(&ordered, cfg);
    let mut builder = PlanBuilder::new(cfg, energy, availability);

    for quantum in &quanta {
        if cancel.is_cancelled() {
            return Err(ScheduleError::Cancelled);
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                outcome.deadline_hit = true;
                break;
            }
        }
        if !builder.place_quantum(quantum) {
            outcome.truncated = true;
            break;
        }
    }

    builder.finalize();
    outcome.forced_breaks = builder.forced_breaks;
    outcome.blocks = builder.blocks;
    Ok(outcome)
}

/// Mutable state threaded through the placement loop: the fatigue
/// accumulator, the cursor, and the block list under construction.
struct PlanBuilder<'a> {
    cfg: &'a CogConfig,
    energy: &'a EnergyModel,
    fatigue: FatigueAccumulator,
    free: &'a [TimeRange],
    fixed: &'a [FixedSegment],
    interval: usize,
    cursor: u32,
    next_fixed: usize,
    blocks: Vec<PlacedBlock>,
    forced_breaks: u32,
    /// Task index and quantum count of the trailing work block, used for
    /// the light-quantum merge.
    last_work: Option<(usize, u32)>,
    after_break: bool,
}

impl<'a> PlanBuilder<'a> {
    fn new(cfg: &'a CogConfig, energy: &'a EnergyModel, availability: &'a Availability) -> Self {
        let mut builder = Self {
            cfg,
            energy,
            fatigue: FatigueAccumulator::new(cfg),
            free: &availability.free,
            fixed: &availability.fixed,
            interval: 0,
            cursor: availability.free[0].start_min,
            next_fixed: 0,
            blocks: Vec::new(),
            forced_breaks: 0,
            last_work: None,
            after_break: false,
        };
        let first_start = builder.free[0].start_min;
        builder.emit_fixed_through(first_start);
        builder
    }

    /// Emit every fixed segment starting before `upto` as its own block.
    fn emit_fixed_through(&mut self, upto: u32) {
        while self.next_fixed < self.fixed.len()
            && self.fixed[self.next_fixed].range.start_min < upto
        {
            let seg = &self.fixed[self.next_fixed];
            let explanation = match seg.kind {
                FixedKind::Commitment => "Fixed commitment".to_string(),
                FixedKind::PreferredBreak => "Requested break window".to_string(),
            };
            self.blocks.push(PlacedBlock {
                title: seg.label.clone(),
                start_min: seg.range.start_min,
                end_min: seg.range.end_min,
                load: 0.0,
                energy_at_start: self.energy.energy_at(seg.range.start_min),
                fatigue_at_start: self.fatigue.value(),
                is_break: true,
                explanation,
            });
            self.fatigue.on_break(seg.range.duration_min());
            self.after_break = true;
            self.last_work = None;
            self.next_fixed += 1;
        }
    }

    /// Move the cursor into the next free interval, surfacing the fixed
    /// segments that separate the intervals. Returns false when no free
    /// interval remains.
    fn advance_interval(&mut self) -> bool {
        self.interval += 1;
        if self.interval >= self.free.len() {
            return false;
        }
        self.cursor = self.free[self.interval].start_min;
        self.emit_fixed_through(self.cursor);
        self.last_work = None;
        true
    }

    /// Insert a forced recovery break at the cursor. Returns false when
    /// the break does not fit in the current interval.
    fn insert_forced_break(&mut self) -> bool {
        let kind = self.fatigue.recommended_break();
        let minutes = match kind {
            BreakKind::Short => self.cfg.short_break_duration,
            BreakKind::Long => self.cfg.long_break_duration,
        };
        let interval_end = self.free[self.interval].end_min;
        if self.cursor + minutes > interval_end {
            return false;
        }
        let explanation = match kind {
            BreakKind::Short => format!(
                "Fatigue at {:.0}% — short recovery break",
                self.fatigue.value() * 100.0
            ),
            BreakKind::Long => format!(
                "{} min of deep work today — long recovery break",
                self.fatigue.total_deep_min()
            ),
        };
        let title = match kind {
            BreakKind::Short => "Short Break",
            BreakKind::Long => "Long Break",
        };
        self.blocks.push(PlacedBlock {
            title: title.to_string(),
            start_min: self.cursor,
            end_min: self.cursor + minutes,
            load: 0.0,
            energy_at_start: self.energy.energy_at(self.cursor),
            fatigue_at_start: self.fatigue.value(),
            is_break: true,
            explanation,
        });
        self.fatigue.on_break(minutes);
        self.cursor += minutes;
        self.forced_breaks += 1;
        self.after_break = true;
        self.last_work = None;
        true
    }

    /// Place one quantum. Returns false once no free interval can hold it.
    fn place_quantum(&mut self, quantum: &Quantum) -> bool {
        // At most one forced break per quantum: a break always clears the
        // consecutive trigger, and skipping a second break keeps a
        // degenerate config (zero recovery) from looping forever.
        let mut broke_for_this = false;
        loop {
            if self.interval >= self.free.len() {
                return false;
            }
            let interval_end = self.free[self.interval].end_min;
            if self.cursor + quantum.minutes > interval_end {
                if !self.advance_interval() {
                    return false;
                }
                continue;
            }
            if !broke_for_this
                && self
                    .fatigue
                    .needs_break_before(quantum.minutes, quantum.load)
            {
                if self.insert_forced_break() {
                    broke_for_this = true;
                } else if !self.advance_interval() {
                    return false;
                }
                continue;
            }

            self.emit_work(quantum);
            return true;
        }
    }

    fn emit_work(&mut self, quantum: &Quantum) {
        let deep = quantum.is_deep(self.cfg);
        let start = self.cursor;
        let end = start + quantum.minutes;

        // Light back-to-back quanta of the same task collapse into one
        // block, capped at two quanta. Fatigue stays per-quantum.
        let merged = !deep
            && match (self.last_work, self.blocks.last_mut()) {
                (Some((task_index, count)), Some(last))
                    if task_index == quantum.task_index
                        && count < 2
                        && !last.is_break
                        && last.end_min == start =>
                {
                    last.end_min = end;
                    self.last_work = Some((task_index, count + 1));
                    true
                }
                _ => false,
            };

        if !merged {
            let energy_now = self.energy.energy_at(start);
            let fatigue_now = self.fatigue.value();
            let explanation = self.explain_work(energy_now, fatigue_now, deep);
            self.blocks.push(PlacedBlock {
                title: quantum.title.clone(),
                start_min: start,
                end_min: end,
                load: quantum.load,
                energy_at_start: energy_now,
                fatigue_at_start: fatigue_now,
                is_break: false,
                explanation,
            });
            self.last_work = Some((quantum.task_index, 1));
        }

        self.fatigue.on_work(quantum.minutes, quantum.load);
        self.cursor = end;
        self.after_break = false;
    }

    fn explain_work(&self, energy: f64, fatigue: f64, deep: bool) -> String {
        if self.after_break {
            return "Scheduled after a break for recovery".to_string();
        }
        if deep {
            if energy >= 0.65 && fatigue <= 0.35 {
                "High energy, low fatigue — ideal for deep focus".to_string()
            } else {
                "Best remaining slot for demanding work".to_string()
            }
        } else if energy < 0.55 {
            "Lighter task placed during an energy dip".to_string()
        } else {
            "Light work keeps momentum between harder blocks".to_string()
        }
    }

    /// Emit the commitments and preferred breaks that fall after the last
    /// placed quantum; the plan covers them even when work ends early.
    fn finalize(&mut self) {
        self.emit_fixed_through(u32::MAX);
    }
}

/// Replay the placed blocks to sample the fatigue curve across the window.
pub fn fatigue_curve(
    blocks: &[PlacedBlock],
    window: &TimeRange,
    cfg: &CogConfig,
) -> Vec<CurvePoint> {
    let mut fat = FatigueAccumulator::new(cfg);
    let mut points = Vec::new();
    let mut t = window.start_min;
    while t <= window.end_min {
        points.push(CurvePoint {
            time: format_hhmm(t),
            value: round3(fat.value()),
        });
        let step_end = t + CURVE_CADENCE_MIN;
        if let Some(block) = blocks
            .iter()
            .find(|b| b.start_min <= t && t < b.end_min)
        {
            let step = CURVE_CADENCE_MIN.min(block.end_min - t).min(step_end - t);
            if block.is_break {
                fat.on_break(step);
            } else {
                fat.on_work(step, block.load);
            }
        }
        t = step_end;
    }
    points
}
