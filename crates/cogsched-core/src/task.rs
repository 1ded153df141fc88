//! Task model and cognitive-load estimation.
//!
//! Tasks arrive either pre-parsed from the RPC layer or out of the fallback
//! free-text parser. Before scheduling, each task is validated, its load
//! estimated if missing, and then split into fixed-size work quanta.

use serde::{Deserialize, Serialize};

use crate::config::CogConfig;
use crate::error::ScheduleError;
use crate::profile::Profile;

/// A single unit of work the user wants scheduled today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-form category, only used for load weighting and display.
    #[serde(default = "default_category")]
    pub category: String,
    /// Subjective difficulty, 1-10.
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,
    /// Requested duration. Signed so that a negative request can be
    /// rejected with a named error instead of a deserialization failure.
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
    /// Explicit cognitive load, 0-10. Estimated from difficulty and
    /// category when absent.
    #[serde(default)]
    pub cognitive_load: Option<f64>,
}

fn default_category() -> String {
    "general".to_string()
}
fn default_difficulty() -> f64 {
    5.0
}
fn default_duration() -> i64 {
    60
}

impl Task {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category: category.into(),
            difficulty: default_difficulty(),
            duration_minutes: default_duration(),
            cognitive_load: None,
        }
    }

    /// Reject tasks the engine cannot schedule.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.title.trim().is_empty() {
            return Err(self.malformed("title is empty"));
        }
        if self.duration_minutes <= 0 {
            return Err(self.malformed(&format!(
                "duration_minutes must be positive, got {}",
                self.duration_minutes
            )));
        }
        if !(1.0..=10.0).contains(&self.difficulty) {
            return Err(self.malformed(&format!(
                "difficulty must be within 1-10, got {}",
                self.difficulty
            )));
        }
        if let Some(load) = self.cognitive_load {
            if !(0.0..=10.0).contains(&load) {
                return Err(self.malformed(&format!(
                    "cognitive_load must be within 0-10, got {load}"
                )));
            }
        }
        Ok(())
    }

    fn malformed(&self, message: &str) -> ScheduleError {
        ScheduleError::MalformedTask {
            title: self.title.clone(),
            message: message.to_string(),
        }
    }

    /// Cognitive load for this task: the supplied value clamped to [0, 10],
    /// or `difficulty x category_weight + lectures x penalty` when absent.
    pub fn effective_load(&self, profile: &Profile, cfg: &CogConfig) -> f64 {
        match self.cognitive_load {
            Some(load) => load.clamp(0.0, 10.0),
            None => {
                let estimated = self.difficulty * cfg.category_weight(&self.category)
                    + f64::from(profile.lectures_today) * cfg.lecture_penalty_per;
                estimated.clamp(0.0, 10.0)
            }
        }
    }
}

/// One schedulable slice of a task, always `quantum_min` minutes long.
///
/// Durations are rounded up to a whole number of quanta, never down, so
/// the sum of a task's quanta can exceed its requested duration by less
/// than one quantum.
#[derive(Debug, Clone)]
pub struct Quantum {
    pub title: String,
    pub category: String,
    pub load: f64,
    pub minutes: u32,
    /// Index of the owning task in the ordered task list.
    pub task_index: usize,
    /// Position of this quantum within its task.
    pub seq: u32,
}

impl Quantum {
    pub fn is_deep(&self, cfg: &CogConfig) -> bool {
        self.load >= cfg.deep_work_load_threshold
    }
}

/// Split an ordered task list into its quantum sequence.
///
/// Quanta of one task stay adjacent and in order; the scheduler may later
/// merge two back-to-back light quanta of the same task into one block.
pub fn split_into_quanta(
    tasks: &[(Task, f64)],
    cfg: &CogConfig,
) -> Vec<Quantum> {
    let quantum = cfg.quantum_min.max(1);
    let mut quanta = Vec::new();
    for (task_index, (task, load)) in tasks.iter().enumerate() {
        let duration = task.duration_minutes.max(0) as u32;
        let count = duration.div_ceil(quantum).max(1);
        for seq in 0..count {
            quanta.push(Quantum {
                title: task.title.clone(),
                category: task.category.clone(),
                load: *load,
                minutes: quantum,
                task_index,
                seq,
            });
        }
    }
    quanta
}

/// Sort tasks for placement: heaviest load first, then difficulty, then
/// input order. Returns each task paired with its effective load.
pub fn order_for_placement(
    tasks: &[Task],
    profile: &Profile,
    cfg: &CogConfig,
) -> Vec<(Task, f64)> {
    let mut with_load: Vec<(usize, Task, f64)> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (i, t.clone(), t.effective_load(profile, cfg)))
        .collect();
    with_load.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.1.difficulty
                    .partial_cmp(&a.1.difficulty)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.0.cmp(&b.0))
    });
    with_load.into_iter().map(|(_, t, load)| (t, load)).collect()
}
