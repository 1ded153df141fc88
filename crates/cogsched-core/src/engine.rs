//! Engine façade.
//!
//! `run_engine` is the pure pipeline: parsed tasks → placement → warnings →
//! gamification → curves, all over value snapshots. `Service` wraps it with
//! the storage and parser seams for the RPC surface: per-user config merge,
//! plan persistence, TLX feedback, and calendar export.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::availability::build_availability;
use crate::config::{CogConfig, FatigueWeights};
use crate::energy::{CurvePoint, EnergyModel};
use crate::error::{Result, StorageError};
use crate::gamification::{self, Gamification, PriorPlan};
use crate::ics::plan_to_ics;
use crate::parser::TaskParser;
use crate::profile::{Chronotype, Profile};
use crate::recalibrate::{recalibrate, TlxEntry};
use crate::scheduler::{fatigue_curve, place, Block};
use crate::task::Task;
use crate::warnings::derive_warnings;

/// Default soft deadline per scheduling call.
pub const DEFAULT_SOFT_DEADLINE: Duration = Duration::from_secs(2);

/// Cooperative cancellation flag, checked between quanta.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-call knobs that are not part of the config snapshot.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub cancel: CancelToken,
    /// Soft wall-clock budget; `None` disables the check.
    pub soft_deadline: Option<Duration>,
    /// Calendar date the plan is for. Injected so streak computation and
    /// tests stay deterministic.
    pub today: NaiveDate,
}

impl EngineOptions {
    /// Options for an interactive call: today's local date, 2s deadline.
    pub fn for_today() -> Self {
        Self {
            cancel: CancelToken::new(),
            soft_deadline: Some(DEFAULT_SOFT_DEADLINE),
            today: Local::now().date_naive(),
        }
    }

    /// Options for deterministic runs: no deadline.
    pub fn for_date(today: NaiveDate) -> Self {
        Self {
            cancel: CancelToken::new(),
            soft_deadline: None,
            today,
        }
    }
}

/// One scheduling request with pre-parsed tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub tasks: Vec<Task>,
    pub profile: Profile,
    /// Defaults to the profile's wake time.
    #[serde(default)]
    pub available_from: Option<String>,
    /// Defaults to the profile's sleep time.
    #[serde(default)]
    pub available_to: Option<String>,
}

/// Echo of an input task with its effective cognitive load filled in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTask {
    pub title: String,
    pub category: String,
    pub difficulty: f64,
    pub duration_minutes: i64,
    pub cognitive_load: f64,
}

/// The full plan payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub parsed_tasks: Vec<ParsedTask>,
    pub schedule: Vec<Block>,
    pub energy_curve: Vec<CurvePoint>,
    pub fatigue_curve: Vec<CurvePoint>,
    pub warnings: Vec<String>,
    pub gamification: Gamification,
    pub truncated: bool,
    /// False when the storage write failed after a successful run.
    pub persisted: bool,
}

/// Run the engine pipeline on a request and an isolated config snapshot.
pub fn run_engine(
    req: &ScheduleRequest,
    cfg: &CogConfig,
    prior: Option<&PriorPlan>,
    opts: &EngineOptions,
) -> Result<PlanResponse> {
    let mut profile = req.profile.clone();
    profile.stress_level = profile.stress_level.clamp(1, 5);

    let from = req
        .available_from
        .clone()
        .unwrap_or_else(|| profile.wake_time.clone());
    let to = req
        .available_to
        .clone()
        .unwrap_or_else(|| profile.sleep_time.clone());

    let availability = build_availability(
        &from,
        &to,
        &profile.daily_commitments,
        &profile.break_preferences,
    )?;
    debug!(
        free_intervals = availability.free.len(),
        free_minutes = availability.free_minutes(),
        "availability built"
    );

    let energy = EnergyModel::new(&profile, cfg);
    let deadline = opts.soft_deadline.map(|d| Instant::now() + d);
    let outcome = place(
        &req.tasks,
        &profile,
        cfg,
        &availability,
        &energy,
        &opts.cancel,
        deadline,
    )?;

    let mut warnings = derive_warnings(&profile, &outcome, cfg);
    if outcome.deadline_hit {
        warnings.push(
            "truncated_by_deadline: soft deadline reached, returning the best plan so far"
                .to_string(),
        );
    }
    if outcome.truncated {
        warn!(
            requested_min = outcome.requested_minutes,
            free_min = outcome.free_minutes,
            "plan truncated"
        );
    }

    let gamification = gamification::compute(
        &outcome.blocks,
        outcome.truncated,
        profile.stress_level,
        prior,
        opts.today,
        cfg,
    );

    let parsed_tasks = req
        .tasks
        .iter()
        .map(|t| ParsedTask {
            title: t.title.clone(),
            category: t.category.clone(),
            difficulty: t.difficulty,
            duration_minutes: t.duration_minutes,
            cognitive_load: t.effective_load(&profile, cfg),
        })
        .collect();

    info!(
        blocks = outcome.blocks.len(),
        truncated = outcome.truncated,
        xp = gamification.xp,
        "plan produced"
    );

    Ok(PlanResponse {
        parsed_tasks,
        schedule: outcome.blocks.iter().map(|b| b.render()).collect(),
        energy_curve: energy.sample(&availability.window),
        fatigue_curve: fatigue_curve(&outcome.blocks, &availability.window, cfg),
        warnings,
        gamification,
        truncated: outcome.truncated,
        persisted: false,
    })
}

/// A plan row as stored.
#[derive(Debug, Clone)]
pub struct StoredPlan {
    pub id: String,
    pub created_on: NaiveDate,
    pub data: serde_json::Value,
}

/// Storage seam consumed by the façade. Implementations must serialize
/// writes per user; the façade reads one consistent snapshot per call.
pub trait ScheduleStore {
    fn profile(&self, user_id: &str) -> std::result::Result<Option<Profile>, StorageError>;
    fn save_profile(
        &self,
        user_id: &str,
        profile: &Profile,
    ) -> std::result::Result<(), StorageError>;
    fn fatigue_weights(
        &self,
        user_id: &str,
    ) -> std::result::Result<Option<FatigueWeights>, StorageError>;
    /// Streak-relevant facts about the most recent stored plan. The deep
    /// threshold travels in because the store does not hold a config.
    fn prior_plan(
        &self,
        user_id: &str,
        deep_threshold: f64,
    ) -> std::result::Result<Option<PriorPlan>, StorageError>;
    fn save_plan(
        &self,
        user_id: &str,
        plan: &serde_json::Value,
    ) -> std::result::Result<String, StorageError>;
    fn latest_plan(&self, user_id: &str) -> std::result::Result<Option<StoredPlan>, StorageError>;
    /// Append a TLX entry and, in the same transaction, persist the
    /// updated weights when a recalibration fired. Returns the new entry
    /// count.
    fn append_tlx(
        &self,
        user_id: &str,
        entry: &TlxEntry,
        updated: Option<&FatigueWeights>,
    ) -> std::result::Result<usize, StorageError>;
    fn tlx_entries(&self, user_id: &str) -> std::result::Result<Vec<TlxEntry>, StorageError>;
    fn mark_calendar_synced(&self, schedule_id: &str) -> std::result::Result<(), StorageError>;
}

/// Per-request profile overrides for the conversational entry point.
/// A set field wins over the stored profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    pub sleep_hours: Option<f64>,
    pub stress_level: Option<u8>,
    pub chronotype: Option<Chronotype>,
    pub lectures_today: Option<u32>,
    pub available_from: Option<String>,
    pub available_to: Option<String>,
    pub breaks_at: Option<Vec<String>>,
}

impl ProfileOverrides {
    fn apply(&self, base: &Profile) -> Profile {
        let mut profile = base.clone();
        if let Some(v) = self.sleep_hours {
            profile.sleep_hours = v;
        }
        if let Some(v) = self.stress_level {
            profile.stress_level = v;
        }
        if let Some(v) = self.chronotype {
            profile.chronotype = v;
        }
        if let Some(v) = self.lectures_today {
            profile.lectures_today = v;
        }
        if let Some(v) = &self.breaks_at {
            profile.break_preferences = v.clone();
        }
        profile
    }
}

/// Response to a TLX feedback submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlxResponse {
    pub status: String,
    pub tlx_entries: usize,
    pub updated_weights: FatigueWeights,
}

/// Liveness payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

/// Liveness check.
pub fn health() -> HealthStatus {
    HealthStatus {
        status: "healthy".to_string(),
        service: "cognitive-scheduler".to_string(),
    }
}

/// The orchestrating façade: engine + storage + parser.
pub struct Service<S, P> {
    base_config: CogConfig,
    store: S,
    parser: P,
}

impl<S: ScheduleStore, P: TaskParser> Service<S, P> {
    pub fn new(base_config: CogConfig, store: S, parser: P) -> Self {
        Self {
            base_config,
            store,
            parser,
        }
    }

    pub fn config(&self) -> &CogConfig {
        &self.base_config
    }

    /// PUT /config: all-or-nothing update of the base config.
    pub fn update_config(
        &mut self,
        updates: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<&CogConfig> {
        self.base_config.apply_updates(updates)?;
        Ok(&self.base_config)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Base config with the user's recalibrated weights merged in.
    fn merged_config(&self, user_id: &str) -> Result<CogConfig> {
        let cfg = match self.store.fatigue_weights(user_id)? {
            Some(weights) => self.base_config.with_weights(&weights),
            None => self.base_config.clone(),
        };
        Ok(cfg)
    }

    /// Schedule pre-parsed tasks for a user and persist the plan.
    pub fn schedule(
        &self,
        user_id: &str,
        req: &ScheduleRequest,
        opts: &EngineOptions,
    ) -> Result<PlanResponse> {
        let cfg = self.merged_config(user_id)?;
        let prior = self
            .store
            .prior_plan(user_id, cfg.deep_work_load_threshold)?;
        let mut plan = run_engine(req, &cfg, prior.as_ref(), opts)?;

        match self
            .store
            .save_plan(user_id, &serde_json::to_value(&plan)?)
        {
            Ok(_) => plan.persisted = true,
            Err(e) => {
                // A failed write does not invalidate a successful run.
                warn!(error = %e, "plan persistence failed");
                plan.persisted = false;
            }
        }
        Ok(plan)
    }

    /// Conversational entry point: parse free text into tasks, merge the
    /// stored profile with per-request overrides, then schedule.
    pub fn converse(
        &self,
        user_id: &str,
        message: &str,
        overrides: &ProfileOverrides,
        opts: &EngineOptions,
    ) -> Result<PlanResponse> {
        let tasks = self.parser.parse(message)?;
        let base = self.store.profile(user_id)?.unwrap_or_default();
        let profile = overrides.apply(&base);
        let req = ScheduleRequest {
            tasks,
            available_from: overrides
                .available_from
                .clone()
                .or_else(|| Some(profile.wake_time.clone())),
            available_to: overrides
                .available_to
                .clone()
                .or_else(|| Some(profile.sleep_time.clone())),
            profile,
        };
        self.schedule(user_id, &req, opts)
    }

    /// Append a TLX entry and recalibrate on cadence. The log append and
    /// the weight update commit together.
    pub fn tlx_feedback(
        &self,
        user_id: &str,
        block_index: i64,
        mental_demand: u8,
        effort: u8,
        now: DateTime<Utc>,
    ) -> Result<TlxResponse> {
        let entry = TlxEntry::new(block_index, mental_demand, effort, now)?;
        let mut entries = self.store.tlx_entries(user_id)?;
        entries.push(entry.clone());

        let current = self
            .store
            .fatigue_weights(user_id)?
            .unwrap_or_else(|| self.base_config.weights());
        let updated = recalibrate(&entries, &current);

        let count = self.store.append_tlx(user_id, &entry, updated.as_ref())?;
        Ok(TlxResponse {
            status: "ok".to_string(),
            tlx_entries: count,
            updated_weights: updated.unwrap_or(current),
        })
    }

    /// Export the user's most recent plan as an ICS document.
    pub fn export_calendar(&self, user_id: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        let Some(stored) = self.store.latest_plan(user_id)? else {
            return Ok(None);
        };
        let blocks: Vec<Block> = match stored.data.get("schedule") {
            Some(v) => serde_json::from_value(v.clone())?,
            None => Vec::new(),
        };
        let ics = plan_to_ics(&blocks, stored.created_on, now);
        self.store.mark_calendar_synced(&stored.id)?;
        Ok(Some(ics))
    }
}
