//! # CogScheduler Core Library
//!
//! Core business logic for the cognitive-aware daily task scheduler. It
//! implements a CLI-first philosophy: every operation is available through
//! the library API, with the CLI binary (and any HTTP layer) being a thin
//! transport over the same core.
//!
//! ## Architecture
//!
//! - **Engine**: a pure pipeline from `(profile, config, tasks)` to
//!   `(plan, curves, warnings, gamification)`; no I/O inside
//! - **Scheduler**: cursor-based block placement with fatigue-driven
//!   recovery breaks, fixed commitments, and preferred break windows
//! - **Adaptive layer**: NASA-TLX feedback recalibrates the per-user
//!   fatigue weights
//! - **Storage**: SQLite persistence for users, profiles, schedules, the
//!   TLX log, and recalibrated weights
//!
//! ## Key Components
//!
//! - [`Service`]: orchestrating façade over engine + storage + parser
//! - [`run_engine`]: the pure scheduling pipeline
//! - [`FatigueAccumulator`]: the stateful fatigue model
//! - [`Storage`]: persistence adapter

pub mod availability;
pub mod clock;
pub mod config;
pub mod energy;
pub mod engine;
pub mod error;
pub mod fatigue;
pub mod gamification;
pub mod ics;
pub mod parser;
pub mod profile;
pub mod recalibrate;
pub mod scheduler;
pub mod storage;
pub mod task;
pub mod warnings;

pub use availability::{build_availability, Availability, FixedKind, FixedSegment};
pub use clock::{format_hhmm, parse_hhmm, TimeRange};
pub use config::{CogConfig, FatigueWeights};
pub use energy::{CurvePoint, EnergyModel, CURVE_CADENCE_MIN};
pub use engine::{
    health, run_engine, CancelToken, EngineOptions, HealthStatus, ParsedTask, PlanResponse,
    ProfileOverrides, ScheduleRequest, ScheduleStore, Service, StoredPlan, TlxResponse,
    DEFAULT_SOFT_DEADLINE,
};
pub use error::{
    ConfigError, CoreError, ParseError, Result, ScheduleError, StorageError, ValidationError,
};
pub use fatigue::{BreakKind, FatigueAccumulator};
pub use gamification::{Gamification, PriorPlan};
pub use ics::plan_to_ics;
pub use parser::{RegexTaskParser, TaskParser};
pub use profile::{Chronotype, Profile, Role};
pub use recalibrate::{recalibrate, TlxEntry};
pub use scheduler::{fatigue_curve, place, Block, PlacedBlock, ScheduleOutcome};
pub use storage::{Storage, User};
pub use task::{order_for_placement, split_into_quanta, Quantum, Task};
pub use warnings::{derive_warnings, MAX_WARNINGS};
