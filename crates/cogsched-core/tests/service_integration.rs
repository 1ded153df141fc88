//! Integration tests for the façade: storage-backed scheduling, TLX
//! recalibration, config updates, and calendar export.

use chrono::{NaiveDate, Utc};
use cogsched_core::{
    CogConfig, EngineOptions, Profile, RegexTaskParser, ScheduleRequest, ScheduleStore, Service,
    Storage, Task,
};
use serde_json::json;

fn service() -> (Service<Storage, RegexTaskParser>, String) {
    let storage = Storage::open_memory().unwrap();
    let user = storage.upsert_user("test-user", "t@example.com", "T", "").unwrap();
    let service = Service::new(CogConfig::default(), storage, RegexTaskParser::new());
    (service, user.id)
}

fn opts() -> EngineOptions {
    EngineOptions::for_date(NaiveDate::from_ymd_opt(2026, 8, 2).unwrap())
}

fn request() -> ScheduleRequest {
    let mut task = Task::new("Graph Theory", "math");
    task.duration_minutes = 100;
    task.cognitive_load = Some(8.0);
    ScheduleRequest {
        tasks: vec![task],
        profile: Profile {
            sleep_hours: 7.0,
            stress_level: 2,
            ..Profile::default()
        },
        available_from: Some("09:00".to_string()),
        available_to: Some("18:00".to_string()),
    }
}

#[test]
fn schedule_persists_the_plan() {
    let (service, user_id) = service();
    let plan = service.schedule(&user_id, &request(), &opts()).unwrap();
    assert!(plan.persisted);

    let stored = service.store().latest_plan(&user_id).unwrap().unwrap();
    let blocks = stored.data["schedule"].as_array().unwrap();
    assert_eq!(blocks.len(), plan.schedule.len());
}

#[test]
fn s4_tlx_recalibration_after_three_entries() {
    let (service, user_id) = service();

    let first = service
        .tlx_feedback(&user_id, 0, 5, 5, Utc::now())
        .unwrap();
    assert_eq!(first.status, "ok");
    assert_eq!(first.tlx_entries, 1);
    // off cadence: weights still at their defaults
    assert_eq!(first.updated_weights.fatigue_consec_weight, 0.4);

    service.tlx_feedback(&user_id, 0, 5, 5, Utc::now()).unwrap();
    let third = service
        .tlx_feedback(&user_id, 0, 5, 5, Utc::now())
        .unwrap();

    assert!(third.tlx_entries >= 3);
    // md = ef = (5-1)/6 ≈ 0.667 > baseline: weights rise, threshold falls
    assert!(third.updated_weights.fatigue_consec_weight > 0.4);
    assert!(third.updated_weights.fatigue_consec_weight >= 0.40);
    assert!(third.updated_weights.fatigue_consec_weight <= 0.60);
    assert!(third.updated_weights.fatigue_total_weight > 0.3);
    assert!(third.updated_weights.fatigue_force_break < 0.75);
    assert!(third.updated_weights.fatigue_force_break >= 0.40);

    // the recalibrated weights survive in storage
    let persisted = service.store().fatigue_weights(&user_id).unwrap().unwrap();
    assert_eq!(
        persisted.fatigue_consec_weight,
        third.updated_weights.fatigue_consec_weight
    );
}

#[test]
fn recalibrated_weights_feed_the_next_schedule() {
    let (service, user_id) = service();
    // drive the force-break threshold down with nine intense entries
    for _ in 0..9 {
        service.tlx_feedback(&user_id, 0, 7, 7, Utc::now()).unwrap();
    }
    let weights = service.store().fatigue_weights(&user_id).unwrap().unwrap();
    assert!(weights.fatigue_force_break < 0.75);

    // the merged snapshot is in effect: the plan still satisfies every
    // invariant with the tighter threshold
    let plan = service.schedule(&user_id, &request(), &opts()).unwrap();
    assert!(!plan.schedule.is_empty());
}

#[test]
fn s6_config_update_validation() {
    let (mut service, _user_id) = service();

    // unknown key: rejected, nothing changes
    let updates = json!({"bogus_key": 99}).as_object().unwrap().clone();
    assert!(service.update_config(&updates).is_err());
    assert_eq!(service.config().quantum_min, 25);

    // known key: applied and visible on read-back
    let updates = json!({"quantum_min": 20}).as_object().unwrap().clone();
    service.update_config(&updates).unwrap();
    assert_eq!(service.config().quantum_min, 20);
}

#[test]
fn converse_parses_and_schedules() {
    let (service, user_id) = service();
    let plan = service
        .converse(
            &user_id,
            "study calculus for 2 hours and review chemistry notes for 1 hour",
            &Default::default(),
            &opts(),
        )
        .unwrap();
    assert_eq!(plan.parsed_tasks.len(), 2);
    assert!(plan.parsed_tasks[0].cognitive_load > 0.0);
    assert!(!plan.schedule.is_empty());
    assert!(plan.persisted);
}

#[test]
fn converse_merges_stored_profile_with_overrides() {
    let (service, user_id) = service();
    let profile = Profile {
        sleep_hours: 8.0,
        stress_level: 2,
        wake_time: "08:00".to_string(),
        sleep_time: "20:00".to_string(),
        ..Profile::default()
    };
    service.store().save_profile(&user_id, &profile).unwrap();

    let overrides = cogsched_core::ProfileOverrides {
        available_from: Some("10:00".to_string()),
        ..Default::default()
    };
    let plan = service
        .converse(&user_id, "write report for 1 hour", &overrides, &opts())
        .unwrap();
    // override wins over the stored wake time
    assert_eq!(plan.energy_curve.first().unwrap().time, "10:00");
    // stored sleep time bounds the window
    assert_eq!(plan.energy_curve.last().unwrap().time, "20:00");
}

#[test]
fn export_produces_ics_for_latest_plan() {
    let (service, user_id) = service();
    assert!(service.export_calendar(&user_id, Utc::now()).unwrap().is_none());

    service.schedule(&user_id, &request(), &opts()).unwrap();
    let ics = service
        .export_calendar(&user_id, Utc::now())
        .unwrap()
        .expect("ics missing");
    assert!(ics.starts_with("BEGIN:VCALENDAR"));
    assert!(ics.contains("SUMMARY:Graph Theory"));
    // breaks are not exported
    assert!(!ics.contains("SUMMARY:Short Break"));
}

#[test]
fn streak_carries_across_plans() {
    let (service, user_id) = service();
    // stored rows are stamped with the local wall clock, so the streak
    // dates key off the local calendar here too
    let today = chrono::Local::now().date_naive();

    // first plan with deep work establishes streak = 1
    let plan = service
        .schedule(&user_id, &request(), &EngineOptions::for_date(today))
        .unwrap();
    assert_eq!(plan.gamification.streak, 1);

    // a second plan on the same day does not increment
    let plan = service
        .schedule(&user_id, &request(), &EngineOptions::for_date(today))
        .unwrap();
    assert_eq!(plan.gamification.streak, 1);

    // a plan dated tomorrow sees yesterday's deep work and increments
    let plan = service
        .schedule(
            &user_id,
            &request(),
            &EngineOptions::for_date(today.succ_opt().unwrap()),
        )
        .unwrap();
    assert_eq!(plan.gamification.streak, 2);
}
