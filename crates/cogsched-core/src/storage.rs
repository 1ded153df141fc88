//! SQLite-based persistence.
//!
//! Three owning entities (users, profiles, schedules) plus the append-only
//! TLX log and the per-user recalibrated fatigue weights. JSON-shaped
//! columns go through serde_json. Deleting a user cascades everything.
//!
//! Writes for one user serialize on the connection; the façade reads one
//! consistent snapshot at the start of each scheduling call.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::config::FatigueWeights;
use crate::engine::{ScheduleStore, StoredPlan};
use crate::error::StorageError;
use crate::gamification::PriorPlan;
use crate::profile::Profile;
use crate::recalibrate::TlxEntry;

/// A user row.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
}

/// SQLite store for users, profiles, schedules, TLX feedback, and weights.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (and migrate) the database at the given path.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database, used by tests and ephemeral runs.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|source| StorageError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id          TEXT PRIMARY KEY,
                    external_id TEXT NOT NULL UNIQUE,
                    email       TEXT NOT NULL DEFAULT '',
                    name        TEXT NOT NULL DEFAULT '',
                    avatar_url  TEXT NOT NULL DEFAULT '',
                    created_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS profiles (
                    user_id           TEXT PRIMARY KEY
                                      REFERENCES users(id) ON DELETE CASCADE,
                    role              TEXT NOT NULL,
                    chronotype        TEXT NOT NULL,
                    wake_time         TEXT NOT NULL,
                    sleep_time        TEXT NOT NULL,
                    sleep_hours       REAL NOT NULL,
                    stress_level      INTEGER NOT NULL,
                    daily_commitments TEXT NOT NULL DEFAULT '[]',
                    break_preferences TEXT NOT NULL DEFAULT '[]',
                    lectures_today    INTEGER NOT NULL DEFAULT 0,
                    meetings_today    INTEGER NOT NULL DEFAULT 0,
                    name              TEXT NOT NULL DEFAULT '',
                    updated_at        TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS schedules (
                    id              TEXT PRIMARY KEY,
                    user_id         TEXT NOT NULL
                                    REFERENCES users(id) ON DELETE CASCADE,
                    schedule_data   TEXT NOT NULL,
                    created_at      TEXT NOT NULL,
                    calendar_synced INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS tlx_entries (
                    id            INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id       TEXT NOT NULL
                                  REFERENCES users(id) ON DELETE CASCADE,
                    block_index   INTEGER NOT NULL,
                    mental_demand INTEGER NOT NULL,
                    effort        INTEGER NOT NULL,
                    created_at    TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS user_weights (
                    user_id               TEXT PRIMARY KEY
                                          REFERENCES users(id) ON DELETE CASCADE,
                    fatigue_consec_weight REAL NOT NULL,
                    fatigue_total_weight  REAL NOT NULL,
                    fatigue_force_break   REAL NOT NULL,
                    updated_at            TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_schedules_user_created
                    ON schedules(user_id, created_at DESC);",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // === Users ===

    /// Create or fetch the user for an external identity.
    pub fn upsert_user(
        &self,
        external_id: &str,
        email: &str,
        name: &str,
        avatar_url: &str,
    ) -> Result<User, StorageError> {
        if let Some(user) = self.user_by_external_id(external_id)? {
            self.conn.execute(
                "UPDATE users SET email = ?1, name = ?2, avatar_url = ?3 WHERE id = ?4",
                params![email, name, avatar_url, user.id],
            )?;
            return Ok(User {
                email: email.to_string(),
                name: name.to_string(),
                avatar_url: avatar_url.to_string(),
                ..user
            });
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            external_id: external_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            avatar_url: avatar_url.to_string(),
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO users (id, external_id, email, name, avatar_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.external_id,
                user.email,
                user.name,
                user.avatar_url,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(user)
    }

    pub fn user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, external_id, email, name, avatar_url, created_at
                 FROM users WHERE external_id = ?1",
                params![external_id],
                |row| {
                    let created_at: String = row.get(5)?;
                    Ok(User {
                        id: row.get(0)?,
                        external_id: row.get(1)?,
                        email: row.get(2)?,
                        name: row.get(3)?,
                        avatar_url: row.get(4)?,
                        created_at: DateTime::parse_from_rfc3339(&created_at)
                            .map(|dt| dt.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Delete a user; profiles, schedules, TLX log, and weights cascade.
    pub fn delete_user(&self, user_id: &str) -> Result<(), StorageError> {
        let deleted = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        if deleted == 0 {
            return Err(StorageError::UserNotFound(user_id.to_string()));
        }
        Ok(())
    }

    // === Profiles ===

    pub fn upsert_profile(&self, user_id: &str, profile: &Profile) -> Result<(), StorageError> {
        let role = serde_json::to_value(profile.role)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "student".to_string());
        let chronotype = serde_json::to_value(profile.chronotype)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "normal".to_string());
        self.conn.execute(
            "INSERT INTO profiles (user_id, role, chronotype, wake_time, sleep_time,
                                   sleep_hours, stress_level, daily_commitments,
                                   break_preferences, lectures_today, meetings_today,
                                   name, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(user_id) DO UPDATE SET
                 role = excluded.role,
                 chronotype = excluded.chronotype,
                 wake_time = excluded.wake_time,
                 sleep_time = excluded.sleep_time,
                 sleep_hours = excluded.sleep_hours,
                 stress_level = excluded.stress_level,
                 daily_commitments = excluded.daily_commitments,
                 break_preferences = excluded.break_preferences,
                 lectures_today = excluded.lectures_today,
                 meetings_today = excluded.meetings_today,
                 name = excluded.name,
                 updated_at = excluded.updated_at",
            params![
                user_id,
                role,
                chronotype,
                profile.wake_time,
                profile.sleep_time,
                profile.sleep_hours,
                profile.stress_level,
                serde_json::to_string(&profile.daily_commitments).unwrap_or_default(),
                serde_json::to_string(&profile.break_preferences).unwrap_or_default(),
                profile.lectures_today,
                profile.meetings_today,
                profile.name,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn profile_for_user(&self, user_id: &str) -> Result<Option<Profile>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT role, chronotype, wake_time, sleep_time, sleep_hours,
                        stress_level, daily_commitments, break_preferences,
                        lectures_today, meetings_today, name
                 FROM profiles WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let role: String = row.get(0)?;
                    let chronotype: String = row.get(1)?;
                    let commitments: String = row.get(6)?;
                    let breaks: String = row.get(7)?;
                    Ok(Profile {
                        role: serde_json::from_value(serde_json::Value::String(role))
                            .unwrap_or(crate::profile::Role::Student),
                        chronotype: serde_json::from_value(serde_json::Value::String(chronotype))
                            .unwrap_or(crate::profile::Chronotype::Normal),
                        wake_time: row.get(2)?,
                        sleep_time: row.get(3)?,
                        sleep_hours: row.get(4)?,
                        stress_level: row.get(5)?,
                        daily_commitments: serde_json::from_str(&commitments)
                            .unwrap_or_default(),
                        break_preferences: serde_json::from_str(&breaks).unwrap_or_default(),
                        lectures_today: row.get(8)?,
                        meetings_today: row.get(9)?,
                        name: row.get(10)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    // === Schedules ===

    pub fn save_schedule(
        &self,
        user_id: &str,
        data: &serde_json::Value,
    ) -> Result<String, StorageError> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO schedules (id, user_id, schedule_data, created_at, calendar_synced)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![
                id,
                user_id,
                serde_json::to_string(data)
                    .map_err(|e| StorageError::QueryFailed(e.to_string()))?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(id)
    }

    /// Most recent schedule row, ordered by created_at desc.
    pub fn latest_schedule(&self, user_id: &str) -> Result<Option<StoredPlan>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, schedule_data, created_at FROM schedules
                 WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT 1",
                params![user_id],
                |row| {
                    let id: String = row.get(0)?;
                    let data: String = row.get(1)?;
                    let created_at: String = row.get(2)?;
                    Ok((id, data, created_at))
                },
            )
            .optional()?;
        let Some((id, data, created_at)) = row else {
            return Ok(None);
        };
        let data: serde_json::Value =
            serde_json::from_str(&data).map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        // streak day boundaries use the server-local calendar
        let created_on = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Local).date_naive())
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        Ok(Some(StoredPlan {
            id,
            created_on,
            data,
        }))
    }

    pub fn schedule_count(&self, user_id: &str) -> Result<u32, StorageError> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM schedules WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn set_calendar_synced(&self, schedule_id: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "UPDATE schedules SET calendar_synced = 1 WHERE id = ?1",
            params![schedule_id],
        )?;
        Ok(())
    }

    // === TLX log and weights ===

    /// Append a TLX entry and persist updated weights in one transaction.
    pub fn append_tlx_entry(
        &self,
        user_id: &str,
        entry: &TlxEntry,
        updated: Option<&FatigueWeights>,
    ) -> Result<usize, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tlx_entries (user_id, block_index, mental_demand, effort, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                entry.block_index,
                entry.mental_demand,
                entry.effort,
                entry.timestamp.to_rfc3339(),
            ],
        )?;
        if let Some(weights) = updated {
            tx.execute(
                "INSERT INTO user_weights (user_id, fatigue_consec_weight,
                                           fatigue_total_weight, fatigue_force_break,
                                           updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                     fatigue_consec_weight = excluded.fatigue_consec_weight,
                     fatigue_total_weight = excluded.fatigue_total_weight,
                     fatigue_force_break = excluded.fatigue_force_break,
                     updated_at = excluded.updated_at",
                params![
                    user_id,
                    weights.fatigue_consec_weight,
                    weights.fatigue_total_weight,
                    weights.fatigue_force_break,
                    Utc::now().to_rfc3339(),
                ],
            )?;
        }
        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM tlx_entries WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(count as usize)
    }

    pub fn tlx_entries_for_user(&self, user_id: &str) -> Result<Vec<TlxEntry>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT block_index, mental_demand, effort, created_at
             FROM tlx_entries WHERE user_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            let created_at: String = row.get(3)?;
            Ok(TlxEntry {
                block_index: row.get(0)?,
                mental_demand: row.get(1)?,
                effort: row.get(2)?,
                timestamp: DateTime::parse_from_rfc3339(&created_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;
        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    pub fn weights_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<FatigueWeights>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT fatigue_consec_weight, fatigue_total_weight, fatigue_force_break
                 FROM user_weights WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(FatigueWeights {
                        fatigue_consec_weight: row.get(0)?,
                        fatigue_total_weight: row.get(1)?,
                        fatigue_force_break: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

impl ScheduleStore for Storage {
    fn profile(&self, user_id: &str) -> Result<Option<Profile>, StorageError> {
        self.profile_for_user(user_id)
    }

    fn save_profile(&self, user_id: &str, profile: &Profile) -> Result<(), StorageError> {
        self.upsert_profile(user_id, profile)
    }

    fn fatigue_weights(&self, user_id: &str) -> Result<Option<FatigueWeights>, StorageError> {
        self.weights_for_user(user_id)
    }

    fn prior_plan(
        &self,
        user_id: &str,
        deep_threshold: f64,
    ) -> Result<Option<PriorPlan>, StorageError> {
        let Some(stored) = self.latest_schedule(user_id)? else {
            return Ok(None);
        };
        let had_deep_work = stored
            .data
            .get("schedule")
            .and_then(|v| v.as_array())
            .map(|blocks| {
                blocks.iter().any(|b| {
                    !b.get("is_break").and_then(|v| v.as_bool()).unwrap_or(false)
                        && b.get("cognitive_load")
                            .and_then(|v| v.as_f64())
                            .unwrap_or(0.0)
                            >= deep_threshold
                })
            })
            .unwrap_or(false);
        let streak = stored
            .data
            .pointer("/gamification/streak")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        Ok(Some(PriorPlan {
            created_on: stored.created_on,
            had_deep_work,
            streak,
        }))
    }

    fn save_plan(
        &self,
        user_id: &str,
        plan: &serde_json::Value,
    ) -> Result<String, StorageError> {
        self.save_schedule(user_id, plan)
    }

    fn latest_plan(&self, user_id: &str) -> Result<Option<StoredPlan>, StorageError> {
        self.latest_schedule(user_id)
    }

    fn append_tlx(
        &self,
        user_id: &str,
        entry: &TlxEntry,
        updated: Option<&FatigueWeights>,
    ) -> Result<usize, StorageError> {
        self.append_tlx_entry(user_id, entry, updated)
    }

    fn tlx_entries(&self, user_id: &str) -> Result<Vec<TlxEntry>, StorageError> {
        self.tlx_entries_for_user(user_id)
    }

    fn mark_calendar_synced(&self, schedule_id: &str) -> Result<(), StorageError> {
        self.set_calendar_synced(schedule_id)
    }
}
