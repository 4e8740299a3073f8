//! SQLite store for levelupd
//!
//! Owns the connection and the schema. Every XP mutation happens inside a
//! single transaction as an in-SQL atomic increment
//! (`UPDATE profiles SET current_xp = MAX(0, current_xp + ?)`) followed by
//! re-deriving `current_level` from the new XP, so the level cache can
//! never drift from the counter and two concurrent toggles never race a
//! read-modify-write in the application tier.
//!
//! Completion records are toggle-semantics rows: one per (habit, day),
//! deleted on uncheck, with `xp_earned` snapshotting the habit's value at
//! completion time. They are kept forever otherwise; the skills page sums
//! them over all time.

use chrono::{NaiveDate, Utc};
use levelup_common::api::{AdminUserRow, OnboardingHabit};
use levelup_common::error::LevelUpError;
use levelup_common::progression::level_for_xp;
use levelup_common::types::{Attribute, CompletionRecord, Difficulty, Habit, Profile, Role};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    token_digest  TEXT NOT NULL UNIQUE,
    role          TEXT NOT NULL DEFAULT 'user',
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    user_id            TEXT PRIMARY KEY REFERENCES users(user_id),
    full_name          TEXT NOT NULL,
    email              TEXT NOT NULL,
    current_xp         INTEGER NOT NULL DEFAULT 0,
    current_level      INTEGER NOT NULL DEFAULT 1,
    streak_count       INTEGER NOT NULL DEFAULT 0,
    last_activity_date TEXT,
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS habits (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    name        TEXT NOT NULL,
    attribute   TEXT NOT NULL,
    difficulty  TEXT NOT NULL,
    xp_value    INTEGER NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS completions (
    id              TEXT PRIMARY KEY,
    habit_id        TEXT NOT NULL REFERENCES habits(id),
    user_id         TEXT NOT NULL REFERENCES users(user_id),
    completed_date  TEXT NOT NULL,
    xp_earned       INTEGER NOT NULL,
    created_at      TEXT NOT NULL,
    UNIQUE (habit_id, completed_date)
);

CREATE TABLE IF NOT EXISTS user_progress (
    user_id                 TEXT PRIMARY KEY REFERENCES users(user_id),
    total_xp_earned         INTEGER NOT NULL DEFAULT 0,
    total_habits_completed  INTEGER NOT NULL DEFAULT 0,
    current_streak          INTEGER NOT NULL DEFAULT 0,
    longest_streak          INTEGER NOT NULL DEFAULT 0,
    last_activity_date      TEXT,
    last_reset_date         TEXT
);

CREATE INDEX IF NOT EXISTS idx_habits_user ON habits(user_id, is_active);
CREATE INDEX IF NOT EXISTS idx_completions_user_date ON completions(user_id, completed_date);
";

/// Outcome of a completion toggle.
#[derive(Debug, Clone, Copy)]
pub struct ToggleOutcome {
    /// True if the habit is now completed for the date.
    pub completed: bool,
    /// Signed XP applied to the profile (before the zero clamp).
    pub xp_delta: i64,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: &Path) -> Result<Self, LevelUpError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LevelUpError::Storage(format!("create {}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        info!("Store open at {}", path.display());
        Ok(Self { conn })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, LevelUpError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ------------------------------------------------------------------
    // Users & sessions
    // ------------------------------------------------------------------

    /// Create an account. The caller supplies the token digest; the raw
    /// token never reaches the store.
    pub fn create_user(&mut self, email: &str, token_digest: &str) -> Result<Uuid, LevelUpError> {
        let user_id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO users (user_id, email, token_digest, role, created_at)
                 VALUES (?1, ?2, ?3, 'user', ?4)",
                params![user_id.to_string(), email, token_digest, Utc::now()],
            )
            .map_err(|e| map_constraint(e, "email already registered"))?;
        debug!("Created user {} ({})", user_id, email);
        Ok(user_id)
    }

    /// Resolve a token digest to (user, role). None means bad token.
    pub fn user_by_token_digest(
        &self,
        token_digest: &str,
    ) -> Result<Option<(Uuid, Role, String)>, LevelUpError> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, role, email FROM users WHERE token_digest = ?1",
                params![token_digest],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        match row {
            None => Ok(None),
            Some((id, role, email)) => {
                Ok(Some((parse_uuid(&id)?, parse_role(&role)?, email)))
            }
        }
    }

    /// Look up an account by email (admin promotion path).
    pub fn user_id_by_email(&self, email: &str) -> Result<Uuid, LevelUpError> {
        let id: Option<String> = self
            .conn
            .query_row(
                "SELECT user_id FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        match id {
            Some(id) => parse_uuid(&id),
            None => Err(LevelUpError::NotFound(format!("user with email {}", email))),
        }
    }

    /// Promote or demote an account.
    pub fn set_role(&mut self, user_id: Uuid, role: Role) -> Result<(), LevelUpError> {
        let n = self.conn.execute(
            "UPDATE users SET role = ?1 WHERE user_id = ?2",
            params![role.as_str(), user_id.to_string()],
        )?;
        if n == 0 {
            return Err(LevelUpError::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }

    pub fn has_profile(&self, user_id: Uuid) -> Result<bool, LevelUpError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM profiles WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ------------------------------------------------------------------
    // Onboarding & profile
    // ------------------------------------------------------------------

    /// Create the profile (XP 0, level 1, streak 0) plus the initial habit
    /// set in one transaction. Re-onboarding an existing profile is a
    /// conflict.
    pub fn onboard(
        &mut self,
        user_id: Uuid,
        email: &str,
        full_name: &str,
        habits: &[OnboardingHabit],
    ) -> Result<Profile, LevelUpError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO profiles
                 (user_id, full_name, email, current_xp, current_level, streak_count, created_at)
             VALUES (?1, ?2, ?3, 0, 1, 0, ?4)",
            params![user_id.to_string(), full_name, email, Utc::now()],
        )
        .map_err(|e| map_constraint(e, "profile already exists"))?;
        tx.execute(
            "INSERT INTO user_progress (user_id) VALUES (?1)",
            params![user_id.to_string()],
        )?;
        for habit in habits {
            insert_habit(&tx, user_id, &habit.name, habit.attribute, habit.difficulty)?;
        }
        tx.commit()?;
        info!("Onboarded {} with {} habits", user_id, habits.len());
        self.profile(user_id)
    }

    /// Fetch the profile, or signal that onboarding is still pending.
    pub fn profile(&self, user_id: Uuid) -> Result<Profile, LevelUpError> {
        self.conn
            .query_row(
                "SELECT user_id, full_name, email, current_xp, current_level,
                        streak_count, last_activity_date, created_at
                 FROM profiles WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| {
                    Ok(RawProfile {
                        user_id: row.get(0)?,
                        full_name: row.get(1)?,
                        email: row.get(2)?,
                        current_xp: row.get(3)?,
                        current_level: row.get(4)?,
                        streak_count: row.get(5)?,
                        last_activity_date: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                },
            )
            .optional()?
            .ok_or(LevelUpError::OnboardingRequired)
            .and_then(RawProfile::into_profile)
    }

    // ------------------------------------------------------------------
    // Habits
    // ------------------------------------------------------------------

    /// Create a habit. `xp_value` is derived from the difficulty here,
    /// never taken from the caller.
    pub fn create_habit(
        &mut self,
        user_id: Uuid,
        name: &str,
        attribute: Attribute,
        difficulty: Difficulty,
    ) -> Result<Habit, LevelUpError> {
        let tx = self.conn.transaction()?;
        let id = insert_habit(&tx, user_id, name, attribute, difficulty)?;
        tx.commit()?;
        self.habit(user_id, id)
    }

    pub fn habit(&self, user_id: Uuid, habit_id: Uuid) -> Result<Habit, LevelUpError> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, attribute, difficulty, xp_value, is_active
                 FROM habits WHERE id = ?1 AND user_id = ?2",
                params![habit_id.to_string(), user_id.to_string()],
                |row| {
                    Ok(RawHabit {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        attribute: row.get(3)?,
                        difficulty: row.get(4)?,
                        xp_value: row.get(5)?,
                        is_active: row.get(6)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| LevelUpError::NotFound(format!("habit {}", habit_id)))
            .and_then(RawHabit::into_habit)
    }

    /// Active habits for a user, creation order.
    pub fn habits(&self, user_id: Uuid) -> Result<Vec<Habit>, LevelUpError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, attribute, difficulty, xp_value, is_active
             FROM habits WHERE user_id = ?1 AND is_active = 1
             ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![user_id.to_string()], |row| {
            Ok(RawHabit {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                attribute: row.get(3)?,
                difficulty: row.get(4)?,
                xp_value: row.get(5)?,
                is_active: row.get(6)?,
            })
        })?;
        let mut habits = Vec::new();
        for raw in rows {
            habits.push(raw?.into_habit()?);
        }
        Ok(habits)
    }

    /// Soft-delete: the habit stops appearing and cannot be completed, but
    /// its historical completions keep feeding attribute XP.
    pub fn deactivate_habit(&mut self, user_id: Uuid, habit_id: Uuid) -> Result<(), LevelUpError> {
        let n = self.conn.execute(
            "UPDATE habits SET is_active = 0 WHERE id = ?1 AND user_id = ?2",
            params![habit_id.to_string(), user_id.to_string()],
        )?;
        if n == 0 {
            return Err(LevelUpError::NotFound(format!("habit {}", habit_id)));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------

    /// Completion records for one day (the dashboard's toggle state).
    pub fn completions_on(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<CompletionRecord>, LevelUpError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, habit_id, user_id, completed_date, xp_earned
             FROM completions WHERE user_id = ?1 AND completed_date = ?2",
        )?;
        let rows = stmt.query_map(params![user_id.to_string(), date], |row| {
            Ok(RawCompletion {
                id: row.get(0)?,
                habit_id: row.get(1)?,
                user_id: row.get(2)?,
                completed_date: row.get(3)?,
                xp_earned: row.get(4)?,
            })
        })?;
        let mut records = Vec::new();
        for raw in rows {
            records.push(raw?.into_record()?);
        }
        Ok(records)
    }

    /// Toggle a habit for a date.
    ///
    /// Checked state: insert the record (snapshotting xp_value) and apply
    /// +xp. Unchecked: delete the record and apply exactly -xp_earned, so
    /// the round trip restores the prior XP. Record mutation, XP increment
    /// and level re-derivation all commit together or not at all.
    pub fn toggle_completion(
        &mut self,
        user_id: Uuid,
        habit_id: Uuid,
        date: NaiveDate,
    ) -> Result<ToggleOutcome, LevelUpError> {
        let habit = self.habit(user_id, habit_id)?;
        if !habit.is_active {
            return Err(LevelUpError::Validation(format!(
                "habit '{}' is inactive",
                habit.name
            )));
        }

        let tx = self.conn.transaction()?;
        let existing: Option<(String, i64)> = tx
            .query_row(
                "SELECT id, xp_earned FROM completions
                 WHERE habit_id = ?1 AND completed_date = ?2",
                params![habit_id.to_string(), date],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let outcome = match existing {
            Some((completion_id, xp_earned)) => {
                tx.execute(
                    "DELETE FROM completions WHERE id = ?1",
                    params![completion_id],
                )?;
                apply_xp(&tx, user_id, -xp_earned, date)?;
                tx.execute(
                    "UPDATE user_progress SET
                         total_xp_earned = MAX(0, total_xp_earned - ?1),
                         total_habits_completed = MAX(0, total_habits_completed - 1)
                     WHERE user_id = ?2",
                    params![xp_earned, user_id.to_string()],
                )?;
                ToggleOutcome {
                    completed: false,
                    xp_delta: -xp_earned,
                }
            }
            None => {
                let xp = i64::from(habit.xp_value);
                tx.execute(
                    "INSERT INTO completions
                         (id, habit_id, user_id, completed_date, xp_earned, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        Uuid::new_v4().to_string(),
                        habit_id.to_string(),
                        user_id.to_string(),
                        date,
                        xp,
                        Utc::now()
                    ],
                )
                .map_err(|e| map_constraint(e, "already completed for this date"))?;
                apply_xp(&tx, user_id, xp, date)?;
                tx.execute(
                    "UPDATE user_progress SET
                         total_xp_earned = total_xp_earned + ?1,
                         total_habits_completed = total_habits_completed + 1,
                         last_activity_date = ?2
                     WHERE user_id = ?3",
                    params![xp, date, user_id.to_string()],
                )?;
                ToggleOutcome {
                    completed: true,
                    xp_delta: xp,
                }
            }
        };
        tx.commit()?;
        debug!(
            "Toggled habit {} for {}: completed={} delta={}",
            habit_id, user_id, outcome.completed, outcome.xp_delta
        );
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Attribute aggregation
    // ------------------------------------------------------------------

    /// All-time XP per attribute, summed from completion snapshots joined
    /// through their habits.
    pub fn attribute_xp(&self, user_id: Uuid) -> Result<HashMap<Attribute, i64>, LevelUpError> {
        let mut stmt = self.conn.prepare(
            "SELECT h.attribute, COALESCE(SUM(c.xp_earned), 0)
             FROM completions c JOIN habits h ON h.id = c.habit_id
             WHERE c.user_id = ?1
             GROUP BY h.attribute",
        )?;
        let rows = stmt.query_map(params![user_id.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut totals = HashMap::new();
        for row in rows {
            let (attr, xp) = row?;
            totals.insert(parse_attribute(&attr)?, xp);
        }
        Ok(totals)
    }

    /// Active habit count per attribute.
    pub fn attribute_habit_counts(
        &self,
        user_id: Uuid,
    ) -> Result<HashMap<Attribute, u32>, LevelUpError> {
        let mut stmt = self.conn.prepare(
            "SELECT attribute, COUNT(*) FROM habits
             WHERE user_id = ?1 AND is_active = 1
             GROUP BY attribute",
        )?;
        let rows = stmt.query_map(params![user_id.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;
        let mut counts = HashMap::new();
        for row in rows {
            let (attr, n) = row?;
            counts.insert(parse_attribute(&attr)?, n);
        }
        Ok(counts)
    }

    // ------------------------------------------------------------------
    // Daily reset
    // ------------------------------------------------------------------

    /// Roll the daily cycle over.
    ///
    /// `cycle_day` is the day that just ended. Users with at least one
    /// completion on that day extend their streak; everyone else drops to
    /// zero. Completion rows are never purged, they are the all-time
    /// attribute XP history.
    pub fn run_daily_reset(&mut self, cycle_day: NaiveDate) -> Result<usize, LevelUpError> {
        let tx = self.conn.transaction()?;
        let extended = tx.execute(
            "UPDATE profiles SET streak_count = streak_count + 1
             WHERE user_id IN
                 (SELECT DISTINCT user_id FROM completions WHERE completed_date = ?1)",
            params![cycle_day],
        )?;
        tx.execute(
            "UPDATE profiles SET streak_count = 0
             WHERE user_id NOT IN
                 (SELECT DISTINCT user_id FROM completions WHERE completed_date = ?1)",
            params![cycle_day],
        )?;
        tx.execute(
            "UPDATE user_progress SET
                 current_streak = (SELECT streak_count FROM profiles
                                   WHERE profiles.user_id = user_progress.user_id),
                 last_reset_date = ?1",
            params![cycle_day],
        )?;
        tx.execute(
            "UPDATE user_progress SET longest_streak = current_streak
             WHERE current_streak > longest_streak",
            [],
        )?;
        tx.commit()?;
        info!("Daily reset for cycle {} ({} streaks extended)", cycle_day, extended);
        Ok(extended)
    }

    /// Last recorded reset cycle, if any. Used at startup to catch up a
    /// missed boundary.
    pub fn last_reset_date(&self) -> Result<Option<NaiveDate>, LevelUpError> {
        let date: Option<NaiveDate> = self
            .conn
            .query_row(
                "SELECT MAX(last_reset_date) FROM user_progress",
                [],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        Ok(date)
    }

    // ------------------------------------------------------------------
    // Admin procedures
    // ------------------------------------------------------------------

    /// Profiles joined with roles and lifetime progress, for the admin
    /// user table.
    pub fn admin_list_users(&self) -> Result<Vec<AdminUserRow>, LevelUpError> {
        let mut stmt = self.conn.prepare(
            "SELECT p.user_id, p.full_name, p.email, p.current_level, p.current_xp,
                    p.created_at, u.role,
                    COALESCE(g.total_habits_completed, 0), COALESCE(g.current_streak, 0)
             FROM profiles p
             JOIN users u ON u.user_id = p.user_id
             LEFT JOIN user_progress g ON g.user_id = p.user_id
             ORDER BY p.created_at",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, chrono::DateTime<Utc>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, u64>(7)?,
                row.get::<_, u32>(8)?,
            ))
        })?;
        let mut users = Vec::new();
        for row in rows {
            let (id, full_name, email, level, xp, created_at, role, completed, streak) = row?;
            users.push(AdminUserRow {
                user_id: parse_uuid(&id)?,
                full_name,
                email,
                current_level: level,
                current_xp: xp,
                created_at,
                role: parse_role(&role)?,
                total_habits_completed: completed,
                current_streak: streak,
            });
        }
        Ok(users)
    }

    /// Administrative delete: every row belonging to the user, cascading
    /// manually so partial deletes cannot survive.
    pub fn admin_delete_user(&mut self, user_id: Uuid) -> Result<(), LevelUpError> {
        let tx = self.conn.transaction()?;
        let id = user_id.to_string();
        tx.execute("DELETE FROM completions WHERE user_id = ?1", params![id])?;
        tx.execute("DELETE FROM habits WHERE user_id = ?1", params![id])?;
        tx.execute("DELETE FROM user_progress WHERE user_id = ?1", params![id])?;
        tx.execute("DELETE FROM profiles WHERE user_id = ?1", params![id])?;
        let n = tx.execute("DELETE FROM users WHERE user_id = ?1", params![id])?;
        tx.commit()?;
        if n == 0 {
            return Err(LevelUpError::NotFound(format!("user {}", user_id)));
        }
        info!("Deleted user {}", user_id);
        Ok(())
    }

    /// Administrative progress reset: back to XP 0 / level 1 / streak 0,
    /// completion history wiped, habits kept.
    pub fn admin_reset_progress(&mut self, user_id: Uuid) -> Result<(), LevelUpError> {
        let tx = self.conn.transaction()?;
        let id = user_id.to_string();
        tx.execute("DELETE FROM completions WHERE user_id = ?1", params![id])?;
        let n = tx.execute(
            "UPDATE profiles SET current_xp = 0, current_level = 1, streak_count = 0,
                                 last_activity_date = NULL
             WHERE user_id = ?1",
            params![id],
        )?;
        tx.execute(
            "UPDATE user_progress SET total_xp_earned = 0, total_habits_completed = 0,
                                      current_streak = 0, longest_streak = 0,
                                      last_activity_date = NULL
             WHERE user_id = ?1",
            params![id],
        )?;
        tx.commit()?;
        if n == 0 {
            return Err(LevelUpError::NotFound(format!("user {}", user_id)));
        }
        info!("Reset progress for {}", user_id);
        Ok(())
    }
}

/// Apply an XP delta to a profile inside an open transaction: atomic
/// in-SQL increment with the zero clamp, then level re-derivation from the
/// value actually stored.
fn apply_xp(
    tx: &rusqlite::Transaction<'_>,
    user_id: Uuid,
    delta: i64,
    activity_date: NaiveDate,
) -> Result<(), LevelUpError> {
    let n = tx.execute(
        "UPDATE profiles SET current_xp = MAX(0, current_xp + ?1),
                             last_activity_date = ?2
         WHERE user_id = ?3",
        params![delta, activity_date, user_id.to_string()],
    )?;
    if n == 0 {
        return Err(LevelUpError::OnboardingRequired);
    }
    let new_xp: i64 = tx.query_row(
        "SELECT current_xp FROM profiles WHERE user_id = ?1",
        params![user_id.to_string()],
        |row| row.get(0),
    )?;
    tx.execute(
        "UPDATE profiles SET current_level = ?1 WHERE user_id = ?2",
        params![level_for_xp(new_xp), user_id.to_string()],
    )?;
    Ok(())
}

fn insert_habit(
    tx: &rusqlite::Transaction<'_>,
    user_id: Uuid,
    name: &str,
    attribute: Attribute,
    difficulty: Difficulty,
) -> Result<Uuid, LevelUpError> {
    let id = Uuid::new_v4();
    tx.execute(
        "INSERT INTO habits (id, user_id, name, attribute, difficulty, xp_value, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
        params![
            id.to_string(),
            user_id.to_string(),
            name,
            attribute.as_str(),
            difficulty.as_str(),
            difficulty.xp_value(),
            Utc::now()
        ],
    )?;
    Ok(id)
}

fn map_constraint(e: rusqlite::Error, what: &str) -> LevelUpError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            LevelUpError::Conflict(what.to_string())
        }
        _ => LevelUpError::Storage(e.to_string()),
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, LevelUpError> {
    Uuid::parse_str(s).map_err(|e| LevelUpError::Storage(format!("bad uuid '{}': {}", s, e)))
}

fn parse_role(s: &str) -> Result<Role, LevelUpError> {
    Role::parse(s).ok_or_else(|| LevelUpError::Storage(format!("bad role '{}'", s)))
}

fn parse_attribute(s: &str) -> Result<Attribute, LevelUpError> {
    Attribute::parse(s).ok_or_else(|| LevelUpError::Storage(format!("bad attribute '{}'", s)))
}

fn parse_difficulty(s: &str) -> Result<Difficulty, LevelUpError> {
    Difficulty::parse(s).ok_or_else(|| LevelUpError::Storage(format!("bad difficulty '{}'", s)))
}

/// Row shapes as they come out of SQLite, before uuid/enum parsing.
struct RawProfile {
    user_id: String,
    full_name: String,
    email: String,
    current_xp: i64,
    current_level: u32,
    streak_count: u32,
    last_activity_date: Option<NaiveDate>,
    created_at: chrono::DateTime<Utc>,
}

impl RawProfile {
    fn into_profile(self) -> Result<Profile, LevelUpError> {
        Ok(Profile {
            user_id: parse_uuid(&self.user_id)?,
            full_name: self.full_name,
            email: self.email,
            current_xp: self.current_xp,
            current_level: self.current_level,
            streak_count: self.streak_count,
            last_activity_date: self.last_activity_date,
            created_at: self.created_at,
        })
    }
}

struct RawHabit {
    id: String,
    user_id: String,
    name: String,
    attribute: String,
    difficulty: String,
    xp_value: u32,
    is_active: bool,
}

impl RawHabit {
    fn into_habit(self) -> Result<Habit, LevelUpError> {
        Ok(Habit {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            name: self.name,
            attribute: parse_attribute(&self.attribute)?,
            difficulty: parse_difficulty(&self.difficulty)?,
            xp_value: self.xp_value,
            is_active: self.is_active,
        })
    }
}

struct RawCompletion {
    id: String,
    habit_id: String,
    user_id: String,
    completed_date: NaiveDate,
    xp_earned: i64,
}

impl RawCompletion {
    fn into_record(self) -> Result<CompletionRecord, LevelUpError> {
        Ok(CompletionRecord {
            id: parse_uuid(&self.id)?,
            habit_id: parse_uuid(&self.habit_id)?,
            user_id: parse_uuid(&self.user_id)?,
            completed_date: self.completed_date,
            xp_earned: self.xp_earned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(store: &mut Store) -> Uuid {
        let user_id = store.create_user("hunter@example.com", "digest-1").unwrap();
        store
            .onboard(
                user_id,
                "hunter@example.com",
                "Sung Jinwoo",
                &[
                    OnboardingHabit {
                        name: "Read 30 minutes".into(),
                        attribute: Attribute::Brain,
                        difficulty: Difficulty::Easy,
                    },
                    OnboardingHabit {
                        name: "Morning run".into(),
                        attribute: Attribute::Health,
                        difficulty: Difficulty::Hard,
                    },
                ],
            )
            .unwrap();
        user_id
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_onboarding_creates_fresh_profile() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);

        let profile = store.profile(user_id).unwrap();
        assert_eq!(profile.current_xp, 0);
        assert_eq!(profile.current_level, 1);
        assert_eq!(profile.streak_count, 0);
        assert_eq!(store.habits(user_id).unwrap().len(), 2);
    }

    #[test]
    fn test_reonboarding_is_conflict() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);
        let err = store
            .onboard(user_id, "hunter@example.com", "Again", &[])
            .unwrap_err();
        assert!(matches!(err, LevelUpError::Conflict(_)));
    }

    #[test]
    fn test_profile_missing_is_onboarding_required() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = store.create_user("new@example.com", "digest-2").unwrap();
        let err = store.profile(user_id).unwrap_err();
        assert!(matches!(err, LevelUpError::OnboardingRequired));
    }

    #[test]
    fn test_habit_xp_value_derived_from_difficulty() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);
        let habit = store
            .create_habit(user_id, "Meditate", Attribute::Discipline, Difficulty::Medium)
            .unwrap();
        assert_eq!(habit.xp_value, 15);
    }

    #[test]
    fn test_toggle_roundtrip_restores_xp_exactly() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);
        let today = day("2025-03-10");

        for difficulty in [Difficulty::Trivial, Difficulty::Easy, Difficulty::Hard] {
            let habit = store
                .create_habit(user_id, "temp", Attribute::Focus, difficulty)
                .unwrap();
            let before = store.profile(user_id).unwrap().current_xp;

            let on = store.toggle_completion(user_id, habit.id, today).unwrap();
            assert!(on.completed);
            assert_eq!(on.xp_delta, i64::from(difficulty.xp_value()));

            let off = store.toggle_completion(user_id, habit.id, today).unwrap();
            assert!(!off.completed);

            let after = store.profile(user_id).unwrap().current_xp;
            assert_eq!(after, before, "round trip broke for {:?}", difficulty);
        }
    }

    #[test]
    fn test_level_cache_matches_curve_after_mutations() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);
        let habit = store
            .create_habit(user_id, "Grind", Attribute::Skill, Difficulty::Hard)
            .unwrap();

        for i in 0..60 {
            let date = day("2025-01-01") + chrono::Duration::days(i);
            store.toggle_completion(user_id, habit.id, date).unwrap();
            let profile = store.profile(user_id).unwrap();
            assert_eq!(
                profile.current_level,
                level_for_xp(profile.current_xp),
                "level cache drifted at xp={}",
                profile.current_xp
            );
        }
    }

    #[test]
    fn test_five_hard_completions_stay_e_rank() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);
        let habit = store
            .create_habit(user_id, "Train", Attribute::Health, Difficulty::Hard)
            .unwrap();

        for i in 0..5 {
            let date = day("2025-02-01") + chrono::Duration::days(i);
            store.toggle_completion(user_id, habit.id, date).unwrap();
        }

        let profile = store.profile(user_id).unwrap();
        assert_eq!(profile.current_xp, 100);
        assert_eq!(profile.current_level, 1);
        assert_eq!(
            levelup_common::rank_for_level(profile.current_level).label(),
            "E-Rank"
        );
    }

    #[test]
    fn test_same_day_double_completion_is_a_toggle_not_a_dup() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);
        let habit = store
            .create_habit(user_id, "Walk", Attribute::Health, Difficulty::Trivial)
            .unwrap();
        let today = day("2025-03-01");

        store.toggle_completion(user_id, habit.id, today).unwrap();
        store.toggle_completion(user_id, habit.id, today).unwrap();
        assert!(store.completions_on(user_id, today).unwrap().is_empty());
    }

    #[test]
    fn test_attribute_xp_aggregation() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);
        // Two brain habits, easy (+10) and medium (+15), completed once each
        let easy = store
            .create_habit(user_id, "Read", Attribute::Brain, Difficulty::Easy)
            .unwrap();
        let medium = store
            .create_habit(user_id, "Study", Attribute::Brain, Difficulty::Medium)
            .unwrap();
        let today = day("2025-04-01");
        store.toggle_completion(user_id, easy.id, today).unwrap();
        store.toggle_completion(user_id, medium.id, today).unwrap();

        let totals = store.attribute_xp(user_id).unwrap();
        assert_eq!(totals.get(&Attribute::Brain), Some(&25));
        assert_eq!(levelup_common::attribute_level(25), 1);
    }

    #[test]
    fn test_xp_earned_snapshots_survive_habit_deactivation() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);
        let habit = store
            .create_habit(user_id, "Sketch", Attribute::Skill, Difficulty::Easy)
            .unwrap();
        store
            .toggle_completion(user_id, habit.id, day("2025-05-05"))
            .unwrap();
        store.deactivate_habit(user_id, habit.id).unwrap();

        let totals = store.attribute_xp(user_id).unwrap();
        assert_eq!(totals.get(&Attribute::Skill), Some(&10));
        // Inactive habits cannot be toggled
        let err = store
            .toggle_completion(user_id, habit.id, day("2025-05-06"))
            .unwrap_err();
        assert!(matches!(err, LevelUpError::Validation(_)));
    }

    #[test]
    fn test_daily_reset_extends_and_breaks_streaks() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);
        let habit = store
            .create_habit(user_id, "Stretch", Attribute::Health, Difficulty::Trivial)
            .unwrap();

        let day1 = day("2025-06-01");
        store.toggle_completion(user_id, habit.id, day1).unwrap();
        store.run_daily_reset(day1).unwrap();
        assert_eq!(store.profile(user_id).unwrap().streak_count, 1);

        let day2 = day("2025-06-02");
        store.toggle_completion(user_id, habit.id, day2).unwrap();
        store.run_daily_reset(day2).unwrap();
        assert_eq!(store.profile(user_id).unwrap().streak_count, 2);

        // Nothing completed on day 3: streak breaks
        store.run_daily_reset(day("2025-06-03")).unwrap();
        assert_eq!(store.profile(user_id).unwrap().streak_count, 0);
        assert_eq!(store.last_reset_date().unwrap(), Some(day("2025-06-03")));
    }

    #[test]
    fn test_admin_reset_and_delete() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);
        let habit = store
            .create_habit(user_id, "Plan", Attribute::Focus, Difficulty::Hard)
            .unwrap();
        store
            .toggle_completion(user_id, habit.id, day("2025-07-01"))
            .unwrap();

        store.admin_reset_progress(user_id).unwrap();
        let profile = store.profile(user_id).unwrap();
        assert_eq!(profile.current_xp, 0);
        assert_eq!(profile.current_level, 1);
        assert!(store.attribute_xp(user_id).unwrap().is_empty());
        // Habits survive a reset
        assert!(!store.habits(user_id).unwrap().is_empty());

        store.admin_delete_user(user_id).unwrap();
        assert!(matches!(
            store.profile(user_id).unwrap_err(),
            LevelUpError::OnboardingRequired
        ));
        assert!(store.user_by_token_digest("digest-1").unwrap().is_none());
    }

    #[test]
    fn test_admin_list_users_joins_role_and_progress() {
        let mut store = Store::open_in_memory().unwrap();
        let user_id = test_user(&mut store);
        store.set_role(user_id, Role::Admin).unwrap();

        let rows = store.admin_list_users().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, Role::Admin);
        assert_eq!(rows[0].full_name, "Sung Jinwoo");
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let mut store = Store::open_in_memory().unwrap();
        store.create_user("same@example.com", "d1").unwrap();
        let err = store.create_user("same@example.com", "d2").unwrap_err();
        assert!(matches!(err, LevelUpError::Conflict(_)));
    }
}
