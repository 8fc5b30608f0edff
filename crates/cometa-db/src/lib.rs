//! Storage layer for children, classrooms and schedule exceptions.
//!
//! Provides persistence using `rusqlite` and feeds the resolution engine
//! through [`RosterSource`] and [`ExceptionSource`].
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but not shared without external
//! synchronization.
//!
//! # Schema
//!
//! - Times are TEXT, `HH:MM` or `HH:MM:SS`, exactly as entered.
//! - Dates are TEXT in ISO 8601 (`2024-03-01`), so lexicographic order is
//!   chronological order.
//! - Booleans are INTEGER 0/1. A NULL override means "keep the default".
//!
//! `exceptions` has no unique constraint on `(child_id, date)`. Duplicates are
//! rejected by the engine at resolution time, never resolved silently here.
//!
//! # Read-after-write
//!
//! Every write is read back before it is reported as done. A read-back that
//! does not observe the write is retried according to [`ReadBackPolicy`] and
//! then fails with [`DbError::ReadBackExhausted`].

use std::path::Path;
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, SecondsFormat, Utc};
use cometa_core::{
    ChildId, ChildProfile, ClassroomId, Exception, ExceptionId, ExceptionSource, ResolveError,
    RosterSource, StaffId, TimeOfDay, ValidationError,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use uuid::Uuid;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored value could not be turned into an engine type.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// A stored identifier was empty.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A stored date could not be parsed.
    #[error("invalid date {value:?}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("child not found: {0}")]
    ChildNotFound(ChildId),
    #[error("classroom not found: {0}")]
    ClassroomNotFound(ClassroomId),
    #[error("exception not found: {0}")]
    ExceptionNotFound(ExceptionId),
    /// A write was not observed by its read-back.
    #[error("{what} not visible after {attempts} read-back attempts")]
    ReadBackExhausted { what: String, attempts: u32 },
}

/// Bounded retry for confirming writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadBackPolicy {
    /// Total reads, including the first. Values below 1 are treated as 1.
    pub attempts: u32,
    /// Pause between reads.
    pub backoff: Duration,
}

impl Default for ReadBackPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
    read_back: ReadBackPolicy,
}

/// A classroom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classroom {
    pub id: ClassroomId,
    pub name: String,
}

/// Input for enrolling a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChild {
    pub name: String,
    pub classroom_id: Option<ClassroomId>,
    pub default_in: TimeOfDay,
    pub default_out: TimeOfDay,
    pub bus_morning: bool,
    pub bus_afternoon: bool,
}

/// Input for recording an exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewException {
    pub child_id: ChildId,
    pub date: NaiveDate,
    pub new_in: Option<TimeOfDay>,
    pub new_out: Option<TimeOfDay>,
    pub bus_morning_override: Option<bool>,
    pub bus_afternoon_override: Option<bool>,
    pub absent: bool,
    pub note: Option<String>,
    pub created_by: StaffId,
}

/// Changes to an existing exception.
///
/// The outer `Option` is "touch this field"; for override fields the inner
/// `None` clears the override so the default applies again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionPatch {
    pub new_in: Option<Option<TimeOfDay>>,
    pub new_out: Option<Option<TimeOfDay>>,
    pub bus_morning_override: Option<Option<bool>>,
    pub bus_afternoon_override: Option<Option<bool>>,
    pub absent: Option<bool>,
    pub note: Option<Option<String>>,
}

impl ExceptionPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Returns `exception` with the patch applied.
    pub fn apply(&self, exception: &Exception) -> Exception {
        let mut patched = exception.clone();
        if let Some(new_in) = self.new_in {
            patched.new_in = new_in;
        }
        if let Some(new_out) = self.new_out {
            patched.new_out = new_out;
        }
        if let Some(bus) = self.bus_morning_override {
            patched.bus_morning_override = bus;
        }
        if let Some(bus) = self.bus_afternoon_override {
            patched.bus_afternoon_override = bus;
        }
        if let Some(absent) = self.absent {
            patched.absent = absent;
        }
        if let Some(note) = &self.note {
            patched.note.clone_from(note);
        }
        patched
    }
}

const CHILD_COLUMNS: &str =
    "id, name, classroom_id, default_in, default_out, bus_morning, bus_afternoon, active";

const EXCEPTION_COLUMNS: &str = "id, child_id, date, new_in, new_out, bus_morning_override, \
     bus_afternoon_override, absent, note, created_by";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn,
            read_back: ReadBackPolicy::default(),
        };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            read_back: ReadBackPolicy::default(),
        };
        db.init()?;
        Ok(db)
    }

    /// Replaces the read-back policy used to confirm writes.
    #[must_use]
    pub fn with_read_back(mut self, policy: ReadBackPolicy) -> Self {
        self.read_back = policy;
        self
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS classrooms (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS children (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                classroom_id TEXT,
                default_in TEXT NOT NULL,
                default_out TEXT NOT NULL,
                bus_morning INTEGER NOT NULL DEFAULT 0,
                bus_afternoon INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY (classroom_id) REFERENCES classrooms(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_children_classroom ON children(classroom_id);

            -- One row per recorded change; NULL override columns inherit the default.
            CREATE TABLE IF NOT EXISTS exceptions (
                id TEXT PRIMARY KEY,
                child_id TEXT NOT NULL,
                date TEXT NOT NULL,
                new_in TEXT,
                new_out TEXT,
                bus_morning_override INTEGER,
                bus_afternoon_override INTEGER,
                absent INTEGER NOT NULL DEFAULT 0,
                note TEXT,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (child_id) REFERENCES children(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_exceptions_date ON exceptions(date);
            CREATE INDEX IF NOT EXISTS idx_exceptions_child ON exceptions(child_id);
            ",
        )?;
        Ok(())
    }

    // ========== Classrooms ==========

    /// Adds a classroom with a fresh ID.
    pub fn add_classroom(&mut self, name: &str) -> Result<Classroom, DbError> {
        let id = ClassroomId::new(Uuid::new_v4().to_string())?;
        self.conn.execute(
            "INSERT INTO classrooms (id, name) VALUES (?, ?)",
            params![id.as_str(), name],
        )?;
        tracing::info!(classroom_id = %id, name, "classroom added");
        Ok(Classroom {
            id,
            name: name.to_string(),
        })
    }

    /// Lists classrooms ordered by name.
    pub fn list_classrooms(&self) -> Result<Vec<Classroom>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM classrooms ORDER BY name ASC, id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut classrooms = Vec::new();
        for row in rows {
            let (id, name) = row?;
            classrooms.push(Classroom {
                id: ClassroomId::new(id)?,
                name,
            });
        }
        Ok(classrooms)
    }

    fn classroom_exists(&self, id: &ClassroomId) -> Result<bool, DbError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM classrooms WHERE id = ?",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    // ========== Children ==========

    /// Enrolls a child with a fresh ID.
    pub fn add_child(&mut self, child: NewChild) -> Result<ChildProfile, DbError> {
        if let Some(classroom_id) = &child.classroom_id {
            if !self.classroom_exists(classroom_id)? {
                return Err(DbError::ClassroomNotFound(classroom_id.clone()));
            }
        }

        let id = ChildId::new(Uuid::new_v4().to_string())?;
        self.conn.execute(
            "
            INSERT INTO children
            (id, name, classroom_id, default_in, default_out, bus_morning, bus_afternoon, active)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1)
            ",
            params![
                id.as_str(),
                child.name,
                child.classroom_id.as_ref().map(ClassroomId::as_str),
                child.default_in.to_string(),
                child.default_out.to_string(),
                child.bus_morning,
                child.bus_afternoon,
            ],
        )?;
        tracing::info!(child_id = %id, name = %child.name, "child added");

        self.confirm("child", |db| db.find_child(&id))
    }

    /// Looks up a child by ID, active or not.
    pub fn find_child(&self, id: &ChildId) -> Result<Option<ChildProfile>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {CHILD_COLUMNS} FROM children WHERE id = ?"),
                [id.as_str()],
                ChildRow::from_row,
            )
            .optional()?;
        row.map(ChildRow::into_profile).transpose()
    }

    /// Lists children ordered by name, optionally including inactive ones.
    pub fn list_children(&self, include_inactive: bool) -> Result<Vec<ChildProfile>, DbError> {
        let sql = if include_inactive {
            format!("SELECT {CHILD_COLUMNS} FROM children ORDER BY name ASC, id ASC")
        } else {
            format!("SELECT {CHILD_COLUMNS} FROM children WHERE active = 1 ORDER BY name ASC, id ASC")
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], ChildRow::from_row)?;
        let mut children = Vec::new();
        for row in rows {
            children.push(row?.into_profile()?);
        }
        Ok(children)
    }

    /// Marks a child inactive. Their exceptions are kept.
    pub fn deactivate_child(&mut self, id: &ChildId) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE children SET active = 0 WHERE id = ?",
            [id.as_str()],
        )?;
        if updated == 0 {
            return Err(DbError::ChildNotFound(id.clone()));
        }
        tracing::info!(child_id = %id, "child deactivated");

        self.confirm("child deactivation", |db| {
            Ok(db.find_child(id)?.filter(|child| !child.active).map(|_| ()))
        })
    }

    // ========== Exceptions ==========

    /// Records an exception for a child and date.
    ///
    /// This does not check for an existing exception on the same date; callers
    /// that want to reject duplicates should look first.
    pub fn create_exception(&mut self, input: NewException) -> Result<Exception, DbError> {
        if self.find_child(&input.child_id)?.is_none() {
            return Err(DbError::ChildNotFound(input.child_id));
        }

        let id = ExceptionId::new(Uuid::new_v4().to_string())?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.conn.execute(
            "
            INSERT INTO exceptions
            (id, child_id, date, new_in, new_out, bus_morning_override, bus_afternoon_override,
             absent, note, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                id.as_str(),
                input.child_id.as_str(),
                format_date(input.date),
                input.new_in.map(|t| t.to_string()),
                input.new_out.map(|t| t.to_string()),
                input.bus_morning_override,
                input.bus_afternoon_override,
                input.absent,
                input.note,
                input.created_by.as_str(),
                created_at,
            ],
        )?;
        tracing::info!(
            exception_id = %id,
            child_id = %input.child_id,
            date = %input.date,
            created_by = %input.created_by,
            "exception created"
        );

        self.confirm("exception", |db| db.find_exception(&id))
    }

    /// Applies `patch` to an exception and returns the stored result.
    pub fn update_exception(
        &mut self,
        id: &ExceptionId,
        patch: &ExceptionPatch,
    ) -> Result<Exception, DbError> {
        let tx = self.conn.transaction()?;
        let current = tx
            .query_row(
                &format!("SELECT {EXCEPTION_COLUMNS} FROM exceptions WHERE id = ?"),
                [id.as_str()],
                ExceptionRow::from_row,
            )
            .optional()?
            .ok_or_else(|| DbError::ExceptionNotFound(id.clone()))?
            .into_exception()?;

        let expected = patch.apply(&current);
        tx.execute(
            "
            UPDATE exceptions SET
                new_in = ?, new_out = ?, bus_morning_override = ?, bus_afternoon_override = ?,
                absent = ?, note = ?
            WHERE id = ?
            ",
            params![
                expected.new_in.map(|t| t.to_string()),
                expected.new_out.map(|t| t.to_string()),
                expected.bus_morning_override,
                expected.bus_afternoon_override,
                expected.absent,
                expected.note,
                id.as_str(),
            ],
        )?;
        tx.commit()?;
        tracing::info!(exception_id = %id, "exception updated");

        self.confirm("exception update", |db| {
            Ok(db.find_exception(id)?.filter(|stored| stored == &expected))
        })
    }

    /// Deletes an exception, reverting the child to defaults for that date.
    pub fn delete_exception(&mut self, id: &ExceptionId) -> Result<(), DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM exceptions WHERE id = ?", [id.as_str()])?;
        if deleted == 0 {
            return Err(DbError::ExceptionNotFound(id.clone()));
        }
        tracing::info!(exception_id = %id, "exception deleted");

        self.confirm("exception deletion", |db| {
            Ok(db.find_exception(id)?.is_none().then_some(()))
        })
    }

    /// Looks up an exception by ID.
    pub fn find_exception(&self, id: &ExceptionId) -> Result<Option<Exception>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {EXCEPTION_COLUMNS} FROM exceptions WHERE id = ?"),
                [id.as_str()],
                ExceptionRow::from_row,
            )
            .optional()?;
        row.map(ExceptionRow::into_exception).transpose()
    }

    /// Lists exceptions recorded for `date`, oldest first.
    pub fn list_exceptions_for_date(&self, date: NaiveDate) -> Result<Vec<Exception>, DbError> {
        self.query_exceptions(
            &format!(
                "SELECT {EXCEPTION_COLUMNS} FROM exceptions WHERE date = ?1 \
                 ORDER BY created_at ASC, id ASC"
            ),
            &[&format_date(date)],
        )
    }

    /// Lists exceptions for one child, most recent date first.
    pub fn list_exceptions_for_child(&self, child_id: &ChildId) -> Result<Vec<Exception>, DbError> {
        self.query_exceptions(
            &format!(
                "SELECT {EXCEPTION_COLUMNS} FROM exceptions WHERE child_id = ?1 \
                 ORDER BY date DESC, created_at DESC, id ASC"
            ),
            &[&child_id.as_str()],
        )
    }

    /// Lists exceptions with `start <= date <= end`.
    pub fn list_exceptions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Exception>, DbError> {
        if end < start {
            return Ok(Vec::new());
        }
        self.query_exceptions(
            &format!(
                "SELECT {EXCEPTION_COLUMNS} FROM exceptions WHERE date >= ?1 AND date <= ?2 \
                 ORDER BY date ASC, created_at ASC, id ASC"
            ),
            &[&format_date(start), &format_date(end)],
        )
    }

    fn query_exceptions(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Exception>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, ExceptionRow::from_row)?;
        let mut exceptions = Vec::new();
        for row in rows {
            exceptions.push(row?.into_exception()?);
        }
        Ok(exceptions)
    }

    /// Reads back a write until `probe` observes it or the policy runs out.
    fn confirm<T>(
        &self,
        what: &str,
        mut probe: impl FnMut(&Self) -> Result<Option<T>, DbError>,
    ) -> Result<T, DbError> {
        let attempts = self.read_back.attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(value) = probe(self)? {
                return Ok(value);
            }
            tracing::debug!(what, attempt, attempts, "write not visible yet");
            if attempt < attempts {
                thread::sleep(self.read_back.backoff);
            }
        }
        tracing::warn!(what, attempts, "read-back exhausted");
        Err(DbError::ReadBackExhausted {
            what: what.to_string(),
            attempts,
        })
    }
}

impl RosterSource for Database {
    type Error = DbError;

    fn active_children(&self) -> Result<Vec<ChildProfile>, Self::Error> {
        self.list_children(false)
    }
}

impl ExceptionSource for Database {
    type Error = DbError;

    fn exceptions_for_date(&self, date: NaiveDate) -> Result<Vec<Exception>, Self::Error> {
        self.list_exceptions_for_date(date)
    }
}

/// Raw `children` row before validation.
struct ChildRow {
    id: String,
    name: String,
    classroom_id: Option<String>,
    default_in: String,
    default_out: String,
    bus_morning: bool,
    bus_afternoon: bool,
    active: bool,
}

impl ChildRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            classroom_id: row.get(2)?,
            default_in: row.get(3)?,
            default_out: row.get(4)?,
            bus_morning: row.get(5)?,
            bus_afternoon: row.get(6)?,
            active: row.get(7)?,
        })
    }

    fn into_profile(self) -> Result<ChildProfile, DbError> {
        Ok(ChildProfile {
            id: ChildId::new(self.id)?,
            name: self.name,
            classroom_id: self.classroom_id.map(ClassroomId::new).transpose()?,
            default_in: TimeOfDay::parse("default_in", &self.default_in)?,
            default_out: TimeOfDay::parse("default_out", &self.default_out)?,
            bus_morning_default: self.bus_morning,
            bus_afternoon_default: self.bus_afternoon,
            active: self.active,
        })
    }
}

/// Raw `exceptions` row before validation.
struct ExceptionRow {
    id: String,
    child_id: String,
    date: String,
    new_in: Option<String>,
    new_out: Option<String>,
    bus_morning_override: Option<bool>,
    bus_afternoon_override: Option<bool>,
    absent: bool,
    note: Option<String>,
    created_by: String,
}

impl ExceptionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            child_id: row.get(1)?,
            date: row.get(2)?,
            new_in: row.get(3)?,
            new_out: row.get(4)?,
            bus_morning_override: row.get(5)?,
            bus_afternoon_override: row.get(6)?,
            absent: row.get(7)?,
            note: row.get(8)?,
            created_by: row.get(9)?,
        })
    }

    fn into_exception(self) -> Result<Exception, DbError> {
        Ok(Exception {
            id: ExceptionId::new(self.id)?,
            child_id: ChildId::new(self.child_id)?,
            date: parse_date(&self.date)?,
            new_in: self
                .new_in
                .map(|t| TimeOfDay::parse("new_in", &t))
                .transpose()?,
            new_out: self
                .new_out
                .map(|t| TimeOfDay::parse("new_out", &t))
                .transpose()?,
            bus_morning_override: self.bus_morning_override,
            bus_afternoon_override: self.bus_afternoon_override,
            absent: self.absent,
            note: self.note,
            created_by: StaffId::new(self.created_by)?,
        })
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| DbError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashSet;

    use cometa_core::{Category, Locale, load_day_view};

    use super::*;

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert!(db.list_children(true).unwrap().is_empty());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(table_columns(&db.conn, "classrooms"), vec!["id", "name"]);
        assert_eq!(
            table_columns(&db.conn, "children"),
            vec![
                "id",
                "name",
                "classroom_id",
                "default_in",
                "default_out",
                "bus_morning",
                "bus_afternoon",
                "active",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "exceptions"),
            vec![
                "id",
                "child_id",
                "date",
                "new_in",
                "new_out",
                "bus_morning_override",
                "bus_afternoon_override",
                "absent",
                "note",
                "created_by",
                "created_at",
            ]
        );

        let indexes = index_names(&db.conn, "exceptions");
        assert!(indexes.contains("idx_exceptions_date"));
        assert!(indexes.contains("idx_exceptions_child"));
    }

    #[test]
    fn init_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cometa.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.add_classroom("Girasoles").unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_classrooms().unwrap().len(), 1);
    }

    #[test]
    fn add_child_requires_known_classroom() {
        let mut db = Database::open_in_memory().unwrap();
        let mut child = new_child("Lucía", None);
        child.classroom_id = Some(ClassroomId::new("missing").unwrap());

        let err = db.add_child(child).unwrap_err();
        assert!(matches!(err, DbError::ClassroomNotFound(_)));
    }

    #[test]
    fn children_round_trip_with_seconds_preserved() {
        let mut db = Database::open_in_memory().unwrap();
        let classroom = db.add_classroom("Girasoles").unwrap();
        let mut child = new_child("Lucía", Some(classroom.id.clone()));
        child.default_in = TimeOfDay::parse("default_in", "08:00:00").unwrap();

        let stored = db.add_child(child).unwrap();
        let found = db.find_child(&stored.id).unwrap().unwrap();
        assert_eq!(found, stored);
        assert_eq!(found.default_in.to_string(), "08:00:00");
        assert_eq!(found.classroom_id, Some(classroom.id));
        assert!(found.active);
    }

    #[test]
    fn deactivated_children_leave_the_active_roster() {
        let mut db = Database::open_in_memory().unwrap();
        let lucia = db.add_child(new_child("Lucía", None)).unwrap();
        let mateo = db.add_child(new_child("Mateo", None)).unwrap();

        db.deactivate_child(&mateo.id).unwrap();

        let active: Vec<ChildId> = db
            .active_children()
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(active, vec![lucia.id]);
        assert_eq!(db.list_children(true).unwrap().len(), 2);

        let missing = ChildId::new("nope").unwrap();
        assert!(matches!(
            db.deactivate_child(&missing),
            Err(DbError::ChildNotFound(_))
        ));
    }

    #[test]
    fn create_exception_round_trips() {
        let mut db = Database::open_in_memory().unwrap();
        let child = db.add_child(new_child("Lucía", None)).unwrap();

        let mut input = new_exception(&child.id, "2024-03-01");
        input.new_in = Some(TimeOfDay::parse("new_in", "08:30").unwrap());
        input.bus_afternoon_override = Some(true);
        input.note = Some("recoge la abuela".to_string());

        let created = db.create_exception(input).unwrap();
        assert_eq!(created.new_in.unwrap().to_string(), "08:30");
        assert_eq!(created.new_out, None);
        assert_eq!(created.bus_morning_override, None);
        assert_eq!(created.bus_afternoon_override, Some(true));
        assert_eq!(created.created_by.as_str(), "staff-1");

        let for_date = db.exceptions_for_date(date("2024-03-01")).unwrap();
        assert_eq!(for_date, vec![created.clone()]);
        assert!(db.exceptions_for_date(date("2024-03-02")).unwrap().is_empty());
    }

    #[test]
    fn create_exception_for_unknown_child_fails() {
        let mut db = Database::open_in_memory().unwrap();
        let ghost = ChildId::new("ghost").unwrap();

        let err = db.create_exception(new_exception(&ghost, "2024-03-01")).unwrap_err();
        assert!(matches!(err, DbError::ChildNotFound(_)));
    }

    #[test]
    fn update_exception_applies_only_patched_fields() {
        let mut db = Database::open_in_memory().unwrap();
        let child = db.add_child(new_child("Lucía", None)).unwrap();
        let mut input = new_exception(&child.id, "2024-03-01");
        input.new_in = Some(TimeOfDay::parse("new_in", "08:30").unwrap());
        input.note = Some("dentista".to_string());
        let created = db.create_exception(input).unwrap();

        let patch = ExceptionPatch {
            new_out: Some(Some(TimeOfDay::parse("new_out", "15:00").unwrap())),
            note: Some(None),
            ..ExceptionPatch::default()
        };
        let updated = db.update_exception(&created.id, &patch).unwrap();

        assert_eq!(updated.new_in, created.new_in);
        assert_eq!(updated.new_out.unwrap().to_string(), "15:00");
        assert_eq!(updated.note, None);
        assert_eq!(db.find_exception(&created.id).unwrap(), Some(updated));
    }

    #[test]
    fn update_missing_exception_fails() {
        let mut db = Database::open_in_memory().unwrap();
        let missing = ExceptionId::new("missing").unwrap();

        let err = db
            .update_exception(&missing, &ExceptionPatch::default())
            .unwrap_err();
        assert!(matches!(err, DbError::ExceptionNotFound(_)));
    }

    #[test]
    fn delete_exception_reverts_to_default() {
        let mut db = Database::open_in_memory().unwrap();
        let child = db.add_child(new_child("Lucía", None)).unwrap();
        let mut input = new_exception(&child.id, "2024-03-01");
        input.absent = true;
        let created = db.create_exception(input).unwrap();

        let view = load_day_view(&db, date("2024-03-01"), Locale::En).unwrap();
        assert_eq!(view[0].classification.category, Category::Absent);

        db.delete_exception(&created.id).unwrap();

        let view = load_day_view(&db, date("2024-03-01"), Locale::En).unwrap();
        assert_eq!(view[0].classification.category, Category::Unchanged);
        assert!(matches!(
            db.delete_exception(&created.id),
            Err(DbError::ExceptionNotFound(_))
        ));
    }

    #[test]
    fn duplicate_rows_surface_as_engine_error() {
        let mut db = Database::open_in_memory().unwrap();
        let child = db.add_child(new_child("Lucía", None)).unwrap();
        db.create_exception(new_exception(&child.id, "2024-03-01")).unwrap();
        db.create_exception(new_exception(&child.id, "2024-03-01")).unwrap();

        let err = load_day_view(&db, date("2024-03-01"), Locale::En).unwrap_err();
        assert!(matches!(
            err,
            DbError::Resolve(ResolveError::MultipleExceptions { .. })
        ));
    }

    #[test]
    fn exceptions_for_child_and_range() {
        let mut db = Database::open_in_memory().unwrap();
        let lucia = db.add_child(new_child("Lucía", None)).unwrap();
        let mateo = db.add_child(new_child("Mateo", None)).unwrap();
        for day in ["2024-03-01", "2024-03-04", "2024-03-08"] {
            db.create_exception(new_exception(&lucia.id, day)).unwrap();
        }
        db.create_exception(new_exception(&mateo.id, "2024-03-05")).unwrap();

        let history: Vec<NaiveDate> = db
            .list_exceptions_for_child(&lucia.id)
            .unwrap()
            .into_iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(
            history,
            vec![date("2024-03-08"), date("2024-03-04"), date("2024-03-01")]
        );

        let week: Vec<NaiveDate> = db
            .list_exceptions_between(date("2024-03-04"), date("2024-03-08"))
            .unwrap()
            .into_iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(
            week,
            vec![date("2024-03-04"), date("2024-03-05"), date("2024-03-08")]
        );
        assert!(
            db.list_exceptions_between(date("2024-03-08"), date("2024-03-04"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn malformed_stored_time_names_the_column() {
        let mut db = Database::open_in_memory().unwrap();
        let child = db.add_child(new_child("Lucía", None)).unwrap();
        db.conn
            .execute(
                "UPDATE children SET default_out = 'five pm' WHERE id = ?",
                [child.id.as_str()],
            )
            .unwrap();

        let err = db.list_children(false).unwrap_err();
        assert!(matches!(
            err,
            DbError::Resolve(ResolveError::InvalidTimeFormat {
                field: "default_out",
                ..
            })
        ));
    }

    #[test]
    fn confirm_retries_until_visible() {
        let db = Database::open_in_memory().unwrap().with_read_back(ReadBackPolicy {
            attempts: 3,
            backoff: Duration::ZERO,
        });
        let calls = Cell::new(0);

        let value = db
            .confirm("probe", |_| {
                calls.set(calls.get() + 1);
                Ok((calls.get() == 2).then_some(42))
            })
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn confirm_gives_up_after_policy_attempts() {
        let db = Database::open_in_memory().unwrap().with_read_back(ReadBackPolicy {
            attempts: 2,
            backoff: Duration::ZERO,
        });
        let calls = Cell::new(0);

        let err = db
            .confirm("probe", |_| {
                calls.set(calls.get() + 1);
                Ok(None::<()>)
            })
            .unwrap_err();
        assert_eq!(calls.get(), 2);
        assert_eq!(
            err.to_string(),
            "probe not visible after 2 read-back attempts"
        );
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("column name")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index name")).collect()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn new_child(name: &str, classroom_id: Option<ClassroomId>) -> NewChild {
        NewChild {
            name: name.to_string(),
            classroom_id,
            default_in: TimeOfDay::parse("default_in", "08:00").unwrap(),
            default_out: TimeOfDay::parse("default_out", "17:00").unwrap(),
            bus_morning: false,
            bus_afternoon: false,
        }
    }

    fn new_exception(child_id: &ChildId, on: &str) -> NewException {
        NewException {
            child_id: child_id.clone(),
            date: date(on),
            new_in: None,
            new_out: None,
            bus_morning_override: None,
            bus_afternoon_override: None,
            absent: false,
            note: None,
            created_by: StaffId::new("staff-1").unwrap(),
        }
    }
}
