//! Task persistence using SQLite

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::task::{NewTask, TaskPatch, TaskRecord};
use crate::validate::check_record;
use crate::{Error, Result};

const TASK_COLUMNS: &str = "id, user_id, title, start, end_time, color, done, emoji, date, \
                            weekly, weekly_day, created_at, updated_at";

/// SQLite-based task store.
///
/// Every call is scoped to one user. Tasks of other users behave as missing.
pub struct TaskStore {
    conn: Connection,
}

impl TaskStore {
    /// Create a new task store with the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    /// Create an in-memory task store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT,
                start TEXT NOT NULL,
                end_time TEXT NOT NULL,
                color TEXT NOT NULL,
                done INTEGER NOT NULL DEFAULT 0,
                emoji TEXT,
                date TEXT,
                weekly INTEGER NOT NULL DEFAULT 0,
                weekly_day TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id)",
            [],
        )?;

        Ok(())
    }

    /// All tasks of a user, ordered by date then start time.
    ///
    /// Weekly templates have no date and come after every dated task.
    pub fn list(&self, user_id: &str) -> Result<Vec<TaskRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1
             ORDER BY date IS NULL, date ASC, start ASC, rowid ASC"
        ))?;

        let tasks = stmt.query_map(params![user_id], row_to_task)?;

        let mut result = Vec::new();
        for task in tasks {
            result.push(task?);
        }
        debug!("Listed {} tasks for user {}", result.len(), user_id);
        Ok(result)
    }

    /// Load one task, `None` when missing or owned by someone else
    pub fn get(&self, user_id: &str, id: &str) -> Result<Option<TaskRecord>> {
        let result = self.conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id],
            row_to_task,
        );

        match result {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::from(e)),
        }
    }

    /// Insert a task. Weekly tasks are stored without a date
    pub fn create(&self, user_id: &str, task: NewTask) -> Result<TaskRecord> {
        let now = Utc::now();
        let record = TaskRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: task.title,
            start: task.start,
            end: task.end,
            color: task.color,
            done: task.done,
            emoji: task.emoji.filter(|e| !e.is_empty()),
            date: if task.weekly { None } else { task.date },
            weekly: task.weekly,
            weekly_day: if task.weekly { task.weekly_day } else { None },
            created_at: now,
            updated_at: now,
        };
        check_record(&record)?;

        self.conn.execute(
            &format!(
                "INSERT INTO tasks ({TASK_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                record.id,
                record.user_id,
                record.title,
                record.start,
                record.end,
                record.color,
                record.done,
                record.emoji,
                record.date.map(|d| d.to_string()),
                record.weekly,
                record.weekly_day,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;

        debug!("Created task {} for user {}", record.id, user_id);
        Ok(record)
    }

    /// Merge `patch` over the stored task and persist the result.
    ///
    /// The merged record is validated as a whole, so nothing is written when
    /// the combination is invalid.
    pub fn update(&self, user_id: &str, id: &str, patch: &TaskPatch) -> Result<TaskRecord> {
        let mut record = self
            .get(user_id, id)?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        patch.apply(&mut record);
        check_record(&record)?;
        record.updated_at = Utc::now();

        self.conn.execute(
            "UPDATE tasks SET title = ?1, start = ?2, end_time = ?3, color = ?4, done = ?5,
                emoji = ?6, date = ?7, weekly = ?8, weekly_day = ?9, updated_at = ?10
             WHERE id = ?11 AND user_id = ?12",
            params![
                record.title,
                record.start,
                record.end,
                record.color,
                record.done,
                record.emoji,
                record.date.map(|d| d.to_string()),
                record.weekly,
                record.weekly_day,
                record.updated_at.to_rfc3339(),
                record.id,
                record.user_id,
            ],
        )?;

        debug!("Updated task {} for user {}", id, user_id);
        Ok(record)
    }

    /// Delete a task, failing with `TaskNotFound` when the user has no such task
    pub fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        let affected = self.conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if affected == 0 {
            return Err(Error::TaskNotFound(id.to_string()));
        }
        debug!("Deleted task {} for user {}", id, user_id);
        Ok(())
    }

    /// Count tasks for a user
    pub fn count(&self, user_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    let date = row
        .get::<_, Option<String>>(8)?
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))
        })
        .transpose()?;

    Ok(TaskRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        start: row.get(3)?,
        end: row.get(4)?,
        color: row.get(5)?,
        done: row.get(6)?,
        emoji: row.get(7)?,
        date,
        weekly: row.get(9)?,
        weekly_day: row.get(10)?,
        created_at: parse_timestamp(row, 11)?,
        updated_at: parse_timestamp(row, 12)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
