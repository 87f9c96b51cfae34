//! User persistence using SQLite

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, Row, params};
use tracing::debug;

use crate::auth::User;
use crate::{Error, Result};

/// SQLite-based user store
pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    /// Create a new user store with the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    /// Create an in-memory user store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                login TEXT NOT NULL UNIQUE,
                name TEXT,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Insert a user, failing with `LoginTaken` when the login exists
    pub fn create(&self, login: &str, name: Option<&str>, password_hash: &str) -> Result<User> {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            login: login.to_string(),
            name: name.map(str::to_string),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        let result = self.conn.execute(
            "INSERT INTO users (id, login, name, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                user.login,
                user.name,
                user.password_hash,
                user.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {
                debug!("Created user {} ({})", user.login, user.id);
                Ok(user)
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(Error::LoginTaken(login.to_string()))
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    /// Load a user by ID
    pub fn get(&self, id: &str) -> Result<Option<User>> {
        self.query_one(
            "SELECT id, login, name, password_hash, created_at FROM users WHERE id = ?1",
            id,
        )
    }

    /// Load a user by login
    pub fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        self.query_one(
            "SELECT id, login, name, password_hash, created_at FROM users WHERE login = ?1",
            login,
        )
    }

    fn query_one(&self, sql: &str, key: &str) -> Result<Option<User>> {
        match self.conn.query_row(sql, params![key], row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::from(e)),
        }
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(4)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(User {
        id: row.get(0)?,
        login: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        created_at,
    })
}
