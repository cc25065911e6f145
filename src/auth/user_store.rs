//! User Storage
//! Mission: Keep credential records behind key lookup and predicate search

use crate::auth::models::{Role, UserRecord};
use parking_lot::Mutex;
use rusqlite::{params, types::Type, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Username or email already held by another record
    #[error("user already exists")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Persistent record store consulted by the auth layer.
///
/// Writes are whole-record: `save` replaces every column, so two concurrent
/// read/modify/write cycles on the same record resolve as last-writer-wins.
pub trait UserRepository: Send + Sync {
    fn find_by_id(&self, id: &Uuid) -> Result<Option<UserRecord>, StoreError>;
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
    /// Any record whose username OR email matches
    fn find_conflicting(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, StoreError>;
    fn insert(&self, record: &UserRecord) -> Result<(), StoreError>;
    fn save(&self, record: &UserRecord) -> Result<(), StoreError>;
    fn delete(&self, id: &Uuid) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<UserRecord>, StoreError>;
    /// Case-insensitive substring match on username or email
    fn search(&self, query: &str) -> Result<Vec<UserRecord>, StoreError>;
}

const SELECT_COLUMNS: &str =
    "SELECT id, username, email, password_hash, role, profile_image, created_at FROM users";

/// User storage with SQLite backend
pub struct UserStore {
    conn: Mutex<Connection>,
}

impl UserStore {
    /// Open (or create) the store at `path` and initialize the schema
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open(path)?),
        };
        store.init_db()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                profile_image TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        debug!("User store schema ready");
        Ok(())
    }

    fn query_one(
        &self,
        clause: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.conn.lock();
        let sql = format!("{SELECT_COLUMNS} WHERE {clause} LIMIT 1");
        let record = conn
            .query_row(&sql, args, row_to_record)
            .optional()?;
        Ok(record)
    }

    fn query_many(
        &self,
        clause: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<UserRecord>, StoreError> {
        let conn = self.conn.lock();
        let sql = format!("{SELECT_COLUMNS} {clause} ORDER BY rowid");
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(args, row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl UserRepository for UserStore {
    fn find_by_id(&self, id: &Uuid) -> Result<Option<UserRecord>, StoreError> {
        self.query_one("id = ?1", &[&id.to_string()])
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.query_one("email = ?1", &[&email])
    }

    fn find_conflicting(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.query_one("username = ?1 OR email = ?2", &[&username, &email])
    }

    fn insert(&self, record: &UserRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, role, profile_image, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.to_string(),
                record.username,
                record.email,
                record.password_hash,
                record.role.as_str(),
                record.profile_image,
                record.created_at,
            ],
        )
        .map_err(map_constraint)?;

        info!(user_id = %record.id, role = record.role.as_str(), "Created user record");
        Ok(())
    }

    fn save(&self, record: &UserRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE users
                 SET username = ?2, email = ?3, password_hash = ?4, role = ?5, profile_image = ?6
                 WHERE id = ?1",
                params![
                    record.id.to_string(),
                    record.username,
                    record.email,
                    record.password_hash,
                    record.role.as_str(),
                    record.profile_image,
                ],
            )
            .map_err(map_constraint)?;

        if rows == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: &Uuid) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;

        if rows == 0 {
            return Err(StoreError::NotFound);
        }

        info!(user_id = %id, "Deleted user record");
        Ok(())
    }

    fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        self.query_many("", &[])
    }

    fn search(&self, query: &str) -> Result<Vec<UserRecord>, StoreError> {
        // instr keeps % and _ in the query literal
        self.query_many(
            "WHERE instr(lower(username), lower(?1)) > 0 OR instr(lower(email), lower(?1)) > 0",
            &[&query],
        )
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
    let role: String = row.get(4)?;

    Ok(UserRecord {
        id,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::parse(&role).unwrap_or(Role::User),
        profile_image: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_constraint(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::Conflict
        }
        other => StoreError::Database(other),
    }
}
