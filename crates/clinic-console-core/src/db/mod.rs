//! Local session store.
//!
//! Holds the bearer token (and any other small session values) in a SQLite
//! key/value table so a login survives between runs.

mod schema;
mod session;

pub use schema::*;
pub use session::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Session store errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot prepare session directory: {0}")]
    Io(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Session store connection wrapper.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open the store at path, creating the file and its directory if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> SessionResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        tracing::debug!("Opened session store at {:?}", path);
        Ok(store)
    }

    /// Create in-memory store (for testing).
    pub fn open_in_memory() -> SessionResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> SessionResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let store = SessionStore::open_in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.db");

        let store = SessionStore::open(&path).unwrap();
        store.set_token("abc").unwrap();

        assert!(path.exists());
    }
}
