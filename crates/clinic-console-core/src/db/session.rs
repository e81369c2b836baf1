//! Key/value session operations.

use rusqlite::{params, OptionalExtension};

use super::{SessionResult, SessionStore};

/// Fixed key under which the bearer token is stored.
pub const TOKEN_KEY: &str = "token";

/// Email of the last successful login, offered as the default next time.
pub const LAST_EMAIL_KEY: &str = "last_email";

impl SessionStore {
    /// Get a session value.
    pub fn get(&self, key: &str) -> SessionResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM session_state WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Set a session value, replacing any previous one.
    pub fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session_state (key, value, updated_at) VALUES (?, ?, datetime('now'))",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a session value. Returns whether anything was removed.
    pub fn remove(&self, key: &str) -> SessionResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM session_state WHERE key = ?", [key])?;
        Ok(rows_affected > 0)
    }

    /// Current bearer token, if logged in.
    pub fn token(&self) -> SessionResult<Option<String>> {
        Ok(self.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    pub fn set_token(&self, token: &str) -> SessionResult<()> {
        self.set(TOKEN_KEY, token)
    }

    /// Drop the bearer token (logout or rejected session).
    pub fn clear_token(&self) -> SessionResult<bool> {
        self.remove(TOKEN_KEY)
    }
}
