use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::error::{BoardError, BoardResult};
use crate::models::{Session, User};

/// Stored credentials: one row, written on login and removed on logout.
pub struct SessionStore {
    conn: Connection,
    path: PathBuf,
}

impl SessionStore {
    pub fn open_at(path: &Path) -> BoardResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BoardError::Session(format!("cannot create {}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn, path: path.to_path_buf() };
        store.init()?;
        Ok(store)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> BoardResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobdesk") {
            proj_dirs.data_dir().join("session.db")
        } else {
            PathBuf::from("jobdesk-session.db")
        }
    }

    fn init(&self) -> BoardResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                token TEXT NOT NULL,
                user_json TEXT NOT NULL,
                stored_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn set(&self, session: &Session) -> BoardResult<()> {
        let user_json = serde_json::to_string(&session.user)?;
        self.conn.execute(
            "INSERT INTO session (id, token, user_json, stored_at) VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                token = excluded.token,
                user_json = excluded.user_json,
                stored_at = excluded.stored_at",
            params![session.token, user_json, session.stored_at.to_rfc3339()],
        )?;
        tracing::debug!(user = %session.user.email, "session stored");
        Ok(())
    }

    pub fn get(&self) -> BoardResult<Option<Session>> {
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT token, user_json, stored_at FROM session WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((token, user_json, stored_at)) = row else {
            return Ok(None);
        };
        let user: User = serde_json::from_str(&user_json)?;
        let stored_at = chrono::DateTime::parse_from_rfc3339(&stored_at)
            .map_err(|e| BoardError::Session(format!("bad stored_at '{}': {}", stored_at, e)))?
            .with_timezone(&chrono::Utc);
        Ok(Some(Session { token, user, stored_at }))
    }

    /// Returns whether a session was present.
    pub fn clear(&self) -> BoardResult<bool> {
        let removed = self.conn.execute("DELETE FROM session", [])?;
        Ok(removed > 0)
    }

    pub fn token(&self) -> BoardResult<Option<String>> {
        Ok(self.get()?.map(|s| s.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::{TimeZone, Utc};

    fn session(token: &str) -> Session {
        Session {
            token: token.to_string(),
            user: User {
                id: "u1".to_string(),
                email: "otieno@example.com".to_string(),
                role: Role::Employer,
                first_name: "Otieno".to_string(),
                last_name: "Ouma".to_string(),
                phone: None,
                location: Some("Kisumu".to_string()),
                company: Some("Lakeside Logistics".to_string()),
            },
            stored_at: Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_store_has_no_session() {
        let store = SessionStore::open_in_memory().unwrap();
        assert_eq!(store.get().unwrap(), None);
        assert_eq!(store.token().unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let store = SessionStore::open_in_memory().unwrap();
        store.set(&session("tok-1")).unwrap();
        assert_eq!(store.get().unwrap(), Some(session("tok-1")));
    }

    #[test]
    fn test_set_replaces_previous_session() {
        let store = SessionStore::open_in_memory().unwrap();
        store.set(&session("tok-1")).unwrap();
        store.set(&session("tok-2")).unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("tok-2"));
    }

    #[test]
    fn test_clear() {
        let store = SessionStore::open_in_memory().unwrap();
        assert!(!store.clear().unwrap());
        store.set(&session("tok-1")).unwrap();
        assert!(store.clear().unwrap());
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_open_at_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("jobdesk-session-test-{}", std::process::id()));
        let path = dir.join("nested").join("session.db");
        {
            let store = SessionStore::open_at(&path).unwrap();
            store.set(&session("tok-file")).unwrap();
        }
        let reopened = SessionStore::open_at(&path).unwrap();
        assert_eq!(reopened.token().unwrap().as_deref(), Some("tok-file"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
