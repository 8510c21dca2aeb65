use crate::models::{CredentialsRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

pub(crate) const USER_COLUMNS: &str =
    "u.id, u.username, u.display_name, u.bio, u.created_at, u.updated_at";

impl Database {
    // -- Users --

    /// Returns `false` when the username or email is already registered.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        display_name: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (id, username, email, password, display_name) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, username, email, password_hash, display_name),
            ) {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// True when either the username or the email is already registered.
    pub fn user_identity_taken(&self, username: &str, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let taken: bool = conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM users WHERE username = ?1 OR email = ?2)",
                [username, email],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    pub fn get_credentials_by_email(&self, email: &str) -> Result<Option<CredentialsRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, password FROM users WHERE email = ?1",
                    [email],
                    |row| {
                        Ok(CredentialsRow {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            password: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn user_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| user_exists(conn, id))
    }
}

pub(crate) fn user_exists(conn: &Connection, id: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM users WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"))?;

    let row = stmt.query_row([id], user_from_row).optional()?;

    Ok(row)
}

/// Maps a row selected with [`USER_COLUMNS`].
pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        bio: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
