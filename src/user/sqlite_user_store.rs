use super::auth::{AuthToken, AuthTokenValue, CredentialsHasher, PasswordCredentials};
use super::models::{User, UserRole};
use super::user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
use crate::membership::Tier;
use crate::sqlite_persistence::{open_versioned, validate_columns, Table, VersionedSchema};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

const USER_TABLE_V_0: Table = Table {
    name: "user",
    schema: "CREATE TABLE user (id INTEGER UNIQUE, name TEXT NOT NULL, email TEXT NOT NULL UNIQUE, membership_tier TEXT NOT NULL DEFAULT 'free', role TEXT NOT NULL DEFAULT 'member', created INTEGER DEFAULT (cast(strftime('%s','now') as int)), PRIMARY KEY (id));",
    indices: &["CREATE INDEX user_email_index ON user (email);"],
};
const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    schema: "CREATE TABLE auth_token (user_id INTEGER NOT NULL, value TEXT NOT NULL UNIQUE, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), last_used INTEGER, CONSTRAINT user_id FOREIGN KEY (user_id) REFERENCES user (id) ON DELETE CASCADE);",
    indices: &["CREATE INDEX auth_token_value_index ON auth_token (value);"],
};
const PASSWORD_CREDENTIALS_TABLE_V_0: Table = Table {
    name: "user_password_credentials",
    schema: "CREATE TABLE user_password_credentials (user_id INTEGER NOT NULL UNIQUE, salt TEXT NOT NULL, hash TEXT NOT NULL, hasher TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), last_tried INTEGER, last_used INTEGER, CONSTRAINT user_id FOREIGN KEY (user_id) REFERENCES user (id) ON DELETE CASCADE);",
    indices: &[],
};

fn validate_schema_0(conn: &Connection) -> Result<()> {
    validate_columns(
        conn,
        "user",
        &["id", "name", "email", "membership_tier", "role", "created"],
    )?;
    validate_columns(
        conn,
        "auth_token",
        &["user_id", "value", "created", "last_used"],
    )?;
    validate_columns(
        conn,
        "user_password_credentials",
        &["user_id", "salt", "hash", "hasher"],
    )
}

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE_V_0,
        AUTH_TOKEN_TABLE_V_0,
        PASSWORD_CREDENTIALS_TABLE_V_0,
    ],
    migration: None,
    validate: validate_schema_0,
}];

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

fn system_time_from_column_result(value: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(value as u64)
}

fn datetime_from_column_result(value: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(value, 0).unwrap_or_default()
}

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        membership_tier: Tier::parse_or_free(&row.get::<usize, String>(3)?),
        role: UserRole::parse_or_member(&row.get::<usize, String>(4)?),
        created_at: datetime_from_column_result(row.get(5)?),
    })
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, name: &str, email: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user (name, email) VALUES (?1, ?2)",
            params![name, email],
        )
        .with_context(|| format!("Failed to create user {}", email))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user(&self, user_id: usize) -> Option<User> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, name, email, membership_tier, role, created FROM user WHERE id = ?1")
            .ok()?;
        stmt.query_row(params![user_id], user_from_row).ok()
    }

    fn get_user_by_email(&self, email: &str) -> Option<User> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, name, email, membership_tier, role, created FROM user WHERE email = ?1",
            )
            .ok()?;
        stmt.query_row(params![email], user_from_row).ok()
    }

    fn set_membership_tier(&self, user_id: usize, tier: Tier) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE user SET membership_tier = ?1 WHERE id = ?2",
            params![tier.as_str(), user_id],
        )?;
        if updated == 0 {
            anyhow::bail!("No user with id {}", user_id);
        }
        Ok(())
    }

    fn set_role(&self, user_id: usize, role: UserRole) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE user SET role = ?1 WHERE id = ?2",
            params![role.as_str(), user_id],
        )?;
        if updated == 0 {
            anyhow::bail!("No user with id {}", user_id);
        }
        Ok(())
    }

    fn count_users(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_users_by_tier(&self) -> Result<HashMap<Tier, usize>> {
        let conn = self.conn.lock().unwrap();
        let mut counts: HashMap<Tier, usize> = Tier::ALL.iter().map(|t| (*t, 0)).collect();
        let mut stmt =
            conn.prepare("SELECT membership_tier, COUNT(*) FROM user GROUP BY membership_tier")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<usize, String>(0)?, row.get::<usize, i64>(1)?))
        })?;
        for row in rows {
            let (tier, count) = row?;
            *counts.entry(Tier::parse_or_free(&tier)).or_insert(0) += count as usize;
        }
        Ok(counts)
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_auth_token(&self, value: &AuthTokenValue) -> Option<AuthToken> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1")
            .ok()?;
        stmt.query_row(params![value.0], |row| {
            Ok(AuthToken {
                user_id: row.get(0)?,
                value: AuthTokenValue(row.get(1)?),
                created: system_time_from_column_result(row.get(2)?),
                last_used: row
                    .get::<usize, Option<i64>>(3)?
                    .map(system_time_from_column_result),
            })
        })
        .ok()
    }

    fn delete_auth_token(&self, value: &AuthTokenValue) -> Option<AuthToken> {
        let token = self.get_auth_token(value)?;
        let conn = self.conn.lock().unwrap();
        match conn.execute(
            "DELETE FROM auth_token WHERE value = ?1",
            params![token.value.0],
        ) {
            Ok(_) => Some(token),
            Err(_) => None,
        }
    }

    fn touch_auth_token(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE auth_token SET last_used = cast(strftime('%s','now') as int) WHERE value = ?1",
            params![token.0],
        )?;
        Ok(())
    }

    fn add_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO auth_token (value, user_id) VALUES (?1, ?2)",
            params![token.value.0, token.user_id],
        )?;
        Ok(())
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_password_credentials(&self, user_id: usize) -> Option<PasswordCredentials> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT user_id, salt, hash, hasher, created, last_tried, last_used \
                 FROM user_password_credentials WHERE user_id = ?1",
            )
            .ok()?;
        stmt.query_row(params![user_id], |row| {
            let hasher = match CredentialsHasher::from_str(&row.get::<usize, String>(3)?) {
                Ok(x) => x,
                Err(_) => return Err(rusqlite::Error::InvalidQuery),
            };
            Ok(PasswordCredentials {
                user_id: row.get(0)?,
                salt: row.get(1)?,
                hash: row.get(2)?,
                hasher,
                created: system_time_from_column_result(row.get(4)?),
                last_tried: row
                    .get::<usize, Option<i64>>(5)?
                    .map(system_time_from_column_result),
                last_used: row
                    .get::<usize, Option<i64>>(6)?
                    .map(system_time_from_column_result),
            })
        })
        .ok()
    }

    fn set_password_credentials(&self, credentials: PasswordCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_password_credentials (user_id, salt, hash, hasher) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(user_id) DO UPDATE SET salt = ?2, hash = ?3, hasher = ?4",
            params![
                credentials.user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string()
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteUserStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let temp_file_path = temp_dir.path().join("test.db");
        let store = SqliteUserStore::new(&temp_file_path).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn creates_user_with_free_tier() {
        let (store, _temp_dir) = create_tmp_store();

        let user_id = store.create_user("Test User", "test@example.com").unwrap();
        assert_eq!(user_id, 1);

        let user = store.get_user(user_id).unwrap();
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.membership_tier, Tier::Free);
        assert_eq!(user.role, UserRole::Member);
    }

    #[test]
    fn rejects_duplicate_email() {
        let (store, _temp_dir) = create_tmp_store();

        store.create_user("A", "same@example.com").unwrap();
        assert!(store.create_user("B", "same@example.com").is_err());
    }

    #[test]
    fn updates_membership_tier() {
        let (store, _temp_dir) = create_tmp_store();

        let user_id = store.create_user("Test User", "test@example.com").unwrap();
        store.set_membership_tier(user_id, Tier::Silver).unwrap();

        let user = store.get_user_by_email("test@example.com").unwrap();
        assert_eq!(user.membership_tier, Tier::Silver);

        assert!(store.set_membership_tier(999, Tier::Gold).is_err());
    }

    #[test]
    fn counts_users_by_tier() {
        let (store, _temp_dir) = create_tmp_store();

        let a = store.create_user("A", "a@example.com").unwrap();
        store.create_user("B", "b@example.com").unwrap();
        store.set_membership_tier(a, Tier::Gold).unwrap();

        let counts = store.count_users_by_tier().unwrap();
        assert_eq!(counts[&Tier::Free], 1);
        assert_eq!(counts[&Tier::Gold], 1);
        assert_eq!(counts[&Tier::Bronze], 0);
        assert_eq!(store.count_users().unwrap(), 2);
    }

    #[test]
    fn token_lifecycle() {
        let (store, _temp_dir) = create_tmp_store();
        let user_id = store.create_user("Test User", "test@example.com").unwrap();

        let value = AuthTokenValue::generate();
        store
            .add_auth_token(AuthToken {
                user_id,
                created: SystemTime::now(),
                last_used: None,
                value: value.clone(),
            })
            .unwrap();

        let loaded = store.get_auth_token(&value).unwrap();
        assert_eq!(loaded.user_id, user_id);

        store.touch_auth_token(&value).unwrap();
        assert!(store.get_auth_token(&value).unwrap().last_used.is_some());

        store.delete_auth_token(&value).unwrap();
        assert!(store.get_auth_token(&value).is_none());
    }

    #[test]
    fn password_credentials_round_trip() {
        let (store, _temp_dir) = create_tmp_store();
        let user_id = store.create_user("Test User", "test@example.com").unwrap();

        let credentials = PasswordCredentials::new(user_id, "hunter2").unwrap();
        store.set_password_credentials(credentials).unwrap();

        let loaded = store.get_password_credentials(user_id).unwrap();
        assert!(loaded.verify("hunter2"));
        assert!(!loaded.verify("wrong"));

        // Replacing credentials keeps a single row per user.
        let replaced = PasswordCredentials::new(user_id, "new-password").unwrap();
        store.set_password_credentials(replaced).unwrap();
        let loaded = store.get_password_credentials(user_id).unwrap();
        assert!(loaded.verify("new-password"));
        assert!(!loaded.verify("hunter2"));
    }
}
