//! Server-side bookkeeping that is neither user nor catalog data: uploaded
//! file records and contact form submissions.

use crate::sqlite_persistence::{open_versioned, validate_columns, Table, VersionedSchema};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: usize,
    pub filename: String,
    pub folder: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: usize,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

pub trait ServerStore: Send + Sync {
    /// Records an uploaded file and returns its id.
    fn add_uploaded_file(&self, filename: &str, folder: &str, url: &str) -> Result<usize>;

    /// All uploaded file records, newest first.
    fn get_uploaded_files(&self) -> Result<Vec<UploadedFile>>;

    /// Stores a contact form submission and returns its id.
    fn add_contact_message(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> Result<usize>;

    /// All contact messages, newest first.
    fn get_contact_messages(&self) -> Result<Vec<ContactMessage>>;
}

const UPLOADED_FILE_TABLE_V_0: Table = Table {
    name: "uploaded_file",
    schema: "CREATE TABLE uploaded_file (id INTEGER PRIMARY KEY, filename TEXT NOT NULL, folder TEXT NOT NULL, url TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &[],
};
const CONTACT_MESSAGE_TABLE_V_0: Table = Table {
    name: "contact_message",
    schema: "CREATE TABLE contact_message (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT NOT NULL, subject TEXT NOT NULL, message TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &[],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[UPLOADED_FILE_TABLE_V_0, CONTACT_MESSAGE_TABLE_V_0],
    migration: None,
    validate: |conn| {
        validate_columns(conn, "uploaded_file", &["id", "filename", "folder", "url"])?;
        validate_columns(
            conn,
            "contact_message",
            &["id", "name", "email", "subject", "message"],
        )
    },
}];

#[derive(Clone)]
pub struct SqliteServerStore {
    conn: Arc<Mutex<Connection>>,
}

fn datetime_from_column_result(value: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(value, 0).unwrap_or_default()
}

impl SqliteServerStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteServerStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl ServerStore for SqliteServerStore {
    fn add_uploaded_file(&self, filename: &str, folder: &str, url: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO uploaded_file (filename, folder, url) VALUES (?1, ?2, ?3)",
            params![filename, folder, url],
        )?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_uploaded_files(&self) -> Result<Vec<UploadedFile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, filename, folder, url, created FROM uploaded_file ORDER BY created DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(UploadedFile {
                id: row.get(0)?,
                filename: row.get(1)?,
                folder: row.get(2)?,
                url: row.get(3)?,
                created_at: datetime_from_column_result(row.get(4)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<UploadedFile>, _>>()?)
    }

    fn add_contact_message(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO contact_message (name, email, subject, message) VALUES (?1, ?2, ?3, ?4)",
            params![name, email, subject, message],
        )?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_contact_messages(&self) -> Result<Vec<ContactMessage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, email, subject, message, created FROM contact_message \
             ORDER BY created DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ContactMessage {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                subject: row.get(3)?,
                message: row.get(4)?,
                created_at: datetime_from_column_result(row.get(5)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<ContactMessage>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteServerStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteServerStore::new(temp_dir.path().join("server.db")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn records_uploaded_files() {
        let (store, _temp_dir) = create_tmp_store();

        store
            .add_uploaded_file("hero.png", "images", "/uploads/images/hero.png")
            .unwrap();
        store
            .add_uploaded_file("guide.pdf", "resources", "/uploads/resources/guide.pdf")
            .unwrap();

        let files = store.get_uploaded_files().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "guide.pdf");
        assert_eq!(files[1].folder, "images");
    }

    #[test]
    fn records_contact_messages() {
        let (store, _temp_dir) = create_tmp_store();

        let id = store
            .add_contact_message("Jane", "jane@example.com", "Coaching", "Tell me more")
            .unwrap();
        assert_eq!(id, 1);

        let messages = store.get_contact_messages().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].email, "jane@example.com");
    }
}
