use super::store::{ContentStore, SectionData};
use crate::sqlite_persistence::{open_versioned, validate_columns, Table, VersionedSchema};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

const CONTENT_FIELD_TABLE_V_0: Table = Table {
    name: "content_field",
    schema: "CREATE TABLE content_field (section TEXT NOT NULL, field TEXT NOT NULL, value TEXT NOT NULL, updated INTEGER DEFAULT (cast(strftime('%s','now') as int)), UNIQUE (section, field));",
    indices: &["CREATE INDEX content_field_section_index ON content_field (section);"],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[CONTENT_FIELD_TABLE_V_0],
    migration: None,
    validate: |conn| validate_columns(conn, "content_field", &["section", "field", "value"]),
}];

#[derive(Clone)]
pub struct SqliteContentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContentStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteContentStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl ContentStore for SqliteContentStore {
    fn read_section(&self, name: &str) -> Result<SectionData> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT field, value FROM content_field WHERE section = ?1")?;
        let rows = stmt.query_map(params![name], |row| {
            Ok((row.get::<usize, String>(0)?, row.get::<usize, String>(1)?))
        })?;

        let mut data = SectionData::new();
        for row in rows {
            let (field, raw) = row?;
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("Malformed value for {}.{}", name, field))?;
            data.insert(field, value);
        }
        Ok(data)
    }

    fn write_section(&self, name: &str, data: &SectionData) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM content_field WHERE section = ?1", params![name])?;
        for (field, value) in data {
            tx.execute(
                "INSERT INTO content_field (section, field, value) VALUES (?1, ?2, ?3)",
                params![name, field, serde_json::to_string(value)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn list_sections(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT DISTINCT section FROM content_field ORDER BY section")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<String>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteContentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteContentStore::new(temp_dir.path().join("content.db")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn missing_section_reads_as_empty() {
        let (store, _temp_dir) = create_tmp_store();
        assert!(store.read_section("never_written").unwrap().is_empty());
    }

    #[test]
    fn write_overwrites_whole_section() {
        let (store, _temp_dir) = create_tmp_store();

        let mut data = SectionData::new();
        data.insert("headline".into(), json!("Welcome"));
        data.insert("cta_text".into(), json!("Join now"));
        store.write_section("homepage_hero", &data).unwrap();

        let mut replacement = SectionData::new();
        replacement.insert("headline".into(), json!("Hello"));
        store.write_section("homepage_hero", &replacement).unwrap();

        let loaded = store.read_section("homepage_hero").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["headline"], json!("Hello"));
    }

    #[test]
    fn sections_hold_structured_values() {
        let (store, _temp_dir) = create_tmp_store();

        let mut data = SectionData::new();
        data.insert("links".into(), json!([{"label": "Twitter", "url": "#"}]));
        store.write_section("contact", &data).unwrap();

        let loaded = store.read_section("contact").unwrap();
        assert_eq!(loaded["links"][0]["label"], json!("Twitter"));
    }

    #[test]
    fn lists_written_sections() {
        let (store, _temp_dir) = create_tmp_store();

        let mut data = SectionData::new();
        data.insert("a".into(), json!("1"));
        store.write_section("beta", &data).unwrap();
        store.write_section("alpha", &data).unwrap();

        assert_eq!(store.list_sections().unwrap(), vec!["alpha", "beta"]);
    }
}
