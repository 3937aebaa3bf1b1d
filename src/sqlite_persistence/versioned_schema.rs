use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// Offset applied to `PRAGMA user_version` so a plain sqlite file
/// (version 0) is never mistaken for one of our schemas.
pub const BASE_DB_VERSION: usize = 7000;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
    pub validate: fn(&Connection) -> Result<()>,
}

fn create_latest(conn: &Connection, schemas: &[VersionedSchema]) -> Result<()> {
    let latest = schemas.last().context("Empty schema list")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    for table in latest.tables {
        conn.execute(table.schema, [])?;
        for index in table.indices {
            conn.execute(index, [])?;
        }
    }
    conn.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest.version),
        [],
    )?;
    Ok(())
}

fn migrate_if_needed(conn: &Connection, schemas: &[VersionedSchema], version: usize) -> Result<()> {
    let mut latest = version;
    for schema in schemas.iter().skip(version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!("Migrating db from version {} to {}", latest, schema.version);
            migration_fn(conn)?;
            latest = schema.version;
        }
    }
    conn.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest),
        [],
    )?;
    Ok(())
}

/// Opens a database at `db_path`, creating the latest schema when the file
/// does not exist, and running pending migrations when it does.
pub fn open_versioned<T: AsRef<Path>>(
    db_path: T,
    schemas: &[VersionedSchema],
) -> Result<Connection> {
    let conn = if db_path.as_ref().exists() {
        Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?
    } else {
        let conn = Connection::open(db_path)?;
        create_latest(&conn, schemas)?;
        conn
    };

    let version = conn
        .query_row("PRAGMA user_version;", [], |row| row.get::<usize, usize>(0))
        .context("Failed to read database version")?
        .saturating_sub(BASE_DB_VERSION);

    if version >= schemas.len() {
        bail!("Database version {} is too new", version);
    }
    (schemas
        .get(version)
        .context("Failed to get schema")?
        .validate)(&conn)?;

    migrate_if_needed(&conn, schemas, version)?;

    Ok(conn)
}

pub fn validate_columns(conn: &Connection, table: &str, expected: &[&str]) -> Result<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table))?;
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(1))?
        .collect::<Result<_, _>>()?;
    for name in expected {
        if !columns.contains(&name.to_string()) {
            bail!(
                "Schema validation failed for {} table, missing {} column.",
                table,
                name
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const THING_TABLE_V_0: Table = Table {
        name: "thing",
        schema: "CREATE TABLE thing (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
        indices: &["CREATE INDEX thing_name_index ON thing (name);"],
    };

    const SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
        version: 0,
        tables: &[THING_TABLE_V_0],
        migration: None,
        validate: |conn| validate_columns(conn, "thing", &["id", "name"]),
    }];

    #[test]
    fn creates_and_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let conn = open_versioned(&db_path, SCHEMAS).unwrap();
            conn.execute("INSERT INTO thing (name) VALUES ('a')", [])
                .unwrap();
        }

        let conn = open_versioned(&db_path, SCHEMAS).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM thing", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
