use crate::model::{ResultSet, Value};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// SQL execution failure (syntax error, unknown column, rejected write, ...).
/// Recorded per attempt and fed back into the feedback prompt; never fatal.
#[derive(Debug, Clone)]
pub struct SqlError {
    pub message: String,
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SqlError {}

impl From<rusqlite::Error> for SqlError {
    fn from(e: rusqlite::Error) -> Self {
        SqlError {
            message: e.to_string(),
        }
    }
}

/// Read-only handle on the subject database. The connection is opened once
/// and reused for every query in a run; SQLite itself rejects write
/// statements submitted through it.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the database read-only. Fails (fatally, for the harness) if the
    /// file is missing or unreadable.
    pub fn open_read_only(path: &Path) -> anyhow::Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| anyhow::anyhow!("cannot open database {}: {}", path.display(), e))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Renders every table with its declared columns as prompt-ready text.
    /// Deterministic: tables in sqlite_master order, columns in table order.
    pub fn describe_schema(&self) -> anyhow::Result<String> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")?;
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?;

        let mut out = String::from("Database structure:\n");
        for table in &tables {
            let mut cols = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
            let columns: Vec<(String, String)> = cols
                .query_map([], |row| {
                    Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
                })?
                .collect::<Result<_, _>>()?;

            let rendered: Vec<String> = columns
                .iter()
                .map(|(name, decl)| {
                    if decl.is_empty() {
                        name.clone()
                    } else {
                        format!("{} {}", name, decl)
                    }
                })
                .collect();
            out.push_str(&format!("  - {}: {}\n", table, rendered.join(", ")));
        }
        Ok(out)
    }

    /// Runs one SQL statement and collects the full result set.
    pub fn execute(&self, sql: &str) -> Result<ResultSet, SqlError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let ncols = columns.len();

        let mut rows = Vec::new();
        let mut raw = stmt.query([])?;
        while let Some(row) = raw.next()? {
            let mut values = Vec::with_capacity(ncols);
            for i in 0..ncols {
                values.push(read_value(row.get_ref(i)?));
            }
            rows.push(values);
        }
        Ok(ResultSet { columns, rows })
    }
}

fn read_value(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seed_db(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE team (id INTEGER PRIMARY KEY, full_name TEXT, state TEXT);
             INSERT INTO team VALUES (1, 'Boston Celtics', 'Massachusetts');
             INSERT INTO team VALUES (2, 'Dallas Mavericks', 'Texas');
             INSERT INTO team VALUES (3, 'Houston Rockets', 'Texas');",
        )
        .unwrap();
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = Database::open_read_only(&dir.path().join("absent.sqlite"));
        assert!(err.is_err());
    }

    #[test]
    fn schema_description_lists_tables_and_columns() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nba.sqlite");
        seed_db(&path);

        let db = Database::open_read_only(&path)?;
        let schema = db.describe_schema()?;
        assert!(schema.contains("- team:"));
        assert!(schema.contains("full_name TEXT"));
        Ok(())
    }

    #[test]
    fn execute_returns_rows_and_columns() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nba.sqlite");
        seed_db(&path);

        let db = Database::open_read_only(&path)?;
        let rs = db.execute("SELECT full_name FROM team WHERE state = 'Texas' ORDER BY id")?;
        assert_eq!(rs.columns, vec!["full_name"]);
        assert_eq!(rs.rows.len(), 2);
        assert_eq!(rs.rows[0][0], Value::Text("Dallas Mavericks".into()));
        Ok(())
    }

    #[test]
    fn execute_surfaces_sql_errors() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nba.sqlite");
        seed_db(&path);

        let db = Database::open_read_only(&path)?;
        let err = db.execute("SELECT nope FROM team").unwrap_err();
        assert!(err.message.contains("nope"));
        Ok(())
    }

    #[test]
    fn writes_are_rejected_on_read_only_connection() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nba.sqlite");
        seed_db(&path);

        let db = Database::open_read_only(&path)?;
        assert!(db.execute("DELETE FROM team").is_err());

        // nothing was deleted
        let rs = db.execute("SELECT COUNT(*) FROM team")?;
        assert_eq!(rs.rows[0][0], Value::Integer(3));
        Ok(())
    }
}
