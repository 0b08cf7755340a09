//! SQLite driver built on `rusqlite`.

use crate::driver::{Driver, Row};
use crate::error::OrmResult;
use crate::value::{Params, Value};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, OpenFlags, ToSql};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Configuration for [`SqliteDriver`].
#[derive(Debug, Clone, Default)]
pub struct SqliteConfig {
    /// Database file. `None` opens a private in-memory database.
    pub path: Option<PathBuf>,
    /// Open the database read-only.
    pub read_only: bool,
    /// Run `PRAGMA foreign_keys = ON` after opening.
    pub foreign_keys: bool,
}

impl SqliteConfig {
    /// Create a new configuration (in-memory, read-write, no FK enforcement).
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a database file.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use a private in-memory database.
    pub fn in_memory(mut self) -> Self {
        self.path = None;
        self
    }

    /// Open read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Enforce foreign key constraints.
    pub fn with_foreign_keys(mut self) -> Self {
        self.foreign_keys = true;
        self
    }
}

/// A [`Driver`] over a single `rusqlite::Connection`.
///
/// The connection is guarded by a mutex so the driver can be shared between tables,
/// joins and threads; statements run one at a time.
#[derive(Debug)]
pub struct SqliteDriver {
    conn: Mutex<Connection>,
}

impl SqliteDriver {
    /// Open a connection according to `config`.
    pub fn connect(config: &SqliteConfig) -> OrmResult<Self> {
        let flags = if config.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI
        } else {
            OpenFlags::default()
        };
        let conn = match &config.path {
            Some(path) => Connection::open_with_flags(path, flags)?,
            None => Connection::open_in_memory_with_flags(flags)?,
        };
        if config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> OrmResult<Self> {
        Self::connect(&SqliteConfig::new())
    }

    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        Self::connect(&SqliteConfig::new().path(path))
    }

    /// Wrap an already opened connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run one or more `;`-separated statements without parameters (DDL, fixtures).
    pub fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute_batch(sql)?;
        Ok(())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

/// `{"id": 1}` -> `[(":id", &1)]`, the shape rusqlite binds named parameters from.
fn named_params(params: &Params) -> (Vec<String>, Vec<&Value>) {
    params
        .iter()
        .map(|(name, value)| (format!(":{name}"), value))
        .unzip()
}

impl Driver for SqliteDriver {
    fn query(&self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(sql)?;
        let width = stmt.column_count();

        let (names, values) = named_params(params);
        let bound: Vec<(&str, &dyn ToSql)> = names
            .iter()
            .map(String::as_str)
            .zip(values.iter().map(|v| *v as &dyn ToSql))
            .collect();

        let mut rows = stmt.query(bound.as_slice())?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(Value::from(row.get_ref(i)?));
            }
            out.push(cells);
        }
        Ok(out)
    }

    fn execute(&self, sql: &str, params: &Params) -> OrmResult<u64> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(sql)?;

        let (names, values) = named_params(params);
        let bound: Vec<(&str, &dyn ToSql)> = names
            .iter()
            .map(String::as_str)
            .zip(values.iter().map(|v| *v as &dyn ToSql))
            .collect();

        let affected = stmt.execute(bound.as_slice())?;
        Ok(affected as u64)
    }
}
