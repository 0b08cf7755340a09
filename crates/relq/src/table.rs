//! Runtime-introspected table handles.

use crate::column::{Column, TableRef};
use crate::driver::{Driver, DriverHandle, Row};
use crate::error::{OrmError, OrmResult};
use crate::ident::check_keys;
use crate::memo::Memo;
use crate::record::{RecordShape, title_case};
use crate::selectable::Selectable;
use crate::value::{FromValue, Params, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One row of `PRAGMA table_info(<table>)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub ordinal: i64,
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

impl ColumnInfo {
    fn from_row(row: &Row) -> OrmResult<Self> {
        fn cell<'a>(row: &'a Row, pos: usize, column: &str) -> OrmResult<&'a Value> {
            row.get(pos)
                .ok_or_else(|| OrmError::decode(column, "missing from PRAGMA table_info row"))
        }

        let default_value = match cell(row, 4, "dflt_value")? {
            Value::Null => None,
            other => Some(other.to_string()),
        };

        Ok(Self {
            ordinal: i64::from_value(cell(row, 0, "cid")?, "cid")?,
            name: String::from_value(cell(row, 1, "name")?, "name")?,
            data_type: String::from_value(cell(row, 2, "type")?, "type")?,
            not_null: bool::from_value(cell(row, 3, "notnull")?, "notnull")?,
            default_value,
            primary_key: bool::from_value(cell(row, 5, "pk")?, "pk")?,
        })
    }
}

pub(crate) struct TableInner {
    driver: DriverHandle,
    name: Arc<str>,
    info: Memo<Arc<Vec<ColumnInfo>>>,
    columns: Memo<Arc<Vec<Column>>>,
    shape: Memo<Arc<RecordShape>>,
}

/// A named relation bound to a driver.
///
/// Cheap to clone; clones share the same column and record-shape caches. Two `Table`
/// values are equal only if they are clones of the same instance.
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    /// Create a handle for `name`. Nothing is queried until metadata is requested.
    pub fn new(driver: DriverHandle, name: impl Into<Arc<str>>) -> Self {
        Self {
            inner: Arc::new(TableInner {
                driver,
                name: name.into(),
                info: Memo::new(),
                columns: Memo::new(),
                shape: Memo::new(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<TableInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner_ptr(&self) -> *const TableInner {
        Arc::as_ptr(&self.inner)
    }

    pub(crate) fn table_ref(&self) -> TableRef {
        TableRef::new(Arc::clone(&self.inner.name), Arc::downgrade(&self.inner))
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn driver_handle(&self) -> &DriverHandle {
        &self.inner.driver
    }

    /// Column metadata as reported by `PRAGMA table_info`, in declaration order. Cached.
    pub fn column_info(&self) -> OrmResult<Arc<Vec<ColumnInfo>>> {
        self.inner.info.get_or_try_init(|| {
            let sql = format!("PRAGMA table_info({})", self.inner.name);
            let rows = self.inner.driver.query(&sql, &Params::new())?;
            let info = rows.iter().map(ColumnInfo::from_row).collect::<OrmResult<_>>()?;
            Ok(Arc::new(info))
        })
    }

    /// Look up one column by name.
    pub fn column(&self, name: &str) -> OrmResult<Column> {
        self.columns()?
            .iter()
            .find(|c| c.name() == name)
            .cloned()
            .ok_or_else(|| OrmError::ColumnNotFound {
                table: self.name().to_string(),
                column: name.to_string(),
            })
    }

    /// `INSERT INTO <table> (<cols>) VALUES (:col, ...)` for the keys of `values`.
    pub fn insert_sql(&self, values: &Params) -> OrmResult<String> {
        check_keys(values.keys())?;
        let columns: Vec<&str> = values.keys().map(String::as_str).collect();
        let placeholders: Vec<String> = columns.iter().map(|c| format!(":{c}")).collect();
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.inner.name,
            columns.join(", "),
            placeholders.join(", ")
        ))
    }

    /// Insert one row, binding `values` by name. Returns the driver's affected-row count.
    ///
    /// Column existence is not checked locally; the driver reports unknown columns.
    pub fn insert(&self, values: &Params) -> OrmResult<u64> {
        let sql = self.insert_sql(values)?;
        self.inner.driver.execute(&sql, values)
    }

    /// Drop this table's cached columns and record shape.
    ///
    /// Columns obtained earlier keep working; they still refer to this instance.
    pub fn forget(&self) {
        self.inner.info.forget();
        self.inner.columns.forget();
        self.inner.shape.forget();
    }
}

impl Selectable for Table {
    fn driver(&self) -> &dyn Driver {
        &*self.inner.driver
    }

    fn from_clause(&self) -> String {
        self.inner.name.to_string()
    }

    /// Columns in declaration order. Cached.
    fn columns(&self) -> OrmResult<Arc<Vec<Column>>> {
        self.inner.columns.get_or_try_init(|| {
            let table = self.table_ref();
            let columns = self
                .column_info()?
                .iter()
                .map(|info| Column::new(info.name.as_str(), table.clone()))
                .collect();
            Ok(Arc::new(columns))
        })
    }

    fn record_shape(&self) -> OrmResult<Arc<RecordShape>> {
        self.inner.shape.get_or_try_init(|| {
            let fields = self
                .columns()?
                .iter()
                .map(|c| c.name().to_string())
                .collect();
            let name = format!("{}Record", title_case(&self.inner.name));
            Ok(Arc::new(RecordShape::new(name, fields)?))
        })
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Table {}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.inner.name)
            .field("columns_cached", &self.inner.columns.is_cached())
            .finish()
    }
}
