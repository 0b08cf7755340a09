//! The capability shared by tables and joins.
//!
//! An implementor supplies where rows come from (`from_clause`), an optional mandatory
//! predicate (`base_where`), its columns and its record shape. The query operations are
//! provided methods written once against that contract.

use crate::column::Column;
use crate::driver::Driver;
use crate::error::{OrmError, OrmResult};
use crate::ident::check_keys;
use crate::record::{Record, RecordShape, Records};
use crate::value::Params;
use std::sync::Arc;

/// A query-able source: a [`Table`](crate::Table) or a [`Join`](crate::Join).
pub trait Selectable {
    /// The driver statements are executed on.
    fn driver(&self) -> &dyn Driver;

    /// SQL naming the relation(s) to read from.
    fn from_clause(&self) -> String;

    /// Predicate that every query against this source must include.
    fn base_where(&self) -> Option<String> {
        None
    }

    /// Output columns, in the order `SELECT *` yields them.
    fn columns(&self) -> OrmResult<Arc<Vec<Column>>>;

    /// Cached row-to-record materializer.
    fn record_shape(&self) -> OrmResult<Arc<RecordShape>>;

    /// SQL for [`Selectable::select`].
    fn select_sql(&self, where_sql: Option<&str>, limit: Option<u64>) -> String {
        let mut sql = format!("SELECT * FROM {}", self.from_clause());

        let base = self.base_where().filter(|w| !w.trim().is_empty());
        let extra = where_sql.filter(|w| !w.trim().is_empty());
        match (base, extra) {
            (Some(base), Some(extra)) => {
                sql.push_str(" WHERE ");
                sql.push_str(&base);
                sql.push_str(" AND ");
                sql.push_str(extra);
            }
            (Some(base), None) => {
                sql.push_str(" WHERE ");
                sql.push_str(&base);
            }
            (None, Some(extra)) => {
                sql.push_str(" WHERE ");
                sql.push_str(extra);
            }
            (None, None) => {}
        }

        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }

    /// Select rows, optionally filtered by raw SQL and limited.
    ///
    /// # Security
    /// `where_sql` is spliced into the statement verbatim and nothing is bound. Never pass
    /// untrusted input; use [`Selectable::select_where`] for value filters.
    fn select(&self, where_sql: Option<&str>, limit: Option<u64>) -> OrmResult<Records> {
        let shape = self.record_shape()?;
        let sql = self.select_sql(where_sql, limit);
        let rows = self.driver().query(&sql, &Params::new())?;
        Ok(Records::new(shape, rows))
    }

    /// SQL for [`Selectable::select_where`]: `col = :col` per key, in key order.
    ///
    /// The base predicate is not merged in here.
    fn select_where_sql(&self, limit: Option<u64>, filter: &Params) -> OrmResult<String> {
        check_keys(filter.keys())?;

        let mut sql = format!("SELECT * FROM {}", self.from_clause());
        if !filter.is_empty() {
            let clauses: Vec<String> = filter.keys().map(|c| format!("{c} = :{c}")).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        Ok(sql)
    }

    /// Select rows whose columns equal the given values, bound as parameters.
    fn select_where(&self, limit: Option<u64>, filter: &Params) -> OrmResult<Records> {
        let shape = self.record_shape()?;
        let sql = self.select_where_sql(limit, filter)?;
        let rows = self.driver().query(&sql, filter)?;
        Ok(Records::new(shape, rows))
    }

    /// Select exactly one row matching `filter`.
    ///
    /// Semantics:
    /// - 0 rows: returns [`OrmError::NoResultFound`]
    /// - 1 row: returns that record
    /// - multiple rows: returns [`OrmError::TooManyResultsFound`]
    fn select_one_where(&self, filter: &Params) -> OrmResult<Record> {
        let mut records = self.select_where(Some(2), filter)?;
        match records.len() {
            0 => Err(OrmError::NoResultFound),
            1 => records.next().ok_or(OrmError::NoResultFound)?,
            _ => Err(OrmError::TooManyResultsFound),
        }
    }
}
