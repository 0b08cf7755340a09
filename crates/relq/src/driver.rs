//! Driver trait: the execution surface the query layer consumes.
//!
//! Everything above this module only produces SQL text plus a [`Params`] map; how the
//! statement reaches the store is the driver's business.

use crate::error::OrmResult;
use crate::value::{Params, Value};
use std::sync::Arc;

/// A single result row, cells in the order the statement produced them.
pub type Row = Vec<Value>;

/// A shared, type-erased driver as held by tables, joins and databases.
pub type DriverHandle = Arc<dyn Driver>;

/// A trait for anything that can run SQL with named (`:name`) parameters.
///
/// Errors are returned as produced by the driver; the query layer never translates them.
pub trait Driver: Send + Sync {
    /// Execute a query and return all rows.
    fn query(&self, sql: &str, params: &Params) -> OrmResult<Vec<Row>>;

    /// Execute a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &Params) -> OrmResult<u64>;
}

impl<D: Driver + ?Sized> Driver for Arc<D> {
    fn query(&self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn execute(&self, sql: &str, params: &Params) -> OrmResult<u64> {
        (**self).execute(sql, params)
    }
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn query(&self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn execute(&self, sql: &str, params: &Params) -> OrmResult<u64> {
        (**self).execute(sql, params)
    }
}
