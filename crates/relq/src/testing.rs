//! In-memory catalog driver for unit tests.

use crate::driver::{Driver, Row};
use crate::error::OrmResult;
use crate::value::{Params, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Answers catalog and `PRAGMA table_info` reads from a fixed schema, returns canned
/// rows for everything else and logs each statement it sees.
#[derive(Default)]
pub(crate) struct SchemaDriver {
    schema: Mutex<BTreeMap<String, Vec<String>>>,
    rows: Mutex<Vec<Row>>,
    log: Mutex<Vec<(String, Params)>>,
}

impl SchemaDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_table(self, name: &str, columns: &[&str]) -> Self {
        self.set_table(name, columns);
        self
    }

    pub(crate) fn set_table(&self, name: &str, columns: &[&str]) {
        self.schema.lock().unwrap().insert(
            name.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
    }

    /// Rows returned by any non-catalog query.
    pub(crate) fn set_rows(&self, rows: Vec<Row>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(sql, _)| sql.clone()).collect()
    }

    pub(crate) fn last(&self) -> Option<(String, Params)> {
        self.log.lock().unwrap().last().cloned()
    }

    pub(crate) fn count_matching(&self, prefix: &str) -> usize {
        self.statements()
            .iter()
            .filter(|sql| sql.starts_with(prefix))
            .count()
    }
}

impl Driver for SchemaDriver {
    fn query(&self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        self.log
            .lock()
            .unwrap()
            .push((sql.to_string(), params.clone()));

        let schema = self.schema.lock().unwrap();
        if sql.starts_with("SELECT name FROM sqlite_master") {
            return Ok(schema
                .keys()
                .map(|name| vec![Value::from(name.as_str())])
                .collect());
        }
        if let Some(table) = sql
            .strip_prefix("PRAGMA table_info(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let columns = schema.get(table).cloned().unwrap_or_default();
            return Ok(columns
                .into_iter()
                .enumerate()
                .map(|(cid, name)| {
                    vec![
                        Value::Integer(cid as i64),
                        Value::Text(name),
                        Value::from("TEXT"),
                        Value::Integer(0),
                        Value::Null,
                        Value::Integer(0),
                    ]
                })
                .collect());
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    fn execute(&self, sql: &str, params: &Params) -> OrmResult<u64> {
        self.log
            .lock()
            .unwrap()
            .push((sql.to_string(), params.clone()));
        Ok(1)
    }
}
