//! Record shapes and materialized records.
//!
//! A [`RecordShape`] is derived (never declared) from a table's or join's column list
//! and cached by its owner. Every [`Record`] produced from it shares the shape through
//! an `Arc`, so field lookup by name costs one hash probe.

use crate::driver::Row;
use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Ordered field names plus a name -> position index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordShape {
    name: String,
    fields: Vec<String>,
    index: HashMap<String, usize>,
}

impl RecordShape {
    /// Build a shape; field names must be unique.
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> OrmResult<Self> {
        let name = name.into();
        let mut index = HashMap::with_capacity(fields.len());
        for (pos, field) in fields.iter().enumerate() {
            if index.insert(field.clone(), pos).is_some() {
                return Err(OrmError::validation(format!(
                    "duplicate field '{field}' in record shape {name}"
                )));
            }
        }
        Ok(Self {
            name,
            fields,
            index,
        })
    }

    /// Type-like name of the shape, e.g. `EpisodesProductionsRecord`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of `field`, if present.
    pub fn position(&self, field: &str) -> Option<usize> {
        self.index.get(field).copied()
    }

    /// Materialize one driver row.
    pub fn make(self: &Arc<Self>, row: Row) -> OrmResult<Record> {
        if row.len() != self.fields.len() {
            return Err(OrmError::decode(
                self.name.as_str(),
                format!(
                    "row has {} values, shape expects {} fields",
                    row.len(),
                    self.fields.len()
                ),
            ));
        }
        Ok(Record {
            shape: Arc::clone(self),
            values: row,
        })
    }
}

/// Title-case a relation name the way record shape names are built: `tv_shows` -> `Tv_Shows`.
pub(crate) fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// One materialized row: values addressable by field name or position.
#[derive(Clone, PartialEq)]
pub struct Record {
    shape: Arc<RecordShape>,
    values: Vec<Value>,
}

impl Record {
    pub fn shape(&self) -> &Arc<RecordShape> {
        &self.shape
    }

    pub fn fields(&self) -> &[String] {
        self.shape.fields()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of `field`, if the shape has it.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.shape.position(field).map(|pos| &self.values[pos])
    }

    /// Value at `index`, in field order.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Typed value of `field`.
    pub fn try_get<T: FromValue>(&self, field: &str) -> OrmResult<T> {
        let value = self
            .get(field)
            .ok_or_else(|| OrmError::decode(field, format!("no such field in {}", self.shape.name())))?;
        T::from_value(value, field)
    }

    /// `(field, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.shape
            .fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl std::ops::Index<usize> for Record {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.shape.name());
        for (field, value) in self.iter() {
            s.field(field, value);
        }
        s.finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

/// Trait for converting a [`Record`] into a Rust struct.
///
/// # Example
///
/// ```ignore
/// use relq::{FromRecord, OrmResult, Record};
///
/// struct Episode {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRecord for Episode {
///     fn from_record(record: &Record) -> OrmResult<Self> {
///         Ok(Self {
///             id: record.try_get("id")?,
///             name: record.try_get("name")?,
///         })
///     }
/// }
/// ```
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> OrmResult<Self>;
}

/// Lazily materialized query results.
///
/// Rows are fetched by the driver up front; each is turned into a [`Record`] only when the
/// iterator reaches it. One-shot: consuming it consumes the rows.
#[must_use]
pub struct Records {
    shape: Arc<RecordShape>,
    rows: std::vec::IntoIter<Row>,
}

impl Records {
    pub(crate) fn new(shape: Arc<RecordShape>, rows: Vec<Row>) -> Self {
        Self {
            shape,
            rows: rows.into_iter(),
        }
    }

    pub fn shape(&self) -> &Arc<RecordShape> {
        &self.shape
    }

    /// Materialize every remaining row.
    pub fn all(self) -> OrmResult<Vec<Record>> {
        self.collect()
    }

    /// Materialize every remaining row and map it to `T`.
    pub fn decode<T: FromRecord>(self) -> OrmResult<Vec<T>> {
        self.map(|record| record.and_then(|r| T::from_record(&r)))
            .collect()
    }
}

impl Iterator for Records {
    type Item = OrmResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(self.shape.make(row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for Records {}

impl fmt::Debug for Records {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Records")
            .field("shape", &self.shape.name())
            .field("remaining", &self.rows.len())
            .finish()
    }
}
