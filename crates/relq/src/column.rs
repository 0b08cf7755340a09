//! Column handles and their predicate builders.

use crate::selection::{CompareOp, Operand, Selection};
use crate::table::{Table, TableInner};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// A non-owning reference from a column back to the table that declared it.
///
/// Identity is the identity of the table instance, not its name: two handles for the same
/// relation obtained from different schema snapshots are different tables.
#[derive(Clone)]
pub struct TableRef {
    name: Arc<str>,
    inner: Weak<TableInner>,
}

impl TableRef {
    pub(crate) fn new(name: Arc<str>, inner: Weak<TableInner>) -> Self {
        Self { name, inner }
    }

    /// Name of the referenced table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recover a [`Table`] handle, if any handle to the table is still alive.
    pub fn upgrade(&self) -> Option<Table> {
        self.inner.upgrade().map(Table::from_inner)
    }

    /// Whether this reference points at `table`.
    pub fn refers_to(&self, table: &Table) -> bool {
        std::ptr::eq(self.inner.as_ptr(), table.inner_ptr())
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for TableRef {}

impl Hash for TableRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.inner.as_ptr() as usize).hash(state);
    }
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TableRef").field(&self.name).finish()
    }
}

/// A named attribute of a table, optionally carrying an output alias.
///
/// Columns are equal when they belong to the same table instance and share a name;
/// the alias only changes the field name a record exposes.
#[derive(Clone)]
pub struct Column {
    name: Arc<str>,
    table: TableRef,
    alias: Option<Arc<str>>,
}

impl Column {
    pub(crate) fn new(name: impl Into<Arc<str>>, table: TableRef) -> Self {
        Self {
            name: name.into(),
            table,
            alias: None,
        }
    }

    /// Column name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output alias, if one was set.
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The alias if set, otherwise the declared name.
    pub fn aliased_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Name of the owning table.
    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    /// Back-reference to the owning table.
    pub fn table_ref(&self) -> &TableRef {
        &self.table
    }

    /// The owning table, if a handle to it is still alive.
    pub fn table(&self) -> Option<Table> {
        self.table.upgrade()
    }

    /// `<table>.<column>`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table.name(), self.name)
    }

    /// A copy of this column exposed under `alias`.
    pub fn alias(&self, alias: impl Into<Arc<str>>) -> Column {
        Column {
            name: Arc::clone(&self.name),
            table: self.table.clone(),
            alias: Some(alias.into()),
        }
    }

    fn compare(&self, op: CompareOp, other: impl Into<Operand>) -> Selection {
        Selection::new(self.clone(), op, other.into())
    }

    /// `self = other`
    pub fn equals(&self, other: impl Into<Operand>) -> Selection {
        self.compare(CompareOp::Eq, other)
    }

    /// `self <> other`
    pub fn not_equals(&self, other: impl Into<Operand>) -> Selection {
        self.compare(CompareOp::Ne, other)
    }

    /// `self < other`
    pub fn less_than(&self, other: impl Into<Operand>) -> Selection {
        self.compare(CompareOp::Lt, other)
    }

    /// `self > other`
    pub fn greater_than(&self, other: impl Into<Operand>) -> Selection {
        self.compare(CompareOp::Gt, other)
    }

    /// `self <= other`
    pub fn less_or_equal(&self, other: impl Into<Operand>) -> Selection {
        self.compare(CompareOp::Le, other)
    }

    /// `self >= other`
    pub fn greater_or_equal(&self, other: impl Into<Operand>) -> Selection {
        self.compare(CompareOp::Ge, other)
    }

    /// Same owner and name, alias ignored.
    pub(crate) fn same_column(&self, other: &Column) -> bool {
        self.table == other.table && self.name == other.name
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.same_column(other)
    }
}

impl Eq for Column {}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Column");
        s.field("table", &self.table.name()).field("name", &self.name);
        if let Some(alias) = &self.alias {
            s.field("alias", alias);
        }
        s.finish()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table.name(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::testing::SchemaDriver;
    use std::collections::HashSet;

    fn db() -> Database {
        Database::new(
            SchemaDriver::new()
                .with_table("foo", &["id", "value"])
                .with_table("bar", &["id", "foo_id"]),
        )
    }

    #[test]
    fn equality_is_owner_and_name() {
        let db = db();
        let foo = db.get_table("foo").unwrap();
        let bar = db.get_table("bar").unwrap();

        let a = foo.column("id").unwrap();
        let b = foo.column("id").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, bar.column("id").unwrap());
        assert_ne!(a, foo.column("value").unwrap());
    }

    #[test]
    fn alias_is_ignored_by_equality_and_hash() {
        let db = db();
        let foo = db.get_table("foo").unwrap();
        let id = foo.column("id").unwrap();
        let aliased = id.alias("foo_id");

        assert_eq!(id, aliased);
        assert_eq!(aliased.name(), "id");
        assert_eq!(aliased.aliased_name(), "foo_id");
        assert_eq!(id.alias_name(), None);

        let set: HashSet<Column> = [id.clone(), aliased].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn same_name_from_a_new_snapshot_is_a_different_column() {
        let db = db();
        let before = db.get_table("foo").unwrap().column("id").unwrap();
        db.forget();
        let after = db.get_table("foo").unwrap().column("id").unwrap();

        assert_eq!(before.qualified_name(), after.qualified_name());
        assert_ne!(before, after);
    }

    #[test]
    fn back_reference_reaches_the_owner() {
        let db = db();
        let foo = db.get_table("foo").unwrap();
        let value = foo.column("value").unwrap();

        assert_eq!(value.table_name(), "foo");
        assert_eq!(value.table(), Some(foo.clone()));
        assert!(value.table_ref().refers_to(&foo));
        assert_eq!(value.to_string(), "foo.value");
        assert_eq!(value.qualified_name(), "foo.value");
    }

    #[test]
    fn back_reference_does_not_keep_the_table_alive() {
        let db = db();
        let value = db.get_table("foo").unwrap().column("value").unwrap();
        db.forget();
        assert!(value.table().is_none());
        assert_eq!(value.table_name(), "foo");
    }
}
