//! Catalog access: table enumeration, lookup and join creation.

use crate::column::Column;
use crate::driver::{Driver, DriverHandle};
use crate::error::{OrmError, OrmResult};
use crate::join::Join;
use crate::memo::Memo;
use crate::selection::Selection;
use crate::table::Table;
use crate::value::{FromValue, Params};
use std::fmt;
use std::sync::Arc;

const LIST_TABLES_SQL: &str = "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name;";

/// Entry point over a store: discovers its tables and caches them per instance.
///
/// # Example
///
/// ```ignore
/// use relq::{Database, Selectable, SqliteDriver, params};
///
/// let db = Database::new(SqliteDriver::open("app.db")?);
/// let users = db.get_table("users")?;
/// users.insert(&params! { "name" => "alice" })?;
/// let alice = users.select_one_where(&params! { "name" => "alice" })?;
/// # Ok::<(), relq::OrmError>(())
/// ```
pub struct Database {
    driver: DriverHandle,
    tables: Memo<Arc<Vec<Table>>>,
}

impl Database {
    /// Create a database over `driver`.
    pub fn new<D: Driver + 'static>(driver: D) -> Self {
        Self::from_handle(Arc::new(driver))
    }

    /// Create a database over an already shared driver.
    pub fn from_handle(driver: DriverHandle) -> Self {
        Self {
            driver,
            tables: Memo::new(),
        }
    }

    pub fn driver(&self) -> &DriverHandle {
        &self.driver
    }

    /// All tables listed by the catalog, sorted by name. Cached until [`Database::forget`];
    /// repeated calls share one list.
    pub fn tables(&self) -> OrmResult<Arc<Vec<Table>>> {
        self.tables.get_or_try_init(|| {
            let rows = self.driver.query(LIST_TABLES_SQL, &Params::new())?;
            let tables = rows
                .iter()
                .map(|row| {
                    let cell = row
                        .first()
                        .ok_or_else(|| OrmError::decode("name", "empty catalog row"))?;
                    let name = String::from_value(cell, "name")?;
                    Ok(Table::new(Arc::clone(&self.driver), name))
                })
                .collect::<OrmResult<Vec<_>>>()?;
            Ok(Arc::new(tables))
        })
    }

    /// Names of all tables, sorted.
    pub fn table_names(&self) -> OrmResult<Vec<String>> {
        Ok(self
            .tables()?
            .iter()
            .map(|t| t.name().to_string())
            .collect())
    }

    /// The cached handle for `name`.
    pub fn get_table(&self, name: &str) -> OrmResult<Table> {
        self.tables()?
            .iter()
            .find(|t| t.name() == name)
            .cloned()
            .ok_or_else(|| OrmError::TableNotFound(name.to_string()))
    }

    pub fn has_table(&self, name: &str) -> OrmResult<bool> {
        Ok(self.tables()?.iter().any(|t| t.name() == name))
    }

    /// Discard this database's cached table list.
    ///
    /// Handles obtained before the call keep their own column caches and no longer
    /// compare equal to handles obtained after it.
    pub fn forget(&self) {
        self.tables.forget();
    }

    /// Build a [`Join`] from its conditions and aliased output columns.
    pub fn create_join<S, A>(&self, selections: S, aliases: A) -> OrmResult<Join>
    where
        S: IntoIterator<Item = Selection>,
        A: IntoIterator<Item = Column>,
    {
        Join::new(selections, aliases)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("tables_cached", &self.tables.is_cached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SchemaDriver;

    fn db() -> (Arc<SchemaDriver>, Database) {
        let driver = Arc::new(
            SchemaDriver::new()
                .with_table("foo", &["id", "value"])
                .with_table("bar", &["id", "foo_id"]),
        );
        let db = Database::from_handle(driver.clone());
        (driver, db)
    }

    #[test]
    fn lists_tables_sorted() {
        let (_driver, db) = db();
        assert_eq!(db.table_names().unwrap(), vec!["bar", "foo"]);
        assert!(db.has_table("foo").unwrap());
        assert!(!db.has_table("baz").unwrap());
    }

    #[test]
    fn get_table_returns_the_cached_instance() {
        let (driver, db) = db();
        let a = db.get_table("foo").unwrap();
        let b = db.get_table("foo").unwrap();
        assert_eq!(a, b);
        assert_eq!(driver.count_matching("SELECT name FROM sqlite_master"), 1);
    }

    #[test]
    fn cache_hits_share_the_table_list() {
        let (_driver, db) = db();
        let first = db.tables().unwrap();
        let second = db.tables().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        db.forget();
        assert!(!Arc::ptr_eq(&first, &db.tables().unwrap()));
    }

    #[test]
    fn unknown_table_is_reported() {
        let (_driver, db) = db();
        let err = db.get_table("baz").unwrap_err();
        assert!(matches!(err, OrmError::TableNotFound(ref name) if name == "baz"));
    }

    #[test]
    fn forget_rereads_the_catalog() {
        let (driver, db) = db();
        let before = db.get_table("foo").unwrap();
        before.column("id").unwrap();

        driver.set_table("baz", &["id"]);
        assert!(!db.has_table("baz").unwrap());

        db.forget();
        assert!(db.has_table("baz").unwrap());
        let after = db.get_table("foo").unwrap();
        assert_ne!(before, after);
        assert_eq!(driver.count_matching("SELECT name FROM sqlite_master"), 2);

        // The old handle keeps its own column cache.
        before.column("value").unwrap();
        assert_eq!(driver.count_matching("PRAGMA"), 1);
    }

    #[test]
    fn forget_leaves_other_databases_alone() {
        let (driver, first) = db();
        let second = Database::from_handle(driver.clone());
        first.tables().unwrap();
        second.tables().unwrap();

        first.forget();
        second.tables().unwrap();
        assert_eq!(driver.count_matching("SELECT name FROM sqlite_master"), 2);
        first.tables().unwrap();
        assert_eq!(driver.count_matching("SELECT name FROM sqlite_master"), 3);
    }
}
