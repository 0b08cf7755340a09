//! Joins: a virtual selectable spanning every table its selections mention.
//!
//! ```ignore
//! let episodes = db.get_table("episodes")?;
//! let productions = db.get_table("productions")?;
//!
//! let join = db.create_join(
//!     [episodes.column("production_id")?.equals(productions.column("id")?)],
//!     [
//!         episodes.column("name")?.alias("episode_name"),
//!         productions.column("name")?.alias("production_name"),
//!     ],
//! )?;
//!
//! // SELECT * FROM episodes, productions WHERE (episodes.production_id = productions.id)
//! for record in join.select(None, None)? {
//!     let record = record?;
//!     println!("{}", record.try_get::<String>("episode_name")?);
//! }
//! ```

use crate::column::Column;
use crate::driver::{Driver, DriverHandle};
use crate::error::{OrmError, OrmResult};
use crate::memo::Memo;
use crate::record::{RecordShape, title_case};
use crate::selectable::Selectable;
use crate::selection::Selection;
use crate::table::Table;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Join of the tables referenced by one or more [`Selection`]s.
///
/// The selections become the mandatory join condition; the FROM clause lists the
/// distinct member tables sorted by name, which also fixes the record field order:
/// tables by name, then each table's columns in declaration order.
pub struct Join {
    selections: Vec<Selection>,
    aliases: Vec<Column>,
    tables: Vec<Table>,
    driver: DriverHandle,
    columns: Memo<Arc<Vec<Column>>>,
    shape: Memo<Arc<RecordShape>>,
}

impl Join {
    /// Build a join from its conditions and the aliased columns used for output naming.
    ///
    /// Fails with [`OrmError::InvalidJoin`] when there are no selections, when a
    /// referenced table has no live handle left, when two distinct table instances share
    /// a name, or when an alias names a column outside the join.
    pub fn new<S, A>(selections: S, aliases: A) -> OrmResult<Self>
    where
        S: IntoIterator<Item = Selection>,
        A: IntoIterator<Item = Column>,
    {
        let selections: Vec<Selection> = selections.into_iter().collect();
        let aliases: Vec<Column> = aliases.into_iter().collect();

        if selections.is_empty() {
            return Err(OrmError::invalid_join("a join needs at least one selection"));
        }

        let mut tables: Vec<Table> = Vec::new();
        for selection in &selections {
            for table_ref in selection.tables() {
                let table = table_ref.upgrade().ok_or_else(|| {
                    OrmError::invalid_join(format!(
                        "table '{}' is no longer available",
                        table_ref.name()
                    ))
                })?;
                if !tables.contains(&table) {
                    tables.push(table);
                }
            }
        }
        tables.sort_by(|a, b| a.name().cmp(b.name()));

        if let Some(pair) = tables.windows(2).find(|w| w[0].name() == w[1].name()) {
            return Err(OrmError::invalid_join(format!(
                "table '{}' is referenced through two different handles",
                pair[0].name()
            )));
        }

        for alias in &aliases {
            if !tables.iter().any(|t| alias.table_ref().refers_to(t)) {
                return Err(OrmError::invalid_join(format!(
                    "aliased column {} does not belong to a joined table",
                    alias.qualified_name()
                )));
            }
        }

        // Non-empty: at least one selection, each referencing at least one table.
        let driver = Arc::clone(tables[0].driver_handle());

        Ok(Self {
            selections,
            aliases,
            tables,
            driver,
            columns: Memo::new(),
            shape: Memo::new(),
        })
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn aliases(&self) -> &[Column] {
        &self.aliases
    }

    /// Distinct member tables, sorted by name.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(Table::name).collect()
    }

    /// Swap in the aliased form of `column`, if one was supplied. O(aliases).
    fn swap_in_alias(&self, column: Column) -> Column {
        self.aliases
            .iter()
            .find(|aliased| aliased.same_column(&column))
            .cloned()
            .unwrap_or(column)
    }

    fn record_name(&self) -> String {
        let mut name: String = self.tables.iter().map(|t| title_case(t.name())).collect();
        name.push_str("Record");
        name
    }

    /// Output field names for `columns`.
    ///
    /// A name produced by an alias must be unique. Plain column names shared by several
    /// tables are qualified as `<table>.<column>`.
    fn field_names(columns: &[Column]) -> OrmResult<Vec<String>> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for column in columns {
            *counts.entry(column.aliased_name()).or_default() += 1;
        }

        for column in columns {
            if column.alias_name().is_some() && counts[column.aliased_name()] > 1 {
                return Err(OrmError::invalid_join(format!(
                    "output field '{}' is produced more than once",
                    column.aliased_name()
                )));
            }
        }

        Ok(columns
            .iter()
            .map(|column| {
                if counts[column.aliased_name()] > 1 {
                    column.qualified_name()
                } else {
                    column.aliased_name().to_string()
                }
            })
            .collect())
    }
}

impl Selectable for Join {
    fn driver(&self) -> &dyn Driver {
        &*self.driver
    }

    fn from_clause(&self) -> String {
        self.table_names().join(", ")
    }

    fn base_where(&self) -> Option<String> {
        let fragments: Vec<String> = self
            .selections
            .iter()
            .map(Selection::to_sql_fragment)
            .collect();
        Some(format!("({})", fragments.join(" AND ")))
    }

    /// Member tables' columns (tables by name, declaration order within), aliases applied.
    fn columns(&self) -> OrmResult<Arc<Vec<Column>>> {
        self.columns.get_or_try_init(|| {
            let mut columns = Vec::new();
            for table in &self.tables {
                columns.extend(table.columns()?.iter().cloned().map(|c| self.swap_in_alias(c)));
            }
            Ok(Arc::new(columns))
        })
    }

    fn record_shape(&self) -> OrmResult<Arc<RecordShape>> {
        self.shape.get_or_try_init(|| {
            let columns = self.columns()?;
            let fields = Self::field_names(&columns)?;
            let shape = RecordShape::new(self.record_name(), fields)
                .map_err(|e| OrmError::invalid_join(e.to_string()))?;
            Ok(Arc::new(shape))
        })
    }
}

impl fmt::Debug for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Join")
            .field("tables", &self.table_names())
            .field("selections", &self.selections)
            .field("aliases", &self.aliases)
            .finish()
    }
}
