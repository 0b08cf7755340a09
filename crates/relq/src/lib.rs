//! # relq
//!
//! A small relational query layer over a live SQLite database.
//!
//! ## Features
//!
//! - **Runtime schema**: tables and their columns are discovered from the catalog, not declared
//! - **Column predicates**: `column.equals(other)` builds a [`Selection`] usable as a join condition
//! - **Joins**: a [`Join`] is queried exactly like a [`Table`] through the [`Selectable`] trait
//! - **Named records**: rows come back as [`Record`]s keyed by column (or alias) name
//! - **Per-instance caching**: catalog and column metadata is read once, until `forget()`
//! - **Query monitoring**: wrap any [`Driver`] in an [`InstrumentedDriver`] for timing, logging and hooks
//!
//! ## Example
//!
//! ```ignore
//! use relq::{Database, Selectable, SqliteDriver, params};
//!
//! let db = Database::new(SqliteDriver::open("shows.db")?);
//! let episodes = db.get_table("episodes")?;
//! let productions = db.get_table("productions")?;
//!
//! episodes.insert(&params! { "name" => "Pilot", "production_id" => 1 })?;
//!
//! let join = db.create_join(
//!     [episodes.column("production_id")?.equals(productions.column("id")?)],
//!     [productions.column("name")?.alias("production_name")],
//! )?;
//! for record in join.select(None, Some(10))? {
//!     println!("{:?}", record?);
//! }
//! # Ok::<(), relq::OrmError>(())
//! ```

pub mod column;
pub mod database;
pub mod driver;
pub mod error;
pub mod ident;
pub mod join;
pub mod memo;
pub mod monitor;
pub mod record;
pub mod selectable;
pub mod selection;
pub mod table;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
pub(crate) mod testing;

pub use column::{Column, TableRef};
pub use database::Database;
pub use driver::{Driver, DriverHandle, Row};
pub use error::{OrmError, OrmResult};
pub use join::Join;
pub use memo::Memo;
pub use monitor::{
    CompositeHook, CompositeMonitor, HookAction, InstrumentedDriver, LoggingMonitor, MonitorConfig,
    NoopMonitor, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryStats, QueryType,
    StatsMonitor, TracingSqlHook,
};
pub use record::{FromRecord, Record, RecordShape, Records};
pub use selectable::Selectable;
pub use selection::{CompareOp, Operand, Selection};
pub use table::{ColumnInfo, Table};
pub use value::{FromValue, Params, Value};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConfig, SqliteDriver};
