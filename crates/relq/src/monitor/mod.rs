//! Statement monitoring and hooks.
//!
//! [`InstrumentedDriver`] wraps any [`Driver`](crate::Driver) and reports every statement
//! (including the catalog and `PRAGMA` reads the query layer issues on its own) to a
//! [`QueryMonitor`]. Hooks can inspect, rewrite or abort statements before they run.
//!
//! # Example
//!
//! ```rust,ignore
//! use relq::monitor::{InstrumentedDriver, LoggingMonitor, MonitorConfig, StatsMonitor};
//! use relq::{Database, SqliteDriver};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let stats = Arc::new(StatsMonitor::new());
//! let driver = InstrumentedDriver::new(SqliteDriver::open_in_memory()?)
//!     .with_config(
//!         MonitorConfig::new()
//!             .with_slow_query_threshold(Duration::from_millis(50))
//!             .enable_monitoring(),
//!     )
//!     .with_monitor_arc(stats.clone());
//!
//! let db = Database::new(driver);
//! ```

mod config;
mod instrumented;
mod monitors;
mod tracing_hook;
mod types;

#[cfg(test)]
mod tests;

pub use config::MonitorConfig;
pub use instrumented::InstrumentedDriver;
pub use monitors::{
    CompositeHook, CompositeMonitor, LoggingMonitor, NoopMonitor, QueryStats, StatsMonitor,
};
pub use tracing_hook::TracingSqlHook;
pub use types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
