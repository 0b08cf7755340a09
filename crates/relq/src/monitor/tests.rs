use super::*;
use crate::driver::{Driver, Row};
use crate::error::{OrmError, OrmResult};
use crate::params;
use crate::value::{Params, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Shared EchoDriver for tests ──

/// Records executed SQL; `query` yields one row per bound parameter.
#[derive(Default)]
struct EchoDriver {
    seen: Mutex<Vec<String>>,
}

impl EchoDriver {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl Driver for EchoDriver {
    fn query(&self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        self.seen.lock().unwrap().push(sql.to_string());
        if sql.contains("missing") {
            return Err(OrmError::TableNotFound("missing".into()));
        }
        Ok(params.values().map(|v| vec![v.clone()]).collect())
    }

    fn execute(&self, sql: &str, _params: &Params) -> OrmResult<u64> {
        self.seen.lock().unwrap().push(sql.to_string());
        Ok(1)
    }
}

fn monitored() -> (InstrumentedDriver<Arc<EchoDriver>>, Arc<EchoDriver>, Arc<StatsMonitor>) {
    let inner = Arc::new(EchoDriver::default());
    let stats = Arc::new(StatsMonitor::new());
    let driver = InstrumentedDriver::new(Arc::clone(&inner))
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor_arc(stats.clone());
    (driver, inner, stats)
}

#[test]
fn test_query_type_detection() {
    assert_eq!(QueryType::from_sql("SELECT * FROM users"), QueryType::Select);
    assert_eq!(QueryType::from_sql("  select * FROM users"), QueryType::Select);
    assert_eq!(
        QueryType::from_sql("WITH cte AS (SELECT 1) SELECT * FROM cte"),
        QueryType::Select
    );
    assert_eq!(
        QueryType::from_sql("INSERT INTO users (name) VALUES (:name)"),
        QueryType::Insert
    );
    assert_eq!(QueryType::from_sql("UPDATE users SET name = :name"), QueryType::Update);
    assert_eq!(QueryType::from_sql("DELETE FROM users"), QueryType::Delete);
    assert_eq!(QueryType::from_sql("PRAGMA table_info(users)"), QueryType::Pragma);
    assert_eq!(QueryType::from_sql("CREATE TABLE users (id INT)"), QueryType::Other);
    assert_eq!(QueryType::from_sql("SELECTED"), QueryType::Other);
}

#[test]
fn test_truncate_respects_char_boundaries() {
    assert_eq!(truncate_sql_bytes("SELECT 'é'", 9), "SELECT '");
    assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
}

#[test]
fn test_logging_monitor_truncation() {
    let monitor = LoggingMonitor::new().max_sql_length(10);
    assert_eq!(monitor.truncate_sql("SELECT * FROM users"), "SELECT * F...");
    assert_eq!(monitor.truncate_sql("SELECT 1"), "SELECT 1");
}

#[test]
fn test_query_result_error_is_truncated() {
    let QueryResult::Error(msg) = QueryResult::error("x".repeat(2000)) else {
        panic!("expected error result");
    };
    assert_eq!(msg.len(), 512 + 3);
}

#[test]
fn test_stats_monitor() {
    let monitor = StatsMonitor::new();
    let ctx = QueryContext::new("SELECT * FROM users", vec![]);

    monitor.on_query_complete(&ctx, Duration::from_millis(10), &QueryResult::Rows(5));
    monitor.on_query_complete(&ctx, Duration::from_millis(20), &QueryResult::Rows(3));

    let stats = monitor.stats();
    assert_eq!(stats.total_queries, 2);
    assert_eq!(stats.select_count, 2);
    assert_eq!(stats.total_duration, Duration::from_millis(30));
    assert_eq!(stats.max_duration, Duration::from_millis(20));
    assert_eq!(stats.slowest_query.as_deref(), Some("SELECT * FROM users"));

    monitor.reset();
    let stats = monitor.stats();
    assert_eq!(stats.total_queries, 0);
    assert!(stats.slowest_query.is_none());
}

#[test]
fn test_instrumented_driver_reports_every_statement() {
    let (driver, inner, stats) = monitored();

    let rows = driver
        .query("SELECT * FROM foo WHERE a = :a", &params! { "a" => 1 })
        .unwrap();
    assert_eq!(rows, vec![vec![Value::Integer(1)]]);
    driver.query("PRAGMA table_info(foo)", &Params::new()).unwrap();
    driver
        .execute("INSERT INTO foo (a) VALUES (:a)", &params! { "a" => 2 })
        .unwrap();
    assert!(driver.query("SELECT * FROM missing", &Params::new()).is_err());

    let stats = stats.stats();
    assert_eq!(stats.total_queries, 4);
    assert_eq!(stats.select_count, 2);
    assert_eq!(stats.pragma_count, 1);
    assert_eq!(stats.insert_count, 1);
    assert_eq!(stats.failed_queries, 1);
    assert_eq!(inner.seen().len(), 4);
}

#[test]
fn test_monitoring_disabled_by_default() {
    let stats = Arc::new(StatsMonitor::new());
    let driver = InstrumentedDriver::new(EchoDriver::default()).with_monitor_arc(stats.clone());
    assert!(!driver.is_monitoring_enabled());

    driver.query("SELECT 1", &Params::new()).unwrap();
    assert_eq!(stats.stats().total_queries, 0);
}

struct AddCommentHook;
impl QueryHook for AddCommentHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        HookAction::ModifySql {
            exec_sql: format!("/* relq */ {}", ctx.exec_sql),
            canonical_sql: None,
        }
    }
}

struct BlockDeleteHook;
impl QueryHook for BlockDeleteHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        if ctx.query_type == QueryType::Delete {
            HookAction::Abort("DELETE not allowed".to_string())
        } else {
            HookAction::Continue
        }
    }
}

#[test]
fn test_composite_hook_modify() {
    let hook = CompositeHook::new().add(AddCommentHook);
    let ctx = QueryContext::new("SELECT 1", vec![]);

    match hook.before_query(&ctx) {
        HookAction::ModifySql {
            exec_sql,
            canonical_sql,
        } => {
            assert_eq!(exec_sql, "/* relq */ SELECT 1");
            assert!(canonical_sql.is_none());
        }
        _ => panic!("Expected ModifySql"),
    }
}

#[test]
fn test_composite_hook_abort() {
    let hook = CompositeHook::new().add(AddCommentHook).add(BlockDeleteHook);
    let ctx = QueryContext::new("DELETE FROM users", vec![]);
    assert!(matches!(hook.before_query(&ctx), HookAction::Abort(_)));
}

#[test]
fn test_hook_rewrites_executed_sql() {
    let (driver, inner, stats) = monitored();
    let driver = driver.add_hook(AddCommentHook);

    driver.query("SELECT 1", &Params::new()).unwrap();
    assert_eq!(inner.seen(), vec!["/* relq */ SELECT 1".to_string()]);
    assert_eq!(stats.stats().total_queries, 1);
}

#[test]
fn test_hook_abort_skips_driver() {
    let (driver, inner, stats) = monitored();
    let driver = driver.add_hook(TracingSqlHook::new()).add_hook(BlockDeleteHook);

    let err = driver.execute("DELETE FROM users", &Params::new()).unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    assert!(err.to_string().contains("DELETE not allowed"));
    assert!(inner.seen().is_empty());
    assert_eq!(stats.stats().total_queries, 0);
}

#[test]
fn test_hooks_run_with_monitoring_disabled() {
    #[derive(Default)]
    struct CountingHook {
        before: Mutex<u32>,
        after: Mutex<u32>,
    }
    impl QueryHook for CountingHook {
        fn before_query(&self, _: &QueryContext) -> HookAction {
            *self.before.lock().unwrap() += 1;
            HookAction::Continue
        }
        fn after_query(&self, _: &QueryContext, _: Duration, _: &QueryResult) {
            *self.after.lock().unwrap() += 1;
        }
    }

    let hook = Arc::new(CountingHook::default());
    let stats = Arc::new(StatsMonitor::new());
    let driver = InstrumentedDriver::new(EchoDriver::default())
        .with_monitor_arc(stats.clone())
        .with_hook_arc(hook.clone());
    assert!(!driver.is_monitoring_enabled());

    driver.query("SELECT 1", &Params::new()).unwrap();
    driver.execute("INSERT INTO t (a) VALUES (1)", &Params::new()).unwrap();

    assert_eq!(*hook.before.lock().unwrap(), 2);
    assert_eq!(*hook.after.lock().unwrap(), 2);
    assert_eq!(stats.stats().total_queries, 0);
}

#[test]
fn test_slow_query_callback() {
    #[derive(Default)]
    struct SlowCounter(Mutex<u32>);
    impl QueryMonitor for SlowCounter {
        fn on_query_complete(&self, _: &QueryContext, _: Duration, _: &QueryResult) {}
        fn on_slow_query(&self, _: &QueryContext, _: Duration) {
            *self.0.lock().unwrap() += 1;
        }
    }

    let counter = Arc::new(SlowCounter::default());
    let driver = InstrumentedDriver::new(EchoDriver::default())
        .with_config(
            MonitorConfig::new()
                .with_slow_query_threshold(Duration::ZERO)
                .enable_monitoring(),
        )
        .with_monitor(CompositeMonitor::new().add(LoggingMonitor::new()).add_arc(counter.clone()));

    driver.query("SELECT 1", &Params::new()).unwrap();
    assert_eq!(*counter.0.lock().unwrap(), 1);
}
