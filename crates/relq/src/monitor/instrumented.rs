use super::config::MonitorConfig;
use super::monitors::{CompositeHook, NoopMonitor};
use super::types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryType};
use crate::driver::{Driver, Row};
use crate::error::{OrmError, OrmResult};
use crate::value::Params;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A driver wrapper that runs hooks and reports every statement to a monitor.
///
/// Monitoring must be explicitly enabled via [`MonitorConfig::enable_monitoring`].
/// Hooks run either way.
pub struct InstrumentedDriver<D> {
    driver: D,
    monitor: Arc<dyn QueryMonitor>,
    hook: Option<Arc<dyn QueryHook>>,
    config: MonitorConfig,
}

impl<D: Driver> InstrumentedDriver<D> {
    /// Wrap `driver` with no monitoring.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            monitor: Arc::new(NoopMonitor),
            hook: None,
            config: MonitorConfig::default(),
        }
    }

    /// Set the monitor configuration.
    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the query monitor.
    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    /// Set the query monitor from an Arc, keeping a handle for reading it back.
    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Set a query hook, replacing any existing one.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Set a query hook from an Arc, replacing any existing one.
    pub fn with_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Add a query hook.
    ///
    /// If a hook is already set, this composes it with the new hook (existing first).
    pub fn add_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        let hook: Arc<dyn QueryHook> = Arc::new(hook);
        self.hook = Some(match self.hook.take() {
            None => hook,
            Some(existing) => Arc::new(CompositeHook::new().add_arc(existing).add_arc(hook)),
        });
        self
    }

    pub fn is_monitoring_enabled(&self) -> bool {
        self.config.monitoring_enabled
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Get a reference to the wrapped driver.
    pub fn inner(&self) -> &D {
        &self.driver
    }

    /// Get the wrapped driver, consuming this wrapper.
    pub fn into_inner(self) -> D {
        self.driver
    }

    fn apply_hook(&self, ctx: &mut QueryContext) -> OrmResult<()> {
        let Some(hook) = &self.hook else {
            return Ok(());
        };

        match hook.before_query(ctx) {
            HookAction::Continue => Ok(()),
            HookAction::ModifySql {
                exec_sql,
                canonical_sql,
            } => {
                ctx.exec_sql = exec_sql;
                if let Some(canonical_sql) = canonical_sql {
                    ctx.canonical_sql = canonical_sql;
                }
                ctx.query_type = QueryType::from_sql(&ctx.canonical_sql);
                Ok(())
            }
            HookAction::Abort(reason) => Err(OrmError::validation(format!(
                "statement aborted by hook: {reason}"
            ))),
        }
    }

    fn report_result(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if let Some(hook) = &self.hook {
            hook.after_query(ctx, duration, result);
        }

        if !self.config.monitoring_enabled {
            return;
        }

        self.monitor.on_query_complete(ctx, duration, result);

        if let Some(threshold) = self.config.slow_query_threshold
            && duration > threshold
        {
            self.monitor.on_slow_query(ctx, duration);
        }
    }

    /// Run `run` under the hook/monitor lifecycle, describing its outcome with `outcome`.
    fn instrument<T>(
        &self,
        sql: &str,
        params: &Params,
        run: impl FnOnce(&str) -> OrmResult<T>,
        outcome: impl FnOnce(&T) -> QueryResult,
    ) -> OrmResult<T> {
        let mut ctx = QueryContext::new(sql, params.keys().cloned().collect());
        self.apply_hook(&mut ctx)?;

        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = run(&ctx.exec_sql);
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(value) => outcome(value),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.report_result(&ctx, duration, &query_result);
        result
    }
}

impl<D: Driver> Driver for InstrumentedDriver<D> {
    fn query(&self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        self.instrument(
            sql,
            params,
            |exec_sql| self.driver.query(exec_sql, params),
            |rows| QueryResult::Rows(rows.len()),
        )
    }

    fn execute(&self, sql: &str, params: &Params) -> OrmResult<u64> {
        self.instrument(
            sql,
            params,
            |exec_sql| self.driver.execute(exec_sql, params),
            |affected| QueryResult::Affected(*affected),
        )
    }
}

impl<D> fmt::Debug for InstrumentedDriver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentedDriver")
            .field("config", &self.config)
            .field("has_hook", &self.hook.is_some())
            .finish_non_exhaustive()
    }
}
