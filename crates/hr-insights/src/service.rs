use std::sync::Arc;

use tracing::{debug, info};

use crate::analytics::profile::{self, Histogram, MissingCount, Preview};
use crate::analytics::{
    AnalyticsError, Dashboard, DataSource, DepartmentFilter, InsightEngine, MemoryBackend,
    SqlBackend,
};
use crate::config::StoreConfig;
use crate::store::{
    ensure_store, BootstrapOutcome, EmployeeRepository, EmployeeUpdate, NewEmployee, Snapshot,
    SnapshotCache, SqliteRepository, StoreError,
};

/// Service composing the repository, the snapshot cache and the insight views.
///
/// Mutations made here invalidate the cached snapshot so the next read sees
/// them. Writes issued directly against the repository do not.
pub struct EmployeeService<R> {
    repository: Arc<R>,
    cache: SnapshotCache<R>,
}

impl EmployeeService<SqliteRepository> {
    /// Bootstraps the store if needed and wraps it in a service.
    pub fn open(config: &StoreConfig) -> Result<(Self, BootstrapOutcome), StoreError> {
        let outcome = ensure_store(&config.csv_path, &config.store_path)?;
        let repository = Arc::new(SqliteRepository::new(&config.store_path));
        Ok((Self::new(repository), outcome))
    }
}

impl<R> EmployeeService<R>
where
    R: EmployeeRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        let cache = SnapshotCache::new(Arc::clone(&repository));
        Self { repository, cache }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn snapshot(&self) -> Result<Arc<Snapshot>, StoreError> {
        self.cache.snapshot()
    }

    /// Drops the cached snapshot and loads a fresh one.
    pub fn refresh(&self) -> Result<Arc<Snapshot>, StoreError> {
        let generation = self.cache.invalidate();
        debug!(generation, "snapshot invalidated on request");
        self.cache.snapshot()
    }

    pub fn add(&self, employee: &NewEmployee) -> Result<(), StoreError> {
        self.repository.insert_employee(employee)?;
        self.cache.invalidate();
        info!(employee_number = employee.employee_number, "employee added");
        Ok(())
    }

    pub fn update(&self, update: &EmployeeUpdate) -> Result<usize, StoreError> {
        let matched = self.repository.update_employee(update)?;
        if matched > 0 {
            self.cache.invalidate();
        }
        info!(employee_number = update.employee_number, matched, "employee updated");
        Ok(matched)
    }

    pub fn remove(&self, employee_number: i64) -> Result<usize, StoreError> {
        let removed = self.repository.delete_employee(employee_number)?;
        if removed > 0 {
            self.cache.invalidate();
        }
        info!(employee_number, removed, "employee removed");
        Ok(removed)
    }

    /// Computes every view, either from the cached snapshot or straight from the store.
    pub fn dashboard(
        &self,
        source: DataSource,
        filter: &DepartmentFilter,
    ) -> Result<Dashboard, AnalyticsError> {
        debug!(source = source.label(), ?filter, "computing dashboard");
        match source {
            DataSource::Memory => {
                let snapshot = self.cache.snapshot()?;
                InsightEngine::new(MemoryBackend::new(&snapshot.table)).dashboard(filter)
            }
            DataSource::Sql => {
                InsightEngine::new(SqlBackend::new(self.repository.as_ref())).dashboard(filter)
            }
        }
    }

    pub fn departments(&self) -> Result<Vec<String>, AnalyticsError> {
        let snapshot = self.cache.snapshot()?;
        profile::departments(&snapshot.table)
    }

    pub fn missing_values(&self) -> Result<Vec<MissingCount>, AnalyticsError> {
        let snapshot = self.cache.snapshot()?;
        Ok(profile::missing_values(&snapshot.table))
    }

    pub fn numeric_columns(&self) -> Result<Vec<String>, AnalyticsError> {
        let snapshot = self.cache.snapshot()?;
        Ok(profile::numeric_columns(&snapshot.table))
    }

    pub fn preview<S: AsRef<str>>(
        &self,
        columns: &[S],
        limit: Option<usize>,
    ) -> Result<Preview, AnalyticsError> {
        let snapshot = self.cache.snapshot()?;
        profile::preview(&snapshot.table, columns, limit)
    }

    pub fn histogram(&self, column: &str, bins: usize) -> Result<Histogram, AnalyticsError> {
        let snapshot = self.cache.snapshot()?;
        profile::histogram(&snapshot.table, column, bins)
    }
}
