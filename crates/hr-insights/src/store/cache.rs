use super::error::StoreError;
use super::repository::EmployeeRepository;
use super::table::Table;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Immutable copy of the table tagged with the generation it was loaded at.
#[derive(Debug)]
pub struct Snapshot {
    pub generation: u64,
    pub table: Table,
}

/// Memoizes [`EmployeeRepository::load_all`] until the generation advances.
///
/// Raw [`EmployeeRepository::execute`] calls do not advance the generation;
/// the snapshot stays stale until [`SnapshotCache::invalidate`] is called.
pub struct SnapshotCache<R> {
    repository: Arc<R>,
    generation: AtomicU64,
    slot: Mutex<Option<Arc<Snapshot>>>,
}

impl<R: EmployeeRepository> SnapshotCache<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            generation: AtomicU64::new(0),
            slot: Mutex::new(None),
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Returns the cached snapshot, reloading it when the generation moved on.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>, StoreError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.generation();

        if let Some(snapshot) = slot.as_ref() {
            if snapshot.generation == generation {
                return Ok(Arc::clone(snapshot));
            }
        }

        let table = self.repository.load_all()?;
        debug!(generation, rows = table.len(), "snapshot reloaded");
        let snapshot = Arc::new(Snapshot { generation, table });
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Marks any cached snapshot stale and returns the new generation.
    pub fn invalidate(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_stale(&self, snapshot: &Snapshot) -> bool {
        snapshot.generation != self.generation()
    }
}
