//! Single-file relational store holding the `employees` table.

mod bootstrap;
mod cache;
mod error;
mod repository;
pub mod schema;
mod table;

pub use bootstrap::{ensure_store, BootstrapOutcome};
pub use cache::{Snapshot, SnapshotCache};
pub use error::StoreError;
pub use repository::{EmployeeRepository, EmployeeUpdate, NewEmployee, OverTime, SqliteRepository};
pub use table::{Cell, Column, ColumnKind, Table};
