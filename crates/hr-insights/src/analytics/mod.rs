//! Aggregate views over the employee records.
//!
//! Every view is described once as an [`AggregatePlan`] and can be evaluated
//! by either backend: [`MemoryBackend`] scans a loaded [`Table`](crate::store::Table),
//! [`SqlBackend`] compiles the plan to SQL and runs it against the store. For
//! the same data and filter both return the same keys and values.

mod engine;
mod memory;
mod plan;
pub mod profile;
mod sql;
pub mod views;

use crate::store::{Cell, StoreError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use engine::InsightEngine;
pub use memory::MemoryBackend;
pub use plan::{AggregatePlan, DepartmentFilter, Measure, SortKey};
pub use sql::SqlBackend;
pub use views::{
    education_label, Dashboard, DepartmentHeadcount, DepartmentPerformance, EducationIncome,
    HeadlineMetrics, OvertimeAttrition, RoleIncome, TopPerformer, WorkLifeAttrition,
};

/// Output rows of a plan: group keys followed by measure values.
pub type AggregateRows = Vec<Vec<Cell>>;

/// Executes aggregate plans.
pub trait AggregationBackend {
    fn aggregate(&self, plan: &AggregatePlan) -> Result<AggregateRows, AnalyticsError>;
}

/// Which backend computes a dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// The cached in-memory snapshot.
    #[default]
    Memory,
    /// A fresh query against the store.
    Sql,
}

impl DataSource {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sql => "sql",
        }
    }
}

impl FromStr for DataSource {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "dataframe" => Ok(Self::Memory),
            "sql" | "database" => Ok(Self::Sql),
            other => Err(AnalyticsError::UnknownSource(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("column {0} is not numeric")]
    NotNumeric(String),
    #[error("histogram needs at least one bin")]
    InvalidBins,
    #[error("unexpected value {value:?} in column {column}")]
    InvalidValue { column: &'static str, value: String },
    #[error("backend returned rows of width {actual}, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("unknown data source '{0}' (expected memory or sql)")]
    UnknownSource(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_source_parses_labels_and_aliases() {
        assert_eq!("memory".parse::<DataSource>().ok(), Some(DataSource::Memory));
        assert_eq!(" SQL ".parse::<DataSource>().ok(), Some(DataSource::Sql));
        assert_eq!("database".parse::<DataSource>().ok(), Some(DataSource::Sql));
        assert!(matches!(
            "csv".parse::<DataSource>(),
            Err(AnalyticsError::UnknownSource(source)) if source == "csv"
        ));
    }
}
