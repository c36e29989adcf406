//! Data-access and aggregation layer for the HR attrition dashboard.
//!
//! The store is a single SQLite file bootstrapped from the attrition CSV.
//! [`service::EmployeeService`] ties the repository, the snapshot cache and the
//! insight views together; [`router::insights_router`] exposes them over HTTP.

pub mod analytics;
pub mod config;
pub mod error;
pub mod router;
pub mod service;
pub mod store;
pub mod telemetry;
