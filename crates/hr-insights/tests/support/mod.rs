#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use hr_insights::service::EmployeeService;
use hr_insights::store::{ensure_store, SqliteRepository};
use tempfile::TempDir;

/// Eleven employees across three departments. Employee 12 has no income on
/// record and employee 14 has no department.
pub const EMPLOYEES_CSV: &str = "\u{feff}EmployeeNumber,Age,Department,JobRole,MonthlyIncome,Education,WorkLifeBalance,OverTime,Attrition,EmployeeCount,PerformanceRating
1,41,Sales,Sales Executive,5993,2,1,Yes,Yes,1,3
2,49,Research & Development,Research Scientist,5130,1,3,No,No,1,4
4,37,Research & Development,Laboratory Technician,2090,2,3,Yes,Yes,1,3
5,33,Research & Development,Research Scientist,2909,4,3,Yes,No,1,3
7,27,Research & Development,Laboratory Technician,3468,1,3,No,No,1,4
8,32,Research & Development,Laboratory Technician,3068,2,2,No,No,1,3
10,59,Research & Development,Laboratory Technician,2670,3,2,Yes,No,1,4
11,30,Research & Development,Laboratory Technician,2693,1,3,No,No,1,4
12,38,Sales,Sales Executive,,3,3,No,No,1,4
13,36,Human Resources,Human Resources,9526,3,2,No,Yes,1,3
14,35,,Manager,8000,5,4,Yes,Yes,1,3
";

pub struct Fixture {
    pub dir: TempDir,
    pub csv_path: PathBuf,
    pub store_path: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv_path = dir.path().join("attrition.csv");
        std::fs::write(&csv_path, EMPLOYEES_CSV).expect("write csv");
        let store_path = dir.path().join("data").join("employees.db");
        Self {
            dir,
            csv_path,
            store_path,
        }
    }

    pub fn bootstrapped() -> Self {
        let fixture = Self::new();
        ensure_store(&fixture.csv_path, &fixture.store_path).expect("bootstrap");
        fixture
    }

    pub fn repository(&self) -> Arc<SqliteRepository> {
        Arc::new(SqliteRepository::new(&self.store_path))
    }

    pub fn service(&self) -> EmployeeService<SqliteRepository> {
        EmployeeService::new(self.repository())
    }
}
