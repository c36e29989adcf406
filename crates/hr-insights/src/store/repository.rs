use super::error::StoreError;
use super::schema::{
    quote_ident, DEPARTMENT, EDUCATION, EMPLOYEE_COUNT, EMPLOYEE_NUMBER, JOB_ROLE,
    MONTHLY_INCOME, OVER_TIME, TABLE_NAME, WORK_LIFE_BALANCE,
};
use super::table::{Cell, Column, ColumnKind, Table};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Payload of the "add employee" form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub employee_number: i64,
    pub department: String,
    pub job_role: String,
    pub monthly_income: i64,
    pub education: i64,
    pub work_life_balance: i64,
}

/// Payload of the "update employee" form. Every settable field is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    pub employee_number: i64,
    pub monthly_income: i64,
    pub department: String,
    pub job_role: String,
    pub education: i64,
    pub work_life_balance: i64,
    pub over_time: OverTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverTime {
    Yes,
    No,
}

impl OverTime {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

/// Storage abstraction over the `employees` table.
///
/// Implementations open a connection per call and release it before
/// returning. Mutations never touch any cached snapshot of the table.
pub trait EmployeeRepository: Send + Sync {
    /// Reads every row and column of the table.
    fn load_all(&self) -> Result<Table, StoreError>;

    /// Runs one read-only query and returns its rows.
    fn query_rows(&self, statement: &str, params: &[Cell]) -> Result<Vec<Vec<Cell>>, StoreError>;

    /// Runs one mutating statement in its own transaction and returns the
    /// number of affected rows.
    fn execute(&self, statement: &str, params: &[Cell]) -> Result<usize, StoreError>;

    /// Inserts a new employee; an existing `EmployeeNumber` is rejected.
    fn insert_employee(&self, employee: &NewEmployee) -> Result<(), StoreError> {
        let table = quote_ident(TABLE_NAME);
        let number = quote_ident(EMPLOYEE_NUMBER);
        let columns = [
            EMPLOYEE_NUMBER,
            DEPARTMENT,
            JOB_ROLE,
            MONTHLY_INCOME,
            EDUCATION,
            WORK_LIFE_BALANCE,
            EMPLOYEE_COUNT,
        ]
        .map(quote_ident)
        .join(", ");
        let statement = format!(
            "INSERT INTO {table} ({columns}) SELECT ?1, ?2, ?3, ?4, ?5, ?6, 1 \
             WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE {number} = ?1)"
        );

        let inserted = self.execute(
            &statement,
            &[
                Cell::Integer(employee.employee_number),
                Cell::from(employee.department.as_str()),
                Cell::from(employee.job_role.as_str()),
                Cell::Integer(employee.monthly_income),
                Cell::Integer(employee.education),
                Cell::Integer(employee.work_life_balance),
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::ConstraintViolation(format!(
                "employee {} already exists",
                employee.employee_number
            )));
        }
        Ok(())
    }

    /// Overwrites the settable fields of an employee, returning how many rows matched.
    fn update_employee(&self, update: &EmployeeUpdate) -> Result<usize, StoreError> {
        let assignments = [
            MONTHLY_INCOME,
            DEPARTMENT,
            JOB_ROLE,
            EDUCATION,
            WORK_LIFE_BALANCE,
            OVER_TIME,
        ]
        .map(|column| format!("{} = ?", quote_ident(column)))
        .join(", ");
        let statement = format!(
            "UPDATE {} SET {assignments} WHERE {} = ?",
            quote_ident(TABLE_NAME),
            quote_ident(EMPLOYEE_NUMBER)
        );

        self.execute(
            &statement,
            &[
                Cell::Integer(update.monthly_income),
                Cell::from(update.department.as_str()),
                Cell::from(update.job_role.as_str()),
                Cell::Integer(update.education),
                Cell::Integer(update.work_life_balance),
                Cell::from(update.over_time.as_str()),
                Cell::Integer(update.employee_number),
            ],
        )
    }

    /// Deletes an employee, returning how many rows were removed.
    fn delete_employee(&self, employee_number: i64) -> Result<usize, StoreError> {
        let statement = format!(
            "DELETE FROM {} WHERE {} = ?",
            quote_ident(TABLE_NAME),
            quote_ident(EMPLOYEE_NUMBER)
        );
        self.execute(&statement, &[Cell::Integer(employee_number)])
    }
}

/// Repository backed by the single-file SQLite store.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    path: PathBuf,
}

impl SqliteRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_read_only(&self) -> Result<Connection, StoreError> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(StoreError::unavailable)
    }

    fn open_read_write(&self) -> Result<Connection, StoreError> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(StoreError::unavailable)
    }
}

impl EmployeeRepository for SqliteRepository {
    fn load_all(&self) -> Result<Table, StoreError> {
        let conn = self.open_read_only()?;
        let columns = read_columns(&conn).map_err(StoreError::unavailable)?;
        if columns.is_empty() {
            return Err(StoreError::StoreUnavailable(format!(
                "table {TABLE_NAME} not found in {}",
                self.path.display()
            )));
        }

        let projection: Vec<String> = columns
            .iter()
            .map(|column| quote_ident(&column.name))
            .collect();
        let statement = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            projection.join(", "),
            quote_ident(TABLE_NAME)
        );
        let rows = collect_rows(&conn, &statement, &[]).map_err(StoreError::unavailable)?;

        debug!(rows = rows.len(), columns = columns.len(), "loaded employees table");
        Ok(Table::new(columns, rows))
    }

    fn query_rows(&self, statement: &str, params: &[Cell]) -> Result<Vec<Vec<Cell>>, StoreError> {
        let conn = self.open_read_only()?;
        collect_rows(&conn, statement, params).map_err(StoreError::unavailable)
    }

    fn execute(&self, statement: &str, params: &[Cell]) -> Result<usize, StoreError> {
        let mut conn = self.open_read_write()?;
        let tx = conn.transaction().map_err(StoreError::from_statement)?;
        let affected = tx
            .execute(statement, params_from_iter(params.iter()))
            .map_err(StoreError::from_statement)?;
        tx.commit().map_err(StoreError::from_statement)?;

        info!(affected, "mutation committed");
        Ok(affected)
    }
}

fn read_columns(conn: &Connection) -> rusqlite::Result<Vec<Column>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(TABLE_NAME)))?;
    let columns = stmt
        .query_map([], |row| {
            let name: String = row.get(1)?;
            let declared: Option<String> = row.get(2)?;
            Ok(Column {
                name,
                kind: ColumnKind::from_declared(declared.as_deref()),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn collect_rows(
    conn: &Connection,
    statement: &str,
    params: &[Cell],
) -> rusqlite::Result<Vec<Vec<Cell>>> {
    let mut stmt = conn.prepare(statement)?;
    let width = stmt.column_count();
    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            (0..width)
                .map(|idx| row.get_ref(idx).map(Cell::from))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
