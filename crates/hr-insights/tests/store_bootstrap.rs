//! Bootstrap and repository behavior against a real store file.

mod support;

use hr_insights::store::{
    ensure_store, BootstrapOutcome, Cell, ColumnKind, EmployeeRepository, NewEmployee,
    SqliteRepository, StoreError,
};
use support::Fixture;

#[test]
fn bootstrap_creates_store_once_and_never_resyncs() {
    let fixture = Fixture::new();

    let outcome = ensure_store(&fixture.csv_path, &fixture.store_path).expect("bootstrap");
    assert_eq!(
        outcome,
        BootstrapOutcome::Created {
            rows: 11,
            columns: 11
        }
    );
    let first = std::fs::read(&fixture.store_path).expect("store bytes");

    std::fs::write(&fixture.csv_path, "EmployeeNumber\n99\n").expect("rewrite csv");
    let again = ensure_store(&fixture.csv_path, &fixture.store_path).expect("second call");
    assert_eq!(again, BootstrapOutcome::AlreadyPresent);
    assert_eq!(std::fs::read(&fixture.store_path).expect("store bytes"), first);

    std::fs::remove_file(&fixture.csv_path).expect("remove csv");
    assert_eq!(
        ensure_store(&fixture.csv_path, &fixture.store_path).expect("csv gone"),
        BootstrapOutcome::AlreadyPresent
    );
}

#[test]
fn missing_source_fails_without_leaving_files_behind() {
    let fixture = Fixture::new();
    let absent = fixture.dir.path().join("absent.csv");

    let error = ensure_store(&absent, &fixture.store_path).expect_err("no source");
    assert!(matches!(error, StoreError::SourceNotFound { path } if path == absent));
    assert!(!fixture.store_path.exists());
    assert!(!fixture.store_path.with_extension("db.partial").exists());
}

#[test]
fn load_all_reflects_inferred_column_types() {
    let fixture = Fixture::bootstrapped();
    let table = fixture.repository().load_all().expect("load");

    assert_eq!(table.len(), 11);
    assert_eq!(table.columns()[0].name, "EmployeeNumber");
    assert_eq!(
        table.column("EmployeeNumber").map(|column| column.kind),
        Some(ColumnKind::Integer)
    );
    assert_eq!(
        table.column("MonthlyIncome").map(|column| column.kind),
        Some(ColumnKind::Real)
    );
    assert_eq!(
        table.column("Department").map(|column| column.kind),
        Some(ColumnKind::Text)
    );

    let last = &table.rows()[10];
    assert_eq!(last[0], Cell::Integer(14));
    assert_eq!(last[2], Cell::Null);
}

#[test]
fn insert_then_delete_round_trips_through_the_store() {
    let fixture = Fixture::bootstrapped();
    let repository = fixture.repository();

    repository
        .insert_employee(&NewEmployee {
            employee_number: 3000,
            department: "Human Resources".to_string(),
            job_role: "Recruiter".to_string(),
            monthly_income: 4500,
            education: 2,
            work_life_balance: 3,
        })
        .expect("insert");

    let table = repository.load_all().expect("load");
    assert_eq!(table.len(), 12);
    let row = &table.rows()[11];
    let count = table.column_index("EmployeeCount").expect("count column");
    let attrition = table.column_index("Attrition").expect("attrition column");
    assert_eq!(row[0], Cell::Integer(3000));
    assert_eq!(row[count], Cell::Integer(1));
    assert_eq!(row[attrition], Cell::Null);

    assert_eq!(repository.delete_employee(3000).expect("delete"), 1);
    let numbers: Vec<Cell> = repository
        .load_all()
        .expect("load")
        .values("EmployeeNumber")
        .expect("column")
        .cloned()
        .collect();
    assert!(!numbers.contains(&Cell::Integer(3000)));
    assert_eq!(numbers.len(), 11);
}

#[test]
fn malformed_statements_are_constraint_violations() {
    let fixture = Fixture::bootstrapped();
    let repository = fixture.repository();

    let error = repository
        .execute("UPDATE employees SET NoSuchColumn = ?", &[Cell::Integer(1)])
        .expect_err("bad column");
    assert!(matches!(error, StoreError::ConstraintViolation(_)));
    assert_eq!(repository.load_all().expect("load").len(), 11);
}

#[test]
fn writes_must_match_the_inferred_column_types() {
    let fixture = Fixture::bootstrapped();
    let repository = fixture.repository();

    let error = repository
        .execute(
            "UPDATE employees SET Education = ? WHERE EmployeeNumber = ?",
            &[Cell::from("high school"), Cell::Integer(2)],
        )
        .expect_err("text in an integer column");
    assert!(matches!(error, StoreError::ConstraintViolation(_)), "{error:?}");

    let table = repository.load_all().expect("load");
    let education = table.column_index("Education").expect("education column");
    assert_eq!(table.rows()[1][0], Cell::Integer(2));
    assert_eq!(table.rows()[1][education], Cell::Integer(1));

    let updated = repository
        .execute(
            "UPDATE employees SET MonthlyIncome = ? WHERE EmployeeNumber = ?",
            &[Cell::Integer(6100), Cell::Integer(2)],
        )
        .expect("integer into a real column");
    assert_eq!(updated, 1);
}

#[test]
fn store_without_employees_table_is_unavailable() {
    let fixture = Fixture::new();
    let parent = fixture.store_path.parent().expect("store parent");
    std::fs::create_dir_all(parent).expect("data dir");
    std::fs::write(&fixture.store_path, b"").expect("empty store file");
    let repository = SqliteRepository::new(&fixture.store_path);

    assert!(matches!(
        repository.load_all(),
        Err(StoreError::StoreUnavailable(_))
    ));
    assert!(matches!(
        repository.execute("DELETE FROM employees", &[]),
        Err(StoreError::StoreUnavailable(_))
    ));
    assert!(matches!(
        repository.query_rows("SELECT COUNT(*) FROM employees", &[]),
        Err(StoreError::StoreUnavailable(_))
    ));
}

#[test]
fn missing_store_is_unavailable() {
    let fixture = Fixture::new();
    let repository = SqliteRepository::new(&fixture.store_path);

    assert!(matches!(
        repository.load_all(),
        Err(StoreError::StoreUnavailable(_))
    ));
    assert!(matches!(
        repository.execute("DELETE FROM employees", &[]),
        Err(StoreError::StoreUnavailable(_))
    ));
    assert!(!fixture.store_path.exists());
}
