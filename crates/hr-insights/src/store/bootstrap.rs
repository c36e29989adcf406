use super::error::StoreError;
use super::schema::{quote_ident, TABLE_NAME};
use super::table::{Cell, ColumnKind};
use rusqlite::{params_from_iter, Connection};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of [`ensure_store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A store file was already present and was left untouched.
    AlreadyPresent,
    /// The store was derived from the CSV source.
    Created { rows: usize, columns: usize },
}

/// Creates the `employees` store from `csv_path` unless a file already exists at
/// `store_path`. Once the store exists it is never re-synced from the CSV.
///
/// The table is `STRICT`: later writes must match the inferred column types.
pub fn ensure_store(csv_path: &Path, store_path: &Path) -> Result<BootstrapOutcome, StoreError> {
    if store_path.exists() {
        debug!(store = %store_path.display(), "store present, skipping bootstrap");
        return Ok(BootstrapOutcome::AlreadyPresent);
    }

    warn!(
        store = %store_path.display(),
        source = %csv_path.display(),
        "store not found, creating it from csv"
    );

    let file = File::open(csv_path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => StoreError::SourceNotFound {
            path: csv_path.to_path_buf(),
        },
        _ => StoreError::write(store_path, err),
    })?;
    let source = read_source(file).map_err(|err| StoreError::write(store_path, err))?;

    if let Some(parent) = store_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| StoreError::write(store_path, err))?;
        }
    }

    let staging = staging_path(store_path);
    if staging.exists() {
        fs::remove_file(&staging).map_err(|err| StoreError::write(&staging, err))?;
    }

    if let Err(err) = write_table(&staging, &source) {
        let _ = fs::remove_file(&staging);
        return Err(StoreError::write(store_path, err));
    }
    fs::rename(&staging, store_path).map_err(|err| StoreError::write(store_path, err))?;

    let outcome = BootstrapOutcome::Created {
        rows: source.rows.len(),
        columns: source.headers.len(),
    };
    info!(
        store = %store_path.display(),
        rows = source.rows.len(),
        columns = source.headers.len(),
        "store created from csv"
    );
    Ok(outcome)
}

#[derive(Debug)]
pub(crate) struct SourceTable {
    pub(crate) headers: Vec<String>,
    pub(crate) kinds: Vec<ColumnKind>,
    pub(crate) rows: Vec<Vec<Cell>>,
}

pub(crate) fn read_source<R: Read>(reader: R) -> Result<SourceTable, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            if idx == 0 {
                header.trim_start_matches('\u{feff}').to_string()
            } else {
                header.to_string()
            }
        })
        .collect();

    let mut raw_rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        raw_rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|idx| infer_kind(raw_rows.iter().map(|row| row[idx].as_str())))
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(raw, kind)| parse_cell(raw, *kind))
                .collect()
        })
        .collect();

    Ok(SourceTable {
        headers,
        kinds,
        rows,
    })
}

/// Integer when every present value is an integer and none are missing, real
/// when every present value is numeric, text otherwise. Columns with no values
/// at all are treated as real, matching how dataframe loaders type them.
fn infer_kind<'a>(values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut integers = true;
    let mut numbers = true;
    let mut missing = false;

    for value in values {
        if value.is_empty() {
            missing = true;
            continue;
        }
        if integers && value.parse::<i64>().is_err() {
            integers = false;
        }
        if !integers && value.parse::<f64>().is_err() {
            numbers = false;
            break;
        }
    }

    match (integers, numbers, missing) {
        (true, _, false) => ColumnKind::Integer,
        (true, _, true) | (false, true, _) => ColumnKind::Real,
        (false, false, _) => ColumnKind::Text,
    }
}

fn parse_cell(raw: String, kind: ColumnKind) -> Cell {
    if raw.is_empty() {
        return Cell::Null;
    }

    match kind {
        ColumnKind::Integer => raw.parse().map(Cell::Integer).unwrap_or(Cell::Text(raw)),
        ColumnKind::Real => raw.parse().map(Cell::Real).unwrap_or(Cell::Text(raw)),
        ColumnKind::Text => Cell::Text(raw),
    }
}

fn write_table(path: &Path, source: &SourceTable) -> rusqlite::Result<()> {
    let mut conn = Connection::open(path)?;
    let tx = conn.transaction()?;

    let table = quote_ident(TABLE_NAME);
    let definitions: Vec<String> = source
        .headers
        .iter()
        .zip(&source.kinds)
        .map(|(name, kind)| format!("{} {}", quote_ident(name), kind.sql_type()))
        .collect();
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({}) STRICT;",
        definitions.join(", ")
    ))?;

    {
        let placeholders = vec!["?"; source.headers.len()].join(", ");
        let mut stmt = tx.prepare(&format!("INSERT INTO {table} VALUES ({placeholders})"))?;
        for row in &source.rows {
            stmt.execute(params_from_iter(row.iter()))?;
        }
    }

    tx.commit()
}

fn staging_path(store_path: &Path) -> PathBuf {
    let mut name = OsString::from(store_path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}
