//! Exploratory summaries of the loaded table: previews, gaps, distributions.

use super::AnalyticsError;
use crate::store::schema::{ATTRITION, DEPARTMENT, EMPLOYEE_NUMBER, JOB_ROLE, MONTHLY_INCOME};
use crate::store::{Cell, Table};
use serde::Serialize;
use std::collections::BTreeSet;

pub const DEFAULT_PREVIEW_COLUMNS: [&str; 5] =
    [EMPLOYEE_NUMBER, DEPARTMENT, JOB_ROLE, MONTHLY_INCOME, ATTRITION];

pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<HistogramBin>,
}

/// Distinct departments, sorted; these are the filter options offered to users.
pub fn departments(table: &Table) -> Result<Vec<String>, AnalyticsError> {
    let values = table
        .values(DEPARTMENT)
        .ok_or_else(|| AnalyticsError::UnknownColumn(DEPARTMENT.to_string()))?;
    let distinct: BTreeSet<String> = values
        .filter(|cell| !cell.is_null())
        .map(Cell::to_string)
        .collect();
    Ok(distinct.into_iter().collect())
}

/// Renders the selected columns as strings, keeping at most `limit` rows.
pub fn preview<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    limit: Option<usize>,
) -> Result<Preview, AnalyticsError> {
    let indices = columns
        .iter()
        .map(|name| {
            table
                .column_index(name.as_ref())
                .ok_or_else(|| AnalyticsError::UnknownColumn(name.as_ref().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let rows = table
        .rows()
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|row| indices.iter().map(|&idx| row[idx].to_string()).collect())
        .collect();

    Ok(Preview {
        columns: columns.iter().map(|name| name.as_ref().to_string()).collect(),
        rows,
    })
}

pub fn missing_values(table: &Table) -> Vec<MissingCount> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| MissingCount {
            column: column.name.clone(),
            missing: table.rows().iter().filter(|row| row[idx].is_null()).count(),
        })
        .collect()
}

pub fn numeric_columns(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|column| column.kind.is_numeric())
        .map(|column| column.name.clone())
        .collect()
}

/// Equal-width histogram over the non-null values of a numeric column. The
/// last bin is closed on both ends; a constant column collapses to one bin.
pub fn histogram(table: &Table, column: &str, bins: usize) -> Result<Histogram, AnalyticsError> {
    if bins == 0 {
        return Err(AnalyticsError::InvalidBins);
    }
    let kind = table
        .column(column)
        .ok_or_else(|| AnalyticsError::UnknownColumn(column.to_string()))?
        .kind;
    if !kind.is_numeric() {
        return Err(AnalyticsError::NotNumeric(column.to_string()));
    }

    let values: Vec<f64> = table
        .values(column)
        .into_iter()
        .flatten()
        .filter_map(Cell::as_f64)
        .collect();

    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Ok(Histogram {
            column: column.to_string(),
            bins: Vec::new(),
        });
    };

    if min == max {
        return Ok(Histogram {
            column: column.to_string(),
            bins: vec![HistogramBin {
                lower: min,
                upper: max,
                count: values.len(),
            }],
        });
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in &values {
        let slot = ((value - min) / width).floor() as usize;
        counts[slot.min(bins - 1)] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| HistogramBin {
            lower: min + width * idx as f64,
            upper: if idx + 1 == bins {
                max
            } else {
                min + width * (idx + 1) as f64
            },
            count,
        })
        .collect();

    Ok(Histogram {
        column: column.to_string(),
        bins,
    })
}
