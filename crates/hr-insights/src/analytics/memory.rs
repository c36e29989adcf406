use super::plan::{AggregatePlan, DepartmentFilter, Measure, SortKey};
use super::{AggregateRows, AggregationBackend, AnalyticsError};
use crate::store::{Cell, Table};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Evaluates plans by scanning an in-memory table snapshot.
#[derive(Debug, Clone, Copy)]
pub struct MemoryBackend<'a> {
    table: &'a Table,
}

impl<'a> MemoryBackend<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self { table }
    }

    fn index(&self, column: &str) -> Result<usize, AnalyticsError> {
        self.table
            .column_index(column)
            .ok_or_else(|| AnalyticsError::UnknownColumn(column.to_string()))
    }
}

impl AggregationBackend for MemoryBackend<'_> {
    fn aggregate(&self, plan: &AggregatePlan) -> Result<AggregateRows, AnalyticsError> {
        let filter_index = match plan.filter {
            DepartmentFilter::All => None,
            DepartmentFilter::Only(_) => Some(self.index(plan.filter.column())?),
        };
        let key_indices = plan
            .group_by
            .iter()
            .map(|column| self.index(column))
            .collect::<Result<Vec<_>, _>>()?;
        let measure_indices = plan
            .measures
            .iter()
            .map(|measure| self.index(measure.column()))
            .collect::<Result<Vec<_>, _>>()?;

        let fresh = || -> Vec<Accumulator> { plan.measures.iter().map(Accumulator::new).collect() };
        let mut groups: BTreeMap<Vec<Cell>, Vec<Accumulator>> = BTreeMap::new();
        if key_indices.is_empty() {
            groups.insert(Vec::new(), fresh());
        }

        for row in self.table.rows() {
            if let Some(idx) = filter_index {
                if !plan.filter.matches(&row[idx]) {
                    continue;
                }
            }

            let key: Vec<Cell> = key_indices.iter().map(|&idx| row[idx].clone()).collect();
            if key.iter().any(Cell::is_null) {
                continue;
            }

            let accumulators = groups.entry(key).or_insert_with(fresh);
            for (accumulator, &idx) in accumulators.iter_mut().zip(&measure_indices) {
                accumulator.push(&row[idx]);
            }
        }

        let mut rows: AggregateRows = groups
            .into_iter()
            .map(|(mut row, accumulators)| {
                row.extend(accumulators.into_iter().map(Accumulator::finish));
                row
            })
            .collect();

        let order = plan.effective_order();
        rows.sort_by(|left, right| compare_rows(left, right, &order));
        if let Some(limit) = plan.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

fn compare_rows(left: &[Cell], right: &[Cell], order: &[SortKey]) -> Ordering {
    order
        .iter()
        .map(|key| {
            let ordering = left[key.column].cmp(&right[key.column]);
            if key.descending {
                ordering.reverse()
            } else {
                ordering
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[derive(Debug)]
enum Accumulator {
    Sum(f64),
    Mean { total: f64, count: usize },
    Max(Cell),
    Rate {
        equals: &'static str,
        hits: usize,
        rows: usize,
    },
}

impl Accumulator {
    fn new(measure: &Measure) -> Self {
        match measure {
            Measure::Sum(_) => Self::Sum(0.0),
            Measure::Mean(_) => Self::Mean {
                total: 0.0,
                count: 0,
            },
            Measure::Max(_) => Self::Max(Cell::Null),
            Measure::Rate { equals, .. } => Self::Rate {
                equals: *equals,
                hits: 0,
                rows: 0,
            },
        }
    }

    fn push(&mut self, cell: &Cell) {
        match self {
            Self::Sum(total) => *total += cell.as_f64().unwrap_or_default(),
            Self::Mean { total, count } => {
                if let Some(value) = cell.as_f64() {
                    *total += value;
                    *count += 1;
                }
            }
            Self::Max(best) => {
                if !cell.is_null() && (best.is_null() || *cell > *best) {
                    *best = cell.clone();
                }
            }
            Self::Rate { equals, hits, rows } => {
                *rows += 1;
                if cell.as_str() == Some(*equals) {
                    *hits += 1;
                }
            }
        }
    }

    fn finish(self) -> Cell {
        match self {
            Self::Sum(total) => Cell::Real(total),
            Self::Mean { count: 0, .. } => Cell::Null,
            Self::Mean { total, count } => Cell::Real(total / count as f64),
            Self::Max(best) => best,
            Self::Rate { rows: 0, .. } => Cell::Null,
            Self::Rate { hits, rows, .. } => Cell::Real(hits as f64 / rows as f64),
        }
    }
}
