use crate::store::schema::DEPARTMENT;
use crate::store::Cell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Department selection applied by the filtered views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentFilter {
    #[default]
    All,
    /// Only the listed departments. An empty set matches nothing.
    Only(BTreeSet<String>),
}

impl DepartmentFilter {
    pub fn only<I, S>(departments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(departments.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, department: &Cell) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => department
                .as_str()
                .is_some_and(|name| selected.contains(name)),
        }
    }

    pub(crate) const fn column(&self) -> &'static str {
        DEPARTMENT
    }
}

/// Aggregate computed per group.
#[derive(Debug, Clone, PartialEq)]
pub enum Measure {
    /// Sum of non-null values; zero when there are none.
    Sum(&'static str),
    /// Mean of non-null values; null when there are none.
    Mean(&'static str),
    /// Largest non-null value.
    Max(&'static str),
    /// Share of rows whose value equals `equals`. Null cells count as misses.
    Rate {
        column: &'static str,
        equals: &'static str,
    },
}

impl Measure {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Sum(column) | Self::Mean(column) | Self::Max(column) => column,
            Self::Rate { column, .. } => column,
        }
    }
}

/// Sort term over an output column (group keys first, then measures).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub descending: bool,
}

/// Backend-neutral description of one aggregate view.
///
/// Output rows hold the group keys in `group_by` order followed by one value
/// per measure. Rows whose group key is null are dropped. Without group keys
/// the plan yields exactly one row, even over an empty selection.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatePlan {
    pub filter: DepartmentFilter,
    pub group_by: Vec<&'static str>,
    pub measures: Vec<Measure>,
    pub order_by: Vec<SortKey>,
    pub limit: Option<usize>,
}

impl AggregatePlan {
    pub fn new(filter: DepartmentFilter) -> Self {
        Self {
            filter,
            group_by: Vec::new(),
            measures: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn unfiltered() -> Self {
        Self::new(DepartmentFilter::All)
    }

    pub fn group_by(mut self, column: &'static str) -> Self {
        self.group_by.push(column);
        self
    }

    pub fn measure(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }

    pub fn ascending(mut self, column: usize) -> Self {
        self.order_by.push(SortKey {
            column,
            descending: false,
        });
        self
    }

    pub fn descending(mut self, column: usize) -> Self {
        self.order_by.push(SortKey {
            column,
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn width(&self) -> usize {
        self.group_by.len() + self.measures.len()
    }

    /// Explicit sort terms followed by any group key not yet mentioned, ascending.
    pub fn effective_order(&self) -> Vec<SortKey> {
        let mut order = self.order_by.clone();
        for column in 0..self.group_by.len() {
            if !order.iter().any(|key| key.column == column) {
                order.push(SortKey {
                    column,
                    descending: false,
                });
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_matches_nothing() {
        let filter = DepartmentFilter::only(Vec::<String>::new());
        assert!(!filter.matches(&Cell::from("Sales")));
        assert!(DepartmentFilter::All.matches(&Cell::Null));
        assert!(!DepartmentFilter::only(["Sales"]).matches(&Cell::Null));
    }

    #[test]
    fn effective_order_appends_unmentioned_keys() {
        let plan = AggregatePlan::unfiltered()
            .group_by("Department")
            .group_by("OverTime")
            .measure(Measure::Sum("EmployeeCount"))
            .descending(2)
            .ascending(1);

        assert_eq!(
            plan.effective_order(),
            vec![
                SortKey {
                    column: 2,
                    descending: true
                },
                SortKey {
                    column: 1,
                    descending: false
                },
                SortKey {
                    column: 0,
                    descending: false
                },
            ]
        );
    }
}
