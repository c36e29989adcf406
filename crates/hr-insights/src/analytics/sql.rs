use super::plan::{AggregatePlan, DepartmentFilter, Measure};
use super::{AggregateRows, AggregationBackend, AnalyticsError};
use crate::store::schema::{quote_ident, TABLE_NAME};
use crate::store::{Cell, EmployeeRepository};

/// Evaluates plans as a single `SELECT … GROUP BY` against the store.
pub struct SqlBackend<'a, R> {
    repository: &'a R,
}

impl<'a, R: EmployeeRepository> SqlBackend<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }
}

impl<R: EmployeeRepository> AggregationBackend for SqlBackend<'_, R> {
    fn aggregate(&self, plan: &AggregatePlan) -> Result<AggregateRows, AnalyticsError> {
        let (statement, params) = build_sql(plan);
        tracing::trace!(%statement, "running aggregate query");
        Ok(self.repository.query_rows(&statement, &params)?)
    }
}

/// Compiles a plan into SQL with positional parameters, in textual order.
pub(crate) fn build_sql(plan: &AggregatePlan) -> (String, Vec<Cell>) {
    let mut params: Vec<Cell> = Vec::new();
    let mut select: Vec<String> = plan.group_by.iter().map(|c| quote_ident(c)).collect();

    for measure in &plan.measures {
        let column = quote_ident(measure.column());
        select.push(match measure {
            Measure::Sum(_) => format!("COALESCE(SUM({column}), 0)"),
            Measure::Mean(_) => format!("AVG({column})"),
            Measure::Max(_) => format!("MAX({column})"),
            Measure::Rate { equals, .. } => {
                params.push(Cell::from(*equals));
                format!("AVG(CASE WHEN {column} = ? THEN 1.0 ELSE 0.0 END)")
            }
        });
    }

    let mut sql = format!("SELECT {} FROM {}", select.join(", "), quote_ident(TABLE_NAME));

    let mut where_parts: Vec<String> = Vec::new();
    match &plan.filter {
        DepartmentFilter::All => {}
        DepartmentFilter::Only(selected) if selected.is_empty() => {
            where_parts.push("0".to_string());
        }
        DepartmentFilter::Only(selected) => {
            let placeholders = vec!["?"; selected.len()].join(", ");
            where_parts.push(format!(
                "{} IN ({placeholders})",
                quote_ident(plan.filter.column())
            ));
            params.extend(selected.iter().map(|name| Cell::from(name.as_str())));
        }
    }
    for column in &plan.group_by {
        where_parts.push(format!("{} IS NOT NULL", quote_ident(column)));
    }
    if !where_parts.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_parts.join(" AND "));
    }

    if !plan.group_by.is_empty() {
        let keys: Vec<String> = plan.group_by.iter().map(|c| quote_ident(c)).collect();
        sql.push_str(" GROUP BY ");
        sql.push_str(&keys.join(", "));
    }

    let order = plan.effective_order();
    if !order.is_empty() {
        let terms: Vec<String> = order
            .iter()
            .map(|key| {
                let direction = if key.descending { "DESC" } else { "ASC" };
                format!("{} {direction}", key.column + 1)
            })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&terms.join(", "));
    }

    if let Some(limit) = plan.limit {
        sql.push_str(" LIMIT ?");
        params.push(Cell::Integer(limit as i64));
    }

    (sql, params)
}
