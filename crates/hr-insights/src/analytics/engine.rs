use super::plan::{AggregatePlan, DepartmentFilter, Measure};
use super::views::{
    education_label, percent, round_to, Dashboard, DepartmentHeadcount, DepartmentPerformance,
    EducationIncome, HeadlineMetrics, OvertimeAttrition, RoleIncome, TopPerformer,
    WorkLifeAttrition,
};
use super::{AggregateRows, AggregationBackend, AnalyticsError};
use crate::store::schema::{
    ATTRITION, DEPARTMENT, EDUCATION, EMPLOYEE_COUNT, EMPLOYEE_NUMBER, JOB_ROLE,
    MONTHLY_INCOME, OVER_TIME, PERFORMANCE_RATING, WORK_LIFE_BALANCE, YES,
};
use crate::store::Cell;

const TOP_PERFORMER_LIMIT: usize = 5;

const ATTRITED: Measure = Measure::Rate {
    column: ATTRITION,
    equals: YES,
};

/// Computes the insight views on top of any aggregation backend.
///
/// Headcount, attrition, the headline averages, the department breakdown,
/// overtime attrition and work-life attrition honor the department filter.
/// Income by role, performance by department, top performers and income by
/// education always cover the full record set.
pub struct InsightEngine<B> {
    backend: B,
}

impl<B: AggregationBackend> InsightEngine<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn headcount(&self, filter: &DepartmentFilter) -> Result<u64, AnalyticsError> {
        let plan = AggregatePlan::new(filter.clone()).measure(Measure::Sum(EMPLOYEE_COUNT));
        let value = self.scalar(&plan)?.unwrap_or_default();
        Ok(value.round().max(0.0) as u64)
    }

    /// Percentage of selected employees who left, to one decimal.
    pub fn attrition_rate(&self, filter: &DepartmentFilter) -> Result<Option<f64>, AnalyticsError> {
        let plan = AggregatePlan::new(filter.clone()).measure(ATTRITED);
        Ok(self.scalar(&plan)?.map(percent))
    }

    pub fn average_performance(
        &self,
        filter: &DepartmentFilter,
    ) -> Result<Option<f64>, AnalyticsError> {
        let plan = AggregatePlan::new(filter.clone()).measure(Measure::Mean(PERFORMANCE_RATING));
        Ok(self.scalar(&plan)?.map(|value| round_to(value, 2)))
    }

    pub fn average_monthly_income(
        &self,
        filter: &DepartmentFilter,
    ) -> Result<Option<f64>, AnalyticsError> {
        let plan = AggregatePlan::new(filter.clone()).measure(Measure::Mean(MONTHLY_INCOME));
        Ok(self.scalar(&plan)?.map(|value| round_to(value, 0)))
    }

    pub fn headline(&self, filter: &DepartmentFilter) -> Result<HeadlineMetrics, AnalyticsError> {
        Ok(HeadlineMetrics {
            headcount: self.headcount(filter)?,
            attrition_rate_pct: self.attrition_rate(filter)?,
            avg_performance_rating: self.average_performance(filter)?,
            avg_monthly_income: self.average_monthly_income(filter)?,
        })
    }

    /// Headcount per department, smallest first.
    pub fn department_headcount(
        &self,
        filter: &DepartmentFilter,
    ) -> Result<Vec<DepartmentHeadcount>, AnalyticsError> {
        let plan = AggregatePlan::new(filter.clone())
            .group_by(DEPARTMENT)
            .measure(Measure::Sum(EMPLOYEE_COUNT))
            .ascending(1);

        self.rows(&plan)?
            .into_iter()
            .map(|row| {
                Ok(DepartmentHeadcount {
                    department: row[0].to_string(),
                    headcount: number(&row[1]).unwrap_or_default().round().max(0.0) as u64,
                })
            })
            .collect()
    }

    /// Mean monthly income per job role in whole units, lowest first.
    pub fn income_by_job_role(&self) -> Result<Vec<RoleIncome>, AnalyticsError> {
        let plan = AggregatePlan::unfiltered()
            .group_by(JOB_ROLE)
            .measure(Measure::Mean(MONTHLY_INCOME))
            .ascending(1);

        Ok(self
            .rows(&plan)?
            .into_iter()
            .map(|row| RoleIncome {
                job_role: row[0].to_string(),
                avg_monthly_income: number(&row[1]).map(|value| round_to(value, 0)),
            })
            .collect())
    }

    pub fn performance_by_department(
        &self,
    ) -> Result<Vec<DepartmentPerformance>, AnalyticsError> {
        let plan = AggregatePlan::unfiltered()
            .group_by(DEPARTMENT)
            .measure(Measure::Mean(PERFORMANCE_RATING));

        Ok(self
            .rows(&plan)?
            .into_iter()
            .map(|row| DepartmentPerformance {
                department: row[0].to_string(),
                avg_performance_rating: number(&row[1]),
            })
            .collect())
    }

    /// Attrition percentage for every department and overtime pair present.
    pub fn attrition_by_overtime(
        &self,
        filter: &DepartmentFilter,
    ) -> Result<Vec<OvertimeAttrition>, AnalyticsError> {
        let plan = AggregatePlan::new(filter.clone())
            .group_by(DEPARTMENT)
            .group_by(OVER_TIME)
            .measure(ATTRITED);

        Ok(self
            .rows(&plan)?
            .into_iter()
            .map(|row| OvertimeAttrition {
                department: row[0].to_string(),
                over_time: row[1].to_string(),
                attrition_rate_pct: percent(number(&row[2]).unwrap_or_default()),
            })
            .collect())
    }

    /// Five employee numbers with the highest rating; ties go to the lower number.
    pub fn top_performers(&self) -> Result<Vec<TopPerformer>, AnalyticsError> {
        let plan = AggregatePlan::unfiltered()
            .group_by(EMPLOYEE_NUMBER)
            .measure(Measure::Max(PERFORMANCE_RATING))
            .descending(1)
            .ascending(0)
            .limit(TOP_PERFORMER_LIMIT);

        self.rows(&plan)?
            .into_iter()
            .map(|row| {
                Ok(TopPerformer {
                    employee_number: integer(EMPLOYEE_NUMBER, &row[0])?,
                    max_performance_rating: number(&row[1]),
                })
            })
            .collect()
    }

    /// Mean monthly income per education level, highest level first.
    pub fn income_by_education(&self) -> Result<Vec<EducationIncome>, AnalyticsError> {
        let plan = AggregatePlan::unfiltered()
            .group_by(EDUCATION)
            .measure(Measure::Mean(MONTHLY_INCOME))
            .descending(0);

        self.rows(&plan)?
            .into_iter()
            .map(|row| {
                let education = integer(EDUCATION, &row[0])?;
                Ok(EducationIncome {
                    education,
                    education_label: education_label(education),
                    avg_monthly_income: number(&row[1]),
                })
            })
            .collect()
    }

    pub fn attrition_by_work_life_balance(
        &self,
        filter: &DepartmentFilter,
    ) -> Result<Vec<WorkLifeAttrition>, AnalyticsError> {
        let plan = AggregatePlan::new(filter.clone())
            .group_by(WORK_LIFE_BALANCE)
            .measure(ATTRITED);

        self.rows(&plan)?
            .into_iter()
            .map(|row| {
                Ok(WorkLifeAttrition {
                    work_life_balance: integer(WORK_LIFE_BALANCE, &row[0])?,
                    attrition_rate_pct: percent(number(&row[1]).unwrap_or_default()),
                })
            })
            .collect()
    }

    pub fn dashboard(&self, filter: &DepartmentFilter) -> Result<Dashboard, AnalyticsError> {
        Ok(Dashboard {
            headline: self.headline(filter)?,
            department_headcount: self.department_headcount(filter)?,
            income_by_job_role: self.income_by_job_role()?,
            performance_by_department: self.performance_by_department()?,
            attrition_by_overtime: self.attrition_by_overtime(filter)?,
            top_performers: self.top_performers()?,
            income_by_education: self.income_by_education()?,
            attrition_by_work_life_balance: self.attrition_by_work_life_balance(filter)?,
        })
    }

    fn rows(&self, plan: &AggregatePlan) -> Result<AggregateRows, AnalyticsError> {
        let rows = self.backend.aggregate(plan)?;
        if let Some(row) = rows.iter().find(|row| row.len() != plan.width()) {
            return Err(AnalyticsError::ShapeMismatch {
                expected: plan.width(),
                actual: row.len(),
            });
        }
        Ok(rows)
    }

    fn scalar(&self, plan: &AggregatePlan) -> Result<Option<f64>, AnalyticsError> {
        Ok(self
            .rows(plan)?
            .first()
            .and_then(|row| row.first())
            .and_then(number))
    }
}

fn number(cell: &Cell) -> Option<f64> {
    cell.as_f64()
}

fn integer(column: &'static str, cell: &Cell) -> Result<i64, AnalyticsError> {
    cell.as_i64().ok_or_else(|| AnalyticsError::InvalidValue {
        column,
        value: cell.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::MemoryBackend;
    use crate::store::{Column, ColumnKind, Table};

    fn table(rows: Vec<Vec<Cell>>) -> Table {
        let columns = [
            (EMPLOYEE_NUMBER, ColumnKind::Integer),
            (DEPARTMENT, ColumnKind::Text),
            (EMPLOYEE_COUNT, ColumnKind::Integer),
            (ATTRITION, ColumnKind::Text),
            (PERFORMANCE_RATING, ColumnKind::Integer),
        ]
        .into_iter()
        .map(|(name, kind)| Column {
            name: name.to_string(),
            kind,
        })
        .collect();
        Table::new(columns, rows)
    }

    fn employee(number: i64, department: &str, attrition: &str, rating: i64) -> Vec<Cell> {
        vec![
            Cell::Integer(number),
            Cell::from(department),
            Cell::Integer(1),
            Cell::from(attrition),
            Cell::Integer(rating),
        ]
    }

    #[test]
    fn headcount_and_attrition_for_two_sales_employees() {
        let table = table(vec![
            employee(1, "Sales", "Yes", 3),
            employee(2, "Sales", "No", 3),
        ]);
        let engine = InsightEngine::new(MemoryBackend::new(&table));
        let sales = DepartmentFilter::only(["Sales"]);

        assert_eq!(engine.headcount(&sales).expect("headcount"), 2);
        assert_eq!(engine.attrition_rate(&sales).expect("rate"), Some(50.0));
    }

    #[test]
    fn top_performers_break_ties_by_lower_employee_number() {
        let table = table(vec![
            employee(9, "Sales", "No", 4),
            employee(4, "Sales", "No", 4),
            employee(2, "Sales", "No", 3),
        ]);
        let engine = InsightEngine::new(MemoryBackend::new(&table));

        let ranked: Vec<i64> = engine
            .top_performers()
            .expect("ranking")
            .into_iter()
            .map(|performer| performer.employee_number)
            .collect();
        assert_eq!(ranked, vec![4, 9, 2]);
    }

    #[test]
    fn top_performers_keep_five_and_ignore_filter_scope() {
        let rows = (1..=8)
            .map(|number| employee(number, "Sales", "No", 3 + number % 2))
            .collect();
        let table = table(rows);
        let engine = InsightEngine::new(MemoryBackend::new(&table));

        let ranked: Vec<i64> = engine
            .top_performers()
            .expect("ranking")
            .into_iter()
            .map(|performer| performer.employee_number)
            .collect();
        assert_eq!(ranked, vec![1, 3, 5, 7, 2]);
    }

    #[test]
    fn empty_selection_has_zero_headcount_and_no_rates() {
        let table = table(vec![employee(1, "Sales", "Yes", 3)]);
        let engine = InsightEngine::new(MemoryBackend::new(&table));
        let nothing = DepartmentFilter::only(Vec::<String>::new());

        assert_eq!(engine.headcount(&nothing).expect("headcount"), 0);
        assert_eq!(engine.attrition_rate(&nothing).expect("rate"), None);
        assert_eq!(engine.average_performance(&nothing).expect("avg"), None);
        assert!(engine
            .department_headcount(&nothing)
            .expect("breakdown")
            .is_empty());
    }
}
