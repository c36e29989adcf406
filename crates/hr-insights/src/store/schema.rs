//! Names shared by the store, the aggregation plans, and the SQL compiler.

pub const TABLE_NAME: &str = "employees";

pub const EMPLOYEE_NUMBER: &str = "EmployeeNumber";
pub const EMPLOYEE_COUNT: &str = "EmployeeCount";
pub const DEPARTMENT: &str = "Department";
pub const JOB_ROLE: &str = "JobRole";
pub const ATTRITION: &str = "Attrition";
pub const OVER_TIME: &str = "OverTime";
pub const EDUCATION: &str = "Education";
pub const PERFORMANCE_RATING: &str = "PerformanceRating";
pub const WORK_LIFE_BALANCE: &str = "WorkLifeBalance";
pub const MONTHLY_INCOME: &str = "MonthlyIncome";

/// Value of `Attrition` (and `OverTime`) marking the affirmative case.
pub const YES: &str = "Yes";

/// Wraps an identifier in double quotes for SQLite, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::quote_ident;

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("Department"), "\"Department\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
