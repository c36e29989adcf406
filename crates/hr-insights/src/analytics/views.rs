use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub headcount: u64,
    pub attrition_rate_pct: Option<f64>,
    pub avg_performance_rating: Option<f64>,
    pub avg_monthly_income: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentHeadcount {
    pub department: String,
    pub headcount: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleIncome {
    pub job_role: String,
    pub avg_monthly_income: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentPerformance {
    pub department: String,
    pub avg_performance_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OvertimeAttrition {
    pub department: String,
    pub over_time: String,
    pub attrition_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPerformer {
    pub employee_number: i64,
    pub max_performance_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationIncome {
    pub education: i64,
    pub education_label: Option<&'static str>,
    pub avg_monthly_income: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkLifeAttrition {
    pub work_life_balance: i64,
    pub attrition_rate_pct: f64,
}

/// Every view the insights page renders, computed from one backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub headline: HeadlineMetrics,
    pub department_headcount: Vec<DepartmentHeadcount>,
    pub income_by_job_role: Vec<RoleIncome>,
    pub performance_by_department: Vec<DepartmentPerformance>,
    pub attrition_by_overtime: Vec<OvertimeAttrition>,
    pub top_performers: Vec<TopPerformer>,
    pub income_by_education: Vec<EducationIncome>,
    pub attrition_by_work_life_balance: Vec<WorkLifeAttrition>,
}

/// Display label for an `Education` level.
pub const fn education_label(level: i64) -> Option<&'static str> {
    match level {
        1 => Some("Below College"),
        2 => Some("College"),
        3 => Some("Bachelor"),
        4 => Some("Master"),
        5 => Some("Doctor"),
        _ => None,
    }
}

/// Rounds half away from zero to `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Converts a 0..=1 share into a percentage with one decimal.
pub(crate) fn percent(rate: f64) -> f64 {
    round_to(rate * 100.0, 1)
}
