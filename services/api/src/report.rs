use crate::cli::EdaCommand;
use crate::infra::{load_config, open_service, parse_source};
use chrono::Local;
use clap::Args;
use hr_insights::analytics::profile::DEFAULT_HISTOGRAM_BINS;
use hr_insights::analytics::{Dashboard, DataSource, DepartmentFilter};
use hr_insights::error::AppError;
use hr_insights::store::{ensure_store, BootstrapOutcome};

#[derive(Args, Debug, Default)]
pub(crate) struct InsightsArgs {
    /// Backend computing the views: memory (cached snapshot) or sql (store query)
    #[arg(long, default_value = "memory", value_parser = parse_source)]
    pub(crate) source: DataSource,
    /// Restrict the filtered views to a department; repeat for several
    #[arg(long = "department")]
    pub(crate) departments: Vec<String>,
    /// Emit the dashboard as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

impl InsightsArgs {
    fn filter(&self) -> DepartmentFilter {
        if self.departments.is_empty() {
            DepartmentFilter::All
        } else {
            DepartmentFilter::only(self.departments.iter().cloned())
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct HistogramArgs {
    /// Numeric column to bin
    #[arg(long)]
    pub(crate) column: String,
    /// Number of equal-width bins
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
    pub(crate) bins: usize,
}

pub(crate) fn run_bootstrap() -> Result<(), AppError> {
    let config = load_config()?;
    let store = &config.store;

    match ensure_store(&store.csv_path, &store.store_path)? {
        BootstrapOutcome::Created { rows, columns } => println!(
            "Created {} from {} ({} rows, {} columns)",
            store.store_path.display(),
            store.csv_path.display(),
            rows,
            columns
        ),
        BootstrapOutcome::AlreadyPresent => println!(
            "Store {} already exists; leaving it untouched",
            store.store_path.display()
        ),
    }
    Ok(())
}

pub(crate) fn run_insights(args: InsightsArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let service = open_service(&config)?;
    let filter = args.filter();
    let dashboard = service.dashboard(args.source, &filter)?;

    if args.json {
        match serde_json::to_string_pretty(&dashboard) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Dashboard payload unavailable: {err}"),
        }
        return Ok(());
    }

    render_dashboard(&dashboard, args.source, &filter);
    Ok(())
}

pub(crate) fn run_eda(command: EdaCommand) -> Result<(), AppError> {
    let config = load_config()?;
    let service = open_service(&config)?;

    match command {
        EdaCommand::Missing => {
            println!("Missing values per column");
            for entry in service.missing_values()? {
                println!("- {}: {}", entry.column, entry.missing);
            }
        }
        EdaCommand::Columns => {
            println!("Numeric columns");
            for column in service.numeric_columns()? {
                println!("- {column}");
            }
        }
        EdaCommand::Histogram(args) => {
            let histogram = service.histogram(&args.column, args.bins)?;
            println!("Distribution of {}", histogram.column);
            if histogram.bins.is_empty() {
                println!("  no values recorded");
            }
            for bin in &histogram.bins {
                println!("  [{:>10.1}, {:>10.1}] {}", bin.lower, bin.upper, bin.count);
            }
        }
    }
    Ok(())
}

fn describe_filter(filter: &DepartmentFilter) -> String {
    match filter {
        DepartmentFilter::All => "all departments".to_string(),
        DepartmentFilter::Only(selected) if selected.is_empty() => "no departments".to_string(),
        DepartmentFilter::Only(selected) => selected
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn or_na(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|value| format!("{value:.decimals$}"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn render_dashboard(dashboard: &Dashboard, source: DataSource, filter: &DepartmentFilter) {
    println!(
        "HR insights ({} backend, {})",
        source.label(),
        Local::now().format("%Y-%m-%d %H:%M")
    );
    println!("Selection: {}", describe_filter(filter));

    let headline = &dashboard.headline;
    println!(
        "Headcount {} | Attrition {}% | Avg performance {} | Avg monthly income {}",
        headline.headcount,
        or_na(headline.attrition_rate_pct, 1),
        or_na(headline.avg_performance_rating, 2),
        or_na(headline.avg_monthly_income, 0)
    );

    println!("\nHeadcount by department");
    for row in &dashboard.department_headcount {
        println!("  - {}: {}", row.department, row.headcount);
    }

    println!("\nMean monthly income by job role");
    for row in &dashboard.income_by_job_role {
        println!("  - {}: {}", row.job_role, or_na(row.avg_monthly_income, 0));
    }

    println!("\nMean performance rating by department");
    for row in &dashboard.performance_by_department {
        println!(
            "  - {}: {}",
            row.department,
            or_na(row.avg_performance_rating, 2)
        );
    }

    println!("\nAttrition by department and overtime");
    for row in &dashboard.attrition_by_overtime {
        println!(
            "  - {} / overtime {}: {:.1}%",
            row.department, row.over_time, row.attrition_rate_pct
        );
    }

    println!("\nTop performers");
    for row in &dashboard.top_performers {
        println!(
            "  - #{}: {}",
            row.employee_number,
            or_na(row.max_performance_rating, 0)
        );
    }

    println!("\nMean monthly income by education");
    for row in &dashboard.income_by_education {
        println!(
            "  - {} ({}): {}",
            row.education_label.unwrap_or("Unlabeled"),
            row.education,
            or_na(row.avg_monthly_income, 0)
        );
    }

    println!("\nAttrition by work-life balance");
    for row in &dashboard.attrition_by_work_life_balance {
        println!(
            "  - level {}: {:.1}%",
            row.work_life_balance, row.attrition_rate_pct
        );
    }
}
