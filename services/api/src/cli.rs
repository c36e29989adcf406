use crate::report::{run_bootstrap, run_eda, run_insights, HistogramArgs, InsightsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hr_insights::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "HR Insights",
    about = "Serve and explore the HR attrition insights from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Create the employee store from the CSV source if it does not exist yet
    Bootstrap,
    /// Print the insight views for a department selection
    Insights(InsightsArgs),
    /// Explore the raw dataset
    Eda {
        #[command(subcommand)]
        command: EdaCommand,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum EdaCommand {
    /// Count missing values per column
    Missing,
    /// List the numeric columns
    Columns,
    /// Print an equal-width histogram of a numeric column
    Histogram(HistogramArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Bootstrap => run_bootstrap(),
        Command::Insights(args) => run_insights(args),
        Command::Eda { command } => run_eda(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_insights::analytics::DataSource;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["hr-insights-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn insights_accepts_repeated_departments() {
        let cli = Cli::try_parse_from([
            "hr-insights-api",
            "insights",
            "--source",
            "sql",
            "--department",
            "Sales",
            "--department",
            "Human Resources",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Insights(args)) => {
                assert_eq!(args.source, DataSource::Sql);
                assert_eq!(args.departments, vec!["Sales", "Human Resources"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn histogram_defaults_to_thirty_bins() {
        let cli = Cli::try_parse_from(["hr-insights-api", "eda", "histogram", "--column", "Age"])
            .expect("parses");

        match cli.command {
            Some(Command::Eda {
                command: EdaCommand::Histogram(args),
            }) => {
                assert_eq!(args.column, "Age");
                assert_eq!(args.bins, 30);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(Cli::try_parse_from(["hr-insights-api", "insights", "--source", "excel"]).is_err());
    }
}
