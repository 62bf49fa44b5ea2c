//! CLI entry point for the school dashboard statistics tool.
//!
//! Loads the portal datasets from a directory or static URL and prints the
//! derived reports: results analytics, attendance, the principal's overview,
//! a student profile, and ad-hoc grouping, ranking and histograms over any
//! dataset column.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use school_stats::analyzers::{Aggregator, Direction, MissingValues, histogram, histogram_over};
use school_stats::loader::{DataSource, Dataset, load_or_empty};
use school_stats::output::{append_rows, print_json, print_pretty, write_json};
use school_stats::record::Record;
use school_stats::session::{FileSessionStore, Role, SessionContext};
use school_stats::stats::overview::Datasets;
use school_stats::stats::{
    AttendanceSummary, ResultFilter, ResultsReport, SchoolOverview, StudentProfile,
};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "school_stats")]
#[command(about = "Summaries of school dashboard datasets", long_about = None)]
struct Cli {
    /// Directory or base URL holding the dataset CSVs [env: SCHOOL_DATA_ROOT]
    #[arg(short, long, global = true)]
    data: Option<String>,

    /// Session file [env: SCHOOL_SESSION_PATH]
    #[arg(long, global = true)]
    session: Option<String>,

    /// Leave missing numeric values out of averages instead of counting them as zero
    #[arg(long, global = true, default_value_t = false)]
    skip_missing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ReportOutput {
    /// Also write the report as JSON to this file
    #[arg(short, long)]
    output: Option<String>,

    /// Gzip-compress the JSON file
    #[arg(long, default_value_t = false)]
    gzip: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DatasetArg {
    Students,
    Teachers,
    Attendance,
    Assessments,
    Results,
    Alerts,
    Nep,
    Progress,
    Vocational,
}

impl From<DatasetArg> for Dataset {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::Students => Dataset::Students,
            DatasetArg::Teachers => Dataset::Teachers,
            DatasetArg::Attendance => Dataset::Attendance,
            DatasetArg::Assessments => Dataset::Assessments,
            DatasetArg::Results => Dataset::Results,
            DatasetArg::Alerts => Dataset::Alerts,
            DatasetArg::Nep => Dataset::NepCompliance,
            DatasetArg::Progress => Dataset::LearningProgress,
            DatasetArg::Vocational => Dataset::VocationalCourses,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Termwise results analytics
    Results {
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        term: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        /// Publish status (Published or Draft)
        #[arg(long)]
        status: Option<String>,
        /// Student name or id substring
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        out: ReportOutput,
    },
    /// Attendance summary for everyone, one kind, or one person
    Attendance {
        #[arg(long)]
        id: Option<String>,
        /// student or teacher
        #[arg(long)]
        kind: Option<String>,
    },
    /// Principal dashboard headline figures
    Overview {
        #[command(flatten)]
        out: ReportOutput,
    },
    /// Profile of one student (defaults to the logged-in student)
    Student {
        id: Option<String>,
        #[command(flatten)]
        out: ReportOutput,
    },
    /// Per-group count/average/highest/lowest of a numeric column
    Group {
        #[arg(value_enum)]
        dataset: DatasetArg,
        /// Column to group by
        #[arg(short, long)]
        by: String,
        /// Numeric column to summarize
        #[arg(short, long)]
        value: String,
        /// Append the summary rows to this CSV file
        #[arg(long)]
        append: Option<String>,
    },
    /// Top (or bottom) rows ranked by a numeric column
    Top {
        #[arg(value_enum)]
        dataset: DatasetArg,
        #[arg(short, long)]
        value: String,
        #[arg(short, default_value_t = 5)]
        n: usize,
        /// Rank ascending (bottom performers)
        #[arg(long, default_value_t = false)]
        asc: bool,
    },
    /// Row counts per value of a column
    Histogram {
        #[arg(value_enum)]
        dataset: DatasetArg,
        #[arg(short, long)]
        by: String,
        /// Comma-separated full bucket list; listed buckets are shown even when empty
        #[arg(long, value_delimiter = ',')]
        buckets: Vec<String>,
    },
    /// Record the logged-in user
    Login {
        id: String,
        #[arg(long, default_value = "student")]
        role: Role,
        /// Display name; looked up in the students/teachers dataset when omitted
        #[arg(long)]
        name: Option<String>,
    },
    /// Forget the logged-in user
    Logout,
    /// Show the logged-in user
    Whoami,
}

/// One CSV row of `group --append` output.
#[derive(Debug, Serialize)]
struct GroupRow {
    dataset: String,
    group_by: String,
    value: String,
    group: String,
    count: usize,
    average: f64,
    highest: f64,
    lowest: f64,
    stddev: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/school_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("school_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let root = cli
        .data
        .or_else(|| std::env::var("SCHOOL_DATA_ROOT").ok())
        .unwrap_or_else(|| "data".to_string());
    let source = DataSource::parse(&root);

    let session_path = cli
        .session
        .or_else(|| std::env::var("SCHOOL_SESSION_PATH").ok())
        .unwrap_or_else(|| ".school_stats/session.json".to_string());
    let store = FileSessionStore::new(session_path);

    let agg = if cli.skip_missing {
        Aggregator::with_missing(MissingValues::Skip)
    } else {
        Aggregator::new()
    };

    info!(%source, missing = ?agg.missing(), "Using data source");

    match cli.command {
        Commands::Results {
            class,
            term,
            subject,
            status,
            search,
            out,
        } => {
            let filter = ResultFilter {
                class: ResultFilter::selection(class),
                term: ResultFilter::selection(term),
                subject: ResultFilter::selection(subject),
                status: ResultFilter::selection(status),
                search,
            };
            let records = load_or_empty(&source, Dataset::Results).await;
            let report = ResultsReport::build(&records, &filter, agg);
            emit(&report, &out)?;
        }
        Commands::Attendance { id, kind } => {
            let records = load_or_empty(&source, Dataset::Attendance).await;
            let summary = AttendanceSummary::from_records(&records, id.as_deref(), kind.as_deref());
            print_json(&summary)?;
        }
        Commands::Overview { out } => {
            let (students, teachers, attendance, assessments, alerts, nep) = tokio::join!(
                load_or_empty(&source, Dataset::Students),
                load_or_empty(&source, Dataset::Teachers),
                load_or_empty(&source, Dataset::Attendance),
                load_or_empty(&source, Dataset::Assessments),
                load_or_empty(&source, Dataset::Alerts),
                load_or_empty(&source, Dataset::NepCompliance),
            );
            let overview = SchoolOverview::from_datasets(
                Datasets {
                    students: &students,
                    teachers: &teachers,
                    attendance: &attendance,
                    assessments: &assessments,
                    alerts: &alerts,
                    nep_compliance: &nep,
                },
                agg,
            );
            emit(&overview, &out)?;
        }
        Commands::Student { id, out } => {
            let ctx = SessionContext::init(store)?;
            let Some(student_id) = id.or_else(|| {
                ctx.current()
                    .filter(|s| s.role == Role::Student)
                    .map(|s| s.user_id.clone())
            }) else {
                warn!("No student id given and no student is logged in");
                return Ok(());
            };

            let (students, results, assessments, attendance) = tokio::join!(
                load_or_empty(&source, Dataset::Students),
                load_or_empty(&source, Dataset::Results),
                load_or_empty(&source, Dataset::Assessments),
                load_or_empty(&source, Dataset::Attendance),
            );
            let profile = StudentProfile::from_datasets(
                &student_id,
                &students,
                &results,
                &assessments,
                &attendance,
                agg,
            );
            emit(&profile, &out)?;
        }
        Commands::Group {
            dataset,
            by,
            value,
            append,
        } => {
            let dataset = Dataset::from(dataset);
            let records = load_or_empty(&source, dataset).await;
            let summary = agg.group_summary(&records, |r| r.display(&by), |r| r.number(&value));

            if let Some(path) = append {
                let rows: Vec<GroupRow> = summary
                    .iter()
                    .map(|(group, s)| GroupRow {
                        dataset: dataset.to_string(),
                        group_by: by.clone(),
                        value: value.clone(),
                        group: group.clone(),
                        count: s.count,
                        average: s.average,
                        highest: s.highest,
                        lowest: s.lowest,
                        stddev: s.stddev,
                    })
                    .collect();
                append_rows(&path, &rows)?;
            }
            print_json(&summary)?;
        }
        Commands::Top {
            dataset,
            value,
            n,
            asc,
        } => {
            let records = load_or_empty(&source, Dataset::from(dataset)).await;
            let direction = if asc { Direction::Asc } else { Direction::Desc };
            let ranked = agg.ranked(&records, |r: &Record| r.number(&value), n, direction);
            print_json(&ranked)?;
        }
        Commands::Histogram {
            dataset,
            by,
            buckets,
        } => {
            let records = load_or_empty(&source, Dataset::from(dataset)).await;
            let counts = if buckets.is_empty() {
                histogram(&records, |r| r.display(&by))
            } else {
                histogram_over(&records, |r| r.display(&by), &buckets)
            };
            print_json(&counts)?;
        }
        Commands::Login { id, role, name } => {
            let name = match name {
                Some(name) => name,
                None => lookup_name(&source, &id, role).await,
            };
            let mut ctx = SessionContext::init(store)?;
            let session = ctx.login(&id, &name, role)?;
            print_json(session)?;
        }
        Commands::Logout => {
            let mut ctx = SessionContext::init(store)?;
            ctx.logout()?;
        }
        Commands::Whoami => {
            let ctx = SessionContext::init(store)?;
            match ctx.current() {
                Some(session) => print_json(session)?,
                None => info!("Not logged in"),
            }
        }
    }

    Ok(())
}

/// Logs a report and optionally writes it to a JSON file.
fn emit<T: Serialize + std::fmt::Debug>(report: &T, out: &ReportOutput) -> Result<()> {
    print_pretty(report);
    print_json(report)?;
    if let Some(path) = &out.output {
        write_json(path, report, out.gzip)?;
    }
    Ok(())
}

/// Display name for `id` from the dataset matching `role`, or the id itself.
async fn lookup_name(source: &DataSource, id: &str, role: Role) -> String {
    let dataset = match role {
        Role::Student => Dataset::Students,
        Role::Principal => Dataset::Teachers,
    };
    load_or_empty(source, dataset)
        .await
        .iter()
        .find(|r| r.display("id") == id)
        .map(|r| r.display("name"))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| id.to_string())
}
