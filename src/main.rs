use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use lesson_progress::achievement::{dashboard_summary, enrollment_progress};
use lesson_progress::dates::{parse_date, parse_month};
use lesson_progress::models::TimelineUnit;
use lesson_progress::report::{self, format_percent};
use lesson_progress::{loader, logging, Window};

const DATA_DIR_ENV: &str = "LESSON_PROGRESS_DATA_DIR";

#[derive(Parser)]
#[command(name = "lesson-progress")]
#[command(about = "Planned versus actual lesson progress from CSV records", long_about = None)]
struct Cli {
    /// Directory holding students.csv, courses.csv, student_courses.csv and lesson_logs.csv
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Achievement per student
    Students {
        #[arg(long, value_parser = date_arg)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = date_arg)]
        to: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Achievement per course
    Courses {
        #[arg(long, value_parser = date_arg)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = date_arg)]
        to: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Actual sessions bucketed by day, week or month
    Timeline {
        #[arg(long, value_parser = date_arg)]
        from: NaiveDate,
        #[arg(long, value_parser = date_arg)]
        to: NaiveDate,
        #[arg(long, value_enum, default_value_t = TimelineUnit::Week)]
        unit: TimelineUnit,
        #[arg(long)]
        json: bool,
    },
    /// Daily planned/actual totals for one student and month
    Calendar {
        #[arg(long)]
        student: String,
        /// Month as YYYY-MM
        #[arg(long)]
        month: String,
        #[arg(long)]
        json: bool,
    },
    /// Enrollment progress for one student
    Enrollments {
        #[arg(long)]
        student: String,
    },
    /// Headline figures
    Dashboard {
        #[arg(long, value_parser = date_arg)]
        today: Option<NaiveDate>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, value_parser = date_arg)]
        from: NaiveDate,
        #[arg(long, value_parser = date_arg)]
        to: NaiveDate,
        #[arg(long, value_enum, default_value_t = TimelineUnit::Week)]
        unit: TimelineUnit,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("expected a date like 2024-04-01, got {raw:?}"))
}

fn data_dir(cli_value: Option<PathBuf>) -> PathBuf {
    cli_value
        .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging()?;
    let cli = Cli::parse();
    let dir = data_dir(cli.data_dir);

    let store = loader::load_snapshot(&dir)
        .await
        .with_context(|| format!("failed to load records from {}", dir.display()))?;

    match cli.command {
        Commands::Students { from, to, json } => {
            let rows = store.student_achievement(Window::new(from, to).normalized());
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            if rows.is_empty() {
                println!("No students found.");
                return Ok(());
            }
            for row in rows.iter() {
                println!(
                    "- {} (grade {}) planned {:.1} actual {:.1} rate {}",
                    row.student.student_id,
                    row.student.grade,
                    row.planned,
                    row.actual,
                    format_percent(row.rate())
                );
            }
        }
        Commands::Courses { from, to, json } => {
            let rows = store.course_achievement(Window::new(from, to).normalized());
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            if rows.is_empty() {
                println!("No courses found.");
                return Ok(());
            }
            for row in rows.iter() {
                println!(
                    "- {} {} ({} students) planned {:.1} actual {:.1} rate {}",
                    row.course.course_id,
                    row.course.course_name,
                    row.student_count,
                    row.planned,
                    row.actual,
                    format_percent(row.rate())
                );
            }
        }
        Commands::Timeline {
            from,
            to,
            unit,
            json,
        } => {
            let buckets = store.timeline(Window::between(from, to).normalized(), unit);
            if json {
                println!("{}", serde_json::to_string_pretty(&buckets)?);
                return Ok(());
            }
            if buckets.is_empty() {
                println!("No actual sessions logged in this window.");
                return Ok(());
            }
            for bucket in buckets.iter() {
                println!("- {}: {:.0}", bucket.key, bucket.total);
            }
        }
        Commands::Calendar {
            student,
            month,
            json,
        } => {
            let (year, month0) = parse_month(&month)
                .with_context(|| format!("expected a month like 2024-04, got {month:?}"))?;
            let days = store.daily_totals(&student, year, month0);
            if json {
                println!("{}", serde_json::to_string_pretty(&days)?);
                return Ok(());
            }
            if days.is_empty() {
                println!("No sessions logged for {student} in {month}.");
                return Ok(());
            }
            for (day, totals) in days.iter() {
                println!(
                    "- {}: planned {:.1} actual {:.1}",
                    day, totals.planned, totals.actual
                );
            }
        }
        Commands::Enrollments { student } => {
            if store.student(&student).is_none() {
                anyhow::bail!("unknown student {student}");
            }
            let rows = enrollment_progress(&store, &student);
            if rows.is_empty() {
                println!("No courses linked to {student}.");
                return Ok(());
            }
            for row in rows.iter() {
                let span = |date: Option<NaiveDate>| {
                    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
                };
                println!(
                    "- {} {} planned {} actual {:.1} rate {} ({} to {})",
                    row.enrollment.course_id,
                    row.course.map(|c| c.course_name.as_str()).unwrap_or(""),
                    row.enrollment.planned_sessions,
                    row.actual,
                    format_percent(row.rate()),
                    span(row.enrollment.start_date),
                    span(row.enrollment.end_date)
                );
            }
        }
        Commands::Dashboard { today } => {
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            let summary = dashboard_summary(&store, today);
            println!("Active students: {}", summary.active_students);
            println!("Sessions this month: {:.1}", summary.month_actual);
            println!("Average achievement: {}", format_percent(summary.average_rate));
        }
        Commands::Report { from, to, unit, out } => {
            let window = Window::between(from, to).normalized();
            let report = report::build_report(&store, window, unit, Utc::now().date_naive());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(out = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
