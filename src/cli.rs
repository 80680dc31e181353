//! Command-line interface

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::judge::{GradeOptions, Grader};
use crate::models::load_roster;
use crate::services::{ItemCounts, NotifyService, StatusService};
use crate::utils::today_stamp;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile, run and report on student submissions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Grade every active student's submission for an assignment
    Grade {
        /// Assignment to grade (e.g. hw1)
        assignment: String,
        /// Compile in c99 mode
        #[arg(long)]
        c99: bool,
        /// Grade the given unix name only
        #[arg(short, long)]
        unixname: Option<String>,
        /// Include the submission's notes.txt
        #[arg(short, long)]
        notes: bool,
        /// Compile against the assignment's alternate main
        #[arg(short, long)]
        altmain: bool,
        /// Show a diff against the reference output
        #[arg(short, long)]
        diff: bool,
    },
    /// Write grade messages built from the persisted reports
    Notify {
        /// Assignment whose reports to send
        assignment: String,
        /// Notify the given unix name only
        #[arg(short, long)]
        unixname: Option<String>,
    },
    /// Generate grade-status reports from the roster
    Status {
        /// Report on the given unix name only
        #[arg(short, long)]
        unixname: Option<String>,
        /// Number of graded homeworks
        #[arg(short, long)]
        assignments: Option<usize>,
        /// Number of graded exams
        #[arg(short, long)]
        exams: Option<usize>,
        /// Number of graded quizzes
        #[arg(short, long)]
        quizzes: Option<usize>,
    },
}

/// Execute a parsed command line.
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Grade {
            assignment,
            c99,
            unixname,
            notes,
            altmain,
            diff,
        } => {
            let students = select_students(&config, unixname).await?;
            let options = GradeOptions {
                c99,
                notes,
                altmain,
                diff,
            };
            let grader = Grader::prepare(&config, &assignment, options)
                .await
                .with_context(|| format!("cannot grade {}", assignment))?;
            grader.grade_all(&students).await;
            Ok(())
        }
        Commands::Notify {
            assignment,
            unixname,
        } => {
            let students = select_students(&config, unixname).await?;
            let mut stdout = std::io::stdout();
            let sent = NotifyService::notify(&config, &assignment, &students, &mut stdout).await?;
            tracing::info!(assignment = %assignment, messages = sent, "Notifications written");
            Ok(())
        }
        Commands::Status {
            unixname,
            assignments,
            exams,
            quizzes,
        } => {
            let roster = load_roster(&config.paths.roster_path).await?;
            let first = roster
                .records
                .first()
                .context("roster has no records")?;
            let counts = ItemCounts::from_record(first).with_overrides(assignments, exams, quizzes);
            StatusService::generate(&config, &roster, unixname.as_deref(), counts, &today_stamp())
                .await?;
            Ok(())
        }
    }
}

/// The named student, or every active student in the roster.
async fn select_students(config: &Config, unixname: Option<String>) -> Result<Vec<String>> {
    match unixname {
        Some(name) => Ok(vec![name]),
        None => {
            let roster = load_roster(&config.paths.roster_path).await?;
            Ok(roster.active_students())
        }
    }
}
