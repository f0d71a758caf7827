//! nbgrade CLI, the command-line front end for grading R notebooks.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nbgrade", version, about = "Rubric grader for R data-analysis notebooks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a notebook
    Grade {
        /// Path to the .ipynb submission
        #[arg(long)]
        notebook: PathBuf,

        /// Assignment name (defaults to the notebook file name)
        #[arg(long)]
        assignment: Option<String>,

        /// Student name (defaults to the name found in the notebook)
        #[arg(long)]
        student: Option<String>,

        /// Grade the saved outputs without re-running the notebook
        #[arg(long)]
        no_execute: bool,

        /// Output formats: json, pdf, text, all (comma-separated)
        #[arg(long, default_value = "text,json")]
        format: String,

        /// Directory for JSON records and PDF reports
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render a PDF report from stored feedback JSON
    Report {
        /// Grading record, analysis, or legacy feedback list
        #[arg(long)]
        feedback: PathBuf,

        #[arg(long)]
        student: String,

        #[arg(long)]
        assignment: String,

        /// Reports directory
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create a starter nbgrade.toml
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nbgrade=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            notebook,
            assignment,
            student,
            no_execute,
            format,
            output,
            config,
        } => {
            commands::grade::execute(
                notebook, assignment, student, no_execute, format, output, config,
            )
            .await
        }
        Commands::Report {
            feedback,
            student,
            assignment,
            output,
        } => commands::report::execute(feedback, student, assignment, output),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
