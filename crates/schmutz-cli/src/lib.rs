//! CLI argument parsing and terminal output for schmutz.

pub mod report;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

pub use report::{JobSummary, SessionRow, format_report, format_sessions, recommendations};

#[derive(Parser, Debug)]
#[command(name = "schmutz", version)]
#[command(about = "Display SLURM job efficiency metrics")]
#[command(after_help = "Examples:
  schmutz 12345              Show efficiency for job 12345
  schmutz status 12345       Same as above
  schmutz update 12345       Update OOD session card for job
  schmutz list               List active OOD sessions")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// SLURM job ID (shortcut for status)
    pub job_id: Option<String>,

    /// Output JSON (with job ID)
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show job efficiency status
    Status {
        /// SLURM job ID
        job_id: String,

        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Update OOD session card
    Update {
        /// SLURM job ID
        job_id: String,

        /// Path to OOD session directory
        #[arg(short, long)]
        session_path: Option<Utf8PathBuf>,

        /// Username for finding session
        #[arg(short, long)]
        user: Option<String>,
    },

    /// List active OOD sessions
    List {
        /// User to list sessions for
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Generate HTML card
    Html {
        /// SLURM job ID
        job_id: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },
}

impl Args {
    /// The command to run; a bare job ID means `status`.
    pub fn action(&self) -> Option<Command> {
        match (&self.command, &self.job_id) {
            (Some(command), _) => Some(command.clone()),
            (None, Some(job_id)) => Some(Command::Status {
                job_id: job_id.clone(),
                json: self.json,
            }),
            (None, None) => None,
        }
    }
}
