use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "session-curator")]
#[command(about = "Check imaging sessions against their expected-acquisition template", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the completeness checks on one session
    Curate {
        session_id: String,
        /// Id recorded in the report; defaults to a timestamped id
        #[arg(long)]
        analysis_id: Option<String>,
    },
    /// Run the completeness checks on every session in the store
    CurateAll {
        #[arg(long)]
        analysis_id: Option<String>,
    },
    /// Write the session status table as CSV
    Summary {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the indexed completeness metadata of a session, or list curated sessions
    Show { session_id: Option<String> },
    /// Print configuration values
    PrintConfig,
    /// Truncate all database tables
    TruncateDb,
}
