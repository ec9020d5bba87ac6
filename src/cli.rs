use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relayforge")]
#[command(author, version, about = "Remote media transcode pipeline")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a conversion job for a file on the storage host
    Submit {
        /// Path of the source file on the storage host
        #[arg(required = true)]
        source: String,

        /// Transcoder parameters, e.g. "-c:v libx265 -crf 28"
        #[arg(long, allow_hyphen_values = true)]
        spec: String,

        /// Queue the job for a worker instead of running it now
        #[arg(long)]
        detach: bool,
    },

    /// Show the status of a job
    Status {
        /// Job id
        #[arg(required = true)]
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recent jobs
    List {
        /// Only show jobs in this status (e.g. PROCESSING_FAILED)
        #[arg(long)]
        status: Option<String>,

        /// Maximum number of jobs to show
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run queue workers until interrupted
    Worker {
        /// Number of worker threads (defaults to pipeline.workers)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
