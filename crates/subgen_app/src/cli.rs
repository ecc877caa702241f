use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate subtitles for a video through a transcription service", long_about = None)]
pub struct Args {
    /// Configuration file (RON). Defaults to ./subgen.ron when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Service base URL, e.g. http://localhost:8000
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Directory downloaded subtitle files are saved to
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to ./subgen.log
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the languages subtitles can be generated in
    Languages,

    /// Upload a video and wait for its subtitles
    Submit {
        /// Video file to transcribe
        #[arg(short, long)]
        file: PathBuf,

        /// Target languages, by code or name (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        languages: Vec<String>,

        /// Download every subtitle file once the job completes
        #[arg(long)]
        download: bool,
    },

    /// Follow a job that was already submitted
    Watch {
        /// Job identifier returned by the upload
        job_id: String,

        /// Download every subtitle file once the job completes
        #[arg(long)]
        download: bool,
    },

    /// List subtitle files currently held by the service
    List,

    /// Download one subtitle file held by the service
    Download {
        /// File name as shown by `list`
        filename: String,
    },

    /// Delete all files on the service and reset the local session
    Cleanup,
}
