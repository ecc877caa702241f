use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Upload {
        path: PathBuf,
        file_name: String,
        languages: Vec<String>,
    },
    /// Replaces any running poll with one for `job_id`.
    StartPolling { job_id: crate::JobId },
    StopPolling,
    DownloadArtifact {
        download_url: String,
        filename: String,
    },
    ListSubtitles,
    Cleanup,
}
