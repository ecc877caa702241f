use crate::{DownloadOutcome, JobId, JobStatus, SelectedFile};

const JOB_ID_DISPLAY_CHARS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub selected_file: Option<SelectedFile>,
    pub selected_languages: Vec<String>,
    pub uploading: bool,
    pub polling: bool,
    /// Present only while a job id and a snapshot are both held.
    pub job: Option<JobView>,
    pub server_files: Vec<ArtifactRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub job_id: JobId,
    pub job_id_short: String,
    pub status: JobStatus,
    pub status_label: &'static str,
    pub processing: bool,
    pub languages: String,
    pub error: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub artifacts: Vec<ArtifactRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRowView {
    pub filename: String,
    pub download_url: String,
    pub download: Option<DownloadOutcome>,
}

/// `0123456789` becomes `01234567...`.
pub fn truncate_job_id(job_id: &str) -> String {
    let head: String = job_id.chars().take(JOB_ID_DISPLAY_CHARS).collect();
    format!("{head}...")
}
