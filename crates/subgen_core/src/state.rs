use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::view_model::{truncate_job_id, AppViewModel, ArtifactRowView, JobView};

/// Opaque job identifier handed out by the service.
pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    ExtractingAudio,
    Transcribing,
    WritingSubtitles,
    Completed,
    Failed,
}

impl JobStatus {
    /// `Completed` and `Failed` are the only statuses that end polling.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::ExtractingAudio => "Extracting Audio",
            JobStatus::Transcribing => "Transcribing",
            JobStatus::WritingSubtitles => "Writing Subtitles",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleArtifact {
    pub filename: String,
    /// Service-relative path, e.g. `/download/subtitles_en.srt`.
    pub download_url: String,
}

/// Last status reported by the service for a job. Replaced in full on every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub created_at: String,
    pub languages: Vec<String>,
    pub subtitles: Vec<SubtitleArtifact>,
    pub error: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl SelectedFile {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A user-facing message produced by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub(crate) fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub(crate) fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub(crate) fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Pending,
    Saved { path: PathBuf },
    Failed { reason: String },
}

/// Session state for one client. Reset to `Default` on cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    selected_file: Option<SelectedFile>,
    selected_languages: BTreeSet<String>,
    uploading: bool,
    job_id: Option<JobId>,
    snapshot: Option<JobSnapshot>,
    polling: bool,
    downloads: BTreeMap<String, DownloadOutcome>,
    server_files: Vec<SubtitleArtifact>,
    notices: Vec<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    /// Selected language codes in sorted order.
    pub fn selected_languages(&self) -> Vec<String> {
        self.selected_languages.iter().cloned().collect()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn snapshot(&self) -> Option<&JobSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn download_outcome(&self, filename: &str) -> Option<&DownloadOutcome> {
        self.downloads.get(filename)
    }

    /// True while any requested download has not reported back.
    pub fn has_pending_downloads(&self) -> bool {
        self.downloads
            .values()
            .any(|outcome| matches!(outcome, DownloadOutcome::Pending))
    }

    pub fn view(&self) -> AppViewModel {
        let job = match (&self.job_id, &self.snapshot) {
            (Some(job_id), Some(snapshot)) => Some(JobView {
                job_id: job_id.clone(),
                job_id_short: truncate_job_id(job_id),
                status: snapshot.status,
                status_label: snapshot.status.label(),
                processing: !snapshot.status.is_terminal(),
                languages: snapshot.languages.join(", "),
                error: snapshot.error.clone(),
                created_at: snapshot.created_at.clone(),
                completed_at: snapshot.completed_at.clone(),
                artifacts: self.artifact_rows(&snapshot.subtitles),
            }),
            _ => None,
        };

        AppViewModel {
            selected_file: self.selected_file.clone(),
            selected_languages: self.selected_languages(),
            uploading: self.uploading,
            polling: self.polling,
            job,
            server_files: self.artifact_rows(&self.server_files),
        }
    }

    /// Returns and clears the dirty flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drains notices produced since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn artifact_rows(&self, artifacts: &[SubtitleArtifact]) -> Vec<ArtifactRowView> {
        artifacts
            .iter()
            .map(|artifact| ArtifactRowView {
                filename: artifact.filename.clone(),
                download_url: artifact.download_url.clone(),
                download: self.downloads.get(&artifact.filename).cloned(),
            })
            .collect()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub(crate) fn select_file(&mut self, file: SelectedFile) {
        self.selected_file = Some(file);
        self.mark_dirty();
    }

    /// Adds the code if absent, removes it otherwise. Returns true if now selected.
    pub(crate) fn toggle_language(&mut self, code: &str) -> bool {
        let selected = if self.selected_languages.remove(code) {
            false
        } else {
            self.selected_languages.insert(code.to_string());
            true
        };
        self.mark_dirty();
        selected
    }

    pub(crate) fn set_uploading(&mut self, uploading: bool) {
        self.uploading = uploading;
        self.mark_dirty();
    }

    /// Adopts a new job: previous snapshot and download outcomes belong to the old job.
    pub(crate) fn begin_job(&mut self, job_id: JobId) {
        self.job_id = Some(job_id);
        self.snapshot = None;
        self.downloads.clear();
        self.polling = true;
        self.mark_dirty();
    }

    pub(crate) fn is_current_job(&self, job_id: &str) -> bool {
        self.job_id.as_deref() == Some(job_id)
    }

    pub(crate) fn replace_snapshot(&mut self, snapshot: JobSnapshot) {
        if snapshot.status.is_terminal() {
            self.polling = false;
        }
        self.snapshot = Some(snapshot);
        self.mark_dirty();
    }

    pub(crate) fn set_polling(&mut self, polling: bool) {
        self.polling = polling;
        self.mark_dirty();
    }

    /// Finds an artifact by filename in the job snapshot first, then in the server listing.
    pub(crate) fn find_artifact(&self, filename: &str) -> Option<&SubtitleArtifact> {
        self.snapshot
            .iter()
            .flat_map(|snapshot| snapshot.subtitles.iter())
            .chain(self.server_files.iter())
            .find(|artifact| artifact.filename == filename)
    }

    pub(crate) fn set_download_outcome(&mut self, filename: String, outcome: DownloadOutcome) {
        self.downloads.insert(filename, outcome);
        self.mark_dirty();
    }

    pub(crate) fn set_server_files(&mut self, files: Vec<SubtitleArtifact>) {
        self.server_files = files;
        self.mark_dirty();
    }

    /// Back to initial values. Pending notices survive so the caller still sees them.
    pub(crate) fn reset_session(&mut self) {
        let notices = std::mem::take(&mut self.notices);
        *self = Self {
            notices,
            ..Self::default()
        };
        self.mark_dirty();
    }
}
