use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a video file.
    FileSelected(crate::SelectedFile),
    /// User toggled a language by code or catalog name.
    LanguageToggled(String),
    /// User asked to generate subtitles for the current selection.
    SubmitClicked,
    /// Service accepted the upload.
    UploadSucceeded { job_id: crate::JobId },
    /// Upload was rejected or never reached the service.
    UploadFailed { message: String },
    /// User wants to follow a job that was submitted elsewhere.
    JobAttached { job_id: crate::JobId },
    /// Poller relayed a status snapshot.
    StatusReceived {
        job_id: crate::JobId,
        snapshot: crate::JobSnapshot,
    },
    /// Poller gave up on a job that never reached a terminal status.
    PollingTimedOut { job_id: crate::JobId },
    /// User clicked download on an artifact row.
    DownloadClicked { filename: String },
    /// Engine finished a download.
    DownloadFinished {
        filename: String,
        result: Result<PathBuf, String>,
    },
    /// User asked for the subtitle files currently held by the service.
    ListClicked,
    /// Engine finished listing server-side subtitle files.
    SubtitlesListed(Result<Vec<crate::SubtitleArtifact>, String>),
    /// User clicked Clear Files.
    CleanupClicked,
    /// Engine finished the server-side cleanup request.
    CleanupFinished(Result<(), String>),
    /// Hosting UI is going away.
    Shutdown,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
