use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub type JobId = String;

/// Job status as spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    ExtractingAudio,
    Transcribing,
    WritingSubtitles,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleFile {
    pub filename: String,
    pub download_url: String,
}

/// Body of `GET /status/{job_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleFile>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Body of a successful `POST /upload/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub job_id: JobId,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SubtitleListing {
    #[serde(default)]
    pub subtitles: Vec<SubtitleFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UploadCompleted(Result<UploadReceipt, ServiceError>),
    StatusReceived {
        job_id: JobId,
        snapshot: JobStatusResponse,
    },
    PollingTimedOut {
        job_id: JobId,
    },
    DownloadCompleted {
        filename: String,
        result: Result<PathBuf, ServiceError>,
    },
    SubtitlesListed(Result<Vec<SubtitleFile>, ServiceError>),
    CleanupCompleted(Result<(), ServiceError>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: FailureKind,
    /// Service-provided detail when there is one, otherwise the transport error text.
    pub message: String,
}

impl ServiceError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
