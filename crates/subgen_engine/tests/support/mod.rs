#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use subgen_engine::{
    EngineEvent, EventSink, FailureKind, JobStatus, JobStatusResponse, ServiceClient,
    ServiceError, SubtitleFile, UploadReceipt, UploadRequest,
};

pub fn snapshot(status: JobStatus) -> JobStatusResponse {
    JobStatusResponse {
        status,
        created_at: "2024-05-01T10:00:00".to_string(),
        languages: vec!["en".to_string()],
        subtitles: Vec::new(),
        error: None,
        completed_at: None,
    }
}

pub fn completed_clip() -> JobStatusResponse {
    JobStatusResponse {
        subtitles: vec![SubtitleFile {
            filename: "clip.en.srt".to_string(),
            download_url: "/files/abc123/clip.en.srt".to_string(),
        }],
        completed_at: Some("2024-05-01T10:01:00".to_string()),
        ..snapshot(JobStatus::Completed)
    }
}

pub fn network_error() -> ServiceError {
    ServiceError {
        kind: FailureKind::Network,
        message: "connection refused".to_string(),
    }
}

/// Answers status requests from a script, then keeps reporting `queued`.
#[derive(Default)]
pub struct ScriptedClient {
    statuses: Mutex<VecDeque<Result<JobStatusResponse, ServiceError>>>,
    status_calls: AtomicUsize,
    uploads: Mutex<Vec<UploadRequest>>,
    download_body: Mutex<Option<Vec<u8>>>,
    cleanup_result: Mutex<Option<ServiceError>>,
}

impl ScriptedClient {
    pub fn with_statuses(statuses: Vec<Result<JobStatusResponse, ServiceError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    pub fn set_download_body(&self, body: &[u8]) {
        *self.download_body.lock().unwrap() = Some(body.to_vec());
    }

    pub fn fail_cleanup(&self, err: ServiceError) {
        *self.cleanup_result.lock().unwrap() = Some(err);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ServiceClient for ScriptedClient {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, ServiceError> {
        self.uploads.lock().unwrap().push(request);
        Ok(UploadReceipt {
            job_id: "abc123".to_string(),
            message: None,
            status_url: Some("/status/abc123".to_string()),
        })
    }

    async fn status(&self, _job_id: &str) -> Result<JobStatusResponse, ServiceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(snapshot(JobStatus::Queued)))
    }

    async fn download(&self, _download_url: &str) -> Result<Vec<u8>, ServiceError> {
        self.download_body.lock().unwrap().clone().ok_or(ServiceError {
            kind: FailureKind::HttpStatus(404),
            message: "Not Found".to_string(),
        })
    }

    async fn list_subtitles(&self) -> Result<Vec<SubtitleFile>, ServiceError> {
        Ok(completed_clip().subtitles)
    }

    async fn cleanup(&self) -> Result<(), ServiceError> {
        match self.cleanup_result.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    /// `(job_id, status)` for every relayed snapshot, in order.
    pub fn statuses(&self) -> Vec<(String, JobStatus)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::StatusReceived { job_id, snapshot } => Some((job_id, snapshot.status)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
