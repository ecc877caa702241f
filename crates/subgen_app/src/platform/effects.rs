use std::sync::{mpsc, Arc};

use subgen_core::{Effect, JobSnapshot, JobStatus, Msg, SubtitleArtifact};
use subgen_engine::{
    EngineConfig, EngineEvent, EngineHandle, EventSink, FailureKind, JobStatusResponse,
    ServiceError, SubtitleFile,
};
use subgen_logging::{short_job_id, subgen_debug, subgen_info, subgen_warn};

/// Executes core effects on the engine.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, msg_tx: mpsc::Sender<Msg>) -> Result<Self, ServiceError> {
        let engine = EngineHandle::new(config, Arc::new(MsgSink { tx: msg_tx }))?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Upload {
                    path,
                    file_name,
                    languages,
                } => {
                    subgen_info!(
                        "Upload file={} languages={}",
                        file_name,
                        languages.join(",")
                    );
                    self.engine.upload(path, file_name, languages);
                }
                Effect::StartPolling { job_id } => {
                    subgen_debug!("StartPolling job_id={}", short_job_id(&job_id));
                    self.engine.start_polling(job_id);
                }
                Effect::StopPolling => self.engine.stop_polling(),
                Effect::DownloadArtifact {
                    download_url,
                    filename,
                } => {
                    subgen_debug!("Download {} from {}", filename, download_url);
                    self.engine.download(download_url, filename);
                }
                Effect::ListSubtitles => self.engine.list_subtitles(),
                Effect::Cleanup => self.engine.cleanup(),
            }
        }
    }
}

/// Feeds engine events back into the dispatch loop as messages.
struct MsgSink {
    tx: mpsc::Sender<Msg>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(map_event(event));
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadCompleted(Ok(receipt)) => Msg::UploadSucceeded {
            job_id: receipt.job_id,
        },
        EngineEvent::UploadCompleted(Err(err)) => {
            subgen_warn!("Upload failed: {}", err);
            Msg::UploadFailed {
                message: upload_failure_message(&err),
            }
        }
        EngineEvent::StatusReceived { job_id, snapshot } => Msg::StatusReceived {
            job_id,
            snapshot: map_snapshot(snapshot),
        },
        EngineEvent::PollingTimedOut { job_id } => Msg::PollingTimedOut { job_id },
        EngineEvent::DownloadCompleted { filename, result } => {
            if let Err(err) = &result {
                subgen_warn!("Download of {} failed: {}", filename, err);
            }
            Msg::DownloadFinished {
                filename,
                result: result.map_err(|err| err.to_string()),
            }
        }
        EngineEvent::SubtitlesListed(result) => Msg::SubtitlesListed(
            result
                .map(|files| files.into_iter().map(map_artifact).collect())
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::CleanupCompleted(result) => {
            if let Err(err) = &result {
                subgen_warn!("Cleanup request failed: {}", err);
            }
            Msg::CleanupFinished(result.map_err(|err| err.to_string()))
        }
    }
}

/// The service's own detail reads best on its own; transport errors keep their kind.
/// A rejection without a detail maps to an empty message, which core words itself.
fn upload_failure_message(err: &ServiceError) -> String {
    match err.kind {
        FailureKind::HttpStatus(_) => err.message.clone(),
        _ => err.to_string(),
    }
}

fn map_snapshot(snapshot: JobStatusResponse) -> JobSnapshot {
    JobSnapshot {
        status: map_status(snapshot.status),
        created_at: snapshot.created_at,
        languages: snapshot.languages,
        subtitles: snapshot.subtitles.into_iter().map(map_artifact).collect(),
        error: snapshot.error,
        completed_at: snapshot.completed_at,
    }
}

fn map_artifact(file: SubtitleFile) -> SubtitleArtifact {
    SubtitleArtifact {
        filename: file.filename,
        download_url: file.download_url,
    }
}

fn map_status(status: subgen_engine::JobStatus) -> JobStatus {
    match status {
        subgen_engine::JobStatus::Queued => JobStatus::Queued,
        subgen_engine::JobStatus::ExtractingAudio => JobStatus::ExtractingAudio,
        subgen_engine::JobStatus::Transcribing => JobStatus::Transcribing,
        subgen_engine::JobStatus::WritingSubtitles => JobStatus::WritingSubtitles,
        subgen_engine::JobStatus::Completed => JobStatus::Completed,
        subgen_engine::JobStatus::Failed => JobStatus::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use subgen_core::{update, AppState, SelectedFile};
    use subgen_engine::UploadReceipt;

    #[test]
    fn upload_rejection_keeps_service_detail() {
        let msg = map_event(EngineEvent::UploadCompleted(Err(ServiceError {
            kind: FailureKind::HttpStatus(400),
            message: "Invalid file type".into(),
        })));
        assert_eq!(
            msg,
            Msg::UploadFailed {
                message: "Invalid file type".into()
            }
        );
    }

    #[test]
    fn upload_rejection_without_detail_falls_back_to_generic_error() {
        let msg = map_event(EngineEvent::UploadCompleted(Err(ServiceError {
            kind: FailureKind::HttpStatus(400),
            message: String::new(),
        })));
        assert_eq!(
            msg,
            Msg::UploadFailed {
                message: String::new()
            }
        );

        let clip = SelectedFile {
            name: "clip.mp4".into(),
            path: PathBuf::from("clip.mp4"),
            size_bytes: 1024,
        };
        let state = [
            Msg::FileSelected(clip),
            Msg::LanguageToggled("en".into()),
            Msg::SubmitClicked,
        ]
        .into_iter()
        .fold(AppState::new(), |state, msg| update(state, msg).0);
        let (mut state, effects) = update(state, msg);
        assert!(effects.is_empty());
        assert!(!state.is_uploading());
        let last = state.take_notices().pop().map(|notice| notice.text);
        assert_eq!(last.as_deref(), Some("Error: Upload failed"));
    }

    #[test]
    fn upload_transport_failure_names_the_kind() {
        let msg = map_event(EngineEvent::UploadCompleted(Err(ServiceError {
            kind: FailureKind::Network,
            message: "connection refused".into(),
        })));
        assert_eq!(
            msg,
            Msg::UploadFailed {
                message: "network error: connection refused".into()
            }
        );
    }

    #[test]
    fn receipt_becomes_job_id() {
        let msg = map_event(EngineEvent::UploadCompleted(Ok(UploadReceipt {
            job_id: "abc123".into(),
            message: None,
            status_url: None,
        })));
        assert_eq!(
            msg,
            Msg::UploadSucceeded {
                job_id: "abc123".into()
            }
        );
    }

    #[test]
    fn snapshot_maps_every_field() {
        let msg = map_event(EngineEvent::StatusReceived {
            job_id: "abc123".into(),
            snapshot: JobStatusResponse {
                status: subgen_engine::JobStatus::WritingSubtitles,
                created_at: "2024-05-01T10:00:00".into(),
                languages: vec!["en".into()],
                subtitles: vec![SubtitleFile {
                    filename: "clip.en.srt".into(),
                    download_url: "/files/abc123/clip.en.srt".into(),
                }],
                error: None,
                completed_at: None,
            },
        });

        let Msg::StatusReceived { job_id, snapshot } = msg else {
            panic!("expected status message");
        };
        assert_eq!(job_id, "abc123");
        assert_eq!(snapshot.status, JobStatus::WritingSubtitles);
        assert_eq!(snapshot.subtitles[0].filename, "clip.en.srt");
    }

    #[test]
    fn download_result_is_flattened_to_text() {
        let msg = map_event(EngineEvent::DownloadCompleted {
            filename: "clip.en.srt".into(),
            result: Err(ServiceError {
                kind: FailureKind::HttpStatus(404),
                message: "Not Found".into(),
            }),
        });
        assert_eq!(
            msg,
            Msg::DownloadFinished {
                filename: "clip.en.srt".into(),
                result: Err("http status 404: Not Found".into()),
            }
        );

        let msg = map_event(EngineEvent::DownloadCompleted {
            filename: "clip.en.srt".into(),
            result: Ok(PathBuf::from("subtitles/clip.en.srt")),
        });
        assert!(matches!(msg, Msg::DownloadFinished { result: Ok(_), .. }));
    }
}
