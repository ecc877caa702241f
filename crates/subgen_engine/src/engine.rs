use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use subgen_logging::{subgen_debug, subgen_error, subgen_info};

use crate::client::{ReqwestServiceClient, ServiceClient, ServiceSettings, UploadRequest};
use crate::persist::AtomicFileWriter;
use crate::{
    sanitize_artifact_filename, EngineEvent, EventSink, FailureKind, JobId, PollSettings,
    ServiceError, StatusPoller,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub service: ServiceSettings,
    pub poll: PollSettings,
    /// Where downloaded subtitle files are saved.
    pub output_dir: PathBuf,
}

impl EngineConfig {
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        Self {
            service: ServiceSettings::default(),
            poll: PollSettings::default(),
            output_dir,
        }
    }
}

enum EngineCommand {
    Upload {
        path: PathBuf,
        file_name: String,
        languages: Vec<String>,
    },
    StartPolling {
        job_id: JobId,
    },
    StopPolling,
    Download {
        download_url: String,
        filename: String,
    },
    ListSubtitles,
    Cleanup,
}

/// Runs service requests on a background tokio runtime and reports results to an [`EventSink`].
///
/// Dropping the handle stops the worker thread, which cancels any running poll.
pub struct EngineHandle {
    cmd_tx: Option<mpsc::Sender<EngineCommand>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Result<Self, ServiceError> {
        let client = Arc::new(ReqwestServiceClient::new(config.service.clone())?);
        Ok(Self::with_client(client, config, sink))
    }

    pub fn with_client(
        client: Arc<dyn ServiceClient>,
        config: EngineConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();

        let worker = thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    subgen_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let mut poller = StatusPoller::new(
                client.clone(),
                sink.clone(),
                runtime.handle().clone(),
                config.poll.clone(),
            );

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling { job_id } => poller.start(job_id),
                    EngineCommand::StopPolling => {
                        poller.stop();
                    }
                    command => {
                        let client = client.clone();
                        let sink = sink.clone();
                        let output_dir = config.output_dir.clone();
                        runtime.spawn(async move {
                            handle_command(client.as_ref(), command, sink.as_ref(), &output_dir)
                                .await;
                        });
                    }
                }
            }

            subgen_debug!("Engine command channel closed; shutting down");
            drop(poller);
        });

        Self {
            cmd_tx: Some(cmd_tx),
            worker: Some(worker),
        }
    }

    pub fn upload(&self, path: PathBuf, file_name: String, languages: Vec<String>) {
        self.send(EngineCommand::Upload {
            path,
            file_name,
            languages,
        });
    }

    pub fn start_polling(&self, job_id: impl Into<JobId>) {
        self.send(EngineCommand::StartPolling {
            job_id: job_id.into(),
        });
    }

    pub fn stop_polling(&self) {
        self.send(EngineCommand::StopPolling);
    }

    pub fn download(&self, download_url: String, filename: String) {
        self.send(EngineCommand::Download {
            download_url,
            filename,
        });
    }

    pub fn list_subtitles(&self) {
        self.send(EngineCommand::ListSubtitles);
    }

    pub fn cleanup(&self) {
        self.send(EngineCommand::Cleanup);
    }

    fn send(&self, command: EngineCommand) {
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(command);
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        self.cmd_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

async fn handle_command(
    client: &dyn ServiceClient,
    command: EngineCommand,
    sink: &dyn EventSink,
    output_dir: &Path,
) {
    match command {
        EngineCommand::Upload {
            path,
            file_name,
            languages,
        } => {
            let result = match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {
                    client
                        .upload(UploadRequest {
                            path,
                            file_name,
                            languages,
                        })
                        .await
                }
                Ok(_) => Err(ServiceError::new(
                    FailureKind::Io,
                    format!("not a file: {}", path.display()),
                )),
                Err(err) => Err(ServiceError::new(
                    FailureKind::Io,
                    format!("cannot read {}: {err}", path.display()),
                )),
            };
            sink.emit(EngineEvent::UploadCompleted(result));
        }
        EngineCommand::Download {
            download_url,
            filename,
        } => {
            let result = download_to(client, &download_url, &filename, output_dir).await;
            if let Ok(saved) = &result {
                subgen_info!("Saved {} to {:?}", filename, saved);
            }
            sink.emit(EngineEvent::DownloadCompleted { filename, result });
        }
        EngineCommand::ListSubtitles => {
            let result = client.list_subtitles().await;
            sink.emit(EngineEvent::SubtitlesListed(result));
        }
        EngineCommand::Cleanup => {
            let result = client.cleanup().await;
            sink.emit(EngineEvent::CleanupCompleted(result));
        }
        EngineCommand::StartPolling { .. } | EngineCommand::StopPolling => {
            // Poll lifecycle is owned by the worker loop.
        }
    }
}

async fn download_to(
    client: &dyn ServiceClient,
    download_url: &str,
    filename: &str,
    output_dir: &Path,
) -> Result<PathBuf, ServiceError> {
    let bytes = client.download(download_url).await?;
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    writer
        .write(&sanitize_artifact_filename(filename), &bytes)
        .map_err(|err| ServiceError::new(FailureKind::Io, err.to_string()))
}
