use crate::{
    find_language, truncate_job_id, AppState, DownloadOutcome, Effect, JobStatus, Msg, Notice,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            state.push_notice(Notice::success(format!(
                "Selected: {} ({:.2} MB)",
                file.name,
                file.size_mb()
            )));
            state.select_file(file);
            Vec::new()
        }
        Msg::LanguageToggled(raw) => {
            match find_language(&raw) {
                Some(lang) => {
                    state.toggle_language(lang.code);
                }
                None => state.push_notice(Notice::error(format!("Unknown language: {}", raw.trim()))),
            }
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::UploadSucceeded { job_id } => {
            // A reset while the upload was in flight orphans its result.
            if !state.is_uploading() {
                return (state, Vec::new());
            }
            state.set_uploading(false);
            state.begin_job(job_id.clone());
            state.push_notice(Notice::success("Video uploaded! Processing started..."));
            vec![Effect::StartPolling { job_id }]
        }
        Msg::UploadFailed { message } => {
            if !state.is_uploading() {
                return (state, Vec::new());
            }
            state.set_uploading(false);
            let message = if message.trim().is_empty() {
                "Upload failed".to_string()
            } else {
                message
            };
            state.push_notice(Notice::error(format!("Error: {message}")));
            Vec::new()
        }
        Msg::JobAttached { job_id } => {
            let job_id = job_id.trim().to_string();
            if job_id.is_empty() {
                state.push_notice(Notice::error("Please provide a job id"));
                return (state, Vec::new());
            }
            if state.is_uploading() {
                state.push_notice(Notice::error("An upload is still in progress"));
                return (state, Vec::new());
            }
            state.begin_job(job_id.clone());
            state.push_notice(Notice::info(format!(
                "Following job {}",
                truncate_job_id(&job_id)
            )));
            vec![Effect::StartPolling { job_id }]
        }
        Msg::StatusReceived { job_id, snapshot } => {
            if !state.is_current_job(&job_id) {
                return (state, Vec::new());
            }
            match snapshot.status {
                JobStatus::Completed => {
                    state.push_notice(Notice::success("Subtitles generated successfully!"));
                }
                JobStatus::Failed => {
                    let reason = snapshot.error.as_deref().unwrap_or("Unknown error");
                    state.push_notice(Notice::error(format!("Processing failed: {reason}")));
                }
                _ => {}
            }
            state.replace_snapshot(snapshot);
            Vec::new()
        }
        Msg::PollingTimedOut { job_id } => {
            if state.is_current_job(&job_id) && state.is_polling() {
                state.set_polling(false);
                state.push_notice(Notice::error(format!(
                    "Stopped waiting for job {}: no final status reported",
                    truncate_job_id(&job_id)
                )));
            }
            Vec::new()
        }
        Msg::DownloadClicked { filename } => {
            let Some(artifact) = state.find_artifact(&filename).cloned() else {
                state.push_notice(Notice::error(format!("No such subtitle file: {filename}")));
                return (state, Vec::new());
            };
            state.set_download_outcome(artifact.filename.clone(), DownloadOutcome::Pending);
            vec![Effect::DownloadArtifact {
                download_url: artifact.download_url,
                filename: artifact.filename,
            }]
        }
        Msg::DownloadFinished { filename, result } => {
            let outcome = match result {
                Ok(path) => {
                    state.push_notice(Notice::success(format!("Downloaded {filename}")));
                    DownloadOutcome::Saved { path }
                }
                Err(reason) => {
                    state.push_notice(Notice::error(format!(
                        "Failed to download file: {reason}"
                    )));
                    DownloadOutcome::Failed { reason }
                }
            };
            state.set_download_outcome(filename, outcome);
            Vec::new()
        }
        Msg::ListClicked => vec![Effect::ListSubtitles],
        Msg::SubtitlesListed(result) => {
            match result {
                Ok(files) => {
                    state.push_notice(Notice::info(format!(
                        "Found {} subtitle file(s) on the server",
                        files.len()
                    )));
                    state.set_server_files(files);
                }
                Err(reason) => {
                    state.push_notice(Notice::error(format!(
                        "Failed to list subtitles: {reason}"
                    )));
                }
            }
            Vec::new()
        }
        Msg::CleanupClicked => {
            // Local state is cleared up front, whatever the service answers.
            state.reset_session();
            vec![Effect::StopPolling, Effect::Cleanup]
        }
        Msg::CleanupFinished(result) => {
            match result {
                Ok(()) => state.push_notice(Notice::success("All files cleaned up successfully!")),
                Err(reason) => state.push_notice(Notice::error(format!("Cleanup failed: {reason}"))),
            }
            Vec::new()
        }
        Msg::Shutdown => {
            if state.is_polling() {
                state.set_polling(false);
            }
            vec![Effect::StopPolling]
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if state.is_uploading() {
        return Vec::new();
    }

    let Some(file) = state.selected_file().cloned() else {
        state.push_notice(Notice::error("Please select a video file"));
        return Vec::new();
    };
    if file.size_bytes == 0 {
        state.push_notice(Notice::error(format!("Selected file is empty: {}", file.name)));
        return Vec::new();
    }

    let languages = state.selected_languages();
    if languages.is_empty() {
        state.push_notice(Notice::error("Please select at least one language"));
        return Vec::new();
    }

    state.set_uploading(true);
    vec![Effect::Upload {
        path: file.path,
        file_name: file.name,
        languages,
    }]
}
