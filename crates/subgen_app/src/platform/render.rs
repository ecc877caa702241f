use chrono::{DateTime, NaiveDateTime};
use subgen_core::{
    AppViewModel, ArtifactRowView, DownloadOutcome, JobView, Notice, NoticeLevel, LANGUAGES,
};

/// Renders the view model as terminal lines. Empty when there is nothing to show.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if view.uploading {
        if let Some(file) = &view.selected_file {
            lines.push(format!(
                "Uploading {} ({:.2} MB) for {}...",
                file.name,
                file.size_mb(),
                view.selected_languages.join(", ")
            ));
        }
    }

    if let Some(job) = &view.job {
        lines.extend(render_job(job));
    } else if view.polling {
        lines.push("Waiting for first status report...".to_string());
    }

    if !view.server_files.is_empty() {
        lines.push("Subtitle files on the server:".to_string());
        lines.extend(view.server_files.iter().map(render_artifact));
    }

    lines
}

fn render_job(job: &JobView) -> Vec<String> {
    let marker = if job.processing { "…" } else { "" };
    let mut lines = vec![format!(
        "Job {} | {}{} | {}",
        job.job_id_short, job.status_label, marker, job.languages
    )];

    if let Some(error) = &job.error {
        lines.push(format!("  Error: {error}"));
    }
    if let Some(elapsed) = job
        .completed_at
        .as_deref()
        .and_then(|done| processing_time(&job.created_at, done))
    {
        lines.push(format!("  Finished in {elapsed}"));
    }
    if !job.artifacts.is_empty() {
        lines.push("  Generated subtitles:".to_string());
        lines.extend(job.artifacts.iter().map(render_artifact));
    }
    lines
}

fn render_artifact(row: &ArtifactRowView) -> String {
    match &row.download {
        None => format!("    {}", row.filename),
        Some(DownloadOutcome::Pending) => format!("    {} (downloading)", row.filename),
        Some(DownloadOutcome::Saved { path }) => {
            format!("    {} -> {}", row.filename, path.display())
        }
        Some(DownloadOutcome::Failed { reason }) => {
            format!("    {} (download failed: {reason})", row.filename)
        }
    }
}

pub fn render_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}", notice.text)
}

pub fn render_languages() -> Vec<String> {
    LANGUAGES
        .iter()
        .map(|lang| format!("{:<4} {}", lang.code, lang.name))
        .collect()
}

/// `1m 05s` between two service timestamps; `None` if either fails to parse.
fn processing_time(created_at: &str, completed_at: &str) -> Option<String> {
    let start = parse_timestamp(created_at)?;
    let end = parse_timestamp(completed_at)?;
    let secs = (end - start).num_seconds();
    if secs < 0 {
        return None;
    }
    Some(if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    })
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_utc());
    }
    raw.parse::<NaiveDateTime>().ok()
}
