use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{bail, Context};
use subgen_core::{find_language, update, AppState, JobStatus, Msg, NoticeLevel, SelectedFile};
use subgen_logging::{subgen_debug, subgen_info};

use super::config::ClientConfig;
use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::render;
use crate::cli::{Args, Commands};

const TICK: Duration = Duration::from_millis(250);

pub fn run_app(args: Args) -> anyhow::Result<()> {
    let destination = if args.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    logging::initialize(destination, args.verbose);

    if let Commands::Languages = args.command {
        for line in render::render_languages() {
            println!("{line}");
        }
        return Ok(());
    }

    let config = ClientConfig::load(args.config.as_deref())?
        .with_overrides(args.server, args.output_dir);
    config.validate()?;
    subgen_info!("Using service at {}", config.base_url);

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(config.engine_config(), msg_tx)
        .context("cannot set up the service client")?;
    let mut session = Session::new(runner, msg_rx);

    let outcome = match args.command {
        Commands::Languages => Ok(()),
        Commands::Submit {
            file,
            languages,
            download,
        } => session.submit(&file, &languages, download),
        Commands::Watch { job_id, download } => session.watch(job_id, download),
        Commands::List => session.list(),
        Commands::Download { filename } => session.download(filename),
        Commands::Cleanup => session.cleanup(),
    };
    session.shutdown();
    outcome?;

    if session.errors > 0 {
        bail!("finished with {} error(s)", session.errors);
    }
    Ok(())
}

/// Drives the core state machine from the terminal: messages in, notices and views out.
struct Session {
    state: AppState,
    runner: EffectRunner,
    inbox: mpsc::Receiver<Msg>,
    rendered: Vec<String>,
    errors: usize,
}

impl Session {
    fn new(runner: EffectRunner, inbox: mpsc::Receiver<Msg>) -> Self {
        Self {
            state: AppState::new(),
            runner,
            inbox,
            rendered: Vec::new(),
            errors: 0,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);

        for notice in state.take_notices() {
            if notice.level == NoticeLevel::Error {
                self.errors += 1;
                eprintln!("{}", render::render_notice(&notice));
            } else {
                println!("{}", render::render_notice(&notice));
            }
        }
        if state.consume_dirty() {
            let lines = render::render(&state.view());
            if lines != self.rendered {
                for line in &lines {
                    println!("{line}");
                }
                self.rendered = lines;
            }
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Feeds engine results into the state until `done` holds.
    fn run_until(&mut self, done: impl Fn(&AppState) -> bool) -> anyhow::Result<()> {
        while !done(&self.state) {
            self.next_message(|_| false)?;
        }
        Ok(())
    }

    /// Feeds engine results into the state until a message matching `wanted` has been handled.
    fn wait_for(&mut self, wanted: impl Fn(&Msg) -> bool) -> anyhow::Result<()> {
        while !self.next_message(&wanted)? {}
        Ok(())
    }

    fn next_message(&mut self, wanted: impl Fn(&Msg) -> bool) -> anyhow::Result<bool> {
        match self.inbox.recv_timeout(TICK) {
            Ok(msg) => {
                let matched = wanted(&msg);
                self.dispatch(msg);
                Ok(matched)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.dispatch(Msg::Tick);
                Ok(false)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                bail!("service worker stopped unexpectedly")
            }
        }
    }

    fn submit(&mut self, file: &Path, languages: &[String], download: bool) -> anyhow::Result<()> {
        let metadata =
            fs::metadata(file).with_context(|| format!("cannot read {}", file.display()))?;
        if !metadata.is_file() {
            bail!("{} is not a file", file.display());
        }
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());

        self.dispatch(Msg::FileSelected(SelectedFile {
            name,
            path: file.to_path_buf(),
            size_bytes: metadata.len(),
        }));
        for language in distinct_languages(languages) {
            self.dispatch(Msg::LanguageToggled(language));
        }
        self.dispatch(Msg::SubmitClicked);

        self.follow(download)
    }

    fn watch(&mut self, job_id: String, download: bool) -> anyhow::Result<()> {
        self.dispatch(Msg::JobAttached { job_id });
        self.follow(download)
    }

    /// Waits for the upload and polling to settle, then optionally fetches every artifact.
    fn follow(&mut self, download: bool) -> anyhow::Result<()> {
        self.run_until(|state| !state.is_uploading() && !state.is_polling())?;

        let completed = self
            .state
            .snapshot()
            .filter(|snapshot| snapshot.status == JobStatus::Completed);
        let Some(snapshot) = completed else {
            return Ok(());
        };
        if !download {
            return Ok(());
        }

        let filenames: Vec<String> = snapshot
            .subtitles
            .iter()
            .map(|artifact| artifact.filename.clone())
            .collect();
        subgen_debug!("Downloading {} artifact(s)", filenames.len());
        for filename in filenames {
            self.dispatch(Msg::DownloadClicked { filename });
        }
        self.run_until(|state| !state.has_pending_downloads())
    }

    fn list(&mut self) -> anyhow::Result<()> {
        self.dispatch(Msg::ListClicked);
        self.wait_for(|msg| matches!(msg, Msg::SubtitlesListed(_)))
    }

    fn download(&mut self, filename: String) -> anyhow::Result<()> {
        self.dispatch(Msg::ListClicked);
        self.wait_for(|msg| matches!(msg, Msg::SubtitlesListed(_)))?;
        self.dispatch(Msg::DownloadClicked { filename });
        self.run_until(|state| !state.has_pending_downloads())
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        self.dispatch(Msg::CleanupClicked);
        self.wait_for(|msg| matches!(msg, Msg::CleanupFinished(_)))
    }

    fn shutdown(&mut self) {
        self.dispatch(Msg::Shutdown);
    }
}

/// Drops languages naming an already listed catalog entry, since each toggle flips the selection.
/// Unknown names are kept so core reports them.
fn distinct_languages(languages: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    languages
        .iter()
        .filter(|language| {
            let key = match find_language(language) {
                Some(lang) => lang.code.to_string(),
                None => language.trim().to_lowercase(),
            };
            seen.insert(key)
        })
        .cloned()
        .collect()
}
