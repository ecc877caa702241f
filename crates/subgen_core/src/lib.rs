//! Subgen core: pure session state machine and view-model helpers.
mod effect;
mod language;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use language::{find_language, Language, LANGUAGES};
pub use msg::Msg;
pub use state::{
    AppState, DownloadOutcome, JobId, JobSnapshot, JobStatus, Notice, NoticeLevel, SelectedFile,
    SubtitleArtifact,
};
pub use update::update;
pub use view_model::{truncate_job_id, AppViewModel, ArtifactRowView, JobView};
