//! Subgen engine: service client, status poller and effect execution.
mod client;
mod engine;
mod filename;
mod persist;
mod poller;
mod sink;
mod types;

pub use client::{ReqwestServiceClient, ServiceClient, ServiceSettings, UploadRequest};
pub use engine::{EngineConfig, EngineHandle};
pub use filename::sanitize_artifact_filename;
pub use persist::{AtomicFileWriter, PersistError};
pub use poller::{PollSettings, StatusPoller};
pub use sink::{ChannelEventSink, EventSink};
pub use types::{
    EngineEvent, FailureKind, JobId, JobStatus, JobStatusResponse, ServiceError, SubtitleFile,
    UploadReceipt,
};
