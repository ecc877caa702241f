mod support;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use subgen_engine::{EngineEvent, JobStatus, PollSettings, StatusPoller};
use tokio::runtime::Handle;
use tokio::time::sleep;

use support::{completed_clip, network_error, snapshot, RecordingSink, ScriptedClient};

fn poller(client: &Arc<ScriptedClient>, sink: &Arc<RecordingSink>, settings: PollSettings) -> StatusPoller {
    StatusPoller::new(client.clone(), sink.clone(), Handle::current(), settings)
}

#[tokio::test(start_paused = true)]
async fn first_request_waits_one_interval() {
    let client = Arc::new(ScriptedClient::default());
    let sink = Arc::new(RecordingSink::default());
    let mut poller = poller(&client, &sink, PollSettings::default());

    poller.start("abc123");
    sleep(Duration::from_millis(1900)).await;
    assert_eq!(client.status_calls(), 0);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(client.status_calls(), 1);
    assert!(poller.is_active());
}

#[tokio::test(start_paused = true)]
async fn completed_status_ends_polling() {
    let client = Arc::new(ScriptedClient::with_statuses(vec![
        Ok(snapshot(JobStatus::Queued)),
        Ok(completed_clip()),
    ]));
    let sink = Arc::new(RecordingSink::default());
    let mut poller = poller(&client, &sink, PollSettings::default());

    poller.start("abc123");
    sleep(Duration::from_secs(5)).await;
    assert_eq!(client.status_calls(), 2);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(client.status_calls(), 2);
    assert!(!poller.is_active());
    assert_eq!(poller.active_job(), None);
    assert_eq!(
        sink.statuses(),
        vec![
            ("abc123".to_string(), JobStatus::Queued),
            ("abc123".to_string(), JobStatus::Completed),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_status_ends_polling_and_relays_error() {
    let mut failed = snapshot(JobStatus::Failed);
    failed.error = Some("CUDA out of memory".to_string());
    let client = Arc::new(ScriptedClient::with_statuses(vec![Ok(failed)]));
    let sink = Arc::new(RecordingSink::default());
    let mut poller = poller(&client, &sink, PollSettings::default());

    poller.start("abc123");
    sleep(Duration::from_secs(30)).await;

    assert_eq!(client.status_calls(), 1);
    match sink.events().as_slice() {
        [EngineEvent::StatusReceived { snapshot, .. }] => {
            assert_eq!(snapshot.error.as_deref(), Some("CUDA out of memory"));
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn transient_failure_does_not_stop_polling() {
    let client = Arc::new(ScriptedClient::with_statuses(vec![
        Err(network_error()),
        Ok(snapshot(JobStatus::Transcribing)),
        Ok(completed_clip()),
    ]));
    let sink = Arc::new(RecordingSink::default());
    let mut poller = poller(&client, &sink, PollSettings::default());

    poller.start("abc123");
    sleep(Duration::from_secs(30)).await;

    assert_eq!(client.status_calls(), 3);
    assert_eq!(
        sink.statuses(),
        vec![
            ("abc123".to_string(), JobStatus::Transcribing),
            ("abc123".to_string(), JobStatus::Completed),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn starting_again_cancels_previous_poll() {
    let client = Arc::new(ScriptedClient::default());
    let sink = Arc::new(RecordingSink::default());
    let mut poller = poller(&client, &sink, PollSettings::default());

    poller.start("first");
    sleep(Duration::from_secs(3)).await;
    poller.start("second");
    sleep(Duration::from_secs(5)).await;

    let statuses = sink.statuses();
    let first = statuses.iter().filter(|(job, _)| job == "first").count();
    let second = statuses.iter().filter(|(job, _)| job == "second").count();
    assert_eq!(first, 1);
    assert_eq!(second, 2);
    assert_eq!(client.status_calls(), 3);
    assert_eq!(poller.active_job(), Some("second"));
}

#[tokio::test(start_paused = true)]
async fn stop_and_drop_cancel_the_timer() {
    let client = Arc::new(ScriptedClient::default());
    let sink = Arc::new(RecordingSink::default());

    let mut stopped = poller(&client, &sink, PollSettings::default());
    stopped.start("abc123");
    sleep(Duration::from_secs(3)).await;
    assert!(stopped.stop());
    assert!(!stopped.stop());
    sleep(Duration::from_secs(10)).await;
    assert_eq!(client.status_calls(), 1);

    let mut dropped = poller(&client, &sink, PollSettings::default());
    dropped.start("abc123");
    drop(dropped);
    sleep(Duration::from_secs(10)).await;
    assert_eq!(client.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn bounded_poll_gives_up_after_max_duration() {
    let client = Arc::new(ScriptedClient::default());
    let sink = Arc::new(RecordingSink::default());
    let settings = PollSettings {
        interval: Duration::from_secs(2),
        max_duration: Some(Duration::from_secs(5)),
    };
    let mut poller = poller(&client, &sink, settings);

    poller.start("abc123");
    sleep(Duration::from_secs(30)).await;

    assert_eq!(client.status_calls(), 2);
    assert!(!poller.is_active());
    assert_eq!(
        sink.events().last(),
        Some(&EngineEvent::PollingTimedOut {
            job_id: "abc123".to_string()
        })
    );
}
