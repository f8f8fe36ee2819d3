//! Feed ingestion, fallback and store switching

use pretty_assertions::assert_eq;
use pulse_agent::{FeedController, FeedIngestor, IngestEnd, MockFeed, RawEvent};
use pulse_core::{FeedStatus, TransportError};
use pulse_model::ActionStatus;
use pulse_test_utils::{
    frames, sample_snapshot, shared_store, RecordingSpeech, Script, ScriptedFeed,
};
use std::sync::Arc;
use std::time::Duration;

async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn full_stream_completes_session() {
    let store = shared_store();
    let feed = Arc::new(
        ScriptedFeed::new().with_script("ATL_050", Script::complete(sample_snapshot("ATL_050"))),
    );
    let ingestor = FeedIngestor::new(store.clone(), feed.clone());

    let guard = store.begin_session("ATL_050");
    let report = ingestor.run(guard).await;

    assert_eq!(report.end, IngestEnd::Completed);
    assert_eq!(report.applied, 8);
    assert_eq!(report.dropped, 0);
    assert_eq!(feed.snapshots(), 0);

    let state = store.snapshot();
    assert_eq!(state.status(), FeedStatus::Complete);
    assert!(state.baseline().is_some());
    assert_eq!(state.catalog().len(), 2);
    assert_eq!(state.catalog().status("act-1"), Some(ActionStatus::Pending));
    assert_eq!(state.conversation().len(), 2);
}

#[tokio::test]
async fn malformed_events_are_skipped() {
    let snapshot = sample_snapshot("ATL_050");
    let mut events: Vec<_> = frames(&snapshot).into_iter().map(Ok).collect();
    let complete = events.pop().unwrap();
    events.push(Ok(RawEvent::new("action", r#"{"id":"broken""#)));
    events.push(Ok(RawEvent::new("heartbeat", "{}")));
    events.push(complete);

    let store = shared_store();
    let feed = Arc::new(
        ScriptedFeed::new()
            .with_script("ATL_050", Script::complete(snapshot).with_events(events)),
    );
    let report = FeedIngestor::new(store.clone(), feed)
        .run(store.begin_session("ATL_050"))
        .await;

    assert_eq!(report.end, IngestEnd::Completed);
    assert_eq!(report.dropped, 2);
    assert_eq!(store.read(|s| s.catalog().len()), 2);
}

#[tokio::test]
async fn stream_error_falls_back_to_snapshot() {
    let snapshot = sample_snapshot("ATL_050");
    let mut events: Vec<_> = frames(&snapshot).into_iter().take(2).map(Ok).collect();
    events.push(Err(TransportError::Stream("connection reset".into())));

    let store = shared_store();
    let feed = Arc::new(
        ScriptedFeed::new()
            .with_script("ATL_050", Script::complete(snapshot).with_events(events)),
    );
    let report = FeedIngestor::new(store.clone(), feed.clone())
        .run(store.begin_session("ATL_050"))
        .await;

    assert_eq!(report.end, IngestEnd::Recovered);
    assert_eq!(report.applied, 2);
    assert_eq!(feed.snapshots(), 1);

    let state = store.snapshot();
    assert_eq!(state.status(), FeedStatus::Complete);
    assert_eq!(state.catalog().len(), 2);
    assert!(state.baseline().is_some());
    let ids: Vec<_> = state.recent_conversation().iter().map(|m| m.id.clone()).collect();
    assert_eq!(ids, vec!["overview", "returns"]);
}

#[tokio::test]
async fn stream_ending_early_falls_back() {
    let snapshot = sample_snapshot("ATL_050");
    let events: Vec<_> = frames(&snapshot).into_iter().take(3).map(Ok).collect();

    let store = shared_store();
    let feed = Arc::new(
        ScriptedFeed::new()
            .with_script("ATL_050", Script::complete(snapshot).with_events(events)),
    );
    let report = FeedIngestor::new(store.clone(), feed)
        .run(store.begin_session("ATL_050"))
        .await;

    assert_eq!(report.end, IngestEnd::Recovered);
    assert_eq!(store.read(|s| s.status()), FeedStatus::Complete);
}

#[tokio::test]
async fn failed_fallback_keeps_last_known_state() {
    let snapshot = sample_snapshot("ATL_050");
    let mut events: Vec<_> = frames(&snapshot).into_iter().take(1).map(Ok).collect();
    events.push(Err(TransportError::Stream("reset".into())));

    let store = shared_store();
    let feed = Arc::new(
        ScriptedFeed::new().with_script(
            "ATL_050",
            Script::complete(snapshot)
                .with_events(events)
                .with_snapshot(Err(TransportError::Fetch("503".into()))),
        ),
    );
    let report = FeedIngestor::new(store.clone(), feed)
        .run(store.begin_session("ATL_050"))
        .await;

    assert_eq!(report.end, IngestEnd::Failed);
    let state = store.snapshot();
    assert_eq!(state.status(), FeedStatus::Error);
    assert_eq!(state.meta().map(|m| m.id.as_str()), Some("ATL_050"));
}

#[tokio::test]
async fn open_failure_uses_snapshot() {
    let store = shared_store();
    let feed = Arc::new(ScriptedFeed::new().with_script(
        "ATL_050",
        Script::complete(sample_snapshot("ATL_050"))
            .with_open_error(TransportError::Connect("refused".into())),
    ));
    let report = FeedIngestor::new(store.clone(), feed)
        .run(store.begin_session("ATL_050"))
        .await;

    assert_eq!(report.end, IngestEnd::Recovered);
    assert_eq!(report.applied, 0);
    assert_eq!(store.read(|s| s.catalog().len()), 2);
}

#[tokio::test]
async fn replaced_session_ignores_its_feed() {
    let store = shared_store();
    let feed = Arc::new(
        ScriptedFeed::new().with_script("ATL_050", Script::complete(sample_snapshot("ATL_050"))),
    );
    let ingestor = FeedIngestor::new(store.clone(), feed);

    let old = store.begin_session("ATL_050");
    store.begin_session("SEA_014");
    let report = ingestor.run(old).await;

    assert_eq!(report.end, IngestEnd::Cancelled);
    assert_eq!(report.applied, 0);
    let state = store.snapshot();
    assert_eq!(state.store_id(), Some("SEA_014"));
    assert!(state.meta().is_none());
    assert!(state.catalog().is_empty());
}

#[tokio::test]
async fn switching_stores_aborts_previous_feed() {
    let first = sample_snapshot("ATL_050");
    let first_events: Vec<_> = frames(&first).into_iter().take(1).map(Ok).collect();
    let feed = Arc::new(
        ScriptedFeed::new()
            .with_script("ATL_050", Script::complete(first).with_events(first_events).hanging())
            .with_script("SEA_014", Script::complete(sample_snapshot("SEA_014"))),
    );
    let store = shared_store();
    let controller = FeedController::new(FeedIngestor::new(store.clone(), feed.clone()));

    controller.switch_store("ATL_050");
    eventually(|| store.read(|s| s.meta().is_some())).await;

    let guard = controller.switch_store("SEA_014");
    let report = controller.wait().await.unwrap();
    assert_eq!(report.end, IngestEnd::Completed);
    assert!(store.is_current(&guard));

    let state = store.snapshot();
    assert_eq!(state.store_id(), Some("SEA_014"));
    assert_eq!(state.meta().map(|m| m.id.as_str()), Some("SEA_014"));
    assert_eq!(state.status(), FeedStatus::Complete);
    assert_eq!(feed.opens(), 2);
    assert_eq!(feed.snapshots(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_switches_leave_the_newest_feed_running() {
    let stores = ["ATL_050", "SEA_014", "DEN_221", "CHI_107"];
    let mut feed = ScriptedFeed::new();
    for id in stores {
        feed = feed.with_script(id, Script::complete(sample_snapshot(id)));
    }
    let store = shared_store();
    let controller = Arc::new(FeedController::new(FeedIngestor::new(
        store.clone(),
        Arc::new(feed),
    )));

    for round in 0..20 {
        let switches: Vec<_> = stores
            .iter()
            .map(|&id| {
                let controller = controller.clone();
                tokio::spawn(async move {
                    controller.switch_store(id);
                })
            })
            .collect();
        for switch in switches {
            switch.await.unwrap();
        }

        let report = controller.wait().await.unwrap();
        assert_eq!(report.end, IngestEnd::Completed, "round {round}");
        let state = store.snapshot();
        assert_eq!(state.status(), FeedStatus::Complete);
        assert_eq!(state.meta().map(|m| m.id.as_str()), state.store_id());
    }
}

#[tokio::test]
async fn teardown_leaves_store_idle() {
    let snapshot = sample_snapshot("ATL_050");
    let events: Vec<_> = frames(&snapshot).into_iter().take(1).map(Ok).collect();
    let feed = Arc::new(ScriptedFeed::new().with_script(
        "ATL_050",
        Script::complete(snapshot).with_events(events).hanging(),
    ));
    let store = shared_store();
    let controller = FeedController::new(FeedIngestor::new(store.clone(), feed));

    controller.switch_store("ATL_050");
    eventually(|| store.read(|s| s.meta().is_some())).await;
    controller.teardown();

    assert!(controller.wait().await.is_none());
    let state = store.snapshot();
    assert_eq!(state.status(), FeedStatus::Idle);
    assert!(state.meta().is_none());
}

#[tokio::test]
async fn intro_is_spoken_after_completion() {
    let store = shared_store();
    let feed = Arc::new(
        ScriptedFeed::new().with_script("ATL_050", Script::complete(sample_snapshot("ATL_050"))),
    );
    let (speech, mut spoken) = RecordingSpeech::new();
    let ingestor = FeedIngestor::new(store.clone(), feed).with_speech(Arc::new(speech));

    ingestor.run(store.begin_session("ATL_050")).await;

    let text = spoken.recv().await.unwrap();
    assert_eq!(
        text,
        "Store Test ATL_050 is operating at 105 percent capacity with a health score of 75. \
         Recommended actions include shifting 10% from Batteries to Wipers and 4% from Batteries to Wipers."
    );
}

#[tokio::test]
async fn speech_failure_does_not_affect_session() {
    let store = shared_store();
    let feed = Arc::new(
        ScriptedFeed::new().with_script("ATL_050", Script::complete(sample_snapshot("ATL_050"))),
    );
    let (speech, mut spoken) = RecordingSpeech::failing();
    let report = FeedIngestor::new(store.clone(), feed)
        .with_speech(Arc::new(speech))
        .run(store.begin_session("ATL_050"))
        .await;

    assert_eq!(report.end, IngestEnd::Completed);
    assert!(spoken.recv().await.is_some());
    assert_eq!(store.read(|s| s.status()), FeedStatus::Complete);
}

#[tokio::test]
async fn mock_feed_end_to_end() {
    let store = shared_store();
    let feed = Arc::new(MockFeed::bundled().unwrap());
    let controller = FeedController::new(FeedIngestor::new(store.clone(), feed));

    controller.switch_store("sea_014");
    let report = controller.wait().await.unwrap();
    assert_eq!(report.end, IngestEnd::Completed);

    let state = store.snapshot();
    assert_eq!(state.meta().map(|m| m.id.as_str()), Some("SEA_014"));
    assert_eq!(state.catalog().actionable().len(), 2);
    assert_eq!(state.conversation().len(), 4);
    let summary = state.effective_summary().unwrap();
    assert!((summary.categories.total() - 1.0).abs() < 1e-9);
}
