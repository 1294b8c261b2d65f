//! Unlock timer state machine integration tests

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use tunemap_core::db::init_in_memory;
use tunemap_core::services::media::MediaOpener;
use tunemap_core::{SessionStore, SharedState, UnlockEngine};
use tunemap_common::catalog::{Catalog, Island, Quiz, Song};
use tunemap_common::events::QuestEvent;
use tunemap_common::progress::SongPhase;
use tunemap_common::{Error, Identity};

struct CapturingOpener {
    opened: Mutex<Vec<String>>,
}

impl CapturingOpener {
    fn new() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
        }
    }

    fn count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

impl MediaOpener for CapturingOpener {
    fn open_url(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}

fn song(title: &str) -> Song {
    Song {
        title: title.to_string(),
        media_url: format!("https://example.com/{}", title),
        lyric_url: None,
        info: String::new(),
        quiz: Quiz {
            question: "主奏樂器？".to_string(),
            options: vec!["琵琶".to_string(), "小提琴".to_string()],
        },
        correct_answer: "琵琶".to_string(),
        response_format: None,
    }
}

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::new(
        vec![song("東風破"), song("青花瓷"), song("髮如雪"), song("菊花台")],
        vec![Island {
            id: 1,
            name: "宮廷古風".to_string(),
            blurb: String::new(),
            songs: vec![
                "東風破".to_string(),
                "青花瓷".to_string(),
                "髮如雪".to_string(),
                "菊花台".to_string(),
            ],
        }],
    ))
}

struct Harness {
    state: Arc<SharedState>,
    engine: UnlockEngine,
    opener: Arc<CapturingOpener>,
}

async fn harness() -> Harness {
    let pool = init_in_memory().await.unwrap();
    let state = Arc::new(SharedState::new());
    let store = Arc::new(SessionStore::new(pool, Arc::clone(&state), catalog()));
    store
        .sign_in(Identity::new("601", "12", "小明"))
        .await
        .unwrap();
    let opener = Arc::new(CapturingOpener::new());
    let engine = UnlockEngine::new(
        Arc::clone(&state),
        store,
        catalog(),
        Arc::clone(&opener) as Arc<dyn MediaOpener>,
    );
    Harness {
        state,
        engine,
        opener,
    }
}

fn at(base: DateTime<Utc>, offset_ms: i64) -> DateTime<Utc> {
    base + Duration::milliseconds(offset_ms)
}

#[tokio::test]
async fn test_start_listening_sets_deadline_and_projection() {
    let h = harness().await;
    let t0 = Utc::now();

    h.engine.start_listening("東風破", t0).await.unwrap();

    let entry = h.state.song("東風破").await.unwrap();
    assert_eq!(entry.unlock_end_time, Some(t0.timestamp_millis() + 150_000));
    assert_eq!(entry.timer, 150);
    assert_eq!(entry.phase(), SongPhase::Running);
    assert_eq!(h.opener.count(), 1);
}

#[tokio::test]
async fn test_second_song_conflicts_while_timer_runs() {
    let h = harness().await;
    let t0 = Utc::now();

    h.engine.start_listening("東風破", t0).await.unwrap();
    let err = h.engine.start_listening("青花瓷", t0).await.unwrap_err();

    match err {
        Error::Conflict { song } => assert_eq!(song, "東風破"),
        other => panic!("expected conflict, got {:?}", other),
    }

    // The conflicting attempt must not have armed a second timer
    let progress = h.state.song_progress.read().await;
    let running = progress.values().filter(|p| p.unlock_end_time.is_some()).count();
    assert_eq!(running, 1);
}

#[tokio::test]
async fn test_single_timer_invariant_across_interleavings() {
    for order in [
        ["東風破", "青花瓷", "髮如雪", "菊花台"],
        ["菊花台", "東風破", "青花瓷", "髮如雪"],
        ["髮如雪", "菊花台", "東風破", "青花瓷"],
    ] {
        let h = harness().await;
        let t0 = Utc::now();

        for (i, title) in order.into_iter().enumerate() {
            let result = h.engine.start_listening(title, at(t0, i as i64)).await;
            if i == 0 {
                result.unwrap();
            } else {
                assert!(matches!(result, Err(Error::Conflict { .. })));
            }

            let progress = h.state.song_progress.read().await;
            let running = progress.values().filter(|p| p.unlock_end_time.is_some()).count();
            assert!(running <= 1, "more than one timer running");
        }
    }
}

#[tokio::test]
async fn test_tick_projection_is_non_increasing() {
    let h = harness().await;
    let t0 = Utc::now();
    h.engine.start_listening("東風破", t0).await.unwrap();

    let mut last = 150;
    for offset_s in [1, 10, 60, 149] {
        h.engine.tick(at(t0, offset_s * 1000)).await.unwrap();
        let timer = h.state.song("東風破").await.unwrap().timer;
        assert!(timer <= last, "timer increased from {} to {}", last, timer);
        assert_eq!(timer, 150 - offset_s as u32);
        last = timer;
    }
}

#[tokio::test]
async fn test_tick_without_change_reports_no_churn() {
    let h = harness().await;
    let t0 = Utc::now();
    h.engine.start_listening("東風破", t0).await.unwrap();

    assert!(h.engine.tick(at(t0, 1000)).await.unwrap());
    // Same instant again: projection unchanged, no state churn
    assert!(!h.engine.tick(at(t0, 1000)).await.unwrap());
}

#[tokio::test]
async fn test_deadline_passing_unlocks_exactly_once() {
    let h = harness().await;
    let mut events = h.state.subscribe_events();
    let t0 = Utc::now();

    h.engine.start_listening("東風破", t0).await.unwrap();
    assert!(h.engine.tick(at(t0, 151_000)).await.unwrap());

    let entry = h.state.song("東風破").await.unwrap();
    assert_eq!(entry.phase(), SongPhase::Unlocked);
    assert_eq!(entry.timer, 0);
    assert!(entry.is_listening_finished);
    assert_eq!(entry.unlock_end_time, None);

    // Second tick past the deadline is a no-op
    assert!(!h.engine.tick(at(t0, 152_000)).await.unwrap());

    let mut unlocked_events = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, QuestEvent::SongUnlocked { .. }) {
            unlocked_events += 1;
        }
    }
    assert_eq!(unlocked_events, 1);
}

#[tokio::test]
async fn test_unlock_frees_the_global_timer() {
    let h = harness().await;
    let t0 = Utc::now();

    h.engine.start_listening("東風破", t0).await.unwrap();
    h.engine.tick(at(t0, 151_000)).await.unwrap();

    // The next song may start its own listening period now
    h.engine
        .start_listening("青花瓷", at(t0, 152_000))
        .await
        .unwrap();
    assert_eq!(
        h.state.song("青花瓷").await.unwrap().phase(),
        SongPhase::Running
    );
}

#[tokio::test]
async fn test_start_listening_on_unlocked_song_only_reopens_media() {
    let h = harness().await;
    let t0 = Utc::now();

    h.engine.start_listening("東風破", t0).await.unwrap();
    h.engine.tick(at(t0, 151_000)).await.unwrap();

    h.engine
        .start_listening("東風破", at(t0, 160_000))
        .await
        .unwrap();
    let entry = h.state.song("東風破").await.unwrap();
    assert_eq!(entry.phase(), SongPhase::Unlocked);
    assert_eq!(entry.unlock_end_time, None);
    assert_eq!(h.opener.count(), 2);
}

#[tokio::test]
async fn test_replay_does_not_touch_timer_state() {
    let h = harness().await;
    let t0 = Utc::now();

    h.engine.start_listening("東風破", t0).await.unwrap();
    h.engine.tick(at(t0, 151_000)).await.unwrap();

    let before = h.state.song("東風破").await.unwrap();
    h.engine.replay("東風破").await.unwrap();
    let after = h.state.song("東風破").await.unwrap();
    assert_eq!(before, after);
    assert_eq!(h.opener.count(), 2);
}

#[tokio::test]
async fn test_replay_rejected_before_listening() {
    let h = harness().await;
    h.engine.open_song("東風破").await.unwrap();

    let err = h.engine.replay("東風破").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(h.opener.count(), 0);
}

#[tokio::test]
async fn test_configured_listening_period_drives_deadline_and_unlock() {
    let pool = init_in_memory().await.unwrap();
    let state = Arc::new(SharedState::new());
    let store = Arc::new(SessionStore::new(pool, Arc::clone(&state), catalog()));
    store
        .sign_in(Identity::new("601", "12", "小明"))
        .await
        .unwrap();
    let engine = UnlockEngine::new(
        Arc::clone(&state),
        store,
        catalog(),
        Arc::new(CapturingOpener::new()) as Arc<dyn MediaOpener>,
    )
    .with_timing(30, 250);
    let t0 = Utc::now();

    engine.start_listening("東風破", t0).await.unwrap();
    let entry = state.song("東風破").await.unwrap();
    assert_eq!(entry.unlock_end_time, Some(t0.timestamp_millis() + 30_000));
    assert_eq!(entry.timer, 30);

    // Shortened period elapses well before the default would
    engine.tick(at(t0, 31_000)).await.unwrap();
    assert_eq!(
        state.song("東風破").await.unwrap().phase(),
        SongPhase::Unlocked
    );
}

#[tokio::test]
async fn test_unknown_song_is_not_found() {
    let h = harness().await;
    let err = h.engine.start_listening("夜曲", Utc::now()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_ticker_task_unlocks_and_stops_cleanly() {
    let h = harness().await;

    // Deadline already in the past: the first real tick must unlock it
    let t0 = Utc::now() - Duration::seconds(151);
    h.engine.start_listening("東風破", t0).await.unwrap();

    h.engine.start().await;
    tokio::time::sleep(std::time::Duration::from_millis(700)).await;
    h.engine.stop().await;

    assert_eq!(
        h.state.song("東風破").await.unwrap().phase(),
        SongPhase::Unlocked
    );
}
