use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use transportlink::host::{CycleTimes, TransportHost, TransportQuery};
use transportlink::metadata::{
    InMemoryPropertyStore, MetadataSync, PropertyStore, BPM_KEY, DECIMAL_TYPE,
};
use transportlink::notifications::NotificationLoop;
use transportlink::session::{BeatSession, LocalSession, SessionEvent, SessionState};
use transportlink::tempo::TempoCell;

/// Host that only records transport commands.
#[derive(Default)]
struct RecordingHost {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl TransportHost for RecordingHost {
    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn cycle_times(&self) -> Option<CycleTimes> {
        None
    }

    fn query(&self) -> TransportQuery {
        TransportQuery {
            state: transportlink::host::TransportState::Stopped,
            position: Default::default(),
            relocated: false,
        }
    }

    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_tempo_event_updates_cell() {
    let session = Arc::new(LocalSession::new(120.0));
    let host = Arc::new(RecordingHost::default());
    let tempo = Arc::new(TempoCell::new(120.0));
    let notifications = NotificationLoop::new(session, host, tempo.clone(), None);

    notifications.handle_session_event(SessionEvent::Tempo(97.0));
    assert_eq!(tempo.load(), 97.0);
}

#[test]
fn test_start_stop_events_drive_transport() {
    let session = Arc::new(LocalSession::new(120.0));
    session.enable_start_stop_sync(true);
    let host = Arc::new(RecordingHost::default());
    let tempo = Arc::new(TempoCell::new(120.0));
    let notifications = NotificationLoop::new(session.clone(), host.clone(), tempo, None);

    notifications.handle_session_event(SessionEvent::StartStop(true));
    notifications.handle_session_event(SessionEvent::StartStop(false));
    assert_eq!(host.starts.load(Ordering::SeqCst), 1);
    assert_eq!(host.stops.load(Ordering::SeqCst), 1);

    session.enable_start_stop_sync(false);
    notifications.handle_session_event(SessionEvent::StartStop(true));
    assert_eq!(host.starts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_tempo_event_republishes_property() {
    let session = Arc::new(LocalSession::new(120.0));
    let host = Arc::new(RecordingHost::default());
    let tempo = Arc::new(TempoCell::new(120.0));
    let store = Arc::new(InMemoryPropertyStore::new(Some(9)));
    let metadata = MetadataSync::new(store.clone(), session.clone(), tempo.clone());
    let notifications = NotificationLoop::new(session, host, tempo, Some(metadata));

    notifications.handle_session_event(SessionEvent::Tempo(88.5));
    assert_eq!(store.get_property(9, BPM_KEY).unwrap().value, "88.5");
}

#[test]
fn test_spawned_loop_dispatches_until_shutdown() {
    let session = Arc::new(LocalSession::new(120.0));
    session.enable_start_stop_sync(true);
    let host = Arc::new(RecordingHost::default());
    let tempo = Arc::new(TempoCell::new(120.0));
    let store = Arc::new(InMemoryPropertyStore::new(Some(9)));
    let metadata = MetadataSync::new(store.clone(), session.clone(), tempo.clone());
    metadata.publish_all().unwrap();

    let handle = NotificationLoop::new(session.clone(), host.clone(), tempo.clone(), Some(metadata))
        .spawn()
        .unwrap();

    session.apply_remote(|state| {
        state.set_tempo(128.0, 0);
        state.set_is_playing(true, 0);
    });
    assert!(wait_for(|| tempo.load() == 128.0));
    assert!(wait_for(|| host.starts.load(Ordering::SeqCst) == 1));

    store.set_property(9, BPM_KEY, "150", DECIMAL_TYPE).unwrap();
    assert!(wait_for(|| tempo.load() == 150.0));

    handle.shutdown();
    assert_eq!(session.capture().tempo(), 128.0);
}
