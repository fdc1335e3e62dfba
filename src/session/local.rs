use super::{BeatSession, Micros, SessionEvent, SessionState};
use crossbeam::atomic::AtomicCell;
use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

const MICROS_PER_MINUTE: f64 = 60_000_000.0;
const EVENT_QUEUE_DEPTH: usize = 64;

/// Linear tempo map: `beat_origin` falls on `time_origin` and beats advance
/// at `tempo` per minute from there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeline {
    pub tempo: f64,
    pub beat_origin: f64,
    pub time_origin: Micros,
}

impl Timeline {
    pub fn beat_at(&self, time: Micros) -> f64 {
        let elapsed = time as f64 - self.time_origin as f64;
        self.beat_origin + elapsed * self.tempo / MICROS_PER_MINUTE
    }

    /// Change tempo at `time` without moving the beat found there.
    fn retempo(&mut self, bpm: f64, time: Micros) {
        self.beat_origin = self.beat_at(time);
        self.time_origin = time;
        self.tempo = bpm;
    }
}

/// Snapshot type of [`LocalSession`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalState {
    timeline: Timeline,
    playing: bool,
    play_time: Micros,
}

impl LocalState {
    pub fn timeline(&self) -> Timeline {
        self.timeline
    }
}

impl SessionState for LocalState {
    fn tempo(&self) -> f64 {
        self.timeline.tempo
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn beat_at_time(&self, time: Micros, _quantum: f64) -> f64 {
        self.timeline.beat_at(time)
    }

    fn phase_at_time(&self, time: Micros, quantum: f64) -> f64 {
        if quantum > 0.0 {
            self.timeline.beat_at(time).rem_euclid(quantum)
        } else {
            0.0
        }
    }

    fn set_tempo(&mut self, bpm: f64, time: Micros) {
        if bpm.is_finite() && bpm > 0.0 {
            self.timeline.retempo(bpm, time);
        }
    }

    fn set_is_playing(&mut self, playing: bool, time: Micros) {
        self.playing = playing;
        self.play_time = time;
    }

    // Alone in the session, a request is honoured exactly.
    fn request_beat_at_time(&mut self, beat: f64, time: Micros, _quantum: f64) {
        self.timeline.beat_origin = beat;
        self.timeline.time_origin = time;
    }
}

/// In-process session with a single participant.
///
/// The committed state lives in an [`AtomicCell`], so the audio thread can
/// capture and commit without taking a lock. Changes made through
/// [`LocalSession::apply_remote`] stand in for other participants and are the
/// only ones that produce [`SessionEvent`]s.
pub struct LocalSession {
    state: AtomicCell<LocalState>,
    start_stop_sync: AtomicBool,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
}

impl LocalSession {
    pub fn new(bpm: f64) -> Self {
        info!("Creating local beat session at {} BPM", bpm);
        let (events_tx, events_rx) = channel::bounded(EVENT_QUEUE_DEPTH);
        Self {
            state: AtomicCell::new(LocalState {
                timeline: Timeline {
                    tempo: bpm,
                    beat_origin: 0.0,
                    time_origin: 0,
                },
                playing: false,
                play_time: 0,
            }),
            start_stop_sync: AtomicBool::new(false),
            events_tx,
            events_rx,
        }
    }

    /// Apply a change as if another participant had committed it.
    pub fn apply_remote<F>(&self, edit: F)
    where
        F: FnOnce(&mut LocalState),
    {
        let before = self.state.load();
        let mut after = before;
        edit(&mut after);

        if !self.is_start_stop_sync_enabled() {
            after.playing = before.playing;
            after.play_time = before.play_time;
        }
        self.state.store(after);

        if after.timeline.tempo != before.timeline.tempo {
            debug!("Remote tempo change: {}", after.timeline.tempo);
            self.notify(SessionEvent::Tempo(after.timeline.tempo));
        }
        if after.playing != before.playing {
            debug!("Remote start/stop change: playing={}", after.playing);
            self.notify(SessionEvent::StartStop(after.playing));
        }
    }

    fn notify(&self, event: SessionEvent) {
        if self.events_tx.try_send(event).is_err() {
            warn!("Session event queue full, dropping notification");
        }
    }
}

impl BeatSession for LocalSession {
    type State = LocalState;

    fn capture(&self) -> LocalState {
        self.state.load()
    }

    fn commit(&self, state: LocalState) {
        self.state.store(state);
    }

    fn is_start_stop_sync_enabled(&self) -> bool {
        self.start_stop_sync.load(Ordering::Acquire)
    }

    fn enable_start_stop_sync(&self, enable: bool) {
        self.start_stop_sync.store(enable, Ordering::Release);
    }

    fn events(&self) -> Receiver<SessionEvent> {
        self.events_rx.clone()
    }
}
