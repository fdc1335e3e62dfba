//! Shared beat-clock session
//!
//! The session holds the continuous tempo/beat/play state shared with
//! remote peers. It is only ever mutated through a capture → edit → commit
//! transaction:
//!
//! - [`BeatSession::capture`] returns a value-type [`SessionState`]
//! - edits happen locally on that snapshot
//! - [`BeatSession::commit`] publishes the snapshot
//!
//! Snapshots are never retained across audio cycles.
//!
//! [`LocalSession`] implements the contract for a single process without
//! any networking.

mod local;

pub use local::{LocalSession, LocalState, Timeline};

use crossbeam::channel::Receiver;

/// Wall-clock time in microseconds, the unit both the host and the session
/// use to anchor beat lookups.
pub type Micros = u64;

/// Notifications the session delivers on a non-real-time thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A peer changed the session tempo.
    Tempo(f64),
    /// A peer started or stopped playback.
    StartStop(bool),
}

/// A captured snapshot of the shared beat state.
pub trait SessionState: Clone + Send {
    fn tempo(&self) -> f64;
    fn is_playing(&self) -> bool;

    /// Continuous beat value at `time` for the given quantum.
    fn beat_at_time(&self, time: Micros, quantum: f64) -> f64;

    /// Position within the bar, in `[0, quantum)`.
    fn phase_at_time(&self, time: Micros, quantum: f64) -> f64;

    fn set_tempo(&mut self, bpm: f64, time: Micros);
    fn set_is_playing(&mut self, playing: bool, time: Micros);

    /// Ask the session to map `beat` onto `time`.
    fn request_beat_at_time(&mut self, beat: f64, time: Micros, quantum: f64);
}

/// The session primitive consumed by the bridge.
///
/// `capture` and `commit` are called from the real-time thread and must not
/// block.
pub trait BeatSession: Send + Sync {
    type State: SessionState;

    fn capture(&self) -> Self::State;
    fn commit(&self, state: Self::State);

    fn is_start_stop_sync_enabled(&self) -> bool;
    fn enable_start_stop_sync(&self, enable: bool);

    /// Receiver for tempo and start/stop notifications.
    fn events(&self) -> Receiver<SessionEvent>;
}
