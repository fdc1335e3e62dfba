//! Host audio-transport contract
//!
//! The host owns the sample clock and the transport. Once per audio cycle it
//! calls the client's hooks strictly in order:
//!
//! 1. [`HostClient::sync`] while the transport is starting
//! 2. [`HostClient::process`]
//! 3. [`HostClient::timebase`] while rolling, starting, or after a relocate
//!
//! [`SimulatedHost`] is a software implementation used by the binary and the
//! integration tests.

mod simulated;

pub use simulated::{spawn_driver, SimulatedHost};

use crate::session::Micros;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Rolling,
    Starting,
}

impl TransportState {
    pub fn is_rolling(self) -> bool {
        self == TransportState::Rolling
    }
}

/// Bar/beat/tick position as the host transports it. `bar` and `beat` are
/// 1-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbt {
    pub bar: i32,
    pub beat: i32,
    pub tick: i32,
    pub bar_start_tick: f64,
    pub beats_per_bar: f64,
    pub beat_type: f32,
    pub ticks_per_beat: f64,
    pub beats_per_minute: f64,
}

/// Transport position; `bbt` is `None` when the host has no valid
/// bar/beat/tick for the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransportPosition {
    pub frame: u64,
    pub frame_rate: u32,
    pub bbt: Option<Bbt>,
}

/// Wall-clock anchors of the running cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleTimes {
    pub current_usecs: Micros,
    pub next_usecs: Micros,
}

/// Result of a transport query made from inside `process`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportQuery {
    pub state: TransportState,
    pub position: TransportPosition,
    /// The position was relocated for this cycle; `timebase` will be called
    /// with `new_pos` set.
    pub relocated: bool,
}

/// What the client's output port holds after `process`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PortOutput<'a> {
    Midi(&'a [crate::midi::MidiEvent]),
    Audio(&'a [f32]),
}

/// Services the host offers to its client.
pub trait TransportHost: Send + Sync {
    fn sample_rate(&self) -> u32;

    /// `None` when the host cannot report timing for the cycle.
    fn cycle_times(&self) -> Option<CycleTimes>;

    fn query(&self) -> TransportQuery;

    fn start(&self);
    fn stop(&self);
}

/// Hooks the host invokes on its real-time thread.
pub trait HostClient: Send {
    fn process(&mut self, nframes: u32);

    fn timebase(
        &mut self,
        state: TransportState,
        nframes: u32,
        pos: &mut TransportPosition,
        new_pos: bool,
    );

    /// Whether a starting transport may proceed.
    fn sync(&mut self, state: TransportState, pos: &TransportPosition) -> bool;

    fn output(&self) -> PortOutput<'_>;
}
