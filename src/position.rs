//! Translation between the session's continuous beat and the host's
//! bar/beat/tick position.

use crate::host::{Bbt, TransportPosition};
use crate::session::{BeatSession, Micros, SessionState};

/// Fallbacks for fields the host cannot supply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionDefaults {
    pub quantum: f64,
    pub beat_type: f32,
    pub ticks_per_beat: f64,
}

impl Default for PositionDefaults {
    fn default() -> Self {
        Self {
            quantum: 4.0,
            beat_type: 4.0,
            ticks_per_beat: 1920.0,
        }
    }
}

/// Where the beat value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeatSourceKind {
    /// Read the session's beat at the cycle anchor time.
    #[default]
    Session,
    /// Accumulate beats locally from tempo and elapsed frames.
    FreeRunning,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BeatSource {
    Session,
    FreeRunning { beat: f64 },
}

/// Cycle facts the translator needs besides the host position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimebaseCycle {
    /// Time the produced position applies to.
    pub anchor: Micros,
    pub nframes: u32,
    pub sample_rate: u32,
    pub rolling: bool,
    pub bpm: f64,
}

pub struct PositionTranslator {
    source: BeatSource,
    defaults: PositionDefaults,
}

impl PositionTranslator {
    pub fn new(kind: BeatSourceKind, defaults: PositionDefaults) -> Self {
        let source = match kind {
            BeatSourceKind::Session => BeatSource::Session,
            BeatSourceKind::FreeRunning => BeatSource::FreeRunning { beat: 0.0 },
        };
        Self { source, defaults }
    }

    pub fn kind(&self) -> BeatSourceKind {
        match self.source {
            BeatSource::Session => BeatSourceKind::Session,
            BeatSource::FreeRunning { .. } => BeatSourceKind::FreeRunning,
        }
    }

    /// Write the authoritative position into `pos`.
    ///
    /// `pending` is a snapshot already edited earlier in the same cycle; it
    /// is committed here together with any realignment so the cycle commits
    /// at most once.
    pub fn timebase<B: BeatSession>(
        &mut self,
        session: &B,
        pending: Option<B::State>,
        cycle: &TimebaseCycle,
        pos: &mut TransportPosition,
        new_pos: bool,
    ) {
        let host = pos.bbt;
        let quantum = host
            .map(|b| b.beats_per_bar)
            .filter(|q| q.is_finite() && *q >= 1.0)
            .unwrap_or(self.defaults.quantum);
        let ticks_per_beat = host
            .map(|b| b.ticks_per_beat)
            .filter(|t| t.is_finite() && *t >= 1.0)
            .unwrap_or(self.defaults.ticks_per_beat);
        let beat_type = host.map_or(self.defaults.beat_type, |b| b.beat_type);

        let target = new_pos.then(|| target_beat(pos, quantum, ticks_per_beat, cycle.bpm));

        let (beat, phase) = match &mut self.source {
            BeatSource::Session => {
                let dirty = pending.is_some();
                let mut state = pending.unwrap_or_else(|| session.capture());
                if let Some(target) = target {
                    state.request_beat_at_time(target, cycle.anchor, quantum);
                }
                if dirty || target.is_some() {
                    session.commit(state.clone());
                }

                let raw = state.beat_at_time(cycle.anchor, quantum);
                if raw < 0.0 {
                    (0.0, 0.0)
                } else {
                    (raw, state.phase_at_time(cycle.anchor, quantum))
                }
            }
            BeatSource::FreeRunning { beat } => {
                if let Some(state) = pending {
                    session.commit(state);
                }
                if let Some(target) = target {
                    *beat = target;
                } else if cycle.rolling && cycle.sample_rate > 0 {
                    *beat += cycle.bpm * f64::from(cycle.nframes)
                        / (f64::from(cycle.sample_rate) * 60.0);
                }
                let current = beat.max(0.0);
                (current, current % quantum)
            }
        };

        pos.bbt = Some(discrete_position(
            beat,
            phase,
            quantum,
            ticks_per_beat,
            beat_type,
            cycle.bpm,
        ));
    }
}

/// Continuous beat a relocated host position asks for.
pub fn target_beat(pos: &TransportPosition, quantum: f64, ticks_per_beat: f64, bpm: f64) -> f64 {
    let beat = match pos.bbt {
        Some(bbt) => {
            f64::from(bbt.bar - 1) * quantum
                + f64::from(bbt.beat - 1)
                + f64::from(bbt.tick) / ticks_per_beat
        }
        None if pos.frame_rate > 0 => pos.frame as f64 / f64::from(pos.frame_rate) * bpm / 60.0,
        None => 0.0,
    };
    beat.max(0.0)
}

fn discrete_position(
    beat: f64,
    phase: f64,
    quantum: f64,
    ticks_per_beat: f64,
    beat_type: f32,
    bpm: f64,
) -> Bbt {
    let bar = (beat / quantum).floor();
    let last_beat = quantum.ceil() - 1.0;
    let beat_in_bar = phase.trunc().clamp(0.0, last_beat);
    let tick = (ticks_per_beat * phase.fract()).trunc().clamp(0.0, ticks_per_beat - 1.0);

    Bbt {
        bar: bar as i32 + 1,
        beat: beat_in_bar as i32 + 1,
        tick: tick as i32,
        bar_start_tick: bar * quantum * ticks_per_beat,
        beats_per_bar: quantum,
        beat_type,
        ticks_per_beat,
        beats_per_minute: bpm,
    }
}
