//! Clock bridge between the host transport and the beat session.

use crate::generator::{
    ClickGenerator, CycleInput, OutputGenerator, PulseConfig, PulseGenerator, RunState,
};
use crate::host::{
    CycleTimes, HostClient, PortOutput, TransportHost, TransportPosition, TransportState,
};
use crate::position::{BeatSourceKind, PositionDefaults, PositionTranslator, TimebaseCycle};
use crate::session::{BeatSession, SessionState};
use crate::tempo::TempoCell;
use log::info;
use std::sync::Arc;

/// Largest period the click buffer is reserved for.
pub const MAX_PERIOD_FRAMES: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    MidiClock(PulseConfig),
    Click { clicks_per_beat: u32 },
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::MidiClock(PulseConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeConfig {
    pub initial_bpm: f64,
    pub defaults: PositionDefaults,
    pub beat_source: BeatSourceKind,
    pub output: OutputMode,
    pub start_stop_sync: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            initial_bpm: 100.0,
            defaults: PositionDefaults::default(),
            beat_source: BeatSourceKind::default(),
            output: OutputMode::default(),
            start_stop_sync: true,
        }
    }
}

/// A session transaction opened by `process` and handed to `timebase` in
/// the same cycle, so a relocate and the bridge's own edits share a commit.
struct Pending<S> {
    state: S,
    reported: Option<TransportState>,
    tempo: Option<f64>,
}

/// Makes the host transport the session's timebase.
///
/// Register it with the host as the process, timebase and sync hooks. All
/// three run on the host's real-time thread and neither block nor allocate.
pub struct ClockBridge<B: BeatSession> {
    host: Arc<dyn TransportHost>,
    session: Arc<B>,
    tempo: Arc<TempoCell>,
    translator: PositionTranslator,
    generator: OutputGenerator,
    times: Option<CycleTimes>,
    reported_state: TransportState,
    committed_tempo: f64,
    pending: Option<Pending<B::State>>,
}

impl<B: BeatSession> ClockBridge<B> {
    pub fn new(
        host: Arc<dyn TransportHost>,
        session: Arc<B>,
        tempo: Arc<TempoCell>,
        config: BridgeConfig,
    ) -> Self {
        info!(
            "Creating clock bridge: {:?} output, {:?} beat source, start/stop sync {}",
            config.output, config.beat_source, config.start_stop_sync
        );
        session.enable_start_stop_sync(config.start_stop_sync);

        let generator = match config.output {
            OutputMode::MidiClock(pulse) => OutputGenerator::Pulse(PulseGenerator::new(pulse)),
            OutputMode::Click { clicks_per_beat } => {
                OutputGenerator::Click(ClickGenerator::new(clicks_per_beat, MAX_PERIOD_FRAMES))
            }
        };

        Self {
            host,
            session,
            tempo,
            translator: PositionTranslator::new(config.beat_source, config.defaults),
            generator,
            times: None,
            reported_state: TransportState::Stopped,
            committed_tempo: config.initial_bpm,
            pending: None,
        }
    }

    pub fn session(&self) -> &Arc<B> {
        &self.session
    }

    pub fn tempo(&self) -> &Arc<TempoCell> {
        &self.tempo
    }

    pub fn generator(&self) -> &OutputGenerator {
        &self.generator
    }

    /// Run state of the pulse generator; `None` in click mode.
    pub fn run_state(&self) -> Option<RunState> {
        match &self.generator {
            OutputGenerator::Pulse(pulse) => Some(pulse.run_state()),
            OutputGenerator::Click(_) => None,
        }
    }

    /// Play state most recently committed to the session.
    pub fn reported_state(&self) -> TransportState {
        self.reported_state
    }

    fn record_commit(&mut self, reported: Option<TransportState>, tempo: Option<f64>) {
        if let Some(state) = reported {
            self.reported_state = state;
        }
        if let Some(bpm) = tempo {
            self.committed_tempo = bpm;
        }
    }

    pub fn process(&mut self, nframes: u32) {
        // An unclaimed transaction means timebase never ran; its edits are
        // recomputed from scratch below.
        self.pending = None;

        self.times = self.host.cycle_times();
        let Some(times) = self.times else {
            self.generator.skip_cycle(nframes);
            return;
        };

        let query = self.host.query();
        let rolling = query.state.is_rolling();
        let position = query.position.bbt;

        let state_change = query.state != self.reported_state
            && matches!(
                query.state,
                TransportState::Rolling | TransportState::Stopped
            );
        let tempo_change = position
            .map(|bbt| bbt.beats_per_minute)
            .filter(|bpm| bpm.is_finite() && *bpm > 0.0 && *bpm != self.committed_tempo);

        if state_change || tempo_change.is_some() {
            let mut state = self.session.capture();
            if state_change {
                state.set_is_playing(rolling, times.current_usecs);
            }
            if let Some(bpm) = tempo_change {
                state.set_tempo(bpm, times.current_usecs);
                self.tempo.store(bpm);
            }

            let reported = state_change.then_some(query.state);
            if query.relocated {
                self.pending = Some(Pending {
                    state,
                    reported,
                    tempo: tempo_change,
                });
            } else {
                self.session.commit(state);
                self.record_commit(reported, tempo_change);
            }
        }

        self.generator.process(&CycleInput {
            position,
            nframes,
            sample_rate: f64::from(self.host.sample_rate()),
            rolling,
        });
    }

    pub fn timebase(
        &mut self,
        state: TransportState,
        nframes: u32,
        pos: &mut TransportPosition,
        new_pos: bool,
    ) {
        let pending = self.pending.take();
        let Some(times) = self.times else {
            return;
        };

        let cycle = TimebaseCycle {
            anchor: times.next_usecs,
            nframes,
            sample_rate: self.host.sample_rate(),
            rolling: state.is_rolling(),
            bpm: self.tempo.load(),
        };

        let (snapshot, reported, tempo) = match pending {
            Some(p) => (Some(p.state), p.reported, p.tempo),
            None => (None, None, None),
        };
        self.translator
            .timebase(self.session.as_ref(), snapshot, &cycle, pos, new_pos);
        self.record_commit(reported, tempo);

        if new_pos {
            self.generator.resync();
        }
    }
}

impl<B> HostClient for ClockBridge<B>
where
    B: BeatSession + 'static,
{
    fn process(&mut self, nframes: u32) {
        ClockBridge::process(self, nframes);
    }

    fn timebase(
        &mut self,
        state: TransportState,
        nframes: u32,
        pos: &mut TransportPosition,
        new_pos: bool,
    ) {
        ClockBridge::timebase(self, state, nframes, pos, new_pos);
    }

    fn sync(&mut self, _state: TransportState, _pos: &TransportPosition) -> bool {
        true
    }

    fn output(&self) -> PortOutput<'_> {
        self.generator.output()
    }
}
