//! MIDI clock pulse generator.

use super::grid::{frame_index, BbtCursor, ClockGrid};
use super::CycleInput;
use crate::midi::{ClockMessage, MidiEventBuffer, CLOCKS_PER_BEAT};

/// Run state of the emitted clock stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    /// Alignment was lost; a stop goes out next cycle and the stream
    /// restarts on a fresh downbeat.
    NeedsSync,
}

/// When start messages are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Once, when the stream starts.
    #[default]
    TransportStart,
    /// On the downbeat of every bar.
    EveryBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PulseConfig {
    pub start_mode: StartMode,
    /// Hold the first clock after a start back by half a clock period or
    /// 1 ms, whichever is shorter.
    pub delay_first_clock: bool,
}

/// Emits 24-per-quarter-note clock, start and stop messages at
/// buffer-relative frames, keeping the pulse counter aligned with the beat
/// grid across cycles.
#[derive(Debug)]
pub struct PulseGenerator {
    config: PulseConfig,
    run_state: RunState,
    clock_count: u32,
    clock_frame_delay: f64,
    owed_clock: Option<f64>,
    last_emitted: Option<BbtCursor>,
    buffer: MidiEventBuffer,
}

impl PulseGenerator {
    pub fn new(config: PulseConfig) -> Self {
        Self {
            config,
            run_state: RunState::Stopped,
            clock_count: 0,
            clock_frame_delay: 0.0,
            owed_clock: None,
            last_emitted: None,
            buffer: MidiEventBuffer::default(),
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn clock_count(&self) -> u32 {
        self.clock_count
    }

    /// Last processed position, `None` once invalidated.
    pub fn last_emitted(&self) -> Option<BbtCursor> {
        self.last_emitted
    }

    pub fn events(&self) -> &MidiEventBuffer {
        &self.buffer
    }

    /// Drop this cycle's output without touching the run state.
    pub fn skip_cycle(&mut self) {
        self.buffer.clear();
    }

    /// Force a clean stop/restart after the position jumped.
    pub fn resync(&mut self) {
        if self.run_state == RunState::Running {
            self.run_state = RunState::NeedsSync;
        }
        self.clock_frame_delay = 0.0;
        self.owed_clock = None;
        self.last_emitted = None;
    }

    pub fn process(&mut self, input: &CycleInput) {
        self.buffer.clear();

        if !input.rolling {
            if self.run_state != RunState::Stopped {
                self.buffer.write(0, ClockMessage::Stop);
                self.run_state = RunState::Stopped;
                self.clock_frame_delay = 0.0;
                self.owed_clock = None;
                self.last_emitted = None;
            }
            return;
        }

        let Some(bbt) = input.position.as_ref() else {
            return;
        };
        let Some(grid) = ClockGrid::new(bbt, input.sample_rate, CLOCKS_PER_BEAT) else {
            return;
        };
        let nframes = f64::from(input.nframes);

        let (mut cursor, mut frame) = grid.first_step(bbt, self.last_emitted);

        if self.run_state == RunState::NeedsSync {
            self.buffer.write(0, ClockMessage::Stop);
            self.run_state = RunState::Stopped;
        }

        if let Some(owed) = self.owed_clock.take() {
            if owed.floor() < nframes {
                self.buffer
                    .write(frame_index(owed, input.nframes), ClockMessage::Clock);
                self.clock_count = 1;
            } else {
                self.owed_clock = Some(owed - nframes);
            }
        }

        while (frame + self.clock_frame_delay).floor() < nframes {
            if self.run_state == RunState::Running {
                let at = frame_index(frame + self.clock_frame_delay, input.nframes);
                self.clock_frame_delay = 0.0;

                // count 0 must coincide with the first clock division of a beat
                let in_first_division = grid.step_index(&cursor) == 0;
                let resync = if self.clock_count == 0 {
                    !in_first_division
                } else {
                    in_first_division
                };
                if resync {
                    self.buffer.write(at, ClockMessage::Stop);
                    self.run_state = RunState::NeedsSync;
                    self.last_emitted = None;
                    break;
                }

                if self.config.start_mode == StartMode::EveryBar
                    && cursor.beat == 0
                    && self.clock_count == 0
                {
                    self.buffer.write(at, ClockMessage::Start);
                }
                self.buffer.write(at, ClockMessage::Clock);
                self.clock_count = (self.clock_count + 1) % CLOCKS_PER_BEAT;
            } else if cursor.is_downbeat(grid.ticks_per_step) {
                self.run_state = RunState::Running;
                if self.config.start_mode == StartMode::TransportStart {
                    self.buffer
                        .write(frame_index(frame, input.nframes), ClockMessage::Start);
                }
                if self.config.delay_first_clock {
                    self.clock_frame_delay =
                        (grid.frames_per_step / 2.0).min(input.sample_rate / 1000.0);
                }
                self.clock_count = 0;
                continue;
            }

            self.last_emitted = Some(cursor);
            grid.advance(&mut cursor);
            frame += grid.frames_per_step;
        }

        if self.clock_frame_delay > 0.0 {
            // The delayed first clock lands in a later buffer.
            self.owed_clock = Some(frame + self.clock_frame_delay - nframes);
            self.clock_frame_delay = 0.0;
            self.last_emitted = Some(cursor);
        }
    }
}
