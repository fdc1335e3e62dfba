//! Output generators
//!
//! Both generators consume the host position once per cycle and place
//! discrete events inside the cycle's buffer:
//! - [`PulseGenerator`] emits MIDI clock/start/stop messages
//! - [`ClickGenerator`] writes unit impulses into an audio buffer
//!
//! Exactly one of them is active per bridge, chosen at construction through
//! [`OutputGenerator`].

mod click;
mod grid;
mod pulse;

pub use click::{ClickGenerator, DEFAULT_CLICKS_PER_BEAT};
pub use grid::{frame_index, BbtCursor, ClockGrid};
pub use pulse::{PulseConfig, PulseGenerator, RunState, StartMode};

use crate::host::{Bbt, PortOutput};

/// Per-cycle input shared by both generators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleInput {
    /// Host position, `None` when the host has no valid bar/beat/tick.
    pub position: Option<Bbt>,
    pub nframes: u32,
    pub sample_rate: f64,
    pub rolling: bool,
}

pub enum OutputGenerator {
    Pulse(PulseGenerator),
    Click(ClickGenerator),
}

impl OutputGenerator {
    pub fn process(&mut self, input: &CycleInput) {
        match self {
            OutputGenerator::Pulse(pulse) => pulse.process(input),
            OutputGenerator::Click(click) => click.process(input),
        }
    }

    pub fn skip_cycle(&mut self, nframes: u32) {
        match self {
            OutputGenerator::Pulse(pulse) => pulse.skip_cycle(),
            OutputGenerator::Click(click) => click.skip_cycle(nframes),
        }
    }

    pub fn resync(&mut self) {
        match self {
            OutputGenerator::Pulse(pulse) => pulse.resync(),
            OutputGenerator::Click(click) => click.resync(),
        }
    }

    pub fn output(&self) -> PortOutput<'_> {
        match self {
            OutputGenerator::Pulse(pulse) => PortOutput::Midi(pulse.events().events()),
            OutputGenerator::Click(click) => PortOutput::Audio(click.samples()),
        }
    }
}
