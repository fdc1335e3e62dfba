use super::grid::{BbtCursor, ClockGrid};
use super::CycleInput;

pub const DEFAULT_CLICKS_PER_BEAT: u32 = 4;

/// Writes a unit impulse at every beat subdivision into an audio buffer.
#[derive(Debug)]
pub struct ClickGenerator {
    clicks_per_beat: u32,
    last_emitted: Option<BbtCursor>,
    buffer: Vec<f32>,
}

impl ClickGenerator {
    /// `max_frames` reserves the buffer so ordinary periods never allocate.
    pub fn new(clicks_per_beat: u32, max_frames: usize) -> Self {
        Self {
            clicks_per_beat: clicks_per_beat.max(1),
            last_emitted: None,
            buffer: Vec::with_capacity(max_frames),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.buffer
    }

    pub fn last_emitted(&self) -> Option<BbtCursor> {
        self.last_emitted
    }

    pub fn skip_cycle(&mut self, nframes: u32) {
        self.silence(nframes);
    }

    pub fn resync(&mut self) {
        self.last_emitted = None;
    }

    pub fn process(&mut self, input: &CycleInput) {
        self.silence(input.nframes);

        if !input.rolling {
            self.last_emitted = None;
            return;
        }
        let Some(bbt) = input.position.as_ref() else {
            return;
        };
        let Some(grid) = ClockGrid::new(bbt, input.sample_rate, self.clicks_per_beat)
        else {
            return;
        };

        let nframes = f64::from(input.nframes);
        let (mut cursor, mut frame) = grid.first_step(bbt, self.last_emitted);
        while frame.ceil() < nframes {
            self.buffer[frame as usize] = 1.0;
            self.last_emitted = Some(cursor);
            grid.advance(&mut cursor);
            frame += grid.frames_per_step;
        }
    }

    fn silence(&mut self, nframes: u32) {
        self.buffer.clear();
        self.buffer.resize(nframes as usize, 0.0);
    }
}
