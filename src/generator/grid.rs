use crate::host::Bbt;

/// Working bar/beat/tick position, all 0-based. `tick` stays fractional so
/// that positions compare exactly as computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BbtCursor {
    pub bar: i32,
    pub beat: i32,
    pub tick: f64,
}

impl BbtCursor {
    pub fn from_bbt(bbt: &Bbt) -> Self {
        Self {
            bar: bbt.bar - 1,
            beat: bbt.beat - 1,
            tick: f64::from(bbt.tick),
        }
    }

    /// Carry tick overflow into beats and beat overflow into bars.
    pub fn normalize(&mut self, beats_per_bar: i32, ticks_per_beat: f64) {
        if self.tick >= ticks_per_beat {
            self.beat += (self.tick / ticks_per_beat).floor() as i32;
            self.tick %= ticks_per_beat;
        }
        if self.beat >= beats_per_bar {
            self.bar += self.beat / beats_per_bar;
            self.beat %= beats_per_bar;
        }
    }

    /// First beat of a bar, within the first step of that beat.
    pub fn is_downbeat(&self, ticks_per_step: f64) -> bool {
        self.beat == 0 && self.tick >= 0.0 && self.tick < ticks_per_step && self.bar > 0
    }
}

/// Step indices within a beat are found with this much slack so that a
/// boundary computed as a repeating fraction still counts as reached.
const STEP_EPSILON: f64 = 1e-9;

/// Frame/tick arithmetic for a pulse train with `steps_per_beat` pulses per
/// beat at the position's tempo. Cursor ticks produced by the grid are
/// always `index * ticks_per_step` for a step index below `steps_per_beat`,
/// so they compare exactly across cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockGrid {
    pub frames_per_tick: f64,
    pub ticks_per_step: f64,
    pub frames_per_step: f64,
    pub ticks_per_beat: f64,
    pub beats_per_bar: i32,
    pub steps_per_beat: i32,
}

impl ClockGrid {
    /// `None` when the position cannot produce a finite grid.
    pub fn new(bbt: &Bbt, sample_rate: f64, steps_per_beat: u32) -> Option<Self> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(bbt.ticks_per_beat)
            || !usable(bbt.beats_per_minute)
            || !usable(bbt.beats_per_bar)
            || !usable(sample_rate)
            || steps_per_beat == 0
        {
            return None;
        }
        let steps_per_beat = i32::try_from(steps_per_beat).ok()?;

        let frames_per_tick = 60.0 * sample_rate / (bbt.ticks_per_beat * bbt.beats_per_minute);
        let ticks_per_step = bbt.ticks_per_beat / f64::from(steps_per_beat);
        Some(Self {
            frames_per_tick,
            ticks_per_step,
            frames_per_step: frames_per_tick * ticks_per_step,
            ticks_per_beat: bbt.ticks_per_beat,
            beats_per_bar: bbt.beats_per_bar.ceil() as i32,
            steps_per_beat,
        })
    }

    /// Step index of a cursor sitting on a boundary.
    pub fn step_index(&self, cursor: &BbtCursor) -> i32 {
        (cursor.tick / self.ticks_per_step).round() as i32
    }

    /// Move the cursor onto step `index` of its beat, carrying whole beats.
    fn place(&self, cursor: &mut BbtCursor, index: i32) {
        cursor.beat += index.div_euclid(self.steps_per_beat);
        cursor.tick = f64::from(index.rem_euclid(self.steps_per_beat)) * self.ticks_per_step;
        cursor.normalize(self.beats_per_bar, self.ticks_per_beat);
    }

    pub fn advance(&self, cursor: &mut BbtCursor) {
        let next = self.step_index(cursor) + 1;
        self.place(cursor, next);
    }

    /// Position and buffer frame of the first step boundary at or after the
    /// cycle's starting tick. A boundary equal to `last_emitted` was already
    /// handled in the previous cycle and is skipped. When the host position
    /// is coarser than a step, the successor of `last_emitted` can fall just
    /// behind the cycle start; it is then taken at frame zero instead of
    /// being dropped.
    pub fn first_step(&self, bbt: &Bbt, last_emitted: Option<BbtCursor>) -> (BbtCursor, f64) {
        let mut cursor = BbtCursor::from_bbt(bbt);
        cursor.normalize(self.beats_per_bar, self.ticks_per_beat);

        let exact = cursor.tick / self.ticks_per_step;
        let index = (exact - STEP_EPSILON).ceil();
        let offset = ((index - exact) * self.ticks_per_step).max(0.0);
        self.place(&mut cursor, index as i32);
        let mut frame = offset * self.frames_per_tick;

        if let Some(last) = last_emitted {
            if last == cursor {
                self.advance(&mut cursor);
                frame += self.frames_per_step;
            } else {
                let mut missed = last;
                self.advance(&mut missed);
                let mut after = missed;
                self.advance(&mut after);
                if after == cursor {
                    cursor = missed;
                    frame -= self.frames_per_step;
                }
            }
        }
        (cursor, frame)
    }
}

/// Nearest whole frame inside a buffer of `nframes`.
pub fn frame_index(frame: f64, nframes: u32) -> u32 {
    let rounded = frame.round().max(0.0) as u32;
    rounded.min(nframes.saturating_sub(1))
}
