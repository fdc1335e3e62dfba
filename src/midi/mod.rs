//! MIDI clock output
//!
//! This module provides:
//! - the single-byte real-time messages the pulse generator emits
//! - [`MidiEventBuffer`], the preallocated per-cycle event port
//! - the [`MidiEngine`] trait for forwarding messages to a device, with a
//!   `midir` implementation and a recording mock
//!
mod engine;
pub mod midir_engine;
pub mod mock_engine;

pub use engine::MidiEngine;
pub use midir_engine::MidirEngine;
pub use mock_engine::MockMidiEngine;

/// MIDI standard resolution: clock pulses per quarter note.
pub const CLOCKS_PER_BEAT: u32 = 24;

/// Default capacity of a [`MidiEventBuffer`].
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// System real-time messages, each a single status byte with no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMessage {
    Clock,
    Start,
    Stop,
}

impl ClockMessage {
    pub fn status_byte(self) -> u8 {
        match self {
            ClockMessage::Clock => 0xF8,
            ClockMessage::Start => 0xFA,
            ClockMessage::Stop => 0xFC,
        }
    }

    pub fn from_status_byte(byte: u8) -> Option<Self> {
        match byte {
            0xF8 => Some(ClockMessage::Clock),
            0xFA => Some(ClockMessage::Start),
            0xFC => Some(ClockMessage::Stop),
            _ => None,
        }
    }
}

/// A message placed at a buffer-relative frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    pub frame: u32,
    pub message: ClockMessage,
}

/// Fixed-capacity event list for one cycle.
///
/// Storage is reserved up front and never grows, so writing from the audio
/// thread does not allocate. Writes past capacity are dropped.
#[derive(Debug)]
pub struct MidiEventBuffer {
    events: Vec<MidiEvent>,
    capacity: usize,
}

impl MidiEventBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Returns `false` if the buffer is full.
    pub fn write(&mut self, frame: u32, message: ClockMessage) -> bool {
        if self.events.len() >= self.capacity {
            return false;
        }
        self.events.push(MidiEvent { frame, message });
        true
    }

    pub fn events(&self) -> &[MidiEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for MidiEventBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}
