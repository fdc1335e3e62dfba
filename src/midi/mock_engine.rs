use super::{ClockMessage, MidiEngine};
use crate::error::Result;
use std::sync::{Arc, Mutex};

/// Records every message it is asked to send.
#[derive(Clone, Default)]
pub struct MockMidiEngine {
    sent: Arc<Mutex<Vec<ClockMessage>>>,
}

impl MockMidiEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ClockMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl MidiEngine for MockMidiEngine {
    fn send(&mut self, msg: ClockMessage) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(msg);
        }
        Ok(())
    }
}
