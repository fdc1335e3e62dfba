use super::ClockMessage;
use crate::error::Result;

/// Destination for clock messages leaving the process.
pub trait MidiEngine: Send {
    fn send(&mut self, msg: ClockMessage) -> Result<()>;
}
