use super::{ClockMessage, MidiEngine};
use crate::error::{Error, Result};
use log::info;
use midir::{MidiOutput, MidiOutputConnection};

/// Sends clock messages to a system MIDI output port.
pub struct MidirEngine {
    output: MidiOutputConnection,
}

impl MidirEngine {
    /// Connect to the first output port whose name contains `device_name`.
    pub fn connect(client_name: &str, device_name: &str) -> Result<Self> {
        let midi_out = MidiOutput::new(client_name).map_err(|e| Error::Midi(e.to_string()))?;

        let out_ports = midi_out.ports();
        let out_port = out_ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(device_name)
            })
            .ok_or_else(|| Error::Midi(format!("output device '{}' not found", device_name)))?;

        let port_name = midi_out
            .port_name(out_port)
            .map_err(|e| Error::Midi(e.to_string()))?;
        info!("Connecting clock output to MIDI port: {}", port_name);

        let output = midi_out
            .connect(out_port, "clock")
            .map_err(|e| Error::Midi(e.to_string()))?;
        Ok(Self { output })
    }

    pub fn list_ports(client_name: &str) -> Result<Vec<String>> {
        let midi_out = MidiOutput::new(client_name).map_err(|e| Error::Midi(e.to_string()))?;
        Ok(midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect())
    }
}

impl MidiEngine for MidirEngine {
    fn send(&mut self, msg: ClockMessage) -> Result<()> {
        self.output
            .send(&[msg.status_byte()])
            .map_err(|e| Error::Midi(e.to_string()))
    }
}
