use crate::config::{BeatSource, OutputKind, StartAnnouncement};
use clap::Parser;
use std::path::PathBuf;

/// Every setting is optional here; anything left out falls back to the
/// settings file, the environment, then the built-in default.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Host transport timebase bridged to a shared beat session", long_about = None)]
pub struct Args {
    /// Settings file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Synchronize starts and stops with other start/stop enabled peers
    #[arg(short = 's', long, value_name = "BOOL")]
    pub start_stop_sync: Option<bool>,

    /// Initial tempo if the transport has none
    #[arg(short = 'b', long, value_name = "BPM")]
    pub initial_bpm: Option<f64>,

    /// Initial quantum (time signature numerator)
    #[arg(short = 'q', long, value_name = "BEATS")]
    pub initial_quantum: Option<f64>,

    /// Initial time signature denominator
    #[arg(short = 'd', long, value_name = "DENOM")]
    pub initial_denom: Option<f64>,

    /// Initial ticks per beat
    #[arg(short = 't', long, value_name = "TICKS")]
    pub initial_ticks_per_beat: Option<f64>,

    /// Name of the host client
    #[arg(short = 'n', long, value_name = "NAME")]
    pub client_name: Option<String>,

    /// Emit MIDI clock or an audible click
    #[arg(long, value_enum)]
    pub output_mode: Option<OutputKind>,

    /// Follow the shared session or count beats locally
    #[arg(long, value_enum)]
    pub beat_source: Option<BeatSource>,

    /// Send MIDI start once per transport start or on every bar
    #[arg(long, value_enum)]
    pub start_mode: Option<StartAnnouncement>,

    /// Hold the first clock after a start back slightly
    #[arg(long, value_name = "BOOL")]
    pub delay_first_clock: Option<bool>,

    /// Clicks per beat in click mode
    #[arg(long, value_name = "N")]
    pub clicks_per_beat: Option<u32>,

    /// Sample rate of the simulated host
    #[arg(long, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Frames per period of the simulated host
    #[arg(long, value_name = "FRAMES")]
    pub period_frames: Option<u32>,

    /// MIDI output port to forward clock messages to
    #[arg(long, value_name = "DEVICE")]
    pub midi_output: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// List available MIDI output ports and exit
    #[arg(long)]
    pub list_midi_ports: bool,

    /// Exit after this many seconds instead of running until interrupted
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<u64>,
}
