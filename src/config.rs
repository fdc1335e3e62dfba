// config.rs

use crate::bridge::{BridgeConfig, OutputMode, MAX_PERIOD_FRAMES};
use crate::cli::Args;
use crate::error::{Error, Result};
use crate::generator::{PulseConfig, StartMode, DEFAULT_CLICKS_PER_BEAT};
use crate::position::{BeatSourceKind, PositionDefaults};
use clap::ValueEnum;
use config::{Config, Environment, File};
use log::LevelFilter;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "transportlink.toml";
pub const ENV_PREFIX: &str = "TRANSPORTLINK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    MidiClock,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BeatSource {
    Session,
    FreeRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StartAnnouncement {
    TransportStart,
    EveryBar,
}

fn value_name<T: ValueEnum>(value: T) -> Option<String> {
    value.to_possible_value().map(|v| v.get_name().to_string())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub client_name: String,
    pub start_stop_sync: bool,
    pub initial_bpm: f64,
    pub initial_quantum: f64,
    pub initial_denom: f32,
    pub initial_ticks_per_beat: f64,
    pub output_mode: OutputKind,
    pub beat_source: BeatSource,
    pub start_mode: StartAnnouncement,
    pub delay_first_clock: bool,
    pub clicks_per_beat: u32,
    pub sample_rate: u32,
    pub period_frames: u32,
    pub midi_output: Option<String>,
    pub log_level: String,
}

impl Settings {
    /// Layer defaults, settings file, environment and command line, then
    /// validate.
    pub fn load(args: &Args) -> Result<Self> {
        let path = args
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let settings: Settings = Config::builder()
            .set_default("client_name", "jack-transport-link")?
            .set_default("start_stop_sync", true)?
            .set_default("initial_bpm", 100.0)?
            .set_default("initial_quantum", 4.0)?
            .set_default("initial_denom", 4.0)?
            .set_default("initial_ticks_per_beat", 1920.0)?
            .set_default("output_mode", "midi-clock")?
            .set_default("beat_source", "session")?
            .set_default("start_mode", "transport-start")?
            .set_default("delay_first_clock", false)?
            .set_default("clicks_per_beat", i64::from(DEFAULT_CLICKS_PER_BEAT))?
            .set_default("sample_rate", 48_000_i64)?
            .set_default("period_frames", 512_i64)?
            .set_default("log_level", "info")?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .set_override_option("client_name", args.client_name.clone())?
            .set_override_option("start_stop_sync", args.start_stop_sync)?
            .set_override_option("initial_bpm", args.initial_bpm)?
            .set_override_option("initial_quantum", args.initial_quantum)?
            .set_override_option("initial_denom", args.initial_denom)?
            .set_override_option("initial_ticks_per_beat", args.initial_ticks_per_beat)?
            .set_override_option("output_mode", args.output_mode.and_then(value_name))?
            .set_override_option("beat_source", args.beat_source.and_then(value_name))?
            .set_override_option("start_mode", args.start_mode.and_then(value_name))?
            .set_override_option("delay_first_clock", args.delay_first_clock)?
            .set_override_option("clicks_per_beat", args.clicks_per_beat.map(i64::from))?
            .set_override_option("sample_rate", args.sample_rate.map(i64::from))?
            .set_override_option("period_frames", args.period_frames.map(i64::from))?
            .set_override_option("midi_output", args.midi_output.clone())?
            .set_override_option("log_level", args.log_level.clone())?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.initial_bpm > 0.0)
            || !(self.initial_quantum >= 1.0)
            || !(self.initial_denom >= 1.0)
            || !(self.initial_ticks_per_beat >= 1.0)
        {
            return Err(Error::Config(
                "one or more numeric options are out of range".into(),
            ));
        }
        if self.clicks_per_beat == 0 {
            return Err(Error::Config("clicks_per_beat must be at least 1".into()));
        }
        if self.sample_rate == 0 || self.period_frames == 0 {
            return Err(Error::Config(
                "sample_rate and period_frames must be positive".into(),
            ));
        }
        if self.period_frames as usize > MAX_PERIOD_FRAMES {
            return Err(Error::Config(format!(
                "period_frames must not exceed {}",
                MAX_PERIOD_FRAMES
            )));
        }
        self.log_filter()?;
        Ok(())
    }

    pub fn log_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| Error::Config(format!("unknown log level '{}'", self.log_level)))
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        let output = match self.output_mode {
            OutputKind::MidiClock => OutputMode::MidiClock(PulseConfig {
                start_mode: match self.start_mode {
                    StartAnnouncement::TransportStart => StartMode::TransportStart,
                    StartAnnouncement::EveryBar => StartMode::EveryBar,
                },
                delay_first_clock: self.delay_first_clock,
            }),
            OutputKind::Click => OutputMode::Click {
                clicks_per_beat: self.clicks_per_beat,
            },
        };

        BridgeConfig {
            initial_bpm: self.initial_bpm,
            defaults: PositionDefaults {
                quantum: self.initial_quantum,
                beat_type: self.initial_denom,
                ticks_per_beat: self.initial_ticks_per_beat,
            },
            beat_source: match self.beat_source {
                BeatSource::Session => BeatSourceKind::Session,
                BeatSource::FreeRunning => BeatSourceKind::FreeRunning,
            },
            output,
            start_stop_sync: self.start_stop_sync,
        }
    }
}
