pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod host;
pub mod logging;
pub mod metadata;
pub mod midi;
pub mod notifications;
pub mod position;
pub mod scheduler;
pub mod session;
pub mod tempo;
pub mod ui;

pub use bridge::{BridgeConfig, ClockBridge, OutputMode};
pub use error::{Error, Result};
pub use host::{HostClient, SimulatedHost, TransportHost};
pub use session::{BeatSession, LocalSession};
pub use tempo::TempoCell;

/// Name used for the log directory.
pub const APP_NAME: &str = "transportlink";
