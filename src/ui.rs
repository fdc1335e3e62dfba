// ui.rs

use crate::host::{PortOutput, SimulatedHost};
use crate::midi::ClockMessage;
use crate::tempo::TempoCell;
use indicatif::ProgressDrawTarget;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Running totals of what the bridge has written to its output port.
#[derive(Debug, Default)]
pub struct OutputStats {
    clocks: AtomicU64,
    starts: AtomicU64,
    stops: AtomicU64,
    click_cycles: AtomicU64,
}

impl OutputStats {
    pub fn record(&self, output: PortOutput<'_>) {
        match output {
            PortOutput::Midi(events) => {
                for event in events {
                    let counter = match event.message {
                        ClockMessage::Clock => &self.clocks,
                        ClockMessage::Start => &self.starts,
                        ClockMessage::Stop => &self.stops,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            }
            PortOutput::Audio(samples) => {
                if samples.iter().any(|s| *s != 0.0) {
                    self.click_cycles.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    pub fn clocks(&self) -> u64 {
        self.clocks.load(Ordering::Relaxed)
    }

    pub fn starts(&self) -> u64 {
        self.starts.load(Ordering::Relaxed)
    }

    pub fn stops(&self) -> u64 {
        self.stops.load(Ordering::Relaxed)
    }

    pub fn click_cycles(&self) -> u64 {
        self.click_cycles.load(Ordering::Relaxed)
    }
}

fn create_beat_progress(multi_progress: &MultiProgress, beats_per_bar: u64) -> ProgressBar {
    let pb = multi_progress.add(ProgressBar::new(beats_per_bar));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:40.cyan}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("⣀⣤⣦⣶⣷⣿ "),
    );
    pb.set_prefix("Beat");
    pb
}

fn create_transport_spinner(multi_progress: &MultiProgress) -> ProgressBar {
    let pb = multi_progress.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("Transport");
    pb
}

/// Terminal status line for the simulated host.
pub struct StatusDisplay {
    host: Arc<SimulatedHost>,
    tempo: Arc<TempoCell>,
    stats: Arc<OutputStats>,

    #[allow(dead_code)]
    multi_progress: MultiProgress,
    beat_pb: ProgressBar,
    transport_pb: ProgressBar,
}

impl StatusDisplay {
    pub fn new(
        host: Arc<SimulatedHost>,
        tempo: Arc<TempoCell>,
        stats: Arc<OutputStats>,
        beats_per_bar: u64,
    ) -> Self {
        let multi_progress = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
        let beat_pb = create_beat_progress(&multi_progress, beats_per_bar.max(1));
        let transport_pb = create_transport_spinner(&multi_progress);

        StatusDisplay {
            host,
            tempo,
            stats,
            multi_progress,
            beat_pb,
            transport_pb,
        }
    }

    pub fn refresh(&self) {
        let position = self.host.position();

        if let Some(bbt) = position.bbt {
            self.beat_pb.set_position(u64::try_from(bbt.beat).unwrap_or(0));
        }

        let bar = position.bbt.map_or(0, |bbt| bbt.bar);
        self.transport_pb.set_message(format!(
            "{:?}, BPM: {:.2}, Bar: {}, Frame: {}, Clocks: {}, Starts: {}, Stops: {}, Click cycles: {}",
            self.host.state(),
            self.tempo.load(),
            bar,
            position.frame,
            self.stats.clocks(),
            self.stats.starts(),
            self.stats.stops(),
            self.stats.click_cycles(),
        ));
        self.transport_pb.tick();
    }

    /// Redraw every 100 ms until `running` is cleared or `until` passes.
    pub fn run(&self, running: &AtomicBool, until: Option<Instant>) {
        while running.load(Ordering::Acquire) {
            if until.is_some_and(|deadline| Instant::now() >= deadline) {
                break;
            }
            thread::sleep(Duration::from_millis(100));
            self.refresh();
        }
        self.transport_pb.finish();
    }
}
