use super::{
    Bbt, CycleTimes, HostClient, PortOutput, TransportHost, TransportPosition, TransportQuery,
    TransportState,
};
use crate::scheduler::{Scheduler, ThreadScheduler};
use crate::session::Micros;
use log::info;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const COMMAND_NONE: u8 = 0;
const COMMAND_START: u8 = 1;
const COMMAND_STOP: u8 = 2;

#[derive(Debug, Clone, Copy)]
enum Locate {
    Frame(u64),
    Bbt(Bbt),
}

#[derive(Debug)]
struct CycleData {
    state: TransportState,
    position: TransportPosition,
    times: Option<CycleTimes>,
    relocated: bool,
    pending_locate: Option<Locate>,
}

/// Software transport with a fixed sample rate and period.
///
/// Cycles are run either by [`spawn_driver`] against the wall clock or
/// directly through [`SimulatedHost::run_cycle`] with synthetic times.
///
/// A pending locate is applied before the cycle's hooks run: `process` sees
/// the located position in its query, and the same position, held still for
/// the relocated cycle, is handed to `timebase` to fill in the next one. The
/// located bar/beat/tick is therefore reported for two consecutive periods.
pub struct SimulatedHost {
    sample_rate: u32,
    period_frames: u32,
    epoch: Instant,
    command: AtomicU8,
    timing_available: AtomicBool,
    cycle: Mutex<CycleData>,
}

impl SimulatedHost {
    pub fn new(sample_rate: u32, period_frames: u32) -> Self {
        info!(
            "Creating simulated host: {} Hz, {} frames per period",
            sample_rate, period_frames
        );
        Self {
            sample_rate,
            period_frames,
            epoch: Instant::now(),
            command: AtomicU8::new(COMMAND_NONE),
            timing_available: AtomicBool::new(true),
            cycle: Mutex::new(CycleData {
                state: TransportState::Stopped,
                position: TransportPosition {
                    frame: 0,
                    frame_rate: sample_rate,
                    bbt: None,
                },
                times: None,
                relocated: false,
                pending_locate: None,
            }),
        }
    }

    pub fn period_frames(&self) -> u32 {
        self.period_frames
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(f64::from(self.period_frames) / f64::from(self.sample_rate))
    }

    pub fn now_usecs(&self) -> Micros {
        self.epoch.elapsed().as_micros() as Micros
    }

    pub fn state(&self) -> TransportState {
        self.data().state
    }

    pub fn position(&self) -> TransportPosition {
        self.data().position
    }

    pub fn locate_frame(&self, frame: u64) {
        self.data().pending_locate = Some(Locate::Frame(frame));
    }

    pub fn locate_bbt(&self, bbt: Bbt) {
        self.data().pending_locate = Some(Locate::Bbt(bbt));
    }

    /// Make `cycle_times` fail, as a host does when it cannot report timing.
    pub fn set_timing_available(&self, available: bool) {
        self.timing_available.store(available, Ordering::Release);
    }

    /// Run one full cycle starting at `now`.
    pub fn run_cycle(&self, client: &mut dyn HostClient, now: Micros) {
        let nframes = self.period_frames;
        let period_usecs = self.period().as_secs_f64() * 1_000_000.0;

        let (state, position) = {
            let mut data = self.data();
            data.times = if self.timing_available.load(Ordering::Acquire) {
                Some(CycleTimes {
                    current_usecs: now,
                    next_usecs: now + period_usecs.round() as Micros,
                })
            } else {
                None
            };

            match self.command.swap(COMMAND_NONE, Ordering::AcqRel) {
                COMMAND_START if data.state == TransportState::Stopped => {
                    data.state = TransportState::Starting;
                }
                COMMAND_STOP => data.state = TransportState::Stopped,
                _ => {}
            }

            if let Some(locate) = data.pending_locate.take() {
                match locate {
                    Locate::Frame(frame) => {
                        data.position.frame = frame;
                        data.position.bbt = None;
                    }
                    Locate::Bbt(bbt) => data.position.bbt = Some(bbt),
                }
                data.relocated = true;
            }
            (data.state, data.position)
        };

        let ready = state == TransportState::Starting && client.sync(state, &position);

        client.process(nframes);

        let (state, mut position, relocated) = {
            let mut data = self.data();
            if data.state.is_rolling() && !data.relocated {
                data.position.frame += u64::from(nframes);
            }
            (data.state, data.position, data.relocated)
        };

        if state != TransportState::Stopped || relocated {
            client.timebase(state, nframes, &mut position, relocated);
        }

        let mut data = self.data();
        data.position = position;
        data.relocated = false;
        if ready && data.state == TransportState::Starting {
            data.state = TransportState::Rolling;
        }
    }

    fn data(&self) -> MutexGuard<'_, CycleData> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TransportHost for SimulatedHost {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn cycle_times(&self) -> Option<CycleTimes> {
        self.data().times
    }

    fn query(&self) -> TransportQuery {
        let data = self.data();
        TransportQuery {
            state: data.state,
            position: data.position,
            relocated: data.relocated,
        }
    }

    fn start(&self) {
        self.command.store(COMMAND_START, Ordering::Release);
    }

    fn stop(&self) {
        self.command.store(COMMAND_STOP, Ordering::Release);
    }
}

/// Drive `client` from the wall clock until `running` is cleared, handing
/// each cycle's port output to `sink`.
pub fn spawn_driver<F>(
    host: Arc<SimulatedHost>,
    mut client: Box<dyn HostClient>,
    running: Arc<AtomicBool>,
    mut sink: F,
) -> std::io::Result<JoinHandle<()>>
where
    F: FnMut(PortOutput<'_>) + Send + 'static,
{
    ThreadScheduler::new().spawn("host-driver", move || {
        info!("Simulated host driver started");
        let period = host.period();
        let mut deadline = Instant::now();

        while running.load(Ordering::Acquire) {
            host.run_cycle(client.as_mut(), host.now_usecs());
            sink(client.output());

            deadline += period;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                // Overran; realign instead of bursting to catch up.
                deadline = now;
            }
        }
        info!("Simulated host driver stopped");
    })
}
