use clap::Parser;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use transportlink::{
    cli::Args,
    config::Settings,
    host::{spawn_driver, PortOutput, TransportHost},
    logging,
    metadata::{ClientUuid, InMemoryPropertyStore, MetadataSync, PropertyStore},
    midi::{MidiEngine, MidirEngine},
    notifications::NotificationLoop,
    ui::{OutputStats, StatusDisplay},
    ClockBridge, LocalSession, Result, SimulatedHost, TempoCell, APP_NAME,
};

fn main() {
    let args = Args::parse();

    if args.list_midi_ports {
        list_midi_ports(&args);
        return;
    }

    let settings = match Settings::load(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    initialize_logging(&settings);

    if let Err(e) = run(&settings, args.duration.map(Duration::from_secs)) {
        log::error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn initialize_logging(settings: &Settings) {
    let level = settings.log_filter().unwrap_or(log::LevelFilter::Info);
    match logging::init_logger(APP_NAME, level) {
        Ok(path) => log::info!("Application starting, logging to {}", path.display()),
        Err(e) => eprintln!("Logger initialization failed: {}", e),
    }
}

fn list_midi_ports(args: &Args) {
    let client_name = args.client_name.as_deref().unwrap_or(APP_NAME);
    match MidirEngine::list_ports(client_name) {
        Ok(ports) => {
            println!("Available MIDI output ports:");
            for port in ports {
                println!("  - {}", port);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn client_uuid(client_name: &str) -> ClientUuid {
    let mut hasher = DefaultHasher::new();
    client_name.hash(&mut hasher);
    std::process::id().hash(&mut hasher);
    hasher.finish()
}

fn run(settings: &Settings, duration: Option<Duration>) -> Result<()> {
    let mut midi: Option<Box<dyn MidiEngine>> = match &settings.midi_output {
        Some(device) => Some(Box::new(MidirEngine::connect(
            &settings.client_name,
            device,
        )?)),
        None => None,
    };

    let tempo = Arc::new(TempoCell::new(settings.initial_bpm));
    let session = Arc::new(LocalSession::new(settings.initial_bpm));
    let host = Arc::new(SimulatedHost::new(
        settings.sample_rate,
        settings.period_frames,
    ));

    let bridge = ClockBridge::new(
        host.clone(),
        session.clone(),
        tempo.clone(),
        settings.bridge_config(),
    );

    let store: Arc<dyn PropertyStore> = Arc::new(InMemoryPropertyStore::new(Some(client_uuid(
        &settings.client_name,
    ))));
    let metadata = MetadataSync::new(store, session.clone(), tempo.clone());
    metadata.publish_all()?;

    let notifications =
        NotificationLoop::new(session.clone(), host.clone(), tempo.clone(), Some(metadata))
            .spawn()?;

    let stats = Arc::new(OutputStats::default());
    let running = Arc::new(AtomicBool::new(true));

    let sink_stats = stats.clone();
    let driver = spawn_driver(host.clone(), Box::new(bridge), running.clone(), move |output| {
        sink_stats.record(output);
        if let (Some(engine), PortOutput::Midi(events)) = (midi.as_mut(), output) {
            for event in events {
                if let Err(e) = engine.send(event.message) {
                    log::error!("Failed to forward {:?}: {}", event.message, e);
                }
            }
        }
    })?;

    host.start();
    log::info!("Transport started");

    let display = StatusDisplay::new(
        host.clone(),
        tempo,
        stats,
        settings.initial_quantum.ceil() as u64,
    );
    display.run(&running, duration.map(|d| Instant::now() + d));

    // Let the driver deliver the stop before it exits.
    host.stop();
    thread::sleep(host.period() * 2);
    running.store(false, Ordering::Release);
    if driver.join().is_err() {
        log::error!("Host driver thread panicked");
    }
    notifications.shutdown();
    log::info!("Application stopped");
    Ok(())
}
